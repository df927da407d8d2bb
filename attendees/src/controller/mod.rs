//! Attendee list controller: an actor owning the observable list state,
//! fed by a pool of blocking fetch workers.

pub mod errors;
pub mod message;
pub mod actor;
mod executor;

pub use self::actor::AttendeesController;
pub use self::message::{Field, GetSnapshot, LoadAttendees, SelectEvent, SetCheckedInOnly, SetPageSize, StateSnapshot,
                        Subscribe, Subscription, Unsubscribe};
