extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate reqwest;
extern crate frunk;
extern crate actix;
#[macro_use]
extern crate log;
#[cfg(test)] #[macro_use] extern crate matches;
#[cfg(test)] extern crate serde_json;

pub mod model;
pub mod live;
pub mod repository;
pub mod eventyay;
pub mod changes;
pub mod preferences;
pub mod controller;
