pub mod errors;

pub mod model;
pub mod attendees;

pub use self::attendees::EventyayRepository;

pub const EVENTYAY_BASE_URL: &'static str = "https://api.eventyay.com";

/// Page size used when a full fetch walks every page of an event.
const FULL_FETCH_PAGE_SIZE: u32 = 100;
