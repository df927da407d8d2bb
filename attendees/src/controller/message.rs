use live::{Observer, ObserverId};
use model::Attendee;

pub struct LoadAttendees {
    pub force_reload: bool
}

pub struct SelectEvent(pub u64);

pub struct SetCheckedInOnly(pub bool);

/// `None` (or a zero page size) loads the whole list at once.
pub struct SetPageSize(pub Option<u32>);

pub enum Subscribe {
    Progress(Box<dyn Observer<bool>>),
    Error(Box<dyn Observer<String>>),
    ShowScanButton(Box<dyn Observer<bool>>),
    AttendeeList(Box<dyn Observer<Vec<Attendee>>>),
    Attendee(Box<dyn Observer<Attendee>>)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Progress,
    Error,
    ShowScanButton,
    AttendeeList,
    Attendee
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub field: Field,
    pub id: ObserverId
}

pub struct Unsubscribe(pub Subscription);

pub struct GetSnapshot;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub event_id: Option<u64>,
    pub checked_in_only: bool,
    pub page_size: Option<u32>,
    pub progress: bool,
    pub error: Option<String>,
    pub show_scan_button: bool,
    pub attendees: Vec<Attendee>
}
