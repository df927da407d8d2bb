use failure::Error;

#[derive(Fail, Debug)]
pub enum HostError {
    #[fail(display = "Invalid parameter")]
    InvalidParameter,
    #[fail(display = "No attendee {} in the current list", id)]
    AttendeeNotFound { id: u64 },
    #[fail(display = "Attendees controller unavailable")]
    ControllerUnavailable { cause: Error },
}
