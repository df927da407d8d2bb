#[derive(Debug, Fail, PartialEq)]
pub enum ControllerError {
    #[fail(display = "No event selected")]
    NoEventSelected,
    #[fail(display = "Attendees fetch executor is not running")]
    ExecutorUnavailable
}
