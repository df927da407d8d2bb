use failure::Error;

#[derive(Debug, Fail)]
pub enum EventyayError {
    #[fail(display = "error while loading attendees for event {}", event_id)]
    AttendeesLoadError {
        event_id: u64,
        #[cause] cause: Error
    },
    #[fail(display = "error while loading page {} of attendees for event {}", page, event_id)]
    PageLoadError {
        event_id: u64,
        page: u32,
        #[cause] cause: Error
    },
    #[fail(display = "invalid attendee id {:?}", id)]
    InvalidAttendeeId {
        id: String
    }
}
