//! JSON:API documents served by the Eventyay attendees endpoints.
use failure::Error;
use model::Attendee;
use super::errors::EventyayError;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Meta {
    #[serde(default)]
    pub count: u32
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AttendeeAttributes {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub is_checked_in: Option<bool>,
    pub checkin_times: Option<String>
}

#[derive(Deserialize, Debug, Clone)]
pub struct AttendeeResource {
    pub id: String,
    #[serde(default)]
    pub attributes: AttendeeAttributes
}

#[derive(Deserialize, Debug, Clone)]
pub struct AttendeesDocument {
    pub data: Vec<AttendeeResource>,
    #[serde(default)]
    pub meta: Meta
}

impl AttendeeResource {
    pub fn into_attendee(self) -> Result<Attendee, Error> {
        let id = self.id.parse::<u64>()
            .map_err(|_| EventyayError::InvalidAttendeeId { id: self.id.clone() })?;
        let attributes = self.attributes;
        Ok(Attendee {
            id,
            firstname: attributes.firstname,
            lastname: attributes.lastname,
            email: attributes.email,
            is_checked_in: attributes.is_checked_in.unwrap_or(false),
            checkin_times: attributes.checkin_times
        })
    }
}

impl AttendeesDocument {
    pub fn into_attendees(self) -> Result<Vec<Attendee>, Error> {
        self.data.into_iter().map(AttendeeResource::into_attendee).collect()
    }
}
