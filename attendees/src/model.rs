/// One registered person of an event, as handed out by an `AttendeeRepository`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Attendee {
    pub id: u64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub is_checked_in: bool,
    pub checkin_times: Option<String>
}

impl Attendee {
    pub fn full_name(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (&Some(ref first), &Some(ref last)) => format!("{} {}", first, last),
            (&Some(ref first), &None) => first.clone(),
            (&None, &Some(ref last)) => last.clone(),
            (&None, &None) => String::new()
        }
    }
}
