use std::cmp;
use std::collections::VecDeque;
use std::iter;
use failure::Error;
use frunk::monoid::combine_all;
use reqwest::Client;
use reqwest::header::Authorization;
use model::Attendee;
use repository::{attendee_stream, failed_stream, AttendeeQuery, AttendeeRepository, AttendeeStream};
use super::model::AttendeesDocument;
use super::errors::EventyayError;
use super::FULL_FETCH_PAGE_SIZE;

/// `[{"name":"is-checked-in","op":"eq","val":true}]`, url encoded
const CHECKED_IN_FILTER: &'static str = "%5B%7B%22name%22%3A%22is-checked-in%22%2C%22op%22%3A%22eq%22%2C%22val%22%3Atrue%7D%5D";

fn attendees_url(base_url: &str, event_id: u64, page: u32, page_size: u32, checked_in_only: bool) -> String {
    let filter = if checked_in_only { format!("&filter={}", CHECKED_IN_FILTER) } else { String::new() };
    format!("{base_url}/v1/events/{event_id}/attendees?page%5Bsize%5D={page_size}&page%5Bnumber%5D={page}{filter}",
            base_url = base_url, event_id = event_id, page_size = page_size, page = page, filter = filter)
}

fn page_count(object_count: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = (u64::from(object_count) + u64::from(page_size) - 1) / u64::from(page_size);
    cmp::max(1, pages as u32)
}

/// Load every page of an event, failing on the first page in error.
///
/// The first page tells how many attendees exist, the remaining pages are
/// then requested in order and concatenated.
fn fetch_all_attendees<F>(fetch: F, event_id: u64, page_size: u32) -> Result<Vec<Attendee>, Error>
    where F: Fn(u32) -> Result<AttendeesDocument, Error> {
    fetch(1)
        .and_then(|first: AttendeesDocument| {
            let pages = page_count(first.meta.count, page_size);
            iter::once(Ok(first))
                .chain((2..=pages).map(|page| fetch(page)))
                .collect::<Result<Vec<AttendeesDocument>, Error>>()
        })
        .and_then(|documents| documents.into_iter().map(AttendeesDocument::into_attendees).collect::<Result<Vec<Vec<Attendee>>, Error>>())
        .map(|pages: Vec<Vec<Attendee>>| combine_all(&pages))
        .map_err(|err| EventyayError::AttendeesLoadError { event_id, cause: err }.into())
}

/// Lazily walks the pages of an event: page `n + 1` is requested only once
/// every attendee of page `n` has been consumed.
pub struct PageWiseAttendees<F> {
    fetch: F,
    event_id: u64,
    page_size: u32,
    next_page: u32,
    yielded: u32,
    buffered: VecDeque<Attendee>,
    exhausted: bool
}

impl<F> PageWiseAttendees<F> where F: FnMut(u32) -> Result<AttendeesDocument, Error> {
    pub fn new(fetch: F, event_id: u64, page_size: u32) -> Self {
        PageWiseAttendees { fetch, event_id, page_size, next_page: 1, yielded: 0, buffered: VecDeque::new(), exhausted: false }
    }

    fn load_next_page(&mut self) -> Result<(), Error> {
        let page = self.next_page;
        let event_id = self.event_id;
        let document = (self.fetch)(page)
            .map_err(|cause| EventyayError::PageLoadError { event_id, page, cause })?;
        let total = document.meta.count;
        let attendees = document.into_attendees()
            .map_err(|cause| EventyayError::PageLoadError { event_id, page, cause })?;
        let received = attendees.len() as u32;

        self.next_page += 1;
        self.buffered.extend(attendees);
        if received == 0 || received < self.page_size || (total > 0 && self.yielded.saturating_add(received) >= total) {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<F> Iterator for PageWiseAttendees<F> where F: FnMut(u32) -> Result<AttendeesDocument, Error> {
    type Item = Result<Attendee, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(attendee) = self.buffered.pop_front() {
                self.yielded = self.yielded.saturating_add(1);
                return Some(Ok(attendee));
            }
            if self.exhausted {
                return None;
            }
            if let Err(error) = self.load_next_page() {
                self.exhausted = true;
                return Some(Err(error));
            }
        }
    }
}

/// Attendees of the Eventyay (open-event) API.
#[derive(Clone)]
pub struct EventyayRepository {
    client: Client,
    base_url: String,
    token: Option<String>
}

impl EventyayRepository {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        EventyayRepository { client: Client::new(), base_url: base_url.trim_end_matches('/').to_owned(), token }
    }

    fn fetch_page(&self, event_id: u64, checked_in_only: bool, page: u32, page_size: u32) -> Result<AttendeesDocument, Error> {
        let url = attendees_url(&self.base_url, event_id, page, page_size, checked_in_only);
        debug!("Loading attendees page {} of event {}", page, event_id);
        let mut request = self.client.get(url.as_str());
        if let Some(ref token) = self.token {
            request.header(Authorization(format!("JWT {}", token)));
        }
        let document = request.send()?
            .error_for_status()?
            .json()?;
        Ok(document)
    }
}

impl AttendeeRepository for EventyayRepository {
    fn get_attendees(&self, query: &AttendeeQuery) -> AttendeeStream {
        let (event_id, checked_in_only) = (query.event_id, query.checked_in_only);
        let fetch = |page| self.fetch_page(event_id, checked_in_only, page, FULL_FETCH_PAGE_SIZE);
        match fetch_all_attendees(fetch, event_id, FULL_FETCH_PAGE_SIZE) {
            Ok(attendees) => attendee_stream(attendees),
            Err(error) => failed_stream(error)
        }
    }

    fn get_attendees_page_wise(&self, query: &AttendeeQuery, page_size: u32) -> AttendeeStream {
        let repository = self.clone();
        let (event_id, checked_in_only) = (query.event_id, query.checked_in_only);
        let fetch = move |page| repository.fetch_page(event_id, checked_in_only, page, page_size);
        Box::new(PageWiseAttendees::new(fetch, event_id, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::model::{AttendeeAttributes, AttendeeResource, Meta};
    use super::super::EVENTYAY_BASE_URL;
    use std::cell::RefCell;
    use std::io::Error;
    use std::io::ErrorKind;

    fn document(ids: Vec<u64>, count: u32) -> AttendeesDocument {
        AttendeesDocument {
            data: ids.into_iter().map(|id| AttendeeResource { id: id.to_string(), attributes: AttendeeAttributes::default() }).collect(),
            meta: Meta { count }
        }
    }

    fn attendee_ids(attendees: Vec<Attendee>) -> Vec<u64> {
        attendees.into_iter().map(|attendee| attendee.id).collect()
    }

    #[test]
    fn test_attendees_url() {
        assert_eq!(attendees_url(EVENTYAY_BASE_URL, 5, 1, 100, false),
                   EVENTYAY_BASE_URL.to_owned() + "/v1/events/5/attendees?page%5Bsize%5D=100&page%5Bnumber%5D=1");
        assert_eq!(attendees_url("http://localhost:5000", 5, 3, 2, true),
                   "http://localhost:5000/v1/events/5/attendees?page%5Bsize%5D=2&page%5Bnumber%5D=3&filter=%5B%7B%22name%22%3A%22is-checked-in%22%2C%22op%22%3A%22eq%22%2C%22val%22%3Atrue%7D%5D");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 100), 1);
        assert_eq!(page_count(7, 2), 4);
        assert_eq!(page_count(8, 2), 4);
        assert_eq!(page_count(8, 0), 1);
        assert_eq!(page_count(u32::max_value(), 100), 42_949_673);
        assert_eq!(page_count(u32::max_value(), 1), u32::max_value());
    }

    #[test]
    fn test_fetch_all_attendees() {
        // Single page
        let fetch = |_page: u32| Ok(document(vec![1, 2], 2));
        let result = fetch_all_attendees(fetch, 5, 100);
        assert_eq!(attendee_ids(result.unwrap()), vec![1, 2]);

        // Pages are concatenated in order
        let requested = RefCell::new(vec![]);
        let fetch = |page: u32| {
            requested.borrow_mut().push(page);
            match page {
                1 => Ok(document(vec![1, 2], 5)),
                2 => Ok(document(vec![3, 4], 5)),
                _ => Ok(document(vec![5], 5))
            }
        };
        let result = fetch_all_attendees(fetch, 5, 2);
        assert_eq!(attendee_ids(result.unwrap()), vec![1, 2, 3, 4, 5]);
        assert_eq!(*requested.borrow(), vec![1, 2, 3]);

        // Err on first call
        let fetch = |_page: u32| Err(Error::new(ErrorKind::ConnectionRefused, "Fake error").into());
        let result = fetch_all_attendees(fetch, 5, 2);
        let typed_error = result.unwrap_err().downcast::<EventyayError>().unwrap();
        match typed_error {
            EventyayError::AttendeesLoadError { event_id, cause } => {
                assert_eq!(event_id, 5);
                assert_eq!(cause.downcast::<Error>().unwrap().kind(), ErrorKind::ConnectionRefused)
            }
            _ => assert!(false)
        }

        // Err on a following page
        let fetch = |page: u32| match page {
            1 => Ok(document(vec![1, 2], 4)),
            _ => Err(Error::new(ErrorKind::ConnectionRefused, "Fake error").into())
        };
        let result = fetch_all_attendees(fetch, 5, 2);
        let typed_error = result.unwrap_err().downcast::<EventyayError>().unwrap();
        assert_matches!(typed_error, EventyayError::AttendeesLoadError { event_id: 5, .. });
    }

    #[test]
    fn test_page_wise_attendees_are_loaded_lazily() {
        let requested = RefCell::new(vec![]);
        let fetch = |page: u32| {
            requested.borrow_mut().push(page);
            match page {
                1 => Ok(document(vec![1, 2], 5)),
                2 => Ok(document(vec![3, 4], 5)),
                _ => Ok(document(vec![5], 5))
            }
        };
        let mut attendees = PageWiseAttendees::new(fetch, 5, 2);

        assert_eq!(attendees.next().unwrap().unwrap().id, 1);
        assert_eq!(*requested.borrow(), vec![1]);
        assert_eq!(attendees.next().unwrap().unwrap().id, 2);
        assert_eq!(attendees.next().unwrap().unwrap().id, 3);
        assert_eq!(*requested.borrow(), vec![1, 2]);

        let rest = attendees.map(|attendee| attendee.unwrap().id).collect::<Vec<_>>();
        assert_eq!(rest, vec![4, 5]);
        assert_eq!(*requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_wise_stops_on_empty_page() {
        let fetch = |page: u32| match page {
            1 => Ok(document(vec![1, 2], 0)),
            _ => Ok(document(vec![], 0))
        };
        let ids = PageWiseAttendees::new(fetch, 5, 2).map(|attendee| attendee.unwrap().id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_page_wise_error_ends_stream() {
        let fetch = |page: u32| match page {
            1 => Ok(document(vec![1, 2], 6)),
            _ => Err(Error::new(ErrorKind::TimedOut, "Fake error").into())
        };
        let items = PageWiseAttendees::new(fetch, 5, 2).collect::<Vec<_>>();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().id, 1);
        assert_eq!(items[1].as_ref().unwrap().id, 2);

        let error = items.into_iter().nth(2).unwrap().unwrap_err();
        assert_matches!(error.downcast::<EventyayError>(), Ok(EventyayError::PageLoadError { event_id: 5, page: 2, .. }));
    }
}
