use std::collections::HashMap;
use std::iter;
use std::sync::Mutex;
use failure::Error;
use model::Attendee;

/// Blocking stream of attendees. The first `Err` ends the stream.
pub type AttendeeStream = Box<dyn Iterator<Item = Result<Attendee, Error>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttendeeQuery {
    pub event_id: u64,
    pub checked_in_only: bool,
    /// Skip any cached result and ask the source again.
    pub reload: bool
}

pub trait AttendeeRepository: Send + Sync {
    fn get_attendees(&self, query: &AttendeeQuery) -> AttendeeStream;

    fn get_attendees_page_wise(&self, query: &AttendeeQuery, page_size: u32) -> AttendeeStream;
}

pub fn attendee_stream(attendees: Vec<Attendee>) -> AttendeeStream {
    Box::new(attendees.into_iter().map(Ok::<Attendee, Error>))
}

pub fn failed_stream(error: Error) -> AttendeeStream {
    Box::new(iter::once(Err::<Attendee, Error>(error)))
}

/// Keeps the last successful full fetch of every `(event, filter)` pair.
///
/// Page-wise fetches are never cached.
pub struct CachingRepository<R> {
    inner: R,
    cache: Mutex<HashMap<(u64, bool), Vec<Attendee>>>
}

impl<R: AttendeeRepository> CachingRepository<R> {
    pub fn new(inner: R) -> Self {
        CachingRepository { inner, cache: Mutex::new(HashMap::new()) }
    }

    fn cached(&self, key: &(u64, bool)) -> Option<Vec<Attendee>> {
        match self.cache.lock() {
            Ok(cache) => cache.get(key).cloned(),
            Err(_) => None
        }
    }

    fn store(&self, key: (u64, bool), attendees: &[Attendee]) {
        match self.cache.lock() {
            Ok(mut cache) => { cache.insert(key, attendees.to_vec()); }
            Err(_) => warn!("Attendees cache lock poisoned, result of event {} not cached", key.0)
        }
    }
}

impl<R: AttendeeRepository> AttendeeRepository for CachingRepository<R> {
    fn get_attendees(&self, query: &AttendeeQuery) -> AttendeeStream {
        let key = (query.event_id, query.checked_in_only);
        if !query.reload {
            if let Some(attendees) = self.cached(&key) {
                debug!("Serving {} cached attendees of event {}", attendees.len(), query.event_id);
                return attendee_stream(attendees);
            }
        }
        match self.inner.get_attendees(query).collect::<Result<Vec<_>, _>>() {
            Ok(attendees) => {
                self.store(key, &attendees);
                attendee_stream(attendees)
            }
            Err(error) => failed_stream(error)
        }
    }

    fn get_attendees_page_wise(&self, query: &AttendeeQuery, page_size: u32) -> AttendeeStream {
        self.inner.get_attendees_page_wise(query, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failure::err_msg;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepository {
        calls: AtomicUsize,
        fail: bool
    }

    impl AttendeeRepository for CountingRepository {
        fn get_attendees(&self, query: &AttendeeQuery) -> AttendeeStream {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            if self.fail {
                return failed_stream(err_msg("source unavailable"));
            }
            attendee_stream(vec![Attendee { id: query.event_id * 100 + call, ..Attendee::default() }])
        }

        fn get_attendees_page_wise(&self, _query: &AttendeeQuery, _page_size: u32) -> AttendeeStream {
            self.calls.fetch_add(1, Ordering::SeqCst);
            attendee_stream(vec![])
        }
    }

    fn query(event_id: u64, checked_in_only: bool, reload: bool) -> AttendeeQuery {
        AttendeeQuery { event_id, checked_in_only, reload }
    }

    fn ids(stream: AttendeeStream) -> Vec<u64> {
        stream.map(|attendee| attendee.unwrap().id).collect()
    }

    #[test]
    fn test_cached_result_without_reload() {
        let repository = CachingRepository::new(CountingRepository { calls: AtomicUsize::new(0), fail: false });

        assert_eq!(ids(repository.get_attendees(&query(5, false, false))), vec![500]);
        assert_eq!(ids(repository.get_attendees(&query(5, false, false))), vec![500]);
        assert_eq!(repository.inner.calls.load(Ordering::SeqCst), 1);

        // The filter is part of the cache key
        assert_eq!(ids(repository.get_attendees(&query(5, true, false))), vec![501]);
        assert_eq!(repository.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reload_bypasses_cache() {
        let repository = CachingRepository::new(CountingRepository { calls: AtomicUsize::new(0), fail: false });

        assert_eq!(ids(repository.get_attendees(&query(5, false, false))), vec![500]);
        assert_eq!(ids(repository.get_attendees(&query(5, false, true))), vec![501]);
        assert_eq!(ids(repository.get_attendees(&query(5, false, false))), vec![501]);
        assert_eq!(repository.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let repository = CachingRepository::new(CountingRepository { calls: AtomicUsize::new(0), fail: true });

        let result = repository.get_attendees(&query(5, false, false)).collect::<Result<Vec<_>, _>>();
        assert_eq!(result.unwrap_err().to_string(), "source unavailable");
        assert!(repository.get_attendees(&query(5, false, false)).next().unwrap().is_err());
        assert_eq!(repository.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_page_wise_passes_through() {
        let repository = CachingRepository::new(CountingRepository { calls: AtomicUsize::new(0), fail: false });

        assert_eq!(ids(repository.get_attendees_page_wise(&query(5, false, false), 2)), Vec::<u64>::new());
        assert_eq!(ids(repository.get_attendees_page_wise(&query(5, false, false), 2)), Vec::<u64>::new());
        assert_eq!(repository.inner.calls.load(Ordering::SeqCst), 2);
    }
}
