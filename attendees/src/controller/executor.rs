//! Blocking fetch workers. Every result goes back through the controller
//! mailbox so that items and completion of one fetch are handled in order.
//! A worker stops pulling its stream as soon as a newer load was started.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use actix::{Actor, Handler, Message, Recipient, SyncContext};
use failure::Error;
use model::Attendee;
use repository::{AttendeeQuery, AttendeeRepository};

pub struct FetchExecutor {
    repository: Arc<dyn AttendeeRepository>,
    current_load: Arc<AtomicUsize>
}

impl FetchExecutor {
    pub fn new(repository: Arc<dyn AttendeeRepository>, current_load: Arc<AtomicUsize>) -> Self {
        FetchExecutor { repository, current_load }
    }

    fn is_replaced(&self, generation: usize) -> bool {
        self.current_load.load(Ordering::SeqCst) != generation
    }
}

impl Actor for FetchExecutor {
    type Context = SyncContext<Self>;
}

pub struct Fetch {
    pub generation: usize,
    pub query: AttendeeQuery,
    pub page_size: Option<u32>,
    pub reply: Recipient<FetchEvent>
}

pub struct FetchEvent {
    pub generation: usize,
    pub kind: FetchEventKind
}

pub enum FetchEventKind {
    Item(Attendee),
    Loaded(Vec<Attendee>),
    Completed,
    Failed(Error)
}

impl Message for Fetch {
    type Result = ();
}

impl Message for FetchEvent {
    type Result = ();
}

fn deliver(reply: &Recipient<FetchEvent>, generation: usize, kind: FetchEventKind) -> bool {
    match reply.do_send(FetchEvent { generation, kind }) {
        Ok(()) => true,
        Err(_) => {
            warn!("Controller mailbox closed, dropping result of load {}", generation);
            false
        }
    }
}

impl Handler<Fetch> for FetchExecutor {
    type Result = ();

    fn handle(&mut self, msg: Fetch, _: &mut Self::Context) -> Self::Result {
        let Fetch { generation, query, page_size, reply } = msg;
        if self.is_replaced(generation) {
            debug!("Load {} replaced before it started", generation);
            return;
        }
        match page_size {
            None => {
                let kind = match self.repository.get_attendees(&query).collect::<Result<Vec<_>, _>>() {
                    Ok(attendees) => FetchEventKind::Loaded(attendees),
                    Err(error) => FetchEventKind::Failed(error)
                };
                deliver(&reply, generation, kind);
            }
            Some(page_size) => {
                let mut attendees = self.repository.get_attendees_page_wise(&query, page_size);
                loop {
                    if self.is_replaced(generation) {
                        debug!("Load {} replaced, stop paging", generation);
                        return;
                    }
                    let delivered = match attendees.next() {
                        Some(Ok(attendee)) => deliver(&reply, generation, FetchEventKind::Item(attendee)),
                        Some(Err(error)) => {
                            deliver(&reply, generation, FetchEventKind::Failed(error));
                            return;
                        }
                        None => break
                    };
                    if !delivered {
                        return;
                    }
                }
                deliver(&reply, generation, FetchEventKind::Completed);
            }
        }
    }
}
