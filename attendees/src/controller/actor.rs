use std::cmp;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use actix::{Actor, Addr, AsyncContext, Context, Handler, Message, SyncArbiter};
use actix::dev::{MessageResponse, ResponseChannel};
use failure::Error;
use changes::{ChangeAction, DatabaseChangeListener, ModelChange};
use live::Observable;
use model::Attendee;
use preferences::{Preferences, ATTENDEES_CHECKED_IN_ONLY, SELECTED_EVENT};
use repository::{AttendeeQuery, AttendeeRepository};
use super::errors::ControllerError;
use super::executor::{Fetch, FetchEvent, FetchEventKind, FetchExecutor};
use super::message::{Field, GetSnapshot, LoadAttendees, SelectEvent, SetCheckedInOnly, SetPageSize, StateSnapshot,
                     Subscribe, Subscription, Unsubscribe};

const DEFAULT_FETCH_WORKERS: usize = 2;

/// Owns the attendee list state of one event.
///
/// Every observable field is only written from this actor's handlers, fetch
/// workers report back through its mailbox. Each `LoadAttendees` starts a new
/// generation: workers stop paging through older ones and their late results
/// are dropped, so a load replaces any load still in flight.
pub struct AttendeesController {
    repository: Arc<dyn AttendeeRepository>,
    change_listener: Box<dyn DatabaseChangeListener<Attendee>>,
    preferences: Arc<dyn Preferences>,
    executor: Option<Addr<FetchExecutor>>,
    fetch_workers: usize,
    event_id: Option<u64>,
    checked_in_only: bool,
    page_size: Option<u32>,
    generation: usize,
    current_load: Arc<AtomicUsize>,
    /// Items of the current page-wise load, published as a list once complete.
    pending: Vec<Attendee>,
    progress: Observable<bool>,
    error: Observable<String>,
    show_scan_button: Observable<bool>,
    attendee_list: Observable<Vec<Attendee>>,
    attendee: Observable<Attendee>
}

impl AttendeesController {
    pub fn new(repository: Arc<dyn AttendeeRepository>,
               change_listener: Box<dyn DatabaseChangeListener<Attendee>>,
               preferences: Arc<dyn Preferences>) -> Self {
        let selected_event = preferences.get_long(SELECTED_EVENT, -1);
        let checked_in_only = preferences.get_boolean(ATTENDEES_CHECKED_IN_ONLY, false);
        AttendeesController {
            repository,
            change_listener,
            preferences,
            executor: None,
            fetch_workers: DEFAULT_FETCH_WORKERS,
            event_id: if selected_event < 0 { None } else { Some(selected_event as u64) },
            checked_in_only,
            page_size: None,
            generation: 0,
            current_load: Arc::new(AtomicUsize::new(0)),
            pending: Vec::new(),
            progress: Observable::new(),
            error: Observable::new(),
            show_scan_button: Observable::new(),
            attendee_list: Observable::new(),
            attendee: Observable::new()
        }
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size.and_then(non_zero);
        self
    }

    pub fn with_fetch_workers(mut self, fetch_workers: usize) -> Self {
        self.fetch_workers = cmp::max(1, fetch_workers);
        self
    }

    fn fail(&mut self, error: Error) {
        self.pending.clear();
        warn!("Unable to load attendees : {}", error);
        self.error.set_value(error.to_string());
        self.progress.set_value(false);
    }

    fn complete(&mut self) {
        self.progress.set_value(false);
        self.show_scan_button.set_value(true);
    }
}

fn non_zero(page_size: u32) -> Option<u32> {
    if page_size == 0 { None } else { Some(page_size) }
}

impl Actor for AttendeesController {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Context<Self>) {
        let repository = self.repository.clone();
        let current_load = self.current_load.clone();
        self.executor = Some(SyncArbiter::start(self.fetch_workers,
                                                move || FetchExecutor::new(repository.clone(), current_load.clone())));
        self.change_listener.start_listening(ctx.address().recipient());
        info!("Attendees controller started with {} fetch workers", self.fetch_workers);
    }

    fn stopped(&mut self, _ctx: &mut Context<Self>) {
        self.change_listener.stop_listening();
    }
}

impl Message for LoadAttendees {
    type Result = ();
}

impl Handler<LoadAttendees> for AttendeesController {
    type Result = ();

    fn handle(&mut self, msg: LoadAttendees, ctx: &mut Context<Self>) -> Self::Result {
        self.generation += 1;
        self.current_load.store(self.generation, Ordering::SeqCst);
        self.pending.clear();
        self.progress.set_value(true);

        let event_id = match self.event_id {
            Some(event_id) => event_id,
            None => return self.fail(ControllerError::NoEventSelected.into())
        };
        let fetch = Fetch {
            generation: self.generation,
            query: AttendeeQuery { event_id, checked_in_only: self.checked_in_only, reload: msg.force_reload },
            page_size: self.page_size,
            reply: ctx.address().recipient()
        };
        match self.executor.clone() {
            Some(executor) => {
                debug!("Loading attendees of event {} (load {}, force reload {})", event_id, self.generation, msg.force_reload);
                executor.do_send(fetch)
            }
            None => self.fail(ControllerError::ExecutorUnavailable.into())
        }
    }
}

impl Handler<FetchEvent> for AttendeesController {
    type Result = ();

    fn handle(&mut self, msg: FetchEvent, _ctx: &mut Context<Self>) -> Self::Result {
        if msg.generation != self.generation {
            debug!("Dropping result of replaced load {}", msg.generation);
            return;
        }
        match msg.kind {
            FetchEventKind::Item(attendee) => {
                self.pending.push(attendee.clone());
                self.attendee.set_value(attendee);
            }
            FetchEventKind::Loaded(attendees) => {
                info!("Loaded {} attendees", attendees.len());
                self.attendee_list.set_value(attendees);
                self.complete();
            }
            FetchEventKind::Completed => {
                let attendees = mem::replace(&mut self.pending, Vec::new());
                info!("Loaded {} attendees page wise", attendees.len());
                self.attendee_list.set_value(attendees);
                self.complete();
            }
            FetchEventKind::Failed(error) => self.fail(error)
        }
    }
}

impl Message for SelectEvent {
    type Result = ();
}

impl Handler<SelectEvent> for AttendeesController {
    type Result = ();

    fn handle(&mut self, msg: SelectEvent, _ctx: &mut Context<Self>) -> Self::Result {
        if msg.0 > i64::max_value() as u64 {
            warn!("Event id {} can't be stored, keeping the current selection", msg.0);
            return;
        }
        self.event_id = Some(msg.0);
        self.preferences.set_long(SELECTED_EVENT, msg.0 as i64);
    }
}

impl Message for SetCheckedInOnly {
    type Result = ();
}

impl Handler<SetCheckedInOnly> for AttendeesController {
    type Result = ();

    fn handle(&mut self, msg: SetCheckedInOnly, _ctx: &mut Context<Self>) -> Self::Result {
        self.checked_in_only = msg.0;
        self.preferences.set_boolean(ATTENDEES_CHECKED_IN_ONLY, msg.0);
    }
}

impl Message for SetPageSize {
    type Result = ();
}

impl Handler<SetPageSize> for AttendeesController {
    type Result = ();

    fn handle(&mut self, msg: SetPageSize, _ctx: &mut Context<Self>) -> Self::Result {
        self.page_size = msg.0.and_then(non_zero);
    }
}

impl Message for Subscribe {
    type Result = Subscription;
}

impl<A, M> MessageResponse<A, M> for Subscription
    where
        A: Actor,
        M: Message<Result=Subscription>,
{
    fn handle<R: ResponseChannel<M>>(self, _: &mut A::Context, tx: Option<R>) {
        if let Some(tx) = tx {
            tx.send(self);
        }
    }
}

impl Handler<Subscribe> for AttendeesController {
    type Result = Subscription;

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Context<Self>) -> Self::Result {
        match msg {
            Subscribe::Progress(observer) => Subscription { field: Field::Progress, id: self.progress.observe(observer) },
            Subscribe::Error(observer) => Subscription { field: Field::Error, id: self.error.observe(observer) },
            Subscribe::ShowScanButton(observer) => Subscription { field: Field::ShowScanButton, id: self.show_scan_button.observe(observer) },
            Subscribe::AttendeeList(observer) => Subscription { field: Field::AttendeeList, id: self.attendee_list.observe(observer) },
            Subscribe::Attendee(observer) => Subscription { field: Field::Attendee, id: self.attendee.observe(observer) }
        }
    }
}

impl Message for Unsubscribe {
    type Result = bool;
}

impl Handler<Unsubscribe> for AttendeesController {
    type Result = bool;

    fn handle(&mut self, msg: Unsubscribe, _ctx: &mut Context<Self>) -> Self::Result {
        let Subscription { field, id } = msg.0;
        match field {
            Field::Progress => self.progress.remove_observer(id),
            Field::Error => self.error.remove_observer(id),
            Field::ShowScanButton => self.show_scan_button.remove_observer(id),
            Field::AttendeeList => self.attendee_list.remove_observer(id),
            Field::Attendee => self.attendee.remove_observer(id)
        }
    }
}

impl Message for GetSnapshot {
    type Result = StateSnapshot;
}

impl<A, M> MessageResponse<A, M> for StateSnapshot
    where
        A: Actor,
        M: Message<Result=StateSnapshot>,
{
    fn handle<R: ResponseChannel<M>>(self, _: &mut A::Context, tx: Option<R>) {
        if let Some(tx) = tx {
            tx.send(self);
        }
    }
}

impl Handler<GetSnapshot> for AttendeesController {
    type Result = StateSnapshot;

    fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Context<Self>) -> Self::Result {
        StateSnapshot {
            event_id: self.event_id,
            checked_in_only: self.checked_in_only,
            page_size: self.page_size,
            progress: self.progress.value().cloned().unwrap_or(false),
            error: self.error.value().cloned(),
            show_scan_button: self.show_scan_button.value().cloned().unwrap_or(false),
            attendees: self.attendee_list.value().cloned().unwrap_or_default()
        }
    }
}

impl Handler<ModelChange<Attendee>> for AttendeesController {
    type Result = ();

    fn handle(&mut self, change: ModelChange<Attendee>, _ctx: &mut Context<Self>) -> Self::Result {
        if change.action != ChangeAction::Update {
            return;
        }
        let updated = change.model;
        let attendees = match self.attendee_list.value() {
            Some(attendees) if attendees.iter().any(|attendee| attendee.id == updated.id) => attendees.iter()
                .map(|attendee| if attendee.id == updated.id { updated.clone() } else { attendee.clone() })
                .collect::<Vec<_>>(),
            _ => {
                debug!("Ignoring change of attendee {} absent from the list", updated.id);
                return;
            }
        };
        self.attendee_list.set_value(attendees);
        self.attendee.set_value(updated);
    }
}
