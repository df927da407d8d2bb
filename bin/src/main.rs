extern crate actix;
extern crate actix_web;
extern crate tokio;
extern crate eventyay_attendees;
#[macro_use]
extern crate failure_derive;
extern crate failure;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;
extern crate env_logger;

mod config;
mod errors;
mod refresh_loop;

use actix::prelude::{System, Arbiter, Addr, Actor};
use config::HostConfig;
use errors::HostError;
use eventyay_attendees::changes::{ChangeAction, ChangeNotifier, ModelChange};
use eventyay_attendees::controller::{AttendeesController, GetSnapshot, LoadAttendees, SetCheckedInOnly, SetPageSize, StateSnapshot, Subscribe};
use eventyay_attendees::eventyay::EventyayRepository;
use eventyay_attendees::model::Attendee;
use eventyay_attendees::preferences::{MemoryPreferences, Preferences, ATTENDEES_CHECKED_IN_ONLY, SELECTED_EVENT};
use eventyay_attendees::repository::CachingRepository;
use tokio::prelude::future::Future;

use actix_web::{App, HttpResponse, http::Method, FutureResponse, State, AsyncResponder, Path, Query};
use actix_web::{http, error};
use actix_web::server::HttpServer;
use std::process;
use std::sync::Arc;

struct WebState {
    controller: Addr<AttendeesController>,
    changes: ChangeNotifier<Attendee>
}

impl error::ResponseError for HostError {
    fn error_response(&self) -> HttpResponse {
        match *self {
            HostError::InvalidParameter => HttpResponse::new(http::StatusCode::BAD_REQUEST),
            HostError::AttendeeNotFound { .. } => HttpResponse::with_body(http::StatusCode::NOT_FOUND, format!("{}", self)),
            HostError::ControllerUnavailable { cause: ref e } => HttpResponse::with_body(http::StatusCode::SERVICE_UNAVAILABLE, format!("{}", e))
        }
    }
}

#[derive(Deserialize)]
struct FilterQuery {
    checked_in_only: bool
}

#[derive(Deserialize)]
struct PageSizeQuery {
    size: i64
}

#[derive(Deserialize)]
struct CheckInQuery {
    checked_in: bool
}

fn page_size(size: i64) -> Result<Option<u32>, HostError> {
    match size {
        0 => Ok(None),
        size if size < 0 || size > i64::from(u32::max_value()) => Err(HostError::InvalidParameter),
        size => Ok(Some(size as u32))
    }
}

fn snapshot_handler(state: State<WebState>) -> FutureResponse<HttpResponse, HostError> {
    state.controller.send(GetSnapshot)
        .map_err(|error| HostError::ControllerUnavailable { cause: error.into() })
        .and_then(|snapshot| Ok(HttpResponse::Ok().json(snapshot)))
        .responder()
}

fn reload_handler(state: State<WebState>) -> HttpResponse {
    state.controller.do_send(LoadAttendees { force_reload: true });
    HttpResponse::Accepted().finish()
}

fn filter_handler((state, query): (State<WebState>, Query<FilterQuery>)) -> HttpResponse {
    state.controller.do_send(SetCheckedInOnly(query.checked_in_only));
    state.controller.do_send(LoadAttendees { force_reload: false });
    HttpResponse::Accepted().finish()
}

fn page_size_handler((state, query): (State<WebState>, Query<PageSizeQuery>)) -> Result<HttpResponse, HostError> {
    let page_size = page_size(query.size)?;
    state.controller.do_send(SetPageSize(page_size));
    state.controller.do_send(LoadAttendees { force_reload: false });
    Ok(HttpResponse::Accepted().finish())
}

/// Marks an attendee of the current list as (not) checked in and lets the
/// controller republish it through its change listener.
///
/// The change only lives in the controller list: the next forced reload
/// replaces it with what the API returns, and a non forced full load may
/// still serve the list cached before the check in.
fn check_in(snapshot: &StateSnapshot, id: u64, checked_in: bool, changes: &ChangeNotifier<Attendee>) -> Result<Attendee, HostError> {
    let attendee = snapshot.attendees.iter()
        .find(|attendee| attendee.id == id)
        .ok_or(HostError::AttendeeNotFound { id })?;
    let updated = Attendee { is_checked_in: checked_in, ..attendee.clone() };
    if !changes.notify(ModelChange::new(ChangeAction::Update, updated.clone())) {
        warn!("Nobody listens to attendee changes, check in of {} not propagated", id);
    }
    Ok(updated)
}

fn check_in_handler((state, id, query): (State<WebState>, Path<u64>, Query<CheckInQuery>)) -> FutureResponse<HttpResponse, HostError> {
    let id = id.into_inner();
    let checked_in = query.checked_in;
    let changes = state.changes.clone();
    state.controller.send(GetSnapshot)
        .map_err(|error| HostError::ControllerUnavailable { cause: error.into() })
        .and_then(move |snapshot| check_in(&snapshot, id, checked_in, &changes))
        .map(|updated| HttpResponse::Ok().json(updated))
        .responder()
}

fn log_signals(addr: &Addr<AttendeesController>) {
    addr.do_send(Subscribe::Progress(Box::new(|loading: &bool| {
        if *loading { debug!("Loading attendees") } else { debug!("Attendees loaded") }
    })));
    addr.do_send(Subscribe::Error(Box::new(|error: &String| warn!("Attendees error : {}", error))));
    addr.do_send(Subscribe::ShowScanButton(Box::new(|visible: &bool| info!("Scan button visible : {}", visible))));
    addr.do_send(Subscribe::Attendee(Box::new(|attendee: &Attendee| debug!("Attendee {} : {}", attendee.id, attendee.full_name()))));
}

fn main() {
    env_logger::init();
    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!("Invalid configuration : {}", error);
            process::exit(1);
        }
    };

    info!("Starting attendees host for event {} ! ", config.event_id);
    let system = System::new("attendees");

    let preferences = MemoryPreferences::new();
    preferences.set_long(SELECTED_EVENT, config.event_id as i64);
    preferences.set_boolean(ATTENDEES_CHECKED_IN_ONLY, config.checked_in_only);
    let repository = CachingRepository::new(EventyayRepository::new(&config.api_url, config.token.clone()));
    let changes: ChangeNotifier<Attendee> = ChangeNotifier::new();

    let addr = AttendeesController::new(Arc::new(repository), Box::new(changes.clone()), Arc::new(preferences))
        .with_page_size(config.page_size)
        .with_fetch_workers(config.fetch_workers)
        .start();
    log_signals(&addr);
    Arbiter::spawn(refresh_loop::refresh_interval(config.refresh_interval, addr.clone()));

    let addr_cloned = addr.clone();
    let server = HttpServer::new(move ||
        App::with_state(WebState { controller: addr_cloned.clone(), changes: changes.clone() })
            .resource("/attendees", |r| r.method(Method::GET).with(snapshot_handler))
            .resource("/attendees/reload", |r| r.method(Method::POST).with(reload_handler))
            .resource("/attendees/filter", |r| r.method(Method::POST).with(filter_handler))
            .resource("/attendees/page-size", |r| r.method(Method::POST).with(page_size_handler))
            .resource("/attendees/{id}/check-in", |r| r.method(Method::POST).with(check_in_handler)))
        .bind(config.bind_address.as_str());

    match server {
        Ok(server) => {
            info!("Listening on {}", config.bind_address);
            server.start();
        }
        Err(error) => {
            error!("Unable to bind {} : {}", config.bind_address, error);
            process::exit(1);
        }
    }

    system.run();
}
