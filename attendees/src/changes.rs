//! Notifications about attendees modified outside of a fetch.
use std::sync::{Arc, Mutex};
use actix::{Message, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Insert,
    Update,
    Delete
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelChange<T> {
    pub action: ChangeAction,
    pub model: T
}

impl<T> ModelChange<T> {
    pub fn new(action: ChangeAction, model: T) -> Self {
        ModelChange { action, model }
    }
}

impl<T: 'static> Message for ModelChange<T> {
    type Result = ();
}

pub trait DatabaseChangeListener<T>: Send where T: Send + 'static {
    fn start_listening(&mut self, notifier: Recipient<ModelChange<T>>);

    fn stop_listening(&mut self);
}

/// In memory listener: every clone shares the same listening recipient, so
/// a writer keeps one clone and hands another to the controller.
pub struct ChangeNotifier<T: Send + 'static> {
    recipient: Arc<Mutex<Option<Recipient<ModelChange<T>>>>>
}

impl<T: Send + 'static> Clone for ChangeNotifier<T> {
    fn clone(&self) -> Self {
        ChangeNotifier { recipient: self.recipient.clone() }
    }
}

impl<T: Send + 'static> ChangeNotifier<T> {
    pub fn new() -> Self {
        ChangeNotifier { recipient: Arc::new(Mutex::new(None)) }
    }

    /// Returns false when nobody listens.
    pub fn notify(&self, change: ModelChange<T>) -> bool {
        let recipient = match self.recipient.lock() {
            Ok(recipient) => recipient.clone(),
            Err(_) => None
        };
        match recipient {
            Some(recipient) => recipient.do_send(change).is_ok(),
            None => false
        }
    }

    pub fn is_listened(&self) -> bool {
        self.recipient.lock().map(|recipient| recipient.is_some()).unwrap_or(false)
    }
}

impl<T: Send + 'static> DatabaseChangeListener<T> for ChangeNotifier<T> {
    fn start_listening(&mut self, notifier: Recipient<ModelChange<T>>) {
        match self.recipient.lock() {
            Ok(mut recipient) => *recipient = Some(notifier),
            Err(_) => warn!("Change notifier lock poisoned, changes will not be delivered")
        }
    }

    fn stop_listening(&mut self) {
        if let Ok(mut recipient) = self.recipient.lock() {
            *recipient = None;
        }
    }
}
