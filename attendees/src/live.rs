//! Last-value cached cells observed by any number of callbacks.
//!
//! Observers are notified in registration order. A newly attached observer
//! immediately receives the last published value, when there is one. Every
//! `set_value` is delivered, even when the value did not change.

/// Identifies one observer inside the `Observable` it was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) usize);

pub trait Observer<T>: Send {
    fn on_changed(&mut self, value: &T);
}

impl<T, F> Observer<T> for F where F: FnMut(&T) + Send {
    fn on_changed(&mut self, value: &T) {
        self(value)
    }
}

pub struct Observable<T> {
    value: Option<T>,
    next_id: usize,
    observers: Vec<(ObserverId, Box<dyn Observer<T>>)>
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Observable { value: None, next_id: 0, observers: Vec::new() }
    }
}

impl<T> Observable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, mut observer: Box<dyn Observer<T>>) -> ObserverId {
        if let Some(ref value) = self.value {
            observer.on_changed(value);
        }
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns false when `id` was not attached (or already removed).
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|&(observer_id, _)| observer_id != id);
        self.observers.len() != before
    }

    pub fn set_value(&mut self, value: T) {
        for &mut (_, ref mut observer) in self.observers.iter_mut() {
            observer.on_changed(&value);
        }
        self.value = Some(value);
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }
}
