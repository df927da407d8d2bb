use std::collections::HashMap;
use std::sync::RwLock;

/// Event whose attendees are listed, negative when none is selected.
pub const SELECTED_EVENT: &'static str = "selected_event";
pub const ATTENDEES_CHECKED_IN_ONLY: &'static str = "attendees_checked_in_only";

pub trait Preferences: Send + Sync {
    fn get_long(&self, key: &str, default: i64) -> i64;

    fn set_long(&self, key: &str, value: i64);

    fn get_boolean(&self, key: &str, default: bool) -> bool;

    fn set_boolean(&self, key: &str, value: bool);
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Long(i64),
    Boolean(bool)
}

#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, Value>>
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().ok().and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) {
        match self.values.write() {
            Ok(mut values) => { values.insert(key.to_owned(), value); }
            Err(_) => warn!("Preferences lock poisoned, {} not stored", key)
        }
    }
}

impl Preferences for MemoryPreferences {
    fn get_long(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(Value::Long(value)) => value,
            _ => default
        }
    }

    fn set_long(&self, key: &str, value: i64) {
        self.set(key, Value::Long(value))
    }

    fn get_boolean(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Boolean(value)) => value,
            _ => default
        }
    }

    fn set_boolean(&self, key: &str, value: bool) {
        self.set(key, Value::Boolean(value))
    }
}
