use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Invocation-scoped key/value store shared by every handler of a chain.
///
/// Keys are strings and values may be of any `'static` type. Values are
/// retrieved by naming their concrete type; asking for a key under the wrong
/// type behaves as if the key were absent.
#[derive(Default)]
pub struct SharedState {
    values: HashMap<String, Box<dyn Any>>,
}

impl SharedState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Returns the value stored under `key`, first storing `default()` when the
    /// key is missing or holds a value of another type.
    pub fn get_or_insert_with<T: Any>(
        &mut self,
        key: impl Into<String>,
        default: impl FnOnce() -> T,
    ) -> &mut T {
        let slot = match self.values.entry(key.into()) {
            Entry::Occupied(entry) if entry.get().is::<T>() => entry.into_mut(),
            Entry::Occupied(mut entry) => {
                entry.insert(Box::new(default()));
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(Box::new(default())),
        };
        // Every arm leaves a `T` in the slot, so the downcast always succeeds.
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!(),
        }
    }

    /// Removes `key` and returns its value when it holds a `T`.
    ///
    /// A value of another type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key).is_some_and(|value| value.is::<T>()) {
            return None;
        }
        self.values
            .remove(key)
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SharedState").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get_typed() {
        let mut state = SharedState::new();
        state.insert("v", 3u32);
        state.insert("name", "flow".to_string());

        assert_eq!(state.get::<u32>("v"), Some(&3));
        assert_eq!(state.get::<String>("name").map(String::as_str), Some("flow"));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let mut state = SharedState::new();
        state.insert("v", 3u32);

        assert!(state.get::<i64>("v").is_none());
        assert!(state.contains_key("v"));
    }

    #[test]
    fn test_get_or_insert_with_counter() {
        let mut state = SharedState::new();
        for _ in 0..3 {
            *state.get_or_insert_with("v", || 0u32) += 1;
        }
        assert_eq!(state.get::<u32>("v"), Some(&3));
    }

    #[test]
    fn test_get_or_insert_with_replaces_mismatched_type() {
        let mut state = SharedState::new();
        state.insert("v", "not a number");

        *state.get_or_insert_with("v", || 10i64) += 1;
        assert_eq!(state.get::<i64>("v"), Some(&11));
    }

    #[test]
    fn test_remove_only_matching_type() {
        let mut state = SharedState::new();
        state.insert("v", 1u8);

        assert_eq!(state.remove::<u16>("v"), None);
        assert!(state.contains_key("v"));
        assert_eq!(state.remove::<u8>("v"), Some(1));
        assert!(state.is_empty());
    }

    #[test]
    fn test_debug_lists_sorted_keys() {
        let mut state = SharedState::new();
        state.insert("b", 1);
        state.insert("a", 2);
        assert_eq!(format!("{:?}", state), r#"SharedState { keys: ["a", "b"] }"#);
    }
}
