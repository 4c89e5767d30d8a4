//! Persisted entity properties
//!
//! Every entity carries a flat, ordered list of `(name, text)` pairs. Most
//! names belong to other systems; component arguments, the component manifest
//! and union kind tags are multiplexed into the same list by naming
//! convention.

use indexmap::IndexMap;

/// Ordered property list with unique names
///
/// Insertion order is preserved; overwriting a property keeps its position.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    properties: IndexMap<String, String>,
}

impl PropertyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Whether a property exists
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Insert a property or overwrite its value in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.properties.shift_remove(name)
    }

    /// Keep only properties matching the predicate, returning how many were removed
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) -> usize {
        let before = self.properties.len();
        self.properties.retain(|name, value| keep(name, value));
        before - self.properties.len()
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Property names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// Order is part of the persisted layout, so two stores are only equal when
// their pairs match position by position.
impl PartialEq for PropertyStore {
    fn eq(&self, other: &Self) -> bool {
        self.properties.iter().eq(other.properties.iter())
    }
}

impl Eq for PropertyStore {}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for PropertyStore {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (name, value) in iter {
            store.set(name, value);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut store: PropertyStore = [("a", "1"), ("b", "2")].into_iter().collect();
        store.set("a", "3");
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.get("a"), Some("3"));
    }

    #[test]
    fn test_remove_keeps_order_of_the_rest() {
        let mut store: PropertyStore = [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")].into_iter().collect();
        assert_eq!(store.remove("b"), Some("2".to_string()));
        assert_eq!(store.remove("b"), None);
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![("a", "1"), ("c", "3"), ("d", "4")]);

        store.set("b", "5");
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_retain() {
        let mut store: PropertyStore = [("a", "1"), ("b", "2"), ("ab", "3")].into_iter().collect();
        assert_eq!(store.retain(|name, _| !name.starts_with('a')), 2);
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![("b", "2")]);
    }

    #[test]
    fn test_equality_is_ordered() {
        let ab: PropertyStore = [("a", "1"), ("b", "2")].into_iter().collect();
        let ba: PropertyStore = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }
}
