//! Element Attributes
//!
//! Ordered attribute map: insertion order is the serialization order.

use std::collections::HashMap;

/// Ordered attribute collection
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
    by_name: HashMap<String, usize>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .and_then(|&i| self.entries.get(i))
            .map(|(_, v)| v.as_str())
    }

    /// Check if attribute exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Set attribute, keeping its position if it already exists.
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some(&index) = self.by_name.get(&name) {
            Some(std::mem::replace(&mut self.entries[index].1, value))
        } else {
            self.by_name.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
            None
        }
    }

    /// Remove attribute by name
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.by_name.remove(name)?;
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.entries.remove(index).1)
    }

    /// Attribute names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over (name, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for AttributeMap {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}
