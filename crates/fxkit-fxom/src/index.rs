//! Document-wide fx:id index
//!
//! Maps identifiers of attached objects to their ids. Updated by the same
//! document primitive that attaches or detaches the object.

use std::collections::HashMap;

use crate::{FxomError, FxomResult, ObjectId};

/// fx:id index
#[derive(Debug, Clone, Default)]
pub struct FxIdIndex {
    ids: HashMap<String, ObjectId>,
}

impl FxIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ObjectId> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ids.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Register an identifier; fails without overwriting when it is taken
    pub(crate) fn insert(&mut self, id: &str, object: ObjectId) -> FxomResult<()> {
        match self.ids.get(id) {
            Some(existing) if *existing != object => Err(FxomError::DuplicateId { id: id.to_string() }),
            Some(_) => Ok(()),
            None => {
                self.ids.insert(id.to_string(), object);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &str, object: ObjectId) {
        if self.ids.get(id) == Some(&object) {
            self.ids.remove(id);
        }
    }

    /// Lowest `<base><n>` (n >= 1) not yet taken, or `base` itself when free
    pub fn unique_name(&self, base: &str, reserved: &[String]) -> String {
        let taken = |name: &str| self.contains(name) || reserved.iter().any(|r| r == name);
        if !taken(base) {
            return base.to_string();
        }
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        let stem = if stem.is_empty() { base } else { stem };
        (1..)
            .map(|n| format!("{stem}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_collision() {
        let mut index = FxIdIndex::new();
        index.insert("ok", ObjectId(1)).unwrap();
        index.insert("ok", ObjectId(1)).unwrap();
        assert!(matches!(
            index.insert("ok", ObjectId(2)),
            Err(FxomError::DuplicateId { .. })
        ));
        assert_eq!(index.get("ok"), Some(ObjectId(1)));
    }

    #[test]
    fn test_remove_only_own_entry() {
        let mut index = FxIdIndex::new();
        index.insert("a", ObjectId(1)).unwrap();
        index.remove("a", ObjectId(2));
        assert!(index.contains("a"));
        index.remove("a", ObjectId(1));
        assert!(index.is_empty());
    }

    #[test]
    fn test_unique_name() {
        let mut index = FxIdIndex::new();
        index.insert("button", ObjectId(0)).unwrap();
        index.insert("button1", ObjectId(1)).unwrap();
        assert_eq!(index.unique_name("label", &[]), "label");
        assert_eq!(index.unique_name("button", &[]), "button2");
        assert_eq!(index.unique_name("button1", &["button2".into()]), "button3");
    }
}
