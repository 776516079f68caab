//! Dirty tracking for partial updates.
//!
//! [`DirtyFields`] records which fields of an entity changed since it was
//! loaded or last saved. Only those fields (plus any required ones) are
//! sent when the entity is saved.
//!
//! # Example
//!
//! ```rust
//! use moysklad_api::rest::DirtyFields;
//!
//! let mut dirty = DirtyFields::new();
//! dirty.mark("name");
//! dirty.mark("name");
//! dirty.mark("code");
//!
//! assert_eq!(dirty.iter().collect::<Vec<_>>(), vec!["name", "code"]);
//!
//! dirty.clear();
//! assert!(dirty.is_empty());
//! ```

/// An insertion-ordered set of changed field names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyFields {
    names: Vec<String>,
}

impl DirtyFields {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Records `name` as changed. Marking a field twice records it once.
    pub fn mark(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
    }

    /// Returns `true` if `name` has been marked.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns `true` if nothing has changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Iterates changed field names in the order they were first marked.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Forgets every change, typically after a successful save.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}
