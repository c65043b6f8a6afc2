//! Dependency references recorded by name lookup
//!
//! An incremental builder decides which units to recompile from these
//! sets; the binder only fills them.

use std::collections::BTreeSet;

/// Names a unit depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    qualified: BTreeSet<String>,
    simple: BTreeSet<String>,
    root: BTreeSet<String>,
}

impl ReferenceIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference written as dotted `segments`
    pub fn record<S: AsRef<str>>(&mut self, segments: &[S]) {
        let Some(first) = segments.first() else {
            return;
        };
        self.root.insert(first.as_ref().to_string());
        for segment in segments {
            self.simple.insert(segment.as_ref().to_string());
        }
        if segments.len() > 1 {
            let joined: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
            self.qualified.insert(joined.join("."));
        }
    }

    /// Record the qualified name a lookup resolved to
    pub fn record_qualified(&mut self, name: &str) {
        self.qualified.insert(name.to_string());
    }

    /// Qualified names
    pub fn qualified(&self) -> &BTreeSet<String> {
        &self.qualified
    }

    /// Simple names
    pub fn simple(&self) -> &BTreeSet<String> {
        &self.simple
    }

    /// First segments of every reference
    pub fn root(&self) -> &BTreeSet<String> {
        &self.root
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.qualified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_segments() {
        let mut index = ReferenceIndex::new();
        index.record(&["p", "q", "T"]);
        index.record(&["Local"]);
        assert!(index.qualified().contains("p.q.T"));
        assert!(!index.qualified().contains("Local"));
        assert!(index.simple().contains("q"));
        assert!(index.simple().contains("Local"));
        assert_eq!(index.root().len(), 2);
    }

    #[test]
    fn test_empty() {
        let mut index = ReferenceIndex::new();
        let none: [&str; 0] = [];
        index.record(&none);
        assert!(index.is_empty());
    }
}
