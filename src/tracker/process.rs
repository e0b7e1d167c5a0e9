//! Process records and the ordered set that holds them.

use serde::{Deserialize, Serialize};

/// One named in-flight activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process name (unique within a set)
    pub name: String,
    /// Unmatched `start` calls
    pub count: u32,
    /// Latest non-empty status message
    pub message: Option<String>,
}

impl ProcessRecord {
    /// Create a record that has not been started yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            message: None,
        }
    }
}

/// Running processes keyed by name, kept in first-start order.
///
/// Cloning yields an independent copy, which is what
/// [`ProcessTracker::get_processes`](super::ProcessTracker::get_processes) hands out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessSet {
    records: Vec<ProcessRecord>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ProcessRecord> {
        self.records.iter_mut().find(|r| r.name == name)
    }

    /// Get the record for `name`, appending a fresh one if absent
    pub fn entry(&mut self, name: &str) -> &mut ProcessRecord {
        let idx = match self.position(name) {
            Some(idx) => idx,
            None => {
                self.records.push(ProcessRecord::new(name));
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    pub fn remove(&mut self, name: &str) -> Option<ProcessRecord> {
        self.position(name).map(|idx| self.records.remove(idx))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    /// Non-empty messages in set order
    pub fn messages(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.message.as_ref())
            .filter(|m| !m.is_empty())
            .cloned()
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }
}

impl<'a> IntoIterator for &'a ProcessSet {
    type Item = &'a ProcessRecord;
    type IntoIter = std::slice::Iter<'a, ProcessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creates_once() {
        let mut set = ProcessSet::new();
        set.entry("upload").count += 1;
        set.entry("upload").count += 1;
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("upload").map(|r| r.count), Some(2));
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut set = ProcessSet::new();
        set.entry("b");
        set.entry("a");
        set.entry("c");
        set.remove("a");
        set.entry("a");
        assert_eq!(set.names(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_messages_skip_missing_and_empty() {
        let mut set = ProcessSet::new();
        set.entry("one").message = Some("Loading".to_string());
        set.entry("two");
        set.entry("three").message = Some(String::new());
        set.entry("four").message = Some("Saving".to_string());
        assert_eq!(set.messages(), vec!["Loading", "Saving"]);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut set = ProcessSet::new();
        set.entry("upload").count = 1;
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"name":"upload","count":1,"message":null}]"#);
    }
}
