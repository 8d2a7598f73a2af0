//! Ordered instrument metadata snapshots.
//!
//! A snapshot is a small string-keyed map captured by running a fixed,
//! explicitly ordered list of read operations against a device. Insertion
//! order is preserved so that two snapshots taken at different times diff
//! line-for-line.

use serde::Serialize;

/// Insertion-ordered string-to-string map.
///
/// Rebuilt fresh on every snapshot call; never cached across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair, replacing the value in place if the key is
    /// already present (original position is kept).
    pub fn insert(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a MetadataMap {
    type Item = (&'a str, &'a str);
    type IntoIter = std::vec::IntoIter<(&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut map = MetadataMap::new();
        map.insert("LASERID", "LASER-A");
        map.insert("LASERCUR", "1.500");
        map.insert("PIEZOWAV", "SIN");

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["LASERID", "LASERCUR", "PIEZOWAV"]);
    }

    #[test]
    fn reinsert_updates_in_place() {
        let mut map = MetadataMap::new();
        map.insert("LASERCUR", "1.500");
        map.insert("LASERTEM", "24.8");
        map.insert("LASERCUR", "2.000");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("LASERCUR"), Some("2.000"));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["LASERCUR", "LASERTEM"]);
    }

    #[test]
    fn missing_key_is_none() {
        assert_eq!(MetadataMap::new().get("LASERID"), None);
    }
}
