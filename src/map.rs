//! Persisted placeholder maps
//!
//! A `PlaceholderMap` is the storage format of a placeholder list: a format
//! tag, a version and an ordered list of records. Each record names the
//! placeholders of one entry and carries free-form attributes. Attribute
//! values may themselves be maps, which is how the layout of a nested
//! container travels along with its parent.
//!
//! The map derives `Serialize`/`Deserialize`, hosts decide where it ends up
//! (JSON state file, YAML, ...).

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::placeholder::Placeholder;
use crate::strategy::PlaceholderStrategy;

/// Attribute names used by the placeholder list codec
pub mod attr {
    /// Nested map of a child container
    pub const MAP: &str = "map";
    /// Flag: the record carries converter data
    pub const CONVERT: &str = "convert";
    /// Names of the converter data entries
    pub const CONVERT_KEYS: &str = "convert-keys";
    /// Prefix of a converter data entry
    pub const CONVERT_PREFIX: &str = "dock.";
    /// Flag: the record carries item metadata
    pub const ITEM: &str = "item";
    /// Names of the item metadata entries
    pub const ITEM_KEYS: &str = "item-keys";
    /// Prefix of an item metadata entry
    pub const ITEM_PREFIX: &str = "item.";
}

/// A value stored in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(PlaceholderMap),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PlaceholderMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// An array of strings, `None` if any element is not a string
    pub fn as_strings(&self) -> Option<Vec<String>> {
        match self {
            Value::Array(values) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// Build a string array value
    pub fn strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(strings.into_iter().map(|s| Value::String(s.into())).collect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<PlaceholderMap> for Value {
    fn from(map: PlaceholderMap) -> Self {
        Value::Map(map)
    }
}

/// One entry of a placeholder map
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<Placeholder>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
}

impl Record {
    pub fn new(placeholders: Vec<Placeholder>) -> Self {
        Self {
            placeholders,
            attributes: IndexMap::new(),
        }
    }

    /// Strip `placeholders`, returns whether the record should be dropped
    fn remove_all(&mut self, placeholders: &BTreeSet<Placeholder>, recursive: bool) -> bool {
        self.placeholders.retain(|p| !placeholders.contains(p));

        if recursive {
            self.attributes.retain(|_, value| match value {
                Value::Map(nested) => {
                    nested.remove_all(placeholders, true);
                    !nested.is_empty()
                }
                _ => true,
            });
        }

        self.placeholders.is_empty() && !self.attributes.contains_key(attr::CONVERT)
    }
}

/// Persisted layout of a placeholder list
#[derive(Clone, Serialize, Deserialize)]
pub struct PlaceholderMap {
    format: String,
    version: u32,
    #[serde(default)]
    records: Vec<Record>,
    /// Strategy keeping this map free of stale placeholders, not persisted
    #[serde(skip)]
    strategy: Option<Rc<dyn PlaceholderStrategy>>,
}

impl PlaceholderMap {
    pub fn new(format: impl Into<String>, version: u32) -> Self {
        Self {
            format: format.into(),
            version,
            records: Vec::new(),
            strategy: None,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record with `placeholders`, returns its index
    pub fn push_record(&mut self, placeholders: Vec<Placeholder>) -> usize {
        self.records.push(Record::new(placeholders));
        self.records.len() - 1
    }

    pub fn contains(&self, record: usize, attribute: &str) -> bool {
        self.get(record, attribute).is_some()
    }

    pub fn get(&self, record: usize, attribute: &str) -> Option<&Value> {
        self.records
            .get(record)
            .and_then(|r| r.attributes.get(attribute))
    }

    /// Set an attribute, ignored if `record` does not exist
    pub fn put(&mut self, record: usize, attribute: impl Into<String>, value: impl Into<Value>) {
        if let Some(r) = self.records.get_mut(record) {
            r.attributes.insert(attribute.into(), value.into());
        }
    }

    pub fn get_strings(&self, record: usize, attribute: &str) -> Option<Vec<String>> {
        self.get(record, attribute).and_then(Value::as_strings)
    }

    pub fn get_map(&self, record: usize, attribute: &str) -> Option<&PlaceholderMap> {
        self.get(record, attribute).and_then(Value::as_map)
    }

    pub fn get_bool(&self, record: usize, attribute: &str) -> Option<bool> {
        self.get(record, attribute).and_then(Value::as_bool)
    }

    /// Every placeholder named in this map, optionally including nested maps
    pub fn all_placeholders(&self, recursive: bool) -> BTreeSet<Placeholder> {
        let mut result = BTreeSet::new();
        self.collect_placeholders(recursive, &mut result);
        result
    }

    fn collect_placeholders(&self, recursive: bool, into: &mut BTreeSet<Placeholder>) {
        for record in &self.records {
            into.extend(record.placeholders.iter().cloned());
            if recursive {
                for value in record.attributes.values() {
                    if let Value::Map(nested) = value {
                        nested.collect_placeholders(true, into);
                    }
                }
            }
        }
    }

    /// Remove every occurrence of `placeholders`
    ///
    /// Records left without placeholders are dropped unless they carry
    /// converter data (a panel that can be rebuilt does not need a name).
    pub fn remove_all(&mut self, placeholders: &BTreeSet<Placeholder>, recursive: bool) {
        if placeholders.is_empty() {
            return;
        }
        self.records
            .retain_mut(|record| !record.remove_all(placeholders, recursive));
    }

    pub fn strategy(&self) -> Option<&Rc<dyn PlaceholderStrategy>> {
        self.strategy.as_ref()
    }

    /// Attach (or detach) the strategy guarding this map and its nested maps
    ///
    /// Attaching a strategy drops all placeholders it reports as invalid.
    pub fn set_strategy(&mut self, strategy: Option<Rc<dyn PlaceholderStrategy>>) {
        if let Some(strategy) = &strategy {
            let invalid: BTreeSet<Placeholder> = self
                .all_placeholders(true)
                .into_iter()
                .filter(|p| !strategy.is_valid_placeholder(p))
                .collect();
            if !invalid.is_empty() {
                tracing::debug!(
                    "Pruning {} invalid placeholders from nested map",
                    invalid.len()
                );
                self.remove_all(&invalid, true);
            }
        }

        for record in &mut self.records {
            for value in record.attributes.values_mut() {
                if let Value::Map(nested) = value {
                    nested.set_strategy(strategy.clone());
                }
            }
        }
        self.strategy = strategy;
    }
}

impl PartialEq for PlaceholderMap {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.version == other.version
            && self.records == other.records
    }
}

impl fmt::Debug for PlaceholderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderMap")
            .field("format", &self.format)
            .field("version", &self.version)
            .field("records", &self.records)
            .field("has_strategy", &self.strategy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> BTreeSet<Placeholder> {
        names.iter().map(|n| Placeholder::new(*n)).collect()
    }

    fn sample() -> PlaceholderMap {
        let mut map = PlaceholderMap::new("test", 1);
        let first = map.push_record(vec!["a".into(), "b".into()]);
        map.put(first, "title", "First");
        let second = map.push_record(vec!["c".into()]);
        map.put(second, attr::CONVERT, true);

        let mut nested = PlaceholderMap::new("nested", 0);
        nested.push_record(vec!["a".into()]);
        nested.push_record(vec!["d".into()]);
        map.put(second, attr::MAP, nested);
        map
    }

    #[test]
    fn test_attribute_access() {
        let map = sample();
        assert!(map.contains(0, "title"));
        assert!(!map.contains(0, "missing"));
        assert!(!map.contains(7, "title"));
        assert_eq!(map.get(0, "title").and_then(Value::as_str), Some("First"));
        assert_eq!(map.get_bool(1, attr::CONVERT), Some(true));
        assert_eq!(map.get_map(1, attr::MAP).map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_strings_require_every_element_to_be_a_string() {
        let good = Value::strings(["x", "y"]);
        assert_eq!(good.as_strings(), Some(vec!["x".to_string(), "y".to_string()]));

        let bad = Value::Array(vec![Value::from("x"), Value::Int(3)]);
        assert_eq!(bad.as_strings(), None);
    }

    #[test]
    fn test_all_placeholders_recursive() {
        let map = sample();
        assert_eq!(map.all_placeholders(false), keys(&["a", "b", "c"]));
        assert_eq!(map.all_placeholders(true), keys(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_remove_all_drops_empty_records_without_convert_data() {
        let mut map = sample();
        map.remove_all(&keys(&["a", "b", "c"]), false);

        // First record lost all keys, second keeps its converter data
        assert_eq!(map.len(), 1);
        assert!(map.records()[0].placeholders.is_empty());
        assert_eq!(map.get_map(0, attr::MAP).map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_remove_all_recursive_prunes_nested_maps() {
        let mut map = sample();
        map.remove_all(&keys(&["a", "d"]), true);

        assert_eq!(map.records()[0].placeholders, vec![Placeholder::new("b")]);
        // Nested map became empty and is dropped with its attribute
        assert!(!map.contains(1, attr::MAP));
    }

    #[test]
    fn test_json_roundtrip_ignores_strategy() {
        let map = sample();
        let json = serde_json::to_string(&map).unwrap();
        let loaded: PlaceholderMap = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, map);
        assert!(loaded.strategy().is_none());
    }
}
