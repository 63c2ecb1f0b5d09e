//! Converters between live panels and persisted data
//!
//! The list never knows how to rebuild a panel. When writing a map it asks an
//! `ItemConverter` to describe every live panel, when reading it hands the
//! description back and receives a panel (or nothing, leaving a placeholder).

use std::rc::Rc;

use indexmap::IndexMap;

use crate::map::{PlaceholderMap, Value};
use crate::panel::PlaceholderListItem;
use crate::placeholder::Placeholder;
use crate::strategy::PlaceholderStrategy;

/// Persistable description of one live panel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConvertedItem {
    data: IndexMap<String, Value>,
    placeholder: Option<Placeholder>,
    child_map: Option<PlaceholderMap>,
}

impl ConvertedItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, Value::String(value.into()));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, Value::Int(value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Keys of the stored data, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Placeholder written alongside the item's own placeholders
    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    pub fn set_placeholder(&mut self, placeholder: Option<Placeholder>) {
        self.placeholder = placeholder;
    }

    /// Layout of the panel's children, used if the item has none stored
    pub fn child_map(&self) -> Option<&PlaceholderMap> {
        self.child_map.as_ref()
    }

    pub fn set_child_map(&mut self, child_map: Option<PlaceholderMap>) {
        self.child_map = child_map;
    }
}

/// Translates panels to persisted data and back
pub trait ItemConverter<D> {
    /// Describe the `index`'th live panel, `None` to persist nothing for it
    fn describe(&mut self, index: usize, panel: &D) -> Option<ConvertedItem>;

    /// Rebuild a panel, `None` leaves only the placeholders of the record
    fn reconstruct(&mut self, item: &ConvertedItem) -> Option<D>;

    /// Called once for every panel `reconstruct` returned, after reading
    fn on_reconstructed(&mut self, _panel: &D) {}
}

/// Converter that only persists the strategy's placeholders
///
/// Live panels are written as their canonical placeholder (plus the layout of
/// their children if they are containers); reading never rebuilds a panel.
pub struct StrategyConverter {
    strategy: Option<Rc<dyn PlaceholderStrategy>>,
}

impl StrategyConverter {
    pub fn new(strategy: Option<Rc<dyn PlaceholderStrategy>>) -> Self {
        Self { strategy }
    }
}

impl<D: PlaceholderListItem> ItemConverter<D> for StrategyConverter {
    fn describe(&mut self, _index: usize, panel: &D) -> Option<ConvertedItem> {
        let strategy = self.strategy.as_ref()?;
        let panel = panel.as_panel();
        let placeholder = strategy.placeholder_for(panel)?;

        let mut item = ConvertedItem::new();
        item.put_string("placeholder", placeholder.as_str());
        item.set_placeholder(Some(placeholder));
        item.set_child_map(panel.as_container().map(|c| c.placeholders()));
        Some(item)
    }

    fn reconstruct(&mut self, _item: &ConvertedItem) -> Option<D> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_item_keeps_insertion_order() {
        let mut item = ConvertedItem::new();
        item.put_string("zeta", "z");
        item.put_int("alpha", 1);
        item.put("mid", true);

        assert_eq!(item.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(item.get_string("zeta"), Some("z"));
        assert_eq!(item.get_int("alpha"), Some(1));
        assert_eq!(item.get_int("zeta"), None);
    }

    #[test]
    fn test_placeholder_and_child_map() {
        let mut item = ConvertedItem::new();
        assert!(item.placeholder().is_none());

        item.set_placeholder(Some(Placeholder::new("slot/A")));
        item.set_child_map(Some(PlaceholderMap::new("nested", 0)));

        assert_eq!(item.placeholder(), Some(&Placeholder::new("slot/A")));
        assert_eq!(item.child_map().map(PlaceholderMap::format), Some("nested"));
    }
}
