//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use dock_placeholders::list::FORMAT;
use dock_placeholders::{
    Container, ConvertedItem, Item, ItemConverter, Level, Panel, Placeholder, PlaceholderList,
    PlaceholderListItem, PlaceholderMap, PlaceholderStrategy, PlaceholderStrategyListener,
    StrategyListeners,
};

/// A panel handle; tabs with children act as containers
#[derive(Debug, Clone)]
pub struct Tab {
    pub name: String,
    children: Option<Rc<Children>>,
}

impl Tab {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: None,
        }
    }

    /// A container tab currently showing `layout`
    pub fn container(name: &str, layout: PlaceholderMap) -> Self {
        Self {
            name: name.to_string(),
            children: Some(Rc::new(Children {
                layout: RefCell::new(layout),
            })),
        }
    }

    /// The layout last handed to this container
    pub fn layout(&self) -> Option<PlaceholderMap> {
        self.children.as_ref().map(|c| c.layout.borrow().clone())
    }
}

impl PartialEq for Tab {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Panel for Tab {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn as_container(&self) -> Option<&dyn Container> {
        self.children.as_deref().map(|c| c as &dyn Container)
    }
}

impl PlaceholderListItem for Tab {
    fn as_panel(&self) -> &dyn Panel {
        self
    }
}

#[derive(Debug)]
pub struct Children {
    layout: RefCell<PlaceholderMap>,
}

impl Container for Children {
    fn placeholders(&self) -> PlaceholderMap {
        self.layout.borrow().clone()
    }

    fn set_placeholders(&self, placeholders: PlaceholderMap) {
        *self.layout.borrow_mut() = placeholders;
    }
}

/// Gives every tab the placeholder `slot/<name>`
///
/// Placeholders can be invalidated at runtime, listeners are told right away.
#[derive(Default)]
pub struct SlotStrategy {
    invalid: RefCell<BTreeSet<Placeholder>>,
    listeners: StrategyListeners,
}

impl SlotStrategy {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn invalidate(&self, names: &[&str]) {
        let keys = keys(names);
        self.invalid.borrow_mut().extend(keys.iter().cloned());
        self.listeners.notify(&keys);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl PlaceholderStrategy for SlotStrategy {
    fn placeholder_for(&self, panel: &dyn Panel) -> Option<Placeholder> {
        Some(Placeholder::from_segments(["slot", panel.title().as_str()]))
    }

    fn is_valid_placeholder(&self, placeholder: &Placeholder) -> bool {
        !self.invalid.borrow().contains(placeholder)
    }

    fn add_listener(&self, listener: Rc<dyn PlaceholderStrategyListener>) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Rc<dyn PlaceholderStrategyListener>) {
        self.listeners.remove(listener);
    }
}

/// Persists tab names and rebuilds plain tabs from them
#[derive(Default)]
pub struct NameConverter {
    pub described: Vec<usize>,
    pub added: Vec<String>,
}

impl ItemConverter<Tab> for NameConverter {
    fn describe(&mut self, index: usize, panel: &Tab) -> Option<ConvertedItem> {
        self.described.push(index);
        let mut item = ConvertedItem::new();
        item.put_string("name", panel.name.clone());
        Some(item)
    }

    fn reconstruct(&mut self, item: &ConvertedItem) -> Option<Tab> {
        item.get_string("name").map(Tab::new)
    }

    fn on_reconstructed(&mut self, panel: &Tab) {
        self.added.push(panel.name.clone());
    }
}

pub fn key(name: &str) -> Placeholder {
    Placeholder::new(name)
}

pub fn keys(names: &[&str]) -> BTreeSet<Placeholder> {
    names.iter().map(|n| Placeholder::new(*n)).collect()
}

/// A list showing one tab per name
pub fn tabs(names: &[&str]) -> PlaceholderList<Tab> {
    let mut list = PlaceholderList::new();
    for name in names {
        list.panels().push(Tab::new(name)).unwrap();
    }
    list
}

/// Names of the live panels in order
pub fn panel_names(list: &PlaceholderList<Tab>) -> Vec<String> {
    list.iter(Level::Panel)
        .filter_map(Item::value)
        .map(|t| t.name.clone())
        .collect()
}

/// Placeholder sets of the pure placeholder entries in order
pub fn placeholder_sets(list: &PlaceholderList<Tab>) -> Vec<BTreeSet<Placeholder>> {
    list.iter(Level::Placeholder)
        .map(|item| item.placeholders().clone())
        .collect()
}

/// Every entry as either its panel name or its placeholders, in base order
pub fn describe(list: &PlaceholderList<Tab>) -> Vec<String> {
    list.iter(Level::Base)
        .map(|item| match item.value() {
            Some(tab) => tab.name.clone(),
            None => item
                .placeholders()
                .iter()
                .map(Placeholder::as_str)
                .collect::<Vec<_>>()
                .join("+"),
        })
        .collect()
}

/// Check the cross-chain invariants through the public API only
pub fn assert_invariants(list: &PlaceholderList<Tab>) {
    let base = list.iter(Level::Base).count();
    let panels = list.iter(Level::Panel).count();
    let placeholders = list.iter(Level::Placeholder).count();
    assert_eq!(base, panels + placeholders, "chains do not partition the list");
    assert_eq!(base, list.len());

    assert!(list.iter(Level::Panel).all(|i| !i.is_placeholder()));
    assert!(list.iter(Level::Placeholder).all(|i| i.is_placeholder()));
    assert!(list.iter(Level::Base).all(|i| i.is_valid()));

    let mut seen = BTreeSet::new();
    for item in list.iter(Level::Base) {
        for placeholder in item.placeholders() {
            assert!(seen.insert(placeholder.clone()), "{placeholder} claimed twice");
        }
    }
}

/// A nested layout naming `names`, as a child container would store it
pub fn child_layout(names: &[&str]) -> PlaceholderMap {
    let mut map = PlaceholderMap::new(FORMAT, 0);
    for name in names {
        map.push_record(vec![key(name)]);
    }
    map
}
