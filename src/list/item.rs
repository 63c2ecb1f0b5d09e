//! Items - the payload of one list entry
//!
//! An item is a live panel, a set of placeholders, or a panel that also
//! remembers placeholders. An item without panel and without placeholders is
//! invalid; the list deletes the entry of such an item in the same operation
//! that emptied it.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::ListError;
use crate::map::{PlaceholderMap, Value};
use crate::panel::PlaceholderListItem;
use crate::placeholder::Placeholder;

/// Free-form metadata persisted with an item
pub type MetaMap = IndexMap<String, Value>;

/// A single item of a placeholder list
#[derive(Debug, Clone)]
pub struct Item<D> {
    value: Option<D>,
    placeholders: BTreeSet<Placeholder>,
    /// Stored layout of the children, if the (former) panel is a container
    child_map: Option<PlaceholderMap>,
    metadata: MetaMap,
}

impl<D> Item<D> {
    /// An item showing `value`
    pub fn panel(value: D) -> Self {
        Self::panel_with(value, BTreeSet::new(), None)
    }

    /// An item showing `value` that also remembers `placeholders`
    pub fn panel_with(
        value: D,
        placeholders: BTreeSet<Placeholder>,
        child_map: Option<PlaceholderMap>,
    ) -> Self {
        Self {
            value: Some(value),
            placeholders,
            child_map,
            metadata: MetaMap::new(),
        }
    }

    /// A pure placeholder item, `placeholders` must not be empty
    pub fn placeholder(placeholders: BTreeSet<Placeholder>) -> Result<Self, ListError> {
        if placeholders.is_empty() {
            return Err(ListError::EmptyPlaceholderItem);
        }
        Ok(Self {
            value: None,
            placeholders,
            child_map: None,
            metadata: MetaMap::new(),
        })
    }

    /// A pure placeholder item with a single key
    pub fn placeholder_of(placeholder: Placeholder) -> Self {
        Self {
            value: None,
            placeholders: BTreeSet::from([placeholder]),
            child_map: None,
            metadata: MetaMap::new(),
        }
    }

    pub fn value(&self) -> Option<&D> {
        self.value.as_ref()
    }

    /// Whether this item has no live panel
    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }

    /// Whether this item may stay in a list
    pub fn is_valid(&self) -> bool {
        self.value.is_some() || !self.placeholders.is_empty()
    }

    pub fn placeholders(&self) -> &BTreeSet<Placeholder> {
        &self.placeholders
    }

    pub fn has_placeholders(&self) -> bool {
        !self.placeholders.is_empty()
    }

    pub fn has_placeholder(&self, placeholder: &Placeholder) -> bool {
        self.placeholders.contains(placeholder)
    }

    pub fn child_map(&self) -> Option<&PlaceholderMap> {
        self.child_map.as_ref()
    }

    pub fn metadata(&self) -> &MetaMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetaMap {
        &mut self.metadata
    }

    /// Builder-style metadata, handy when preparing items for a view
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a key; the list strips it from every other item first
    pub(crate) fn add(&mut self, placeholder: Placeholder) {
        self.placeholders.insert(placeholder);
    }

    /// Strip `placeholders` from this item and from the stored child layout
    pub(crate) fn remove_all(&mut self, placeholders: &BTreeSet<Placeholder>, prune_child_map: bool) {
        self.placeholders.retain(|p| !placeholders.contains(p));

        if prune_child_map {
            if let Some(map) = &mut self.child_map {
                map.remove_all(placeholders, true);
                if map.is_empty() {
                    self.child_map = None;
                }
            }
        }
    }

    /// Strip every placeholder `keep` rejects, returns how many were dropped
    pub(crate) fn retain_placeholders(&mut self, mut keep: impl FnMut(&Placeholder) -> bool) -> usize {
        let before = self.placeholders.len();
        self.placeholders.retain(|p| keep(p));
        before - self.placeholders.len()
    }

    /// Replace the panel; the owning list must relink the entry afterwards
    pub(crate) fn set_value(&mut self, value: Option<D>) -> Option<D> {
        std::mem::replace(&mut self.value, value)
    }

    pub(crate) fn child_map_mut(&mut self) -> Option<&mut PlaceholderMap> {
        self.child_map.as_mut()
    }

    pub(crate) fn set_child_map(&mut self, child_map: Option<PlaceholderMap>) -> Option<PlaceholderMap> {
        std::mem::replace(&mut self.child_map, child_map)
    }
}

/// Two items are equal if they show the same panel and remember the same
/// placeholders; metadata and stored child layouts are not compared
impl<D: PartialEq> PartialEq for Item<D> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.placeholders == other.placeholders
    }
}

impl<D: PlaceholderListItem> fmt::Display for Item<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(panel=")?;
        if let Some(value) = &self.value {
            write!(f, "{}", value.as_panel().title())?;
        }
        write!(f, ", placeholders={{")?;
        for (i, placeholder) in self.placeholders.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", placeholder)?;
        }
        write!(f, "}})")
    }
}
