//! Placeholder list - the children of a docking container
//!
//! The list is an ordered sequence of items. Some items show a live panel,
//! others only remember where a panel used to be (its placeholders), so that
//! a panel that comes back can be put at its old position and a layout can be
//! stored while parts of it are missing.
//!
//! ## Architecture
//!
//! - `entry`: slab of entries threaded onto three chains (base, panel, placeholder)
//! - `item`: payload of one entry
//! - `view`: indexable, mutable views of one chain each
//! - `codec`: conversion to and from a `PlaceholderMap`
//!
//! A `PlaceholderStrategy` hands out the canonical placeholder of a panel and
//! reports placeholders that became invalid. Invalidations are queued and
//! applied at the start of the next mutating call; lookups treat queued keys
//! as already gone.
//!
//! The list is not thread-safe and not meant to be, it lives on the UI thread
//! of its container.

mod codec;
mod entry;
mod item;
mod view;

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use slab::Slab;

pub use codec::{FORMAT, VERSION};
pub use item::{Item, MetaMap};
pub use view::{AllPlaceholders, Items, Panels, PurePlaceholders, View, ViewKind};

use crate::config::ListConfig;
use crate::error::ListError;
use crate::panel::PlaceholderListItem;
use crate::placeholder::Placeholder;
use crate::strategy::{InvalidationInbox, PlaceholderStrategy, PlaceholderStrategyListener};
use crate::tracing::ListSnapshot;
use entry::Entry;

/// The chains of a placeholder list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Every entry
    Base,
    /// Entries showing a live panel
    Panel,
    /// Entries that are only placeholders
    Placeholder,
}

impl Level {
    fn slot(self) -> usize {
        match self {
            Level::Base => 0,
            Level::Panel => 1,
            Level::Placeholder => 2,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Base => "base",
            Level::Panel => "panel",
            Level::Placeholder => "placeholder",
        })
    }
}

/// An ordered list of panels and placeholders
pub struct PlaceholderList<D> {
    entries: Slab<Entry<D>>,
    head: Option<usize>,
    head_panel: Option<usize>,
    head_placeholder: Option<usize>,
    /// Cached chain lengths, indexed by `Level::slot`
    sizes: [Cell<Option<usize>>; 3],
    strategy: Option<Rc<dyn PlaceholderStrategy>>,
    inbox: Rc<InvalidationInbox>,
    bound: bool,
    config: ListConfig,
}

impl<D> Default for PlaceholderList<D> {
    fn default() -> Self {
        Self::with_config(ListConfig::default())
    }
}

impl<D> PlaceholderList<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ListConfig) -> Self {
        Self {
            entries: Slab::new(),
            head: None,
            head_panel: None,
            head_placeholder: None,
            sizes: Default::default(),
            strategy: None,
            inbox: Rc::new(InvalidationInbox::default()),
            bound: false,
            config,
        }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Number of entries, panels and placeholders alike
    ///
    /// Entries that only hold keys a pending strategy invalidation is about
    /// to remove still count until the next mutating call applies it.
    pub fn len(&self) -> usize {
        self.level_len(Level::Base)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate over the items of one chain
    ///
    /// Like [`len`](Self::len), this does not apply pending invalidations:
    /// items may still show keys that `has_placeholder` already reports as
    /// gone. Call [`apply_invalidations`](Self::apply_invalidations) first
    /// for a settled view.
    pub fn iter(&self, level: Level) -> Iter<'_, D> {
        Iter {
            list: self,
            next: self.head(level),
            level,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn strategy(&self) -> Option<&Rc<dyn PlaceholderStrategy>> {
        self.strategy.as_ref()
    }

    fn listener(&self) -> Rc<dyn PlaceholderStrategyListener> {
        self.inbox.clone()
    }

    /// Position in `level` of the `index`'th entry of the base chain
    ///
    /// `Ok(None)` if that entry is not part of `level`.
    pub fn base_to_level(&self, index: usize, level: Level) -> Result<Option<usize>, ListError> {
        let key = self
            .entry_at(index, Level::Base)
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: self.len(),
                level: Level::Base,
            })?;
        Ok(self.index_of_entry(key, level))
    }

    /// Position in the base chain of the `index`'th entry of `level`
    pub fn level_to_base(&self, index: usize, level: Level) -> Result<usize, ListError> {
        self.entry_at(index, level)
            .and_then(|key| self.index_of_entry(key, Level::Base))
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: self.level_len(level),
                level,
            })
    }

    fn item(&self, key: usize) -> Option<&Item<D>> {
        self.entries.get(key).map(|e| &e.item)
    }

    fn item_mut(&mut self, key: usize) -> Option<&mut Item<D>> {
        self.entries.get_mut(key).map(|e| &mut e.item)
    }

    /// Entry whose placeholder set contains `placeholder`
    fn search(&self, placeholder: &Placeholder) -> Option<usize> {
        if self.inbox.contains(placeholder) {
            return None;
        }
        self.keys(Level::Base)
            .find(|&key| self.item(key).is_some_and(|i| i.has_placeholder(placeholder)))
    }
}

impl<D: PlaceholderListItem> PlaceholderList<D> {
    /// All entries, as items
    pub fn items(&mut self) -> View<'_, D, Items> {
        View::new(self)
    }

    /// Entries showing a live panel
    pub fn panels(&mut self) -> View<'_, D, Panels> {
        View::new(self)
    }

    /// Entries without a panel, as their placeholder sets
    pub fn pure_placeholders(&mut self) -> View<'_, D, PurePlaceholders> {
        View::new(self)
    }

    /// All entries, as their placeholder sets
    pub fn all_placeholders(&mut self) -> View<'_, D, AllPlaceholders> {
        View::new(self)
    }

    /// Apply invalidations the strategy reported since the last mutation
    pub fn apply_invalidations(&mut self) {
        if self.inbox.is_empty() {
            return;
        }
        let invalid = self.inbox.take();
        tracing::debug!(
            "Applying {} invalidated placeholders",
            invalid.len()
        );
        self.prune(&invalid, None);
    }

    /// Remove every occurrence of `placeholders`
    ///
    /// Entries left with neither panel nor placeholders are deleted.
    pub fn remove_all(&mut self, placeholders: &BTreeSet<Placeholder>) {
        self.apply_invalidations();
        self.prune(placeholders, None);
    }

    /// Remove every occurrence of `placeholder`
    pub fn remove_all_of(&mut self, placeholder: &Placeholder) {
        self.remove_all(&BTreeSet::from([placeholder.clone()]));
    }

    /// Strip `placeholders` from every entry except `keep`
    pub(crate) fn prune(&mut self, placeholders: &BTreeSet<Placeholder>, keep: Option<usize>) {
        if placeholders.is_empty() {
            return;
        }
        let before = self.config.log_changes.then(|| ListSnapshot::from_list(self));
        let prune_child_maps = self.config.prune_child_maps;

        let keys: Vec<usize> = self.keys(Level::Base).collect();
        let mut deleted = 0;
        for key in keys {
            if Some(key) == keep {
                continue;
            }
            let Some(item) = self.item_mut(key) else {
                continue;
            };
            item.remove_all(placeholders, prune_child_maps);
            if !item.is_valid() {
                self.unlink(key);
                deleted += 1;
            }
        }

        if deleted > 0 {
            tracing::debug!("Pruning placeholders deleted {} entries", deleted);
        }
        if let Some(before) = before {
            if let Some(diff) = before.diff(&ListSnapshot::from_list(self)) {
                tracing::debug!(target: "placeholders", "prune: {}", diff);
            }
        }
    }

    /// Give `placeholders` to `owner`, taking them away from everyone else
    fn claim(&mut self, owner: usize, placeholders: BTreeSet<Placeholder>) {
        self.prune(&placeholders, Some(owner));
        if let Some(item) = self.item_mut(owner) {
            for placeholder in placeholders {
                item.add(placeholder);
            }
        }
    }

    /// Entry showing `value`
    fn search_value(&self, value: &D) -> Option<usize> {
        self.keys(Level::Panel)
            .find(|&key| self.item(key).and_then(Item::value) == Some(value))
    }

    fn placeholder_for(&self, value: &D) -> Option<Placeholder> {
        self.strategy
            .as_ref()
            .and_then(|s| s.placeholder_for(value.as_panel()))
    }

    /// Replace `value` by its placeholder
    ///
    /// If `value` is a container, the layout of its children is stored with
    /// the placeholder. Returns the placeholder, `None` if the strategy gives
    /// `value` none or `value` is not in this list.
    pub fn remove(&mut self, value: &D) -> Option<Placeholder> {
        self.apply_invalidations();
        let key = self.search_value(value)?;
        self.remove_panel(key)
    }

    /// Like `remove`, addressing the panel by its index in the panel view
    pub fn remove_at(&mut self, index: usize) -> Result<Option<Placeholder>, ListError> {
        self.apply_invalidations();
        let key = self
            .entry_at(index, Level::Panel)
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: self.level_len(Level::Panel),
                level: Level::Panel,
            })?;
        Ok(self.remove_panel(key))
    }

    fn remove_panel(&mut self, key: usize) -> Option<Placeholder> {
        let value = self.item(key).and_then(Item::value).cloned()?;
        let placeholder = self.placeholder_for(&value);

        match &placeholder {
            None => {
                if self.item(key).is_some_and(Item::has_placeholders) {
                    if let Some(item) = self.item_mut(key) {
                        item.set_value(None);
                    }
                    self.relink(key);
                } else {
                    self.unlink(key);
                }
            }
            Some(placeholder) => {
                self.claim(key, BTreeSet::from([placeholder.clone()]));
                let child_map = value.as_panel().as_container().map(|c| c.placeholders());
                let bound = self.bound;
                if let Some(item) = self.item_mut(key) {
                    item.set_value(None);
                    if child_map.is_some() {
                        if let Some(mut old) = item.set_child_map(child_map) {
                            if bound {
                                old.set_strategy(None);
                            }
                        }
                    }
                }
                self.attach_child_map(key);
                self.relink(key);
            }
        }

        tracing::debug!(
            "Removed panel '{}', placeholder: {:?}",
            value.as_panel().title(),
            placeholder.as_ref().map(Placeholder::as_str)
        );
        placeholder
    }

    /// Put `value` where `placeholder` is
    ///
    /// The entry holding `placeholder` gets a fresh item showing `value` that
    /// keeps the old placeholders and stored child layout. A stored layout is
    /// handed to `value` if it is a container. `placeholder` and the
    /// strategy's placeholder for `value` are then removed from the whole list.
    /// Returns the index of `value` in the panel view, `None` if
    /// `placeholder` is unknown.
    pub fn put(&mut self, placeholder: &Placeholder, value: D) -> Option<usize> {
        self.apply_invalidations();
        let key = self.search(placeholder)?;

        let old = self.item_mut(key)?;
        let placeholders = old.placeholders().clone();
        let child_map = old.set_child_map(None);
        let handle = value.clone();
        self.replace_item(key, Item::panel_with(value, placeholders, child_map));

        if let Some(container) = handle.as_panel().as_container() {
            let stored = self.item_mut(key).and_then(|item| item.set_child_map(None));
            if let Some(mut map) = stored {
                map.set_strategy(None);
                container.set_placeholders(map);
            }
        }

        let mut obsolete = BTreeSet::from([placeholder.clone()]);
        if let Some(other) = self.placeholder_for(&handle) {
            obsolete.insert(other);
        }
        self.prune(&obsolete, None);

        tracing::debug!(
            "Put panel '{}' at placeholder {}",
            handle.as_panel().title(),
            placeholder
        );
        self.index_of_entry(key, Level::Panel)
    }

    /// Add `placeholder` to the entry showing `value`, removing it elsewhere
    ///
    /// Returns `false` if `value` is not in this list.
    pub fn put_placeholder(&mut self, value: &D, placeholder: Placeholder) -> bool {
        self.apply_invalidations();
        let Some(key) = self.search_value(value) else {
            return false;
        };
        self.claim(key, BTreeSet::from([placeholder]));
        true
    }

    /// Index in the panel view a panel put at `placeholder` would get
    pub fn panel_index_for(&self, placeholder: &Placeholder) -> Option<usize> {
        let mut cursor = Some(self.search(placeholder)?);
        while let Some(key) = cursor {
            if self.item(key).is_some_and(|i| !i.is_placeholder()) {
                break;
            }
            cursor = self.previous(key, Level::Base);
        }
        match cursor {
            None => Some(0),
            Some(key) => self.index_of_entry(key, Level::Panel).map(|i| i + 1),
        }
    }

    pub fn has_placeholder(&self, placeholder: &Placeholder) -> bool {
        self.search(placeholder).is_some()
    }

    /// The panel stored where `placeholder` is, if any
    pub fn get_at(&self, placeholder: &Placeholder) -> Option<&D> {
        self.search(placeholder)
            .and_then(|key| self.item(key))
            .and_then(Item::value)
    }

    /// Metadata of the entry holding `placeholder`
    pub fn metadata_at(&self, placeholder: &Placeholder) -> Option<&MetaMap> {
        self.search(placeholder)
            .and_then(|key| self.item(key))
            .map(Item::metadata)
    }

    pub fn metadata_at_mut(&mut self, placeholder: &Placeholder) -> Option<&mut MetaMap> {
        self.apply_invalidations();
        let key = self.search(placeholder)?;
        self.item_mut(key).map(Item::metadata_mut)
    }

    /// Record the strategy's placeholder on every live panel
    ///
    /// Used before taking a snapshot so live panels leave a marker of their
    /// position too.
    pub fn insert_all_placeholders(&mut self) {
        self.apply_invalidations();
        if self.strategy.is_none() {
            return;
        }
        let keys: Vec<usize> = self.keys(Level::Panel).collect();
        for key in keys {
            let placeholder = self
                .item(key)
                .and_then(Item::value)
                .and_then(|value| self.placeholder_for(value));
            if let Some(placeholder) = placeholder {
                if !self.item(key).is_some_and(|i| i.has_placeholder(&placeholder)) {
                    self.claim(key, BTreeSet::from([placeholder]));
                }
            }
        }
    }

    /// Connect this list with its strategy
    ///
    /// Starts listening for invalidations, wires the strategy onto stored
    /// child layouts and drops every placeholder the strategy rejects.
    pub fn bind(&mut self) -> Result<(), ListError> {
        if self.bound {
            return Err(ListError::AlreadyBound);
        }
        self.bound = true;
        if let Some(strategy) = self.strategy.clone() {
            strategy.add_listener(self.listener());
            self.wire_child_maps();
            self.check_all_placeholders();
        }
        tracing::debug!("Bound placeholder list with {} entries", self.len());
        Ok(())
    }

    /// Disconnect this list from its strategy, no-op if not bound
    pub fn unbind(&mut self) {
        if !self.bound {
            return;
        }
        self.apply_invalidations();
        self.bound = false;
        if let Some(strategy) = self.strategy.clone() {
            strategy.remove_listener(&self.listener());
            for key in self.keys(Level::Base).collect::<Vec<_>>() {
                if let Some(map) = self.item_mut(key).and_then(Item::child_map_mut) {
                    map.set_strategy(None);
                }
            }
        }
        self.inbox.clear();
        tracing::debug!("Unbound placeholder list");
    }

    /// Exchange the strategy
    ///
    /// While bound the listener moves to the new strategy and all
    /// placeholders are checked against it.
    pub fn set_strategy(&mut self, strategy: Option<Rc<dyn PlaceholderStrategy>>) {
        if !self.bound {
            self.strategy = strategy;
            return;
        }

        self.apply_invalidations();
        let listener = self.listener();
        if let Some(old) = &self.strategy {
            old.remove_listener(&listener);
        }
        self.strategy = strategy;
        if let Some(new) = &self.strategy {
            new.add_listener(listener);
        }
        self.wire_child_maps();
        self.check_all_placeholders();
    }

    fn wire_child_maps(&mut self) {
        let strategy = self.strategy.clone();
        for key in self.keys(Level::Base).collect::<Vec<_>>() {
            if let Some(map) = self.item_mut(key).and_then(Item::child_map_mut) {
                map.set_strategy(strategy.clone());
            }
        }
    }

    /// Drop every placeholder the strategy rejects
    fn check_all_placeholders(&mut self) {
        let Some(strategy) = self.strategy.clone() else {
            return;
        };
        let mut dropped = 0;
        for key in self.keys(Level::Base).collect::<Vec<_>>() {
            let Some(item) = self.item_mut(key) else {
                continue;
            };
            dropped += item.retain_placeholders(|p| strategy.is_valid_placeholder(p));
            if !item.is_valid() {
                self.unlink(key);
            }
        }
        if dropped > 0 {
            tracing::debug!("Dropped {} invalid placeholders", dropped);
        }
    }
}

impl<D> Drop for PlaceholderList<D> {
    fn drop(&mut self) {
        if !self.bound {
            return;
        }
        if let Some(strategy) = &self.strategy {
            strategy.remove_listener(&self.listener());
        }
        self.inbox.clear();
    }
}

impl<D: PlaceholderListItem> fmt::Display for PlaceholderList<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.iter(Level::Base).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl<D: fmt::Debug> fmt::Debug for PlaceholderList<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderList")
            .field("items", &self.iter(Level::Base).collect::<Vec<_>>())
            .field("bound", &self.bound)
            .field("has_strategy", &self.strategy.is_some())
            .finish()
    }
}

/// Iterator over the items of one chain
pub struct Iter<'a, D> {
    list: &'a PlaceholderList<D>,
    next: Option<usize>,
    level: Level,
}

impl<'a, D> Iterator for Iter<'a, D> {
    type Item = &'a Item<D>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        self.next = self.list.next(key, self.level);
        self.list.item(key)
    }
}
