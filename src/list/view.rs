//! Views on the chains of a placeholder list
//!
//! A view presents one chain as an indexable, mutable sequence. All views
//! write through to the same entries, so a panel pushed through `panels()`
//! shows up in `items()` right away. Sizes are cached per chain by the list.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use crate::error::ListError;
use crate::list::item::{Item, MetaMap};
use crate::list::{Level, PlaceholderList};
use crate::panel::PlaceholderListItem;
use crate::placeholder::Placeholder;

mod sealed {
    pub trait Sealed {}
}

/// What a view shows of each entry and which chain it walks
pub trait ViewKind<D>: sealed::Sealed {
    type Element: PartialEq;

    const LEVEL: Level;

    /// Build the item stored for a new element
    fn wrap(element: Self::Element) -> Result<Item<D>, ListError>;

    fn element(item: &Item<D>) -> Option<&Self::Element>;

    /// Runs after an element was inserted or set at `key`
    #[doc(hidden)]
    fn after_store(_list: &mut PlaceholderList<D>, _key: usize) {}
}

/// Every entry, as its item
#[derive(Debug)]
pub enum Items {}

/// Entries with a live panel, as the panel
#[derive(Debug)]
pub enum Panels {}

/// Entries without a panel, as their placeholder set
#[derive(Debug)]
pub enum PurePlaceholders {}

/// Every entry, as its placeholder set
///
/// Panels without placeholders show up as an empty set. Storing a set
/// through this view stores a pure placeholder item.
#[derive(Debug)]
pub enum AllPlaceholders {}

impl sealed::Sealed for Items {}
impl sealed::Sealed for Panels {}
impl sealed::Sealed for PurePlaceholders {}
impl sealed::Sealed for AllPlaceholders {}

impl<D: PlaceholderListItem> ViewKind<D> for Items {
    type Element = Item<D>;
    const LEVEL: Level = Level::Base;

    fn wrap(item: Item<D>) -> Result<Item<D>, ListError> {
        if item.is_valid() {
            Ok(item)
        } else {
            Err(ListError::EmptyPlaceholderItem)
        }
    }

    fn element(item: &Item<D>) -> Option<&Item<D>> {
        Some(item)
    }
}

impl<D: PlaceholderListItem> ViewKind<D> for Panels {
    type Element = D;
    const LEVEL: Level = Level::Panel;

    fn wrap(value: D) -> Result<Item<D>, ListError> {
        Ok(Item::panel(value))
    }

    fn element(item: &Item<D>) -> Option<&D> {
        item.value()
    }

    /// A panel that is back needs no placeholder of its own anywhere
    fn after_store(list: &mut PlaceholderList<D>, key: usize) {
        let placeholder = list
            .item(key)
            .and_then(Item::value)
            .and_then(|value| list.placeholder_for(value));
        if let Some(placeholder) = placeholder {
            list.prune(&BTreeSet::from([placeholder]), None);
        }
    }
}

impl<D: PlaceholderListItem> ViewKind<D> for PurePlaceholders {
    type Element = BTreeSet<Placeholder>;
    const LEVEL: Level = Level::Placeholder;

    fn wrap(placeholders: BTreeSet<Placeholder>) -> Result<Item<D>, ListError> {
        Item::placeholder(placeholders)
    }

    fn element(item: &Item<D>) -> Option<&BTreeSet<Placeholder>> {
        Some(item.placeholders())
    }
}

impl<D: PlaceholderListItem> ViewKind<D> for AllPlaceholders {
    type Element = BTreeSet<Placeholder>;
    const LEVEL: Level = Level::Base;

    fn wrap(placeholders: BTreeSet<Placeholder>) -> Result<Item<D>, ListError> {
        Item::placeholder(placeholders)
    }

    fn element(item: &Item<D>) -> Option<&BTreeSet<Placeholder>> {
        Some(item.placeholders())
    }
}

/// Mutable view on one chain of a `PlaceholderList`
pub struct View<'a, D, K> {
    list: &'a mut PlaceholderList<D>,
    kind: PhantomData<K>,
}

impl<'a, D: PlaceholderListItem, K: ViewKind<D>> View<'a, D, K> {
    pub(crate) fn new(list: &'a mut PlaceholderList<D>) -> Self {
        list.apply_invalidations();
        Self {
            list,
            kind: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.list.level_len(K::LEVEL)
    }

    pub fn is_empty(&self) -> bool {
        self.list.head(K::LEVEL).is_none()
    }

    fn out_of_bounds(&self, index: usize) -> ListError {
        ListError::IndexOutOfBounds {
            index,
            len: self.len(),
            level: K::LEVEL,
        }
    }

    fn key_at(&self, index: usize) -> Result<usize, ListError> {
        self.list
            .entry_at(index, K::LEVEL)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn get(&self, index: usize) -> Result<&K::Element, ListError> {
        let key = self.key_at(index)?;
        self.list
            .item(key)
            .and_then(K::element)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    /// Append after the last entry of the whole list
    pub fn push(&mut self, element: K::Element) -> Result<(), ListError> {
        let len = self.len();
        self.insert(len, element)
    }

    /// Insert so that `element` ends up at `index` of this view
    ///
    /// The new entry goes right behind the entry at `index - 1` of this view
    /// (or at the very front), inserting at `len()` appends to the whole list.
    pub fn insert(&mut self, index: usize, element: K::Element) -> Result<(), ListError> {
        let len = self.len();
        let predecessor = if index == len {
            self.list.tail()
        } else if index < len {
            let key = self.key_at(index)?;
            self.list.previous(key, K::LEVEL)
        } else {
            return Err(self.out_of_bounds(index));
        };

        let item = K::wrap(element)?;
        let key = self.list.insert_after(predecessor, item);
        self.store(key);
        Ok(())
    }

    /// Replace the element at `index`, returns the item that was there
    pub fn set(&mut self, index: usize, element: K::Element) -> Result<Item<D>, ListError> {
        let key = self.key_at(index)?;
        let item = K::wrap(element)?;
        let old = self
            .list
            .replace_item(key, item)
            .ok_or_else(|| self.out_of_bounds(index))?;
        self.store(key);
        Ok(old)
    }

    /// Keep placeholders unique after `key` got a new item
    fn store(&mut self, key: usize) {
        let placeholders = self
            .list
            .item(key)
            .map(|item| item.placeholders().clone())
            .unwrap_or_default();
        self.list.prune(&placeholders, Some(key));
        K::after_store(self.list, key);
    }

    /// Remove the entry at `index`, returns its item
    pub fn remove(&mut self, index: usize) -> Result<Item<D>, ListError> {
        let key = self.key_at(index)?;
        self.list
            .unlink(key)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    /// Remove the first entry showing `element`, returns where it was
    pub fn remove_element(&mut self, element: &K::Element) -> Option<usize> {
        let index = self.index_of(element)?;
        self.remove(index).ok().map(|_| index)
    }

    pub fn index_of(&self, element: &K::Element) -> Option<usize> {
        self.iter().position(|e| e == element)
    }

    /// Move the element at `source` so that it ends up at `destination`
    pub fn move_to(&mut self, source: usize, destination: usize) -> Result<(), ListError> {
        let key = self.key_at(source)?;
        if destination >= self.len() {
            return Err(self.out_of_bounds(destination));
        }
        let delta = destination as isize - source as isize;
        self.list.move_entry(key, delta, K::LEVEL)
    }

    /// Add `placeholder` to the entry at `index`, removing it everywhere else
    pub fn insert_placeholder(&mut self, index: usize, placeholder: Placeholder) -> Result<(), ListError> {
        let key = self.key_at(index)?;
        if !self.list.item(key).is_some_and(|i| i.has_placeholder(&placeholder)) {
            self.list.claim(key, BTreeSet::from([placeholder]));
        }
        Ok(())
    }

    pub fn metadata(&self, index: usize) -> Result<&MetaMap, ListError> {
        let key = self.key_at(index)?;
        self.list
            .item(key)
            .map(Item::metadata)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn metadata_mut(&mut self, index: usize) -> Result<&mut MetaMap, ListError> {
        let key = self.key_at(index)?;
        let len = self.len();
        self.list
            .item_mut(key)
            .map(Item::metadata_mut)
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len,
                level: K::LEVEL,
            })
    }

    /// Remove every entry whose element `keep` rejects
    pub fn retain(&mut self, mut keep: impl FnMut(&K::Element) -> bool) {
        let keys: Vec<usize> = self.list.keys(K::LEVEL).collect();
        for key in keys {
            let rejected = self
                .list
                .item(key)
                .and_then(K::element)
                .is_some_and(|e| !keep(e));
            if rejected {
                self.list.unlink(key);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &K::Element> + '_ {
        self.list.iter(K::LEVEL).filter_map(K::element)
    }
}
