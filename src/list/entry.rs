//! Entry chains
//!
//! Entries live in a slab and are threaded onto three doubly linked chains:
//! the base chain holds every entry, the panel chain the entries with a live
//! panel and the placeholder chain the rest. Each entry carries one link pair
//! for the base chain and one for whichever secondary chain it belongs to.
//! Positions are never stored, an index is the number of steps from a head.

use crate::error::ListError;
use crate::list::item::Item;
use crate::list::{Level, PlaceholderList};

pub(crate) struct Entry<D> {
    pub(crate) item: Item<D>,
    /// Which secondary chain this entry is currently linked into
    pub(crate) was_placeholder: bool,
    next: Option<usize>,
    previous: Option<usize>,
    next_level: Option<usize>,
    previous_level: Option<usize>,
}

impl<D> Entry<D> {
    fn new(item: Item<D>) -> Self {
        Self {
            was_placeholder: item.is_placeholder(),
            item,
            next: None,
            previous: None,
            next_level: None,
            previous_level: None,
        }
    }

    fn in_level(&self, level: Level) -> bool {
        match level {
            Level::Base => true,
            Level::Panel => !self.was_placeholder,
            Level::Placeholder => self.was_placeholder,
        }
    }
}

impl<D> PlaceholderList<D> {
    pub(crate) fn head(&self, level: Level) -> Option<usize> {
        match level {
            Level::Base => self.head,
            Level::Panel => self.head_panel,
            Level::Placeholder => self.head_placeholder,
        }
    }

    fn set_level_head(&mut self, placeholder: bool, key: Option<usize>) {
        if placeholder {
            self.head_placeholder = key;
        } else {
            self.head_panel = key;
        }
    }

    pub(crate) fn next(&self, key: usize, level: Level) -> Option<usize> {
        let entry = self.entries.get(key)?;
        match level {
            Level::Base => entry.next,
            _ if entry.in_level(level) => entry.next_level,
            _ => None,
        }
    }

    pub(crate) fn previous(&self, key: usize, level: Level) -> Option<usize> {
        let entry = self.entries.get(key)?;
        match level {
            Level::Base => entry.previous,
            _ if entry.in_level(level) => entry.previous_level,
            _ => None,
        }
    }

    /// Slab key of the `index`'th entry of `level`
    pub(crate) fn entry_at(&self, index: usize, level: Level) -> Option<usize> {
        let mut cursor = self.head(level);
        for _ in 0..index {
            cursor = self.next(cursor?, level);
        }
        cursor
    }

    /// Position of `key` in `level`, `None` if the entry is not part of it
    pub(crate) fn index_of_entry(&self, key: usize, level: Level) -> Option<usize> {
        let mut cursor = self.head(level);
        let mut index = 0;
        while let Some(current) = cursor {
            if current == key {
                return Some(index);
            }
            cursor = self.next(current, level);
            index += 1;
        }
        debug_assert!(
            self.entries.get(key).map_or(true, |e| !e.in_level(level)),
            "entry {key} missing from {level} chain"
        );
        None
    }

    pub(crate) fn tail(&self) -> Option<usize> {
        let mut cursor = self.head?;
        while let Some(next) = self.next(cursor, Level::Base) {
            cursor = next;
        }
        Some(cursor)
    }

    /// Number of entries in `level`, cached until the next structural change
    pub(crate) fn level_len(&self, level: Level) -> usize {
        let cache = &self.sizes[level.slot()];
        if let Some(len) = cache.get() {
            return len;
        }
        let mut len = 0;
        let mut cursor = self.head(level);
        while let Some(key) = cursor {
            len += 1;
            cursor = self.next(key, level);
        }
        cache.set(Some(len));
        len
    }

    pub(crate) fn invalidate(&self) {
        for size in &self.sizes {
            size.set(None);
        }
    }

    /// Create an entry for `item` right after `predecessor` (at the head if `None`)
    pub(crate) fn insert_after(&mut self, predecessor: Option<usize>, item: Item<D>) -> usize {
        let key = self.entries.insert(Entry::new(item));
        self.link_after(key, predecessor);
        self.attach_child_map(key);
        key
    }

    /// Splice an unlinked entry into the base chain and its secondary chain
    fn link_after(&mut self, key: usize, predecessor: Option<usize>) {
        self.invalidate();

        let next = match predecessor {
            None => self.head,
            Some(pred) => self.next(pred, Level::Base),
        };
        if let Some(entry) = self.entries.get_mut(key) {
            entry.previous = predecessor;
            entry.next = next;
        }
        if let Some(next) = next {
            if let Some(n) = self.entries.get_mut(next) {
                n.previous = Some(key);
            }
        }
        match predecessor {
            None => self.head = Some(key),
            Some(pred) => {
                if let Some(p) = self.entries.get_mut(pred) {
                    p.next = Some(key);
                }
            }
        }

        self.link_level(key);
    }

    /// Link `key` into the secondary chain matching its category
    ///
    /// The neighbours are the closest base-chain entries of the same category
    /// on either side.
    fn link_level(&mut self, key: usize) {
        let Some(placeholder) = self.entries.get(key).map(|e| e.item.is_placeholder()) else {
            return;
        };
        let predecessor = self.find_level_neighbour(key, placeholder, false);
        let successor = match predecessor {
            Some(pred) => self.entries.get(pred).and_then(|p| p.next_level),
            None => self.head(if placeholder {
                Level::Placeholder
            } else {
                Level::Panel
            }),
        };

        if let Some(entry) = self.entries.get_mut(key) {
            entry.was_placeholder = placeholder;
            entry.previous_level = predecessor;
            entry.next_level = successor;
        }
        match predecessor {
            Some(pred) => {
                if let Some(p) = self.entries.get_mut(pred) {
                    p.next_level = Some(key);
                }
            }
            None => self.set_level_head(placeholder, Some(key)),
        }
        if let Some(succ) = successor {
            if let Some(s) = self.entries.get_mut(succ) {
                s.previous_level = Some(key);
            }
        }

        #[cfg(feature = "chain-tracing")]
        tracing::trace!(
            entry = key,
            ?predecessor,
            ?successor,
            placeholder,
            "linked into secondary chain"
        );
    }

    /// Walk the base chain away from `key` until an entry of the requested
    /// category shows up
    fn find_level_neighbour(&self, key: usize, placeholder: bool, forward: bool) -> Option<usize> {
        let step = |k: usize| {
            if forward {
                self.next(k, Level::Base)
            } else {
                self.previous(k, Level::Base)
            }
        };
        let mut cursor = step(key);
        while let Some(current) = cursor {
            let entry = self.entries.get(current)?;
            if entry.was_placeholder == placeholder {
                return Some(current);
            }
            cursor = step(current);
        }
        None
    }

    fn unlink_level(&mut self, key: usize) {
        self.invalidate();

        let Some((previous, next, placeholder)) = self
            .entries
            .get(key)
            .map(|e| (e.previous_level, e.next_level, e.was_placeholder))
        else {
            return;
        };
        if let Some(next) = next {
            if let Some(n) = self.entries.get_mut(next) {
                n.previous_level = previous;
            }
        }
        match previous {
            Some(prev) => {
                if let Some(p) = self.entries.get_mut(prev) {
                    p.next_level = next;
                }
            }
            None => {
                if self.head(if placeholder {
                    Level::Placeholder
                } else {
                    Level::Panel
                }) == Some(key)
                {
                    self.set_level_head(placeholder, next);
                }
            }
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.previous_level = None;
            entry.next_level = None;
        }
    }

    /// Take `key` out of every chain without freeing its slot
    fn detach(&mut self, key: usize) {
        self.invalidate();

        let Some((previous, next)) = self.entries.get(key).map(|e| (e.previous, e.next)) else {
            return;
        };
        if let Some(next) = next {
            if let Some(n) = self.entries.get_mut(next) {
                n.previous = previous;
            }
        }
        match previous {
            Some(prev) => {
                if let Some(p) = self.entries.get_mut(prev) {
                    p.next = next;
                }
            }
            None => self.head = next,
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.previous = None;
            entry.next = None;
        }

        self.unlink_level(key);
    }

    /// Remove `key` from the list and hand back its item
    pub(crate) fn unlink(&mut self, key: usize) -> Option<Item<D>> {
        if !self.entries.contains(key) {
            return None;
        }
        self.detach(key);
        let mut entry = self.entries.remove(key);
        if self.bound {
            if let Some(map) = entry.item.child_map_mut() {
                map.set_strategy(None);
            }
        }
        Some(entry.item)
    }

    /// Move the entry to the other secondary chain if its category changed
    pub(crate) fn relink(&mut self, key: usize) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        if entry.was_placeholder == entry.item.is_placeholder() {
            return;
        }
        self.unlink_level(key);
        self.link_level(key);
    }

    /// Replace the item of `key`, relinking if the category changes
    pub(crate) fn replace_item(&mut self, key: usize, item: Item<D>) -> Option<Item<D>> {
        let bound = self.bound;
        let entry = self.entries.get_mut(key)?;
        let mut old = std::mem::replace(&mut entry.item, item);
        if bound {
            if let Some(map) = old.child_map_mut() {
                map.set_strategy(None);
            }
        }
        self.attach_child_map(key);
        self.relink(key);
        Some(old)
    }

    /// Move `key` by `delta` positions within `level`
    pub(crate) fn move_entry(
        &mut self,
        key: usize,
        delta: isize,
        level: Level,
    ) -> Result<(), ListError> {
        if delta == 0 {
            return Ok(());
        }
        let out_of_range = ListError::MoveOutOfRange { delta, level };

        let new_predecessor = if delta > 0 {
            let mut cursor = key;
            for _ in 0..delta {
                cursor = self.next(cursor, level).ok_or(out_of_range.clone())?;
            }
            Some(cursor)
        } else {
            // One step further back: the entry goes *after* the predecessor
            let mut cursor = Some(key);
            for _ in 0..=delta.unsigned_abs() {
                let current = cursor.ok_or(out_of_range.clone())?;
                cursor = self.previous(current, level);
            }
            cursor
        };

        self.detach(key);
        self.link_after(key, new_predecessor);
        Ok(())
    }

    /// Wire the bound strategy onto the child map of `key`
    pub(crate) fn attach_child_map(&mut self, key: usize) {
        if !self.bound {
            return;
        }
        let strategy = self.strategy.clone();
        if let (Some(strategy), Some(entry)) = (strategy, self.entries.get_mut(key)) {
            if let Some(map) = entry.item.child_map_mut() {
                map.set_strategy(Some(strategy));
            }
        }
    }

    /// Check that every chain agrees with the category of its entries
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let base: Vec<usize> = self.keys(Level::Base).collect();
        assert_eq!(base.len(), self.entries.len(), "base chain misses entries");

        for level in [Level::Panel, Level::Placeholder] {
            let expected: Vec<usize> = base
                .iter()
                .copied()
                .filter(|k| {
                    let placeholder = self.entries[*k].item.is_placeholder();
                    placeholder == (level == Level::Placeholder)
                })
                .collect();
            let actual: Vec<usize> = self.keys(level).collect();
            assert_eq!(actual, expected, "{level} chain out of order");

            let mut backwards: Vec<usize> = Vec::new();
            let mut cursor = actual.last().copied();
            while let Some(k) = cursor {
                backwards.push(k);
                cursor = self.previous(k, level);
            }
            backwards.reverse();
            assert_eq!(backwards, actual, "{level} back links broken");
        }

        for (_, entry) in &self.entries {
            assert_eq!(entry.was_placeholder, entry.item.is_placeholder());
            assert!(entry.item.is_valid(), "invalid item kept in list");
        }
    }

    /// Slab keys of `level` in chain order
    pub(crate) fn keys(&self, level: Level) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.head(level);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.next(current, level);
            Some(current)
        })
    }
}
