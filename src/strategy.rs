//! Placeholder strategies
//!
//! A strategy decides which placeholder a panel gets and whether a
//! placeholder is still worth remembering. Strategies are shared between a
//! container, its placeholder list and the nested maps of child containers,
//! so they are handed around as `Rc<dyn PlaceholderStrategy>`.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::panel::Panel;
use crate::placeholder::Placeholder;

/// Receives batches of placeholders a strategy no longer considers valid
pub trait PlaceholderStrategyListener {
    fn placeholders_invalidated(&self, placeholders: &BTreeSet<Placeholder>);
}

/// Pluggable policy for placeholder keys
pub trait PlaceholderStrategy {
    /// The canonical placeholder of `panel`, `None` if it should not leave one
    fn placeholder_for(&self, panel: &dyn Panel) -> Option<Placeholder>;

    /// Whether `placeholder` may still be kept around
    fn is_valid_placeholder(&self, placeholder: &Placeholder) -> bool;

    fn add_listener(&self, listener: Rc<dyn PlaceholderStrategyListener>);

    /// Removes a listener previously added, compared by pointer
    fn remove_listener(&self, listener: &Rc<dyn PlaceholderStrategyListener>);
}

/// Listener bookkeeping for strategy implementations
#[derive(Default)]
pub struct StrategyListeners {
    listeners: RefCell<Vec<Rc<dyn PlaceholderStrategyListener>>>,
}

impl StrategyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Rc<dyn PlaceholderStrategyListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn remove(&self, listener: &Rc<dyn PlaceholderStrategyListener>) {
        self.listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Tell every listener that `placeholders` are gone
    ///
    /// The listener list is copied first so a listener may (un)register
    /// while being notified.
    pub fn notify(&self, placeholders: &BTreeSet<Placeholder>) {
        if placeholders.is_empty() {
            return;
        }
        let listeners: Vec<_> = self.listeners.borrow().clone();
        tracing::debug!(
            "Invalidating {} placeholders for {} listeners",
            placeholders.len(),
            listeners.len()
        );
        for listener in listeners {
            listener.placeholders_invalidated(placeholders);
        }
    }
}

impl fmt::Debug for StrategyListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyListeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Collects invalidated placeholders until the owning list applies them
///
/// Strategies may fire while the list is borrowed elsewhere, so the list does
/// not react immediately. It drains this inbox at the start of its next
/// mutation and treats queued keys as already gone in lookups.
#[derive(Debug, Default)]
pub(crate) struct InvalidationInbox {
    pending: RefCell<BTreeSet<Placeholder>>,
}

impl InvalidationInbox {
    pub(crate) fn contains(&self, placeholder: &Placeholder) -> bool {
        self.pending.borrow().contains(placeholder)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    pub(crate) fn take(&self) -> BTreeSet<Placeholder> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn clear(&self) {
        self.pending.borrow_mut().clear();
    }
}

impl PlaceholderStrategyListener for InvalidationInbox {
    fn placeholders_invalidated(&self, placeholders: &BTreeSet<Placeholder>) {
        self.pending
            .borrow_mut()
            .extend(placeholders.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter {
        calls: Cell<usize>,
    }

    impl PlaceholderStrategyListener for Counter {
        fn placeholders_invalidated(&self, placeholders: &BTreeSet<Placeholder>) {
            self.calls.set(self.calls.get() + placeholders.len());
        }
    }

    fn keys(names: &[&str]) -> BTreeSet<Placeholder> {
        names.iter().map(|n| Placeholder::new(*n)).collect()
    }

    #[test]
    fn test_listeners_notify_and_remove() {
        let listeners = StrategyListeners::new();
        let counter = Rc::new(Counter {
            calls: Cell::new(0),
        });
        let as_dyn: Rc<dyn PlaceholderStrategyListener> = counter.clone();

        listeners.add(as_dyn.clone());
        listeners.notify(&keys(&["a", "b"]));
        assert_eq!(counter.calls.get(), 2);

        listeners.remove(&as_dyn);
        assert!(listeners.is_empty());
        listeners.notify(&keys(&["c"]));
        assert_eq!(counter.calls.get(), 2);
    }

    #[test]
    fn test_empty_batches_are_not_delivered() {
        let listeners = StrategyListeners::new();
        let counter = Rc::new(Counter {
            calls: Cell::new(0),
        });
        listeners.add(counter.clone());
        listeners.notify(&BTreeSet::new());
        assert_eq!(counter.calls.get(), 0);
    }

    #[test]
    fn test_inbox_accumulates_until_taken() {
        let inbox = InvalidationInbox::default();
        inbox.placeholders_invalidated(&keys(&["a"]));
        inbox.placeholders_invalidated(&keys(&["b", "a"]));

        assert!(inbox.contains(&Placeholder::new("a")));
        assert_eq!(inbox.take(), keys(&["a", "b"]));
        assert!(inbox.is_empty());
    }
}
