//! Benchmarks for placeholder list operations
//!
//! Run with: cargo bench list_operations

use std::collections::BTreeSet;
use std::rc::Rc;

use dock_placeholders::{
    Panel, Placeholder, PlaceholderList, PlaceholderListItem, PlaceholderStrategy,
    PlaceholderStrategyListener, StrategyConverter, StrategyListeners,
};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

#[derive(Debug, Clone, PartialEq)]
struct Tab(usize);

impl Panel for Tab {
    fn title(&self) -> String {
        self.0.to_string()
    }
}

impl PlaceholderListItem for Tab {
    fn as_panel(&self) -> &dyn Panel {
        self
    }
}

#[derive(Default)]
struct Numbered {
    listeners: StrategyListeners,
}

impl PlaceholderStrategy for Numbered {
    fn placeholder_for(&self, panel: &dyn Panel) -> Option<Placeholder> {
        Some(Placeholder::from_segments(["tab", panel.title().as_str()]))
    }

    fn is_valid_placeholder(&self, _placeholder: &Placeholder) -> bool {
        true
    }

    fn add_listener(&self, listener: Rc<dyn PlaceholderStrategyListener>) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Rc<dyn PlaceholderStrategyListener>) {
        self.listeners.remove(listener);
    }
}

/// A list alternating between live tabs and single-key placeholders
fn make_list(entries: usize) -> PlaceholderList<Tab> {
    let mut list = PlaceholderList::new();
    list.set_strategy(Some(Rc::new(Numbered::default()) as Rc<dyn PlaceholderStrategy>));
    for i in 0..entries {
        if i % 2 == 0 {
            list.panels().push(Tab(i)).unwrap_or_default();
        } else {
            let key = Placeholder::new(format!("gone/{i}"));
            list.pure_placeholders()
                .push(BTreeSet::from([key]))
                .unwrap_or_default();
        }
    }
    list
}

const SIZES: &[usize] = &[10, 100, 1000];

// ============================================================================
// Building
// ============================================================================

#[divan::bench(args = SIZES)]
fn push_panels(bencher: divan::Bencher, n: usize) {
    bencher.bench_local(|| make_list(divan::black_box(n)));
}

// ============================================================================
// Remove / put
// ============================================================================

#[divan::bench(args = SIZES)]
fn remove_and_put_middle(bencher: divan::Bencher, n: usize) {
    let mut list = make_list(n);
    let tab = Tab(n / 2 - (n / 2) % 2);
    bencher.bench_local(|| {
        if let Some(placeholder) = list.remove(divan::black_box(&tab)) {
            list.put(&placeholder, tab.clone());
        }
    });
}

#[divan::bench(args = SIZES)]
fn remove_all_single_key(bencher: divan::Bencher, n: usize) {
    bencher
        .with_inputs(|| make_list(n))
        .bench_local_values(|mut list| {
            list.remove_all_of(&Placeholder::new("gone/1"));
            list
        });
}

// ============================================================================
// Views
// ============================================================================

#[divan::bench(args = SIZES)]
fn panel_view_index_walk(bencher: divan::Bencher, n: usize) {
    let mut list = make_list(n);
    bencher.bench_local(|| {
        let panels = list.panels();
        let last = panels.len().saturating_sub(1);
        panels.get(divan::black_box(last)).map(|t| t.0).unwrap_or(0)
    });
}

#[divan::bench(args = SIZES)]
fn move_panel_to_front(bencher: divan::Bencher, n: usize) {
    let mut list = make_list(n);
    bencher.bench_local(|| {
        let mut panels = list.panels();
        let last = panels.len().saturating_sub(1);
        panels.move_to(last, 0).unwrap_or_default();
    });
}

// ============================================================================
// Codec
// ============================================================================

#[divan::bench(args = SIZES)]
fn to_map(bencher: divan::Bencher, n: usize) {
    let list = make_list(n);
    bencher.bench_local(|| list.to_map_with_strategy());
}

#[divan::bench(args = SIZES)]
fn read_map(bencher: divan::Bencher, n: usize) {
    let map = make_list(n).to_map_with_strategy();
    bencher.bench_local(|| {
        PlaceholderList::<Tab>::from_map_with(&map, &mut StrategyConverter::new(None))
            .map(|list| list.len())
            .unwrap_or(0)
    });
}
