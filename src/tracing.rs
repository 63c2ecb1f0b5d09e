//! Debug tracing for placeholder lists
//!
//! The crate logs through `tracing`; hosts install whatever subscriber they
//! like. `init` is a console subscriber for tests and small tools.
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=placeholders=debug` - before/after diffs of pruning passes
//!   (needs `ListConfig::log_changes`)
//! - `RUST_LOG=dock_placeholders::list=trace` - chain relinks (feature
//!   `chain-tracing`)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::list::{Item, Level, PlaceholderList};
use crate::panel::PlaceholderListItem;

/// Initialize a console subscriber respecting RUST_LOG, `warn` by default
///
/// Does nothing if a global subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}

/// Lightweight snapshot of a placeholder list for diffing
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub panel_count: usize,
    pub placeholder_count: usize,
    pub entries: Vec<EntryInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub title: Option<String>,
    pub placeholders: Vec<String>,
}

impl EntryInfo {
    fn from_item<D: PlaceholderListItem>(item: &Item<D>) -> Self {
        Self {
            title: item.value().map(|v| v.as_panel().title()),
            placeholders: item.placeholders().iter().map(|p| p.to_string()).collect(),
        }
    }

    fn label(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("{{{}}}", self.placeholders.join(", ")),
        }
    }
}

impl ListSnapshot {
    pub fn from_list<D: PlaceholderListItem>(list: &PlaceholderList<D>) -> Self {
        let entries: Vec<EntryInfo> = list.iter(Level::Base).map(EntryInfo::from_item).collect();
        Self {
            panel_count: entries.iter().filter(|e| e.title.is_some()).count(),
            placeholder_count: entries.iter().filter(|e| e.title.is_none()).count(),
            entries,
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &ListSnapshot) -> Option<String> {
        let mut changes = Vec::new();

        if self.entries.len() != other.entries.len() {
            changes.push(format!(
                "entries: {} → {} (panels {} → {}, placeholders {} → {})",
                self.entries.len(),
                other.entries.len(),
                self.panel_count,
                other.panel_count,
                self.placeholder_count,
                other.placeholder_count
            ));
        }

        for gone in self.entries.iter().filter(|e| !other.entries.contains(e)) {
            changes.push(format!("-{}", gone.label()));
        }
        for new in other.entries.iter().filter(|e| !self.entries.contains(e)) {
            changes.push(format!("+{}", new.label()));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}
