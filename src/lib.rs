//! Dock placeholders - layout memory for docking containers
//!
//! This crate provides the ordered item/placeholder list a docking container
//! uses for its children: live panels and placeholders for panels that are
//! gone, kept in one sequence so a layout can be stored and restored while
//! parts of it are missing.

pub mod config;
pub mod convert;
pub mod error;
pub mod list;
pub mod map;
pub mod panel;
pub mod placeholder;
pub mod strategy;
pub mod tracing;

// Re-export commonly used types
pub use config::ListConfig;
pub use convert::{ConvertedItem, ItemConverter, StrategyConverter};
pub use error::ListError;
pub use list::{Item, Level, MetaMap, PlaceholderList, View};
pub use map::{PlaceholderMap, Record, Value};
pub use panel::{Container, Panel, PlaceholderListItem};
pub use placeholder::Placeholder;
pub use strategy::{PlaceholderStrategy, PlaceholderStrategyListener, StrategyListeners};
