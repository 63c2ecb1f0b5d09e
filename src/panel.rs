//! Panel abstraction - the live things a docking container holds
//!
//! The placeholder list never knows concrete panel types. It stores a handle
//! `D` per live entry and reaches the panel through these traits:
//!
//! - `Panel`: a user visible unit; may itself be a `Container`
//! - `Container`: owns its own placeholder list, which can be snapshotted
//!   into a `PlaceholderMap` and restored from one
//! - `PlaceholderListItem`: the handle type stored in the list
//!
//! Handles are expected to be cheap to clone (an id, an `Rc`, ...). Containers
//! are addressed through `&self` because the surrounding framework owns them
//! and usually hands out shared handles.

use crate::map::PlaceholderMap;

/// A live, user-visible unit managed by a docking container
pub trait Panel {
    /// Title used in debug output
    fn title(&self) -> String;

    /// This panel seen as a container of other panels, if it is one
    fn as_container(&self) -> Option<&dyn Container> {
        None
    }
}

/// A panel that holds children of its own
pub trait Container {
    /// Snapshot of the layout of the children, including placeholders
    fn placeholders(&self) -> PlaceholderMap;

    /// Restore a layout previously returned by `placeholders`
    fn set_placeholders(&self, placeholders: PlaceholderMap);
}

/// The handle type stored in a placeholder list
pub trait PlaceholderListItem: Clone + PartialEq {
    fn as_panel(&self) -> &dyn Panel;
}
