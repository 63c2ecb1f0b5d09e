//! Placeholder keys
//!
//! A placeholder is a path-like name (`"dock/explorer"`, `"slot/A"`) that
//! stands in for a panel which is not currently shown. Only equality and
//! ordering matter to the list, the segments are for the strategies that
//! hand them out.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the segments of a placeholder
pub const SEPARATOR: char = '/';

/// Opaque, ordered key remembering the position of an absent panel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholder(String);

impl Placeholder {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Build a placeholder from individual segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() {
                path.push(SEPARATOR);
            }
            path.push_str(segment.as_ref());
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the non-empty segments of this placeholder
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Returns a new placeholder with `segment` appended
    pub fn append(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}{}{}", self.0, SEPARATOR, segment))
        }
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn starts_with(&self, other: &Placeholder) -> bool {
        let mut mine = self.segments();
        other.segments().all(|segment| mine.next() == Some(segment))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Placeholder {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Placeholder {
    fn from(path: String) -> Self {
        Self(path)
    }
}
