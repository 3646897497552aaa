//! Resource paths and the store collections they map to.
//!
//! A `RequestPath` is what appears in the URL. It may be compound, such as
//! `users/5/blog_posts`, for related-resource endpoints that share a URL shape
//! but resolve to a flat collection in the store. `CollectionName` is that
//! flat collection; [`RequestPath::collection`] is the only mapping between
//! the two.

use std::fmt;

use serde::{Deserialize, Serialize};

const SEGMENT_SEPARATOR: char = '/';

/// Name of a flat collection in the entity store, e.g. `blog_posts`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CollectionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Resource type as written by the caller, possibly `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestPath(String);

impl RequestPath {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path as it appears in the URL: every `_` becomes `-`.
    pub fn url_segment(&self) -> String {
        self.0.replace('_', "-")
    }

    /// Store collection addressed by this path: the final segment, verbatim.
    pub fn collection(&self) -> CollectionName {
        let last = self
            .0
            .rsplit(SEGMENT_SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str());
        CollectionName::new(last)
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RequestPath {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
