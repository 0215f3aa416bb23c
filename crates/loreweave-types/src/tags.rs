//! Bounded tag map attached to every entity.
//!
//! Tags are the open-ended annotation channel of the graph: systems record
//! detected conditions here (`war_brewing`, `temperature`) and templates
//! react to them later. The map is deliberately bounded -- an entity carries
//! at most [`TagMap::CAPACITY`] tags, and inserts beyond the cap are
//! rejected rather than silently evicting older state.
//!
//! Entities have no first-class numeric field, so scalar state (e.g. colony
//! temperature) is stored as a stringified number via [`TagMap::set_number`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single tag value: either a boolean flag or a free-form string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// A boolean marker tag.
    Flag(bool),
    /// A string-valued tag (cluster ids, encoded numbers, labels).
    Text(String),
}

impl TagValue {
    /// Return the string payload if this is a text tag.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Flag(_) => None,
        }
    }

    /// Return the boolean payload if this is a flag tag.
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

/// A bounded mapping of tag name to [`TagValue`].
///
/// Updates to existing keys always succeed; inserts of new keys fail once
/// the map holds [`TagMap::CAPACITY`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap {
    entries: BTreeMap<String, TagValue>,
}

impl TagMap {
    /// Maximum number of tags an entity may carry.
    pub const CAPACITY: usize = 10;

    /// Create an empty tag map.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or update a tag.
    ///
    /// Returns `false` (and leaves the map unchanged) when the map is full
    /// and `key` is not already present.
    pub fn set(&mut self, key: &str, value: impl Into<TagValue>) -> bool {
        if self.entries.len() >= Self::CAPACITY && !self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(String::from(key), value.into());
        true
    }

    /// Store a numeric value as a stringified tag.
    pub fn set_number(&mut self, key: &str, value: f64) -> bool {
        self.set(key, format!("{value}"))
    }

    /// Read a numeric tag previously stored via [`TagMap::set_number`].
    pub fn number(&self, key: &str) -> Option<f64> {
        self.entries.get(key)?.as_text()?.parse().ok()
    }

    /// Look up a tag value.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(key)
    }

    /// Return the string payload of a text tag.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.entries.get(key)?.as_text()
    }

    /// `true` when the tag is present with value `Flag(true)`.
    pub fn flag(&self, key: &str) -> bool {
        self.entries.get(key).and_then(TagValue::as_flag) == Some(true)
    }

    /// `true` when the tag key is present with any value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a tag, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.entries.remove(key)
    }

    /// Number of tags currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no tags are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TagValue)> {
        self.entries.iter()
    }
}
