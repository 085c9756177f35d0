//! Venue id → name index.
//!
//! Venue lists can sit anywhere in the dump, so the whole tree is visited and
//! every `venues` array contributes. The first entry seen for an id wins.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::fields::{resolve, Field};
use crate::walker::WalkOptions;

/// A venue as listed in the dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueRecord {
    pub id: String,
    pub name: String,
}

/// Venues in discovery order, with an id lookup.
#[derive(Debug, Clone, Default)]
pub struct VenueIndex {
    records: Vec<VenueRecord>,
    by_id: HashMap<String, usize>,
}

impl VenueIndex {
    /// Index every `venues` list in `root` using the default depth guard.
    pub fn build(root: &Value) -> Self {
        Self::build_with(root, &WalkOptions::default())
    }

    /// Index every `venues` list in `root`, skipping nodes nested deeper than
    /// `options.max_depth`.
    pub fn build_with(root: &Value, options: &WalkOptions) -> Self {
        let mut index = Self::default();
        let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = stack.pop() {
            if depth > options.max_depth {
                tracing::warn!(depth, "venue index skipped a node past the depth limit");
                continue;
            }
            match node {
                Value::Object(map) => {
                    if let Some(Value::Array(venues)) = map.get("venues") {
                        for venue in venues {
                            if let Value::Object(entry) = venue {
                                let id = resolve(entry, Field::VenueKey).and_then(Value::as_str);
                                let name =
                                    resolve(entry, Field::VenueName).and_then(Value::as_str);
                                if let (Some(id), Some(name)) = (id, name) {
                                    index.insert(id, name);
                                }
                            }
                        }
                    }
                    stack.extend(map.values().rev().map(|child| (child, depth + 1)));
                }
                Value::Array(items) => {
                    stack.extend(items.iter().rev().map(|child| (child, depth + 1)));
                }
                _ => {}
            }
        }

        tracing::debug!(venues = index.len(), "built venue index");
        index
    }

    fn insert(&mut self, id: &str, name: &str) {
        if id.is_empty() || name.is_empty() || self.by_id.contains_key(id) {
            return;
        }
        self.by_id.insert(id.to_string(), self.records.len());
        self.records.push(VenueRecord {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    /// Name for a venue id, if indexed.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .map(|&pos| self.records[pos].name.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Venues sorted case-insensitively by name. Equal names keep discovery order.
    pub fn sorted_by_name(&self) -> Vec<VenueRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|v| v.name.to_lowercase());
        sorted
    }
}
