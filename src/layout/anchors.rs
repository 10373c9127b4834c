//! Cross-reference anchors.
//!
//! Every heading, figure and table the engine commits is recorded with the
//! page, column and position it landed at, so renderers can resolve
//! "see Table 3 on page N" style references after layout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::BlockKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub anchor_id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// The input block id (chunks resolve to the block they came from).
    pub block_id: String,
    pub page_number: usize,
    pub column_index: usize,
    /// Position within the column's content.
    pub block_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Anchor table for one layout run, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorTracker {
    records: IndexMap<String, AnchorRecord>,
}

impl AnchorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anchor. The first registration of an id wins; returns
    /// false for a duplicate.
    pub fn register(&mut self, record: AnchorRecord) -> bool {
        if self.records.contains_key(&record.anchor_id) {
            tracing::warn!(
                anchor = %record.anchor_id,
                block = %record.block_id,
                "duplicate anchor id ignored"
            );
            return false;
        }
        self.records.insert(record.anchor_id.clone(), record);
        true
    }

    pub fn get(&self, anchor_id: &str) -> Option<&AnchorRecord> {
        self.records.get(anchor_id)
    }

    pub fn find_by_block(&self, block_id: &str) -> Option<&AnchorRecord> {
        self.records.values().find(|r| r.block_id == block_id)
    }

    /// Page number an anchor landed on.
    pub fn page_of(&self, anchor_id: &str) -> Option<usize> {
        self.get(anchor_id).map(|r| r.page_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchorRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
