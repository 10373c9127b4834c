//! Headings: atomic, and kept with the block that follows them.

use crate::model::{Block, PaginationRules};

use super::{
    check_whole_block, BreakReason, ColumnFrame, ContentHandler, Lookahead, PlacementResult,
};

pub struct HeadingHandler;

impl ContentHandler for HeadingHandler {
    fn is_atomic(&self) -> bool {
        true
    }

    fn default_rules(&self) -> PaginationRules {
        PaginationRules {
            keep_with_next: Some(true),
            min_orphans: Some(1),
            ..Default::default()
        }
    }

    fn estimate_height(&self, block: &Block, _column_width: f64) -> f64 {
        match block.metadata.level.unwrap_or(1) {
            0 | 1 => 0.6,
            2 => 0.5,
            _ => 0.4,
        }
    }

    fn check_placement_rules(
        &self,
        block: &Block,
        remaining_height: f64,
        column: ColumnFrame,
        next: Option<Lookahead<'_>>,
    ) -> PlacementResult {
        check_whole_block(
            self.estimate_height(block, column.width),
            remaining_height,
            &self.rules(block),
            next,
            BreakReason::AtomicBlock,
        )
    }

    fn anchor_title(&self, block: &Block) -> Option<String> {
        let text = block.content.text().trim();
        if text.is_empty() {
            block.metadata.title.clone()
        } else {
            Some(text.to_string())
        }
    }
}
