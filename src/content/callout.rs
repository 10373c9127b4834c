//! Callouts: boxed text, never split. Measured a little looser than body
//! text (1.5 words per inch) and padded for the box styling.

use crate::model::{Block, PaginationRules};

use super::{
    check_whole_block, line_count, BreakReason, ColumnFrame, ContentHandler, Lookahead,
    PlacementResult, LINE_HEIGHT,
};

const WORDS_PER_INCH: f64 = 1.5;
const BOX_PADDING: f64 = 0.4;

pub struct CalloutHandler;

impl ContentHandler for CalloutHandler {
    fn is_atomic(&self) -> bool {
        true
    }

    fn default_rules(&self) -> PaginationRules {
        PaginationRules {
            keep_together: Some(true),
            break_avoid: Some(true),
            ..Default::default()
        }
    }

    fn estimate_height(&self, block: &Block, column_width: f64) -> f64 {
        let lines = line_count(block.word_count(), column_width * WORDS_PER_INCH);
        lines as f64 * LINE_HEIGHT + BOX_PADDING
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
}
