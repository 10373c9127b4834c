//! Paragraphs, and the text fallback for every kind without its own handler.
//!
//! Text is measured at 1.8 words per inch of column width per line. Splits
//! happen on word boundaries at a line count chosen by
//! [`plan_line_break`](crate::layout::page_break::plan_line_break).

use crate::layout::page_break::{plan_line_break, BreakDecision, MoveReason};
use crate::model::{Block, BlockContent, PaginationRules};

use super::{
    check_whole_block, derive_chunk, line_count, lines_in, BreakReason, ColumnFrame,
    ContentHandler, Lookahead, PlacementResult, EPSILON, LINE_HEIGHT,
};

const WORDS_PER_INCH: f64 = 1.8;

pub struct ParagraphHandler;

fn words_per_line(column_width: f64) -> f64 {
    (column_width * WORDS_PER_INCH).max(1.0)
}

/// The largest word count that still fits in `lines` lines.
fn words_for_lines(lines: usize, words_per_line: f64) -> usize {
    let mut words = (lines as f64 * words_per_line).floor() as usize;
    while words > 0 && line_count(words, words_per_line) > lines {
        words -= 1;
    }
    words
}

impl ParagraphHandler {
    fn total_lines(&self, block: &Block, column_width: f64) -> usize {
        line_count(block.word_count(), words_per_line(column_width))
    }

    fn plan(&self, block: &Block, remaining_height: f64, column_width: f64) -> BreakDecision {
        let rules = self.rules(block);
        plan_line_break(
            self.total_lines(block, column_width),
            lines_in(remaining_height),
            !rules.keep_together,
            rules.min_orphans as usize,
            rules.min_widows as usize,
        )
    }
}

impl ContentHandler for ParagraphHandler {
    fn default_rules(&self) -> PaginationRules {
        PaginationRules {
            min_orphans: Some(2),
            min_widows: Some(2),
            ..Default::default()
        }
    }

    fn estimate_height(&self, block: &Block, column_width: f64) -> f64 {
        self.total_lines(block, column_width) as f64 * LINE_HEIGHT
    }

    fn min_height(&self, block: &Block, column_width: f64) -> f64 {
        let rules = self.rules(block);
        let total = self.total_lines(block, column_width);
        let min_lines = if rules.keep_together {
            total
        } else {
            total.min(rules.min_orphans.max(1) as usize)
        };
        min_lines as f64 * LINE_HEIGHT
    }

    fn can_split(&self, block: &Block, remaining_height: f64, column: ColumnFrame) -> bool {
        matches!(
            self.plan(block, remaining_height, column.width),
            BreakDecision::Split { .. }
        )
    }

    fn split(&self, block: &Block, remaining_height: f64, column: ColumnFrame) -> Vec<Block> {
        let lines_on_current = match self.plan(block, remaining_height, column.width) {
            BreakDecision::Split { lines_on_current } => lines_on_current,
            _ => return vec![block.clone()],
        };

        let words: Vec<&str> = block.content.words().collect();
        let first_words = words_for_lines(lines_on_current, words_per_line(column.width));
        if first_words == 0 || first_words >= words.len() {
            return vec![block.clone()];
        }

        let head = BlockContent::Text(words[..first_words].join(" "));
        let tail = BlockContent::Text(words[first_words..].join(" "));
        vec![
            derive_chunk(block, 0, 2, head, false),
            derive_chunk(block, 1, 2, tail, false),
        ]
    }

    fn check_placement_rules(
        &self,
        block: &Block,
        remaining_height: f64,
        column: ColumnFrame,
        next: Option<Lookahead<'_>>,
    ) -> PlacementResult {
        let height = self.estimate_height(block, column.width);
        if height <= remaining_height + EPSILON {
            return check_whole_block(
                height,
                remaining_height,
                &self.rules(block),
                next,
                BreakReason::HeightExceeded,
            );
        }

        match self.plan(block, remaining_height, column.width) {
            BreakDecision::Split { .. } => PlacementResult::split(),
            BreakDecision::Place => PlacementResult::place(),
            BreakDecision::MoveToNextColumn(MoveReason::Unbreakable) => {
                PlacementResult::refuse(BreakReason::HeightExceeded)
            }
            BreakDecision::MoveToNextColumn(MoveReason::Orphans) => {
                PlacementResult::refuse(BreakReason::OrphanControl)
            }
            BreakDecision::MoveToNextColumn(MoveReason::Widows) => {
                PlacementResult::refuse(BreakReason::WidowControl)
            }
        }
    }
}
