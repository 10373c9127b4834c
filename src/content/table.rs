//! Tables: split between rows, header repeated on every chunk.
//!
//! The first chunk takes as many rows as fit at the current fill position.
//! The remaining rows are sliced into chunks sized for an empty column of the
//! real column height, so each continuation fits the column it lands in.

use crate::model::{Block, BlockContent, PaginationRules, TableContent};

use super::{
    check_whole_block, derive_chunk, BreakReason, ColumnFrame, ContentHandler, Lookahead,
    PlacementResult, EPSILON,
};

const HEADER_HEIGHT: f64 = 0.3;
const ROW_HEIGHT: f64 = 0.25;
const PADDING: f64 = 0.2;
/// Estimated printed width of one table column.
const WIDTH_PER_COLUMN: f64 = 1.5;

pub struct TableHandler;

fn rows_of(block: &Block) -> &[Vec<String>] {
    block
        .content
        .table()
        .map(|t| t.rows.as_slice())
        .unwrap_or(&[])
}

/// Rows that fit in `height` once header and padding are reserved.
fn rows_fitting(height: f64) -> usize {
    let body = height - HEADER_HEIGHT - PADDING;
    if body + EPSILON < ROW_HEIGHT {
        return 0;
    }
    ((body + EPSILON) / ROW_HEIGHT).floor() as usize
}

impl TableHandler {
    pub fn estimate_width(block: &Block) -> f64 {
        block.content.table().map_or(0, |t| t.headers.len()) as f64 * WIDTH_PER_COLUMN
    }

    fn height_for_rows(rows: usize) -> f64 {
        HEADER_HEIGHT + rows as f64 * ROW_HEIGHT + PADDING
    }
}

impl ContentHandler for TableHandler {
    fn default_rules(&self) -> PaginationRules {
        PaginationRules {
            break_avoid: Some(true),
            ..Default::default()
        }
    }

    fn estimate_height(&self, block: &Block, _column_width: f64) -> f64 {
        Self::height_for_rows(rows_of(block).len())
    }

    fn min_height(&self, block: &Block, column_width: f64) -> f64 {
        if self.rules(block).keep_together {
            return self.estimate_height(block, column_width);
        }
        Self::height_for_rows(rows_of(block).len().min(1))
    }

    fn can_split(&self, block: &Block, remaining_height: f64, _column: ColumnFrame) -> bool {
        let rows = rows_of(block).len();
        if rows <= 1 || self.rules(block).keep_together {
            return false;
        }
        let fit = rows_fitting(remaining_height);
        fit >= 1 && fit < rows
    }

    fn split(&self, block: &Block, remaining_height: f64, column: ColumnFrame) -> Vec<Block> {
        if !self.can_split(block, remaining_height, column) {
            return vec![block.clone()];
        }
        let headers = block
            .content
            .table()
            .map(|t| t.headers.clone())
            .unwrap_or_default();
        let rows = rows_of(block);

        let first = rows_fitting(remaining_height);
        let per_column = rows_fitting(column.height).max(1);

        let mut slices: Vec<&[Vec<String>]> = vec![&rows[..first]];
        slices.extend(rows[first..].chunks(per_column));

        let pieces = slices.len();
        slices
            .into_iter()
            .enumerate()
            .map(|(i, slice)| {
                let content = BlockContent::Table(TableContent {
                    headers: headers.clone(),
                    rows: slice.to_vec(),
                });
                derive_chunk(block, i, pieces, content, true)
            })
            .collect()
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
        if self.can_split(block, remaining_height, column) {
            PlacementResult::split()
        } else {
            PlacementResult::refuse(BreakReason::HeightExceeded)
        }
    }

    fn anchor_title(&self, block: &Block) -> Option<String> {
        block
            .metadata
            .caption
            .clone()
            .or_else(|| block.metadata.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;

    const FRAME: ColumnFrame = ColumnFrame {
        width: 6.5,
        height: 9.0,
    };

    fn table(rows: usize) -> Block {
        Block::new(
            "t",
            BlockKind::Table,
            BlockContent::Table(TableContent {
                headers: vec!["Item".into(), "Qty".into()],
                rows: (0..rows).map(|i| vec![format!("item {}", i), i.to_string()]).collect(),
            }),
        )
    }

    fn row_count(block: &Block) -> usize {
        rows_of(block).len()
    }

    #[test]
    fn height_is_header_rows_padding() {
        assert!((TableHandler.estimate_height(&table(20), 6.5) - 5.5).abs() < 1e-9);
        assert!((TableHandler.estimate_height(&table(0), 6.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn first_chunk_takes_what_fits() {
        // 3.1in leaves room for 10 rows after header and padding
        let block = table(20);
        let result = TableHandler.check_placement_rules(&block, 3.1, FRAME, None);
        assert!(result.must_split);

        let chunks = TableHandler.split(&block, 3.1, FRAME);
        assert_eq!(chunks.len(), 2);
        assert_eq!(row_count(&chunks[0]), 10);
        assert_eq!(row_count(&chunks[1]), 10);
        for (i, chunk) in chunks.iter().enumerate() {
            let info = chunk.metadata.chunk.as_ref().unwrap();
            assert_eq!(info.index, i);
            assert!(info.is_table_chunk && info.has_header_repeat);
            assert_eq!(chunk.content.table().unwrap().headers.len(), 2);
        }
    }

    #[test]
    fn continuations_use_real_column_height() {
        // Empty 3in column holds 10 rows; 1in of room holds 2.
        let frame = ColumnFrame {
            width: 6.5,
            height: 3.0,
        };
        let chunks = TableHandler.split(&table(25), 1.0, frame);
        let sizes: Vec<usize> = chunks.iter().map(row_count).collect();
        assert_eq!(sizes, vec![2, 10, 10, 3]);
        for chunk in &chunks {
            assert!(TableHandler.estimate_height(chunk, 6.5) <= frame.height + EPSILON);
        }
    }

    #[test]
    fn single_row_table_is_not_splittable() {
        assert!(!TableHandler.can_split(&table(1), 0.6, FRAME));
        let result = TableHandler.check_placement_rules(&table(1), 0.6, FRAME, None);
        assert!(!result.can_place);
    }

    #[test]
    fn no_room_for_a_row_refuses() {
        let result = TableHandler.check_placement_rules(&table(20), 0.7, FRAME, None);
        assert!(!result.can_place);
        assert_eq!(result.reason, Some(BreakReason::HeightExceeded));
    }

    #[test]
    fn width_estimate_from_headers() {
        assert!((TableHandler::estimate_width(&table(3)) - 3.0).abs() < 1e-9);
    }
}
