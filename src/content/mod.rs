//! # Content Handlers
//!
//! One placement strategy per block kind. A handler knows how tall a block
//! is in a given column width, whether and how it can be split, and whether
//! it may be placed at the current fill position.
//!
//! Height estimation is heuristic (no font metrics): text is measured in
//! words per inch of column width and converted to lines of
//! [`LINE_HEIGHT`]. Every height in the engine comes from
//! [`HandlerRegistry::estimate_height`], so the placement check and the
//! commit path always agree on a block's size.

pub mod callout;
pub mod figure;
pub mod heading;
pub mod paragraph;
pub mod table;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Block, BlockContent, BlockKind, ChunkInfo, PaginationRules, ResolvedRules};

pub use callout::CalloutHandler;
pub use figure::FigureHandler;
pub use heading::HeadingHandler;
pub use paragraph::ParagraphHandler;
pub use table::TableHandler;

/// Height of one line of body text (≈6 lines per inch).
pub const LINE_HEIGHT: f64 = 0.167;

/// Cap on the lookahead height a keep-with-next block reserves for its
/// successor.
pub const KEEP_WITH_NEXT_CAP: f64 = 0.3;

/// Tolerance for height comparisons. Estimates are sums of rounded
/// constants, so exact comparisons would reject blocks that fit.
pub const EPSILON: f64 = 0.001;

/// The column a block is being placed into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFrame {
    pub width: f64,
    /// Full height of an empty column, used when a splitter needs to size
    /// continuation chunks.
    pub height: f64,
}

/// The block after the one being placed, as seen by keep-with-next.
#[derive(Debug, Clone, Copy)]
pub struct Lookahead<'a> {
    pub block: &'a Block,
    /// Smallest height the block could occupy at the top of a column.
    pub min_height: f64,
}

/// Why a block was not placed, or why a column ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakReason {
    HeightExceeded,
    KeepWithNext,
    AtomicBlock,
    FootnoteOverflow,
    CannotPlace,
    PlacementFailed,
    OrphanControl,
    WidowControl,
    ForcedPlacement,
    /// Reported by placement checks only: the block is placed but is wider
    /// than its column.
    OversizedWidth,
}

impl BreakReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakReason::HeightExceeded => "height-exceeded",
            BreakReason::KeepWithNext => "keep-with-next",
            BreakReason::AtomicBlock => "atomic-block",
            BreakReason::FootnoteOverflow => "footnote-overflow",
            BreakReason::CannotPlace => "cannot-place",
            BreakReason::PlacementFailed => "placement-failed",
            BreakReason::OrphanControl => "orphan-control",
            BreakReason::WidowControl => "widow-control",
            BreakReason::ForcedPlacement => "forced-placement",
            BreakReason::OversizedWidth => "oversized-width",
        }
    }
}

/// Outcome of a placement-rule check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementResult {
    pub can_place: bool,
    pub reason: Option<BreakReason>,
    pub requires_next_column: bool,
    pub requires_next_page: bool,
    /// The block can go here only after splitting it.
    pub must_split: bool,
}

impl PlacementResult {
    pub fn place() -> Self {
        Self {
            can_place: true,
            ..Default::default()
        }
    }

    pub fn split() -> Self {
        Self {
            can_place: true,
            must_split: true,
            ..Default::default()
        }
    }

    pub fn refuse(reason: BreakReason) -> Self {
        Self {
            can_place: false,
            reason: Some(reason),
            requires_next_column: true,
            ..Default::default()
        }
    }
}

/// Placement strategy for one block kind.
pub trait ContentHandler: Send + Sync {
    /// Atomic blocks are never split.
    fn is_atomic(&self) -> bool {
        false
    }

    /// Pagination rules applied where a block leaves a field unset.
    fn default_rules(&self) -> PaginationRules {
        PaginationRules::default()
    }

    fn estimate_height(&self, block: &Block, column_width: f64) -> f64;

    /// Smallest height the block can occupy at the top of a column. Text
    /// handlers return the height of their minimum orphan lines.
    fn min_height(&self, block: &Block, column_width: f64) -> f64 {
        self.estimate_height(block, column_width)
    }

    fn can_split(&self, _block: &Block, _remaining_height: f64, _column: ColumnFrame) -> bool {
        false
    }

    /// Split the block at the current fill position. Returns the block
    /// unchanged when it cannot or need not be split.
    fn split(&self, block: &Block, _remaining_height: f64, _column: ColumnFrame) -> Vec<Block> {
        vec![block.clone()]
    }

    fn check_placement_rules(
        &self,
        block: &Block,
        remaining_height: f64,
        column: ColumnFrame,
        next: Option<Lookahead<'_>>,
    ) -> PlacementResult;

    /// Title recorded for cross-references.
    fn anchor_title(&self, block: &Block) -> Option<String> {
        block
            .metadata
            .title
            .clone()
            .or_else(|| block.metadata.caption.clone())
    }

    /// The block's own rules over this handler's defaults.
    fn rules(&self, block: &Block) -> ResolvedRules {
        block
            .pagination_rules
            .clone()
            .unwrap_or_default()
            .merged_over(&self.default_rules())
            .resolve()
    }
}

/// Number of lines a text of `words` words occupies at `words_per_line`.
pub fn line_count(words: usize, words_per_line: f64) -> usize {
    if words == 0 {
        return 0;
    }
    (words as f64 / words_per_line.max(1.0)).ceil() as usize
}

/// Whole lines that fit in `height`.
pub fn lines_in(height: f64) -> usize {
    if height <= 0.0 {
        return 0;
    }
    ((height + EPSILON) / LINE_HEIGHT).floor() as usize
}

/// Placement check for a block that must go in whole: it has to fit, and a
/// keep-with-next block also needs room for the start of its successor.
pub fn check_whole_block(
    height: f64,
    remaining_height: f64,
    rules: &ResolvedRules,
    next: Option<Lookahead<'_>>,
    too_tall: BreakReason,
) -> PlacementResult {
    if height > remaining_height + EPSILON {
        return PlacementResult::refuse(too_tall);
    }
    if !keep_with_next_satisfied(height, remaining_height, rules, next) {
        return PlacementResult::refuse(BreakReason::KeepWithNext);
    }
    PlacementResult::place()
}

pub fn keep_with_next_satisfied(
    height: f64,
    remaining_height: f64,
    rules: &ResolvedRules,
    next: Option<Lookahead<'_>>,
) -> bool {
    match next {
        Some(next) if rules.keep_with_next => {
            height + next.min_height.min(KEEP_WITH_NEXT_CAP) <= remaining_height + EPSILON
        }
        _ => true,
    }
}

/// Derive the `offset`-th piece of a split from `block`. Chunk numbering
/// continues from the block's own chunk index so that re-splitting a
/// continuation keeps the group contiguous.
pub(crate) fn derive_chunk(
    block: &Block,
    offset: usize,
    pieces: usize,
    content: BlockContent,
    is_table_chunk: bool,
) -> Block {
    let base = block.metadata.chunk.as_ref().map_or(0, |c| c.index);
    let original = block.logical_id().to_string();
    let index = base + offset;

    let mut metadata = block.metadata.clone();
    metadata.chunk = Some(ChunkInfo {
        index,
        total: base + pieces,
        original_block_id: original.clone(),
        is_table_chunk,
        has_header_repeat: is_table_chunk,
    });
    if offset > 0 {
        // Footnotes and the anchor belong to the first piece only.
        metadata.footnotes.clear();
        metadata.anchor_id = None;
    }

    let mut pagination_rules = block.pagination_rules.clone();
    if offset + 1 < pieces {
        // Only the last piece keeps the block's keep-with-next.
        let rules = pagination_rules.get_or_insert_with(PaginationRules::default);
        rules.keep_with_next = Some(false);
    }

    Block {
        id: chunk_id(&original, index),
        kind: block.kind.clone(),
        content,
        metadata,
        pagination_rules,
        order: block.order,
    }
}

pub(crate) fn chunk_id(original: &str, index: usize) -> String {
    format!("{}::chunk-{}", original, index)
}

/// Maps block kinds to their strategies. Kinds without a registered handler
/// are laid out as paragraphs.
pub struct HandlerRegistry {
    handlers: HashMap<BlockKind, Box<dyn ContentHandler>>,
    fallback: Box<dyn ContentHandler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl HandlerRegistry {
    /// A registry with no dedicated handlers: every kind degrades to text.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Box::new(ParagraphHandler),
        }
    }

    /// The built-in strategies for headings, paragraphs, figures, tables and
    /// callouts.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(BlockKind::Heading, HeadingHandler);
        registry.register(BlockKind::Paragraph, ParagraphHandler);
        registry.register(BlockKind::Figure, FigureHandler);
        registry.register(BlockKind::Table, TableHandler);
        registry.register(BlockKind::Callout, CalloutHandler);
        registry
    }

    /// Register (or replace) the strategy for a kind. Returns the handler it
    /// replaced, if any.
    pub fn register(
        &mut self,
        kind: BlockKind,
        handler: impl ContentHandler + 'static,
    ) -> Option<Box<dyn ContentHandler>> {
        self.handlers.insert(kind, Box::new(handler))
    }

    pub fn is_registered(&self, kind: &BlockKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn handler_for(&self, kind: &BlockKind) -> &dyn ContentHandler {
        self.handlers
            .get(kind)
            .map(|h| h.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn estimate_height(&self, block: &Block, column_width: f64) -> f64 {
        self.handler_for(&block.kind)
            .estimate_height(block, column_width)
    }

    pub fn is_atomic(&self, kind: &BlockKind) -> bool {
        self.handler_for(kind).is_atomic()
    }

    pub fn rules(&self, block: &Block) -> ResolvedRules {
        self.handler_for(&block.kind).rules(block)
    }

    pub fn default_rules(&self, kind: &BlockKind) -> PaginationRules {
        self.handler_for(kind).default_rules()
    }

    pub fn anchor_title(&self, block: &Block) -> Option<String> {
        self.handler_for(&block.kind).anchor_title(block)
    }

    pub fn lookahead<'a>(&self, next: Option<&'a Block>, column_width: f64) -> Option<Lookahead<'a>> {
        next.map(|block| Lookahead {
            block,
            min_height: self.handler_for(&block.kind).min_height(block, column_width),
        })
    }

    pub fn check_placement(
        &self,
        block: &Block,
        remaining_height: f64,
        column: ColumnFrame,
        next: Option<&Block>,
    ) -> PlacementResult {
        let lookahead = self.lookahead(next, column.width);
        self.handler_for(&block.kind)
            .check_placement_rules(block, remaining_height, column, lookahead)
    }

    pub fn can_split(&self, block: &Block, remaining_height: f64, column: ColumnFrame) -> bool {
        self.handler_for(&block.kind)
            .can_split(block, remaining_height, column)
    }

    pub fn split(&self, block: &Block, remaining_height: f64, column: ColumnFrame) -> Vec<Block> {
        self.handler_for(&block.kind)
            .split(block, remaining_height, column)
    }
}
