//! # Column Flow Managers
//!
//! A flow manager owns the fill state of one column for one layout pass:
//! the blocks placed so far, the height they consume, and the footnotes
//! they reserve room for. The engine asks it to place blocks and moves on
//! to the next column once it is full.
//!
//! [`StandardFlowManager`] does the bookkeeping. [`SidebarFlowManager`]
//! wraps any flow manager and pulls sidebar callouts out of the column.

use crate::content::{keep_with_next_satisfied, BreakReason, ColumnFrame, HandlerRegistry, EPSILON};
use crate::model::{Block, BlockKind, Placement};

use super::LayoutColumnBox;

/// Where an accepted block went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    /// Appended to the column at this index.
    Column { block_index: usize },
    /// Routed to the page's sidebar.
    Sidebar,
}

/// A block the column would not take, handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Refusal {
    pub block: Block,
    pub reason: BreakReason,
}

/// A footnote reserved in a column, numbered when its page is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFootnote {
    pub id: String,
    pub content: String,
    pub source_block_id: String,
}

/// Everything a column produced.
#[derive(Debug, Clone)]
pub struct ColumnOutput {
    pub column: LayoutColumnBox,
    pub footnotes: Vec<PendingFootnote>,
    pub sidebar_blocks: Vec<Block>,
    /// A block was forced into this column past its capacity.
    pub overflowed: bool,
}

pub trait FlowManager {
    fn column_index(&self) -> usize;

    fn frame(&self) -> ColumnFrame;

    /// Height left for content and footnotes.
    fn remaining_height(&self) -> f64;

    /// Height left for `block` itself once its footnotes are reserved.
    fn available_height_for(&self, block: &Block) -> f64;

    fn is_full(&self) -> bool;

    /// No block has been committed to the column yet.
    fn is_empty(&self) -> bool;

    /// Whether this manager routes `block` somewhere other than the column.
    fn diverts(&self, _block: &Block) -> bool {
        false
    }

    /// Check whether `block` can be committed whole. Returns its height.
    fn can_place_block(&self, block: &Block, next: Option<&Block>) -> Result<f64, BreakReason>;

    /// Re-validate and commit `block`. A refused block is handed back.
    fn place_block(&mut self, block: Block, next: Option<&Block>) -> Result<Placed, Refusal>;

    /// Commit a block that fits nowhere, ending the column.
    fn force_place(&mut self, block: Block) -> Placed;

    fn mark_column_full(&mut self, reason: BreakReason);

    fn finish(self: Box<Self>) -> ColumnOutput;
}

/// Fill state for one column.
pub struct StandardFlowManager<'r> {
    registry: &'r HandlerRegistry,
    column_index: usize,
    frame: ColumnFrame,
    /// Height reserved per footnote.
    note_height: f64,
    content: Vec<Block>,
    current_height: f64,
    footnote_height: f64,
    footnotes: Vec<PendingFootnote>,
    is_full: bool,
    end_reason: Option<BreakReason>,
    overflowed: bool,
}

impl<'r> StandardFlowManager<'r> {
    pub fn new(
        registry: &'r HandlerRegistry,
        column_index: usize,
        frame: ColumnFrame,
        note_height: f64,
    ) -> Self {
        Self {
            registry,
            column_index,
            frame,
            note_height,
            content: Vec::new(),
            current_height: 0.0,
            footnote_height: 0.0,
            footnotes: Vec::new(),
            is_full: false,
            end_reason: None,
            overflowed: false,
        }
    }

    pub fn content(&self) -> &[Block] {
        &self.content
    }

    pub fn current_height(&self) -> f64 {
        self.current_height
    }

    pub fn footnote_height(&self) -> f64 {
        self.footnote_height
    }

    pub fn end_reason(&self) -> Option<BreakReason> {
        self.end_reason
    }

    fn footnote_reservation(&self, block: &Block) -> f64 {
        block.metadata.footnotes.len() as f64 * self.note_height
    }

    /// Commit a validated block. Its footnotes must fit alongside it; a
    /// block is never committed without them.
    fn add_block(&mut self, block: Block, height: f64) -> Result<Placed, Refusal> {
        let reservation = self.footnote_reservation(&block);
        if self.current_height + height + self.footnote_height + reservation
            > self.frame.height + EPSILON
        {
            let reason = if height <= self.remaining_height() + EPSILON {
                BreakReason::FootnoteOverflow
            } else {
                BreakReason::HeightExceeded
            };
            self.mark_column_full(reason);
            return Err(Refusal { block, reason });
        }
        Ok(self.commit(block, height))
    }

    fn commit(&mut self, block: Block, height: f64) -> Placed {
        let source = block.logical_id().to_string();
        for note in &block.metadata.footnotes {
            self.footnotes.push(PendingFootnote {
                id: note.id.clone(),
                content: note.content.clone(),
                source_block_id: source.clone(),
            });
        }
        self.footnote_height += self.footnote_reservation(&block);
        self.current_height += height;
        self.content.push(block);
        Placed::Column {
            block_index: self.content.len() - 1,
        }
    }
}

impl FlowManager for StandardFlowManager<'_> {
    fn column_index(&self) -> usize {
        self.column_index
    }

    fn frame(&self) -> ColumnFrame {
        self.frame
    }

    fn remaining_height(&self) -> f64 {
        (self.frame.height - self.current_height - self.footnote_height).max(0.0)
    }

    fn available_height_for(&self, block: &Block) -> f64 {
        (self.remaining_height() - self.footnote_reservation(block)).max(0.0)
    }

    fn is_full(&self) -> bool {
        self.is_full
    }

    fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn can_place_block(&self, block: &Block, next: Option<&Block>) -> Result<f64, BreakReason> {
        if self.is_full {
            return Err(BreakReason::CannotPlace);
        }

        let height = self.registry.estimate_height(block, self.frame.width);
        let reservation = self.footnote_reservation(block);
        let remaining = self.remaining_height();

        if height + reservation > remaining + EPSILON {
            if height <= remaining + EPSILON && !block.metadata.footnotes.is_empty() {
                return Err(BreakReason::FootnoteOverflow);
            }
            if self.registry.is_atomic(&block.kind) {
                return Err(BreakReason::AtomicBlock);
            }
            // Text blocks report which line rule kept them out.
            let check =
                self.registry
                    .check_placement(block, remaining - reservation, self.frame, next);
            return Err(match check.reason {
                Some(reason) if !check.can_place => reason,
                _ => BreakReason::HeightExceeded,
            });
        }

        let rules = self.registry.rules(block);
        let lookahead = self.registry.lookahead(next, self.frame.width);
        if !keep_with_next_satisfied(height + reservation, remaining, &rules, lookahead) {
            return Err(BreakReason::KeepWithNext);
        }

        Ok(height)
    }

    fn place_block(&mut self, block: Block, next: Option<&Block>) -> Result<Placed, Refusal> {
        match self.can_place_block(&block, next) {
            Ok(height) => self.add_block(block, height),
            Err(reason) => {
                if reason == BreakReason::FootnoteOverflow {
                    self.mark_column_full(reason);
                }
                Err(Refusal { block, reason })
            }
        }
    }

    fn force_place(&mut self, block: Block) -> Placed {
        let height = self.registry.estimate_height(&block, self.frame.width);
        let placed = self.commit(block, height);
        if self.current_height + self.footnote_height > self.frame.height + EPSILON {
            self.overflowed = true;
        }
        self.mark_column_full(BreakReason::ForcedPlacement);
        placed
    }

    fn mark_column_full(&mut self, reason: BreakReason) {
        if self.is_full {
            return;
        }
        self.is_full = true;
        self.end_reason = Some(reason);
    }

    fn finish(self: Box<Self>) -> ColumnOutput {
        ColumnOutput {
            column: LayoutColumnBox {
                column_index: self.column_index,
                width: self.frame.width,
                height: self.frame.height,
                content: self.content,
                current_height: self.current_height,
                footnote_height: self.footnote_height,
                is_full: self.is_full,
                end_reason: self.end_reason,
            },
            footnotes: self.footnotes,
            sidebar_blocks: Vec::new(),
            overflowed: self.overflowed,
        }
    }
}

/// Routes sidebar callouts into a separate accumulator. They never consume
/// column height; every other block goes to the wrapped manager.
pub struct SidebarFlowManager<F> {
    inner: F,
    sidebar: Vec<Block>,
}

impl<F: FlowManager> SidebarFlowManager<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            sidebar: Vec::new(),
        }
    }

    pub fn sidebar_blocks(&self) -> &[Block] {
        &self.sidebar
    }
}

fn is_sidebar_callout(block: &Block) -> bool {
    block.kind == BlockKind::Callout && block.metadata.placement == Some(Placement::Sidebar)
}

impl<F: FlowManager> FlowManager for SidebarFlowManager<F> {
    fn column_index(&self) -> usize {
        self.inner.column_index()
    }

    fn frame(&self) -> ColumnFrame {
        self.inner.frame()
    }

    fn remaining_height(&self) -> f64 {
        self.inner.remaining_height()
    }

    fn available_height_for(&self, block: &Block) -> f64 {
        self.inner.available_height_for(block)
    }

    fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn diverts(&self, block: &Block) -> bool {
        is_sidebar_callout(block)
    }

    fn can_place_block(&self, block: &Block, next: Option<&Block>) -> Result<f64, BreakReason> {
        if is_sidebar_callout(block) {
            return Ok(0.0);
        }
        self.inner.can_place_block(block, next)
    }

    fn place_block(&mut self, block: Block, next: Option<&Block>) -> Result<Placed, Refusal> {
        if is_sidebar_callout(&block) {
            self.sidebar.push(block);
            return Ok(Placed::Sidebar);
        }
        self.inner.place_block(block, next)
    }

    fn force_place(&mut self, block: Block) -> Placed {
        if is_sidebar_callout(&block) {
            self.sidebar.push(block);
            return Placed::Sidebar;
        }
        self.inner.force_place(block)
    }

    fn mark_column_full(&mut self, reason: BreakReason) {
        self.inner.mark_column_full(reason);
    }

    fn finish(self: Box<Self>) -> ColumnOutput {
        let this = *self;
        let mut output = Box::new(this.inner).finish();
        output.sidebar_blocks.extend(this.sidebar);
        output
    }
}
