//! # Pour-and-Paginate Engine
//!
//! This is the heart of Folio.
//!
//! Pages are never sliced out of a tall canvas after the fact. Each section's
//! blocks sit in a queue and are poured into fixed-size columns:
//!
//! 1. Open a page with known column geometry
//! 2. Pop the next block and ask its content handler: "does this fit here?"
//!    (with one block of lookahead for keep-with-next)
//! 3. If it fits: commit it to the column
//! 4. If it fits only once split: commit the first chunk, put the rest back
//!    at the front of the queue in order
//! 5. If it does not fit: the column is full; the block waits for the next
//!    column, or the next page
//! 6. A block that does not fit even an empty column is forced in and the
//!    page is flagged as overflowing (or the run fails, if configured)
//!
//! Placement is greedy and never backtracks. That matches how word
//! processors paginate, and it means widow/orphan decisions are local to
//! each break rather than optimized across the section.

pub mod anchors;
pub mod flow;
pub mod geometry;
pub mod page_break;

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::content::{chunk_id, BreakReason, FigureHandler, HandlerRegistry, TableHandler};
use crate::content::figure::OVERSIZE_FACTOR;
use crate::error::FolioError;
use crate::model::{Block, BlockKind, Document, OversizedPolicy, PageMaster, Section};

use anchors::{AnchorRecord, AnchorTracker};
use flow::{FlowManager, Placed, SidebarFlowManager, StandardFlowManager};
use geometry::PageGeometry;

// ── Layout output ───────────────────────────────────────────────

/// The result of laying out a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLayout {
    pub pages: Vec<LayoutPageBox>,
    pub total_pages: usize,
    /// At least one page holds a block that exceeded its column.
    pub has_overflow: bool,
    pub anchors: AnchorTracker,
    pub statistics: LayoutStatistics,
}

impl DocumentLayout {
    /// Every block placed in a column, in reading order.
    pub fn placed_blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages
            .iter()
            .flat_map(|p| p.column_boxes.iter())
            .flat_map(|c| c.content.iter())
    }
}

/// A laid-out page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPageBox {
    pub page_number: usize,
    pub page_master: PageMaster,
    pub column_boxes: Vec<LayoutColumnBox>,
    pub footnotes: Vec<FootnoteEntry>,
    /// Height of the tallest per-column footnote band.
    pub footnote_height: f64,
    pub has_overflow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_blocks: Option<Vec<Block>>,
}

/// A laid-out column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutColumnBox {
    pub column_index: usize,
    pub width: f64,
    pub height: f64,
    /// Placed blocks (including split chunks) in placement order.
    pub content: Vec<Block>,
    pub current_height: f64,
    pub footnote_height: f64,
    pub is_full: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<BreakReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootnoteEntry {
    pub id: String,
    /// Running number across the whole document, starting at 1.
    pub number: usize,
    pub content: String,
    pub source_block_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutStatistics {
    /// Input blocks taken from the document's flows.
    pub blocks_processed: usize,
    pub pages_generated: usize,
    pub splits: usize,
    pub footnotes: usize,
    pub forced_placements: usize,
    pub oversized_elements: usize,
    pub sidebar_blocks: usize,
}

// ── Engine ──────────────────────────────────────────────────────

/// The pour-and-paginate engine. Holds only configuration and content
/// handlers; every run gets fresh statistics and a fresh anchor table, so
/// one engine can serve any number of runs, including concurrent ones.
pub struct PourAndPaginateEngine {
    config: EngineConfig,
    registry: HandlerRegistry,
}

impl Default for PourAndPaginateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PourAndPaginateEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_registry(config, HandlerRegistry::with_defaults())
    }

    pub fn with_registry(config: EngineConfig, registry: HandlerRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Mutable access for registering handlers between runs.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Main entry point: lay out every section of a document. Page numbers
    /// continue from one section to the next.
    pub fn layout(&self, document: &Document) -> Result<DocumentLayout, FolioError> {
        self.config.validate()?;
        let mut pass = LayoutPass::new(self, 1);
        for (index, section) in document.sections.iter().enumerate() {
            pass.run_section(index, section)?;
        }
        let layout = pass.finish();
        tracing::info!(
            title = document.title.as_deref().unwrap_or(""),
            pages = layout.total_pages,
            splits = layout.statistics.splits,
            overflow = layout.has_overflow,
            "layout complete"
        );
        Ok(layout)
    }

    /// Lay out a single section, numbering its pages from
    /// `first_page_number`.
    pub fn layout_section(
        &self,
        section: &Section,
        first_page_number: usize,
    ) -> Result<DocumentLayout, FolioError> {
        self.config.validate()?;
        let mut pass = LayoutPass::new(self, first_page_number);
        pass.run_section(0, section)?;
        Ok(pass.finish())
    }

    /// Flatten a section's flows into pour order, fill in default pagination
    /// rules and tag elements too wide for their column.
    pub fn preprocess(&self, section: &Section, geometry: &PageGeometry) -> Vec<Block> {
        section
            .flows
            .iter()
            .flat_map(|flow| flow.ordered_blocks())
            .map(|block| self.preprocess_block(block, section, geometry))
            .collect()
    }

    fn preprocess_block(&self, mut block: Block, section: &Section, geometry: &PageGeometry) -> Block {
        let defaults = self.registry.default_rules(&block.kind);
        block.pagination_rules = Some(
            block
                .pagination_rules
                .take()
                .unwrap_or_default()
                .merged_over(&defaults),
        );

        let width = match block.kind {
            BlockKind::Table => TableHandler::estimate_width(&block),
            BlockKind::Figure => FigureHandler::estimate_width(&block),
            _ => 0.0,
        };
        if width > geometry.column_width * OVERSIZE_FACTOR {
            let policy = if block.kind == BlockKind::Table && section.page_master.allow_table_rotation {
                OversizedPolicy::Landscape
            } else {
                self.config.oversized_element_policy
            };
            tracing::warn!(
                block = %block.id,
                width,
                column_width = geometry.column_width,
                policy = policy.as_str(),
                "oversized element"
            );
            block.metadata.is_oversized = true;
            block.metadata.oversized_policy = Some(policy);
        }
        block
    }

    fn new_flow(&self, column_index: usize, geometry: &PageGeometry) -> Box<dyn FlowManager + '_> {
        let standard = StandardFlowManager::new(
            &self.registry,
            column_index,
            geometry.frame(),
            self.config.footnote_height,
        );
        if self.config.enable_sidebar_flow {
            Box::new(SidebarFlowManager::new(standard))
        } else {
            Box::new(standard)
        }
    }
}

/// An anchor waiting for its block to be committed.
struct PendingAnchor {
    anchor_id: String,
    kind: BlockKind,
    block_id: String,
    title: Option<String>,
}

/// State of one layout run.
struct LayoutPass<'e> {
    engine: &'e PourAndPaginateEngine,
    pages: Vec<LayoutPageBox>,
    anchors: AnchorTracker,
    stats: LayoutStatistics,
    next_page_number: usize,
    footnote_number: usize,
    steps: usize,
}

impl<'e> LayoutPass<'e> {
    fn new(engine: &'e PourAndPaginateEngine, first_page_number: usize) -> Self {
        Self {
            engine,
            pages: Vec::new(),
            anchors: AnchorTracker::new(),
            stats: LayoutStatistics::default(),
            next_page_number: first_page_number,
            footnote_number: 0,
            steps: 0,
        }
    }

    fn run_section(&mut self, index: usize, section: &Section) -> Result<(), FolioError> {
        let geometry = PageGeometry::from_master(&section.page_master)
            .map_err(|message| FolioError::InvalidPageMaster {
                section: index,
                message,
            })?;

        let blocks = self.engine.preprocess(section, &geometry);
        self.stats.blocks_processed += blocks.len();
        self.stats.oversized_elements += blocks.iter().filter(|b| b.metadata.is_oversized).count();
        let mut queue: VecDeque<Block> = blocks.into();

        tracing::debug!(
            section = index,
            intent = section.layout_intent.as_deref().unwrap_or(""),
            blocks = queue.len(),
            columns = geometry.columns,
            column_width = geometry.column_width,
            column_height = geometry.column_height,
            "laying out section"
        );

        let max_pages = self.engine.config.max_pages_per_section;
        let mut pages_in_section = 0;
        while !queue.is_empty() {
            if pages_in_section >= max_pages {
                return Err(FolioError::LayoutResourceExhausted {
                    section: index,
                    max_pages,
                    remaining_blocks: queue.len(),
                });
            }
            let page = self.layout_page(section, &geometry, &mut queue)?;
            self.pages.push(page);
            pages_in_section += 1;
        }
        Ok(())
    }

    fn layout_page(
        &mut self,
        section: &Section,
        geometry: &PageGeometry,
        queue: &mut VecDeque<Block>,
    ) -> Result<LayoutPageBox, FolioError> {
        let page_number = self.next_page_number;
        self.next_page_number += 1;
        self.stats.pages_generated += 1;

        let mut column_boxes = Vec::with_capacity(geometry.columns);
        let mut footnotes = Vec::new();
        let mut sidebar = Vec::new();
        let mut has_overflow = false;

        let engine = self.engine;
        for column_index in 0..geometry.columns {
            let mut flow = engine.new_flow(column_index, geometry);
            if !queue.is_empty() {
                self.fill_column(flow.as_mut(), queue, page_number)?;
            }
            let output = flow.finish();
            has_overflow |= output.overflowed;
            for note in output.footnotes {
                self.footnote_number += 1;
                footnotes.push(FootnoteEntry {
                    id: note.id,
                    number: self.footnote_number,
                    content: note.content,
                    source_block_id: note.source_block_id,
                });
            }
            sidebar.extend(output.sidebar_blocks);
            column_boxes.push(output.column);
        }

        self.stats.footnotes += footnotes.len();
        self.stats.sidebar_blocks += sidebar.len();
        let footnote_height = column_boxes
            .iter()
            .map(|c| c.footnote_height)
            .fold(0.0, f64::max);

        Ok(LayoutPageBox {
            page_number,
            page_master: section.page_master.clone(),
            column_boxes,
            footnotes,
            footnote_height,
            has_overflow,
            sidebar_blocks: if sidebar.is_empty() { None } else { Some(sidebar) },
        })
    }

    /// Pour blocks from the queue into one column until it is full or the
    /// queue runs dry.
    fn fill_column(
        &mut self,
        flow: &mut dyn FlowManager,
        queue: &mut VecDeque<Block>,
        page_number: usize,
    ) -> Result<(), FolioError> {
        let engine = self.engine;
        let registry = &engine.registry;
        let frame = flow.frame();

        while let Some(block) = queue.pop_front() {
            self.tick()?;

            if flow.diverts(&block) {
                if let Err(refusal) = flow.place_block(block, None) {
                    self.reject(flow, queue, refusal.block, refusal.reason, page_number)?;
                    break;
                }
                continue;
            }

            let available = flow.available_height_for(&block);
            let check = {
                let next = queue.iter().find(|b| !flow.diverts(b));
                registry.check_placement(&block, available, frame, next)
            };

            if !check.can_place {
                let reason = if self.fits_without_footnotes(flow, &block, queue) {
                    BreakReason::FootnoteOverflow
                } else {
                    check.reason.unwrap_or(BreakReason::CannotPlace)
                };
                self.reject(flow, queue, block, reason, page_number)?;
                break;
            }

            let block = if check.must_split {
                let mut pieces = registry.split(&block, available, frame);
                if pieces.len() < 2 {
                    self.reject(flow, queue, block, BreakReason::CannotPlace, page_number)?;
                    break;
                }
                self.stats.splits += 1;
                tracing::debug!(
                    block = %block.id,
                    pieces = pieces.len(),
                    page = page_number,
                    column = flow.column_index(),
                    "split block"
                );
                let first = pieces.remove(0);
                for piece in pieces.into_iter().rev() {
                    queue.push_front(piece);
                }
                first
            } else {
                block
            };

            let anchor = self.pending_anchor(&block);
            let placed = {
                let next = queue.iter().find(|b| !flow.diverts(b));
                flow.place_block(block, next)
            };
            match placed {
                Ok(placed) => self.record_anchor(anchor, placed, page_number, flow.column_index()),
                Err(refusal) => {
                    self.reject(flow, queue, refusal.block, refusal.reason, page_number)?;
                    break;
                }
            }
        }
        Ok(())
    }

    /// The block would go in whole if its footnotes took no room.
    fn fits_without_footnotes(
        &self,
        flow: &dyn FlowManager,
        block: &Block,
        queue: &VecDeque<Block>,
    ) -> bool {
        if block.metadata.footnotes.is_empty() {
            return false;
        }
        let next = queue.iter().find(|b| !flow.diverts(b));
        let check = self
            .engine
            .registry
            .check_placement(block, flow.remaining_height(), flow.frame(), next);
        check.can_place && !check.must_split
    }

    /// Handle a block the column will not take. An empty column forces it
    /// in (no later column is any larger); otherwise it goes back to the
    /// queue and the column ends.
    fn reject(
        &mut self,
        flow: &mut dyn FlowManager,
        queue: &mut VecDeque<Block>,
        block: Block,
        reason: BreakReason,
        page_number: usize,
    ) -> Result<(), FolioError> {
        if flow.is_empty() {
            if !self.engine.config.force_place_unfittable {
                return Err(FolioError::LayoutStalled {
                    block_id: block.id,
                    page_number,
                });
            }
            tracing::warn!(
                block = %block.id,
                reason = reason.as_str(),
                page = page_number,
                column = flow.column_index(),
                "block does not fit an empty column; forcing placement"
            );
            self.stats.forced_placements += 1;
            let anchor = self.pending_anchor(&block);
            let placed = flow.force_place(block);
            self.record_anchor(anchor, placed, page_number, flow.column_index());
            return Ok(());
        }

        tracing::debug!(
            block = %block.id,
            reason = reason.as_str(),
            page = page_number,
            column = flow.column_index(),
            "column full"
        );
        queue.push_front(block);
        flow.mark_column_full(reason);
        Ok(())
    }

    fn tick(&mut self) -> Result<(), FolioError> {
        self.steps += 1;
        let budget = self.engine.config.max_steps;
        if self.steps > budget {
            return Err(FolioError::StepBudgetExceeded { budget });
        }
        Ok(())
    }

    fn pending_anchor(&self, block: &Block) -> Option<PendingAnchor> {
        if !block.kind.is_anchorable() {
            return None;
        }
        // Only the first piece of a split table is a reference target.
        if block.metadata.chunk.as_ref().is_some_and(|c| c.index != 0) {
            return None;
        }
        let block_id = block.logical_id().to_string();
        let anchor_id = block
            .metadata
            .anchor_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", block.kind, block_id));
        Some(PendingAnchor {
            anchor_id,
            kind: block.kind.clone(),
            block_id,
            title: self.engine.registry.anchor_title(block),
        })
    }

    fn record_anchor(
        &mut self,
        anchor: Option<PendingAnchor>,
        placed: Placed,
        page_number: usize,
        column_index: usize,
    ) {
        let (Some(anchor), Placed::Column { block_index }) = (anchor, placed) else {
            return;
        };
        self.anchors.register(AnchorRecord {
            anchor_id: anchor.anchor_id,
            kind: anchor.kind,
            block_id: anchor.block_id,
            page_number,
            column_index,
            block_index,
            title: anchor.title,
        });
    }

    fn finish(mut self) -> DocumentLayout {
        renumber_chunks(&mut self.pages);
        let has_overflow = self.pages.iter().any(|p| p.has_overflow);
        DocumentLayout {
            total_pages: self.pages.len(),
            pages: self.pages,
            has_overflow,
            anchors: self.anchors,
            statistics: self.stats,
        }
    }
}

/// Number every chunk group 0..N-1 in output order. Re-splitting a
/// continuation during layout can leave gaps or stale totals behind.
fn renumber_chunks(pages: &mut [LayoutPageBox]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for block in pages
        .iter_mut()
        .flat_map(|p| p.column_boxes.iter_mut())
        .flat_map(|c| c.content.iter_mut())
    {
        if let Some(chunk) = block.metadata.chunk.as_mut() {
            let next = counts.entry(chunk.original_block_id.clone()).or_insert(0);
            chunk.index = *next;
            *next += 1;
            block.id = chunk_id(&chunk.original_block_id, chunk.index);
        }
    }

    for block in pages
        .iter_mut()
        .flat_map(|p| p.column_boxes.iter_mut())
        .flat_map(|c| c.content.iter_mut())
    {
        if let Some(chunk) = block.metadata.chunk.as_mut() {
            chunk.total = counts[&chunk.original_block_id];
        }
    }
}
