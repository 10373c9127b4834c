//! # Folio
//!
//! A pour-and-paginate layout engine for semantic documents.
//!
//! A document arrives as sections of ordered blocks (headings, paragraphs,
//! figures, tables, callouts) plus a page master describing paper size,
//! margins and columns. Folio decides which block lands on which page and in
//! which column, splitting paragraphs between lines and tables between rows,
//! keeping headings with what follows them and reserving room for footnotes.
//!
//! Nothing is rendered here. The output is a tree of pages and columns that
//! a renderer paints, plus an anchor table for cross-references.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Document, sections, flows, blocks, page masters
//!       ↓
//!   [content]  — One handler per block kind: heights, splits, rules
//!       ↓
//!   [layout]   — Pour blocks into columns, page by page
//!       ↓
//! DocumentLayout (pages, anchors, statistics)
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod layout;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::EngineConfig;
pub use content::{BreakReason, ContentHandler, HandlerRegistry, PlacementResult};
pub use error::FolioError;
pub use layout::{DocumentLayout, LayoutColumnBox, LayoutPageBox, PourAndPaginateEngine};
pub use model::{Block, BlockKind, Document, PageMaster, Section};

/// Lay out a document with the default configuration.
///
/// This is the primary entry point.
pub fn paginate(document: &Document) -> Result<DocumentLayout, FolioError> {
    PourAndPaginateEngine::new().layout(document)
}

/// Lay out a document with an explicit configuration.
pub fn paginate_with(
    document: &Document,
    config: &EngineConfig,
) -> Result<DocumentLayout, FolioError> {
    PourAndPaginateEngine::with_config(config.clone()).layout(document)
}

/// Lay out a document described as JSON.
pub fn paginate_json(json: &str) -> Result<DocumentLayout, FolioError> {
    let document: Document = serde_json::from_str(json)?;
    paginate(&document)
}
