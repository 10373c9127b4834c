//! # Document Model
//!
//! The input representation for the layout engine. A document is a list of
//! sections; each section owns one or more flows of ordered content blocks and
//! the page master that governs its geometry.
//!
//! The model mirrors what the editor stores: blocks are semantic (heading,
//! paragraph, table...) rather than visual, and carry just enough metadata for
//! the engine to estimate their size and decide where they may break.
//! Blocks are never mutated by layout. Splitting derives new chunk blocks.

pub mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use rules::{PaginationRules, ResolvedRules};

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document title, used only for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Sections in reading order. Page numbering continues across them.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A run of flows sharing one page master.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub flows: Vec<Flow>,

    #[serde(default)]
    pub page_master: PageMaster,

    /// Free-form intent tag set by the editor (e.g. "report", "newsletter").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_intent: Option<String>,
}

/// An ordered stream of blocks within a section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Flow {
    /// Blocks in pour order: by `order`, ties broken by list position.
    pub fn ordered_blocks(&self) -> Vec<Block> {
        let mut blocks = self.blocks.clone();
        // sort_by_key is stable, which is what gives list position priority on ties.
        blocks.sort_by_key(|b| b.order);
        blocks
    }
}

/// A single semantic content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub content: BlockContent,

    #[serde(default)]
    pub metadata: BlockMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_rules: Option<PaginationRules>,

    /// Position within its flow.
    #[serde(default)]
    pub order: i64,
}

impl Block {
    /// Create a block with empty metadata and no rule overrides.
    pub fn new(id: impl Into<String>, kind: BlockKind, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            kind,
            content,
            metadata: BlockMetadata::default(),
            pagination_rules: None,
            order: 0,
        }
    }

    /// Create a text-bearing block (paragraph, heading, callout...).
    pub fn text(id: impl Into<String>, kind: BlockKind, text: &str) -> Self {
        Self::new(id, kind, BlockContent::Text(text.to_string()))
    }

    pub fn is_chunk(&self) -> bool {
        self.metadata.chunk.is_some()
    }

    /// The id of the input block this block stands for. Chunks resolve to
    /// the block they were split from.
    pub fn logical_id(&self) -> &str {
        match &self.metadata.chunk {
            Some(chunk) => &chunk.original_block_id,
            None => &self.id,
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.words().count()
    }
}

/// The kind of a block. Kinds the engine has no dedicated strategy for are
/// kept verbatim in [`BlockKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Heading,
    Paragraph,
    List,
    Quote,
    Figure,
    Table,
    Callout,
    Divider,
    Spacer,
    Other(String),
}

impl BlockKind {
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Quote => "quote",
            BlockKind::Figure => "figure",
            BlockKind::Table => "table",
            BlockKind::Callout => "callout",
            BlockKind::Divider => "divider",
            BlockKind::Spacer => "spacer",
            BlockKind::Other(name) => name,
        }
    }

    /// Kinds that can be targeted by cross-references.
    pub fn is_anchorable(&self) -> bool {
        matches!(self, BlockKind::Heading | BlockKind::Figure | BlockKind::Table)
    }
}

impl From<String> for BlockKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "heading" => BlockKind::Heading,
            "paragraph" => BlockKind::Paragraph,
            "list" => BlockKind::List,
            "quote" => BlockKind::Quote,
            "figure" => BlockKind::Figure,
            "table" => BlockKind::Table,
            "callout" => BlockKind::Callout,
            "divider" => BlockKind::Divider,
            "spacer" => BlockKind::Spacer,
            _ => BlockKind::Other(s),
        }
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-dependent block payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    /// Plain text: headings, paragraphs, lists, quotes, callouts.
    Text(String),
    /// Tabular data. Rows do not include the header row.
    Table(TableContent),
    /// An image reference. Dimensions live in the block metadata.
    Figure(FigureContent),
    #[default]
    Empty,
}

impl BlockContent {
    pub fn text(&self) -> &str {
        match self {
            BlockContent::Text(s) => s,
            _ => "",
        }
    }

    /// Whitespace-separated words of a text payload.
    pub fn words(&self) -> std::str::SplitWhitespace<'_> {
        self.text().split_whitespace()
    }

    pub fn table(&self) -> Option<&TableContent> {
        match self {
            BlockContent::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// An object counts as a table when it carries `headers`, `rows` or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTable")]
pub struct TableContent {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawTable {
    headers: Option<Vec<String>>,
    rows: Option<Vec<Vec<String>>>,
}

impl TryFrom<RawTable> for TableContent {
    type Error = String;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        if raw.headers.is_none() && raw.rows.is_none() {
            return Err("table content needs `headers` or `rows`".to_string());
        }
        Ok(TableContent {
            headers: raw.headers.unwrap_or_default(),
            rows: raw.rows.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Per-block metadata. The editor sets the descriptive fields; the engine
/// writes `chunk`, `is_oversized` and `oversized_policy` on derived blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadata {
    /// Heading level (1 = H1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<FootnoteSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,

    /// Intrinsic width in inches (figures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Intrinsic height in inches (figures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Explicit cross-reference target id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Present only on blocks produced by splitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkInfo>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_oversized: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oversized_policy: Option<OversizedPolicy>,
}

/// A footnote attached to a block, before numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootnoteSource {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Inline,
    Sidebar,
}

/// Identifies a block as one piece of a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub index: usize,
    pub total: usize,
    pub original_block_id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_table_chunk: bool,
    /// Renderers redraw the table header on this chunk.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_header_repeat: bool,
}

/// What should eventually happen to an element wider than its column.
/// Only recorded on the block; the engine does not act on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OversizedPolicy {
    #[default]
    Scale,
    Landscape,
    DedicatedPage,
}

impl OversizedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversizedPolicy::Scale => "scale",
            OversizedPolicy::Landscape => "landscape",
            OversizedPolicy::DedicatedPage => "dedicated-page",
        }
    }
}

// ── Page geometry ───────────────────────────────────────────────

/// Page geometry for a section. All lengths are in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMaster {
    #[serde(default)]
    pub page_size: PageSize,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default = "default_margins")]
    pub margins: Edges,

    #[serde(default = "default_columns")]
    pub columns: u32,

    #[serde(default = "default_column_gap")]
    pub column_gap: f64,

    #[serde(default)]
    pub has_header: bool,

    #[serde(default)]
    pub has_footer: bool,

    /// Passed through for renderers that snap lines to a baseline grid.
    #[serde(default)]
    pub baseline_grid: bool,

    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f64,

    /// Oversized tables on this master are tagged for landscape rotation.
    #[serde(default)]
    pub allow_table_rotation: bool,
}

impl Default for PageMaster {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            orientation: Orientation::Portrait,
            margins: default_margins(),
            columns: default_columns(),
            column_gap: default_column_gap(),
            has_header: false,
            has_footer: false,
            baseline_grid: false,
            grid_spacing: default_grid_spacing(),
            allow_table_rotation: false,
        }
    }
}

fn default_margins() -> Edges {
    Edges::uniform(1.0)
}

fn default_columns() -> u32 {
    1
}

fn default_column_gap() -> f64 {
    0.25
}

fn default_grid_spacing() -> f64 {
    0.167
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    Legal,
    Tabloid,
}

impl PageSize {
    /// Returns portrait (width, height) in inches.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (8.5, 11.0),
            PageSize::A4 => (8.27, 11.69),
            PageSize::Legal => (8.5, 14.0),
            PageSize::Tabloid => (11.0, 17.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}
