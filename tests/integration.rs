//! Integration tests for the Folio pagination pipeline.
//!
//! These tests exercise the full path from document JSON to page layout.
//! They verify:
//! - JSON deserialization of editor documents
//! - Blocks land on the expected pages and columns
//! - Paragraphs and tables split where they should
//! - Footnotes, anchors and sidebars are reported
//! - Failure modes surface as typed errors

use folio::content::{ColumnFrame, ContentHandler, Lookahead, PlacementResult};
use folio::layout::LayoutPageBox;
use folio::model::*;
use folio::*;

// ─── Helpers ────────────────────────────────────────────────────

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

fn make_paragraph(id: &str, n: usize) -> Block {
    Block::text(id, BlockKind::Paragraph, &words(n))
}

fn make_heading(id: &str, level: u8, text: &str) -> Block {
    let mut block = Block::text(id, BlockKind::Heading, text);
    block.metadata.level = Some(level);
    block
}

fn make_figure(id: &str, height: f64) -> Block {
    let mut block = Block::new(
        id,
        BlockKind::Figure,
        BlockContent::Figure(FigureContent::default()),
    );
    block.metadata.height = Some(height);
    block
}

fn make_table(id: &str, rows: usize) -> Block {
    Block::new(
        id,
        BlockKind::Table,
        BlockContent::Table(TableContent {
            headers: vec!["Name".into(), "Value".into()],
            rows: (0..rows)
                .map(|r| vec![format!("row {}", r), r.to_string()])
                .collect(),
        }),
    )
}

fn make_section(master: PageMaster, blocks: Vec<Block>) -> Section {
    let blocks = blocks
        .into_iter()
        .enumerate()
        .map(|(i, mut b)| {
            b.order = i as i64;
            b
        })
        .collect();
    Section {
        flows: vec![Flow { blocks }],
        page_master: master,
        layout_intent: None,
    }
}

fn default_doc(blocks: Vec<Block>) -> Document {
    Document {
        title: Some("Test".into()),
        sections: vec![make_section(PageMaster::default(), blocks)],
    }
}

fn column_ids(page: &LayoutPageBox, column: usize) -> Vec<String> {
    page.column_boxes[column]
        .content
        .iter()
        .map(|b| b.id.clone())
        .collect()
}

// ─── Scenarios ──────────────────────────────────────────────────

#[test]
fn test_single_paragraph_single_page() {
    let json = format!(
        r#"{{
          "sections": [{{
            "pageMaster": {{
              "pageSize": "Letter",
              "margins": {{ "top": 1, "right": 1, "bottom": 1, "left": 1 }},
              "columns": 1
            }},
            "flows": [{{ "blocks": [
              {{ "id": "p1", "type": "paragraph", "order": 0, "content": "{}" }}
            ] }}]
          }}]
        }}"#,
        words(100)
    );
    let layout = paginate_json(&json).unwrap();
    assert_eq!(layout.total_pages, 1);
    assert_eq!(layout.pages[0].column_boxes.len(), 1);
    assert_eq!(column_ids(&layout.pages[0], 0), vec!["p1"]);
    assert!(!layout.has_overflow);
    assert!(layout.placed_blocks().all(|b| !b.is_chunk()));
}

#[test]
fn test_lone_heading_on_first_page() {
    let layout = paginate(&default_doc(vec![make_heading("h1", 1, "Introduction")])).unwrap();
    let page = &layout.pages[0];
    assert_eq!(page.page_number, 1);
    assert_eq!(column_ids(page, 0), vec!["h1"]);
    assert!(!page.column_boxes[0].is_full);

    let anchor = layout.anchors.find_by_block("h1").unwrap();
    assert_eq!((anchor.page_number, anchor.column_index, anchor.block_index), (1, 0, 0));
    assert_eq!(anchor.title.as_deref(), Some("Introduction"));
}

#[test]
fn test_table_split_repeats_header() {
    // A 5.7in figure plus padding leaves room for exactly 10 rows.
    let layout = paginate(&default_doc(vec![
        make_figure("fig", 5.7),
        make_table("tbl", 20),
    ]))
    .unwrap();
    assert_eq!(layout.total_pages, 2);

    let first = &layout.pages[0].column_boxes[0].content[1];
    let info = first.metadata.chunk.as_ref().unwrap();
    assert_eq!(first.content.table().unwrap().rows.len(), 10);
    assert!(info.has_header_repeat && info.is_table_chunk);
    assert_eq!(info.index, 0);

    let second = &layout.pages[1].column_boxes[0].content[0];
    let info = second.metadata.chunk.as_ref().unwrap();
    assert_eq!(second.content.table().unwrap().rows.len(), 10);
    assert_eq!(second.content.table().unwrap().headers, vec!["Name", "Value"]);
    assert_eq!((info.index, info.total), (1, 2));
    assert_eq!(second.id, "tbl::chunk-1");
}

#[test]
fn test_sidebar_callout_leaves_columns() {
    let json = r#"{
      "sections": [{
        "pageMaster": { "columns": 2 },
        "flows": [{ "blocks": [
          { "id": "intro", "type": "paragraph", "order": 0, "content": "Opening words." },
          { "id": "tip", "type": "callout", "order": 1, "content": "Side note.",
            "metadata": { "placement": "sidebar" } }
        ] }]
      }]
    }"#;
    let document: Document = serde_json::from_str(json).unwrap();
    let config = EngineConfig {
        enable_sidebar_flow: true,
        ..Default::default()
    };
    let layout = paginate_with(&document, &config).unwrap();
    let page = &layout.pages[0];
    assert!(!column_ids(page, 0).contains(&"tip".to_string()));
    let sidebar = page.sidebar_blocks.as_ref().unwrap();
    assert_eq!(sidebar.len(), 1);
    assert_eq!(sidebar[0].id, "tip");
}

// ─── Flow behavior ──────────────────────────────────────────────

#[test]
fn test_multi_column_fills_left_to_right() {
    let master = PageMaster {
        columns: 3,
        ..Default::default()
    };
    let blocks = (0..6).map(|i| make_figure(&format!("f{}", i), 5.0)).collect();
    let document = Document {
        title: None,
        sections: vec![make_section(master, blocks)],
    };
    let layout = paginate(&document).unwrap();
    assert_eq!(layout.total_pages, 2);
    for page in &layout.pages {
        assert_eq!(page.column_boxes.len(), 3);
        for (i, column) in page.column_boxes.iter().enumerate() {
            assert_eq!(column.column_index, i);
            assert_eq!(column.content.len(), 1);
            assert!((column.width - 2.0).abs() < 1e-9);
        }
    }
    assert_eq!(column_ids(&layout.pages[1], 2), vec!["f5"]);
}

#[test]
fn test_orphan_control_moves_paragraph() {
    // Leave a single line of room: two orphan lines are required.
    let figure_height = 9.0 - 0.2 - 0.2;
    let layout = paginate(&default_doc(vec![
        make_figure("fig", figure_height),
        make_paragraph("p", 200),
    ]))
    .unwrap();
    assert_eq!(column_ids(&layout.pages[0], 0), vec!["fig"]);
    assert_eq!(
        layout.pages[0].column_boxes[0].end_reason,
        Some(BreakReason::OrphanControl)
    );
    assert_eq!(column_ids(&layout.pages[1], 0), vec!["p"]);
}

#[test]
fn test_split_paragraph_keeps_every_word() {
    let layout = paginate(&default_doc(vec![
        make_heading("h", 1, "Long read"),
        make_paragraph("p", 2500),
    ]))
    .unwrap();
    assert!(layout.total_pages >= 4);

    let chunks: Vec<&Block> = layout
        .placed_blocks()
        .filter(|b| b.logical_id() == "p")
        .collect();
    let joined: Vec<&str> = chunks.iter().flat_map(|b| b.content.words()).collect();
    assert_eq!(joined.join(" "), words(2500));
    for (i, chunk) in chunks.iter().enumerate() {
        let info = chunk.metadata.chunk.as_ref().unwrap();
        assert_eq!(info.index, i);
        assert_eq!(info.total, chunks.len());
        assert_eq!(chunk.id, format!("p::chunk-{}", i));
    }
    assert_eq!(layout.statistics.splits, chunks.len() - 1);
}

#[test]
fn test_footnotes_numbered_in_order_with_sources() {
    let mut a = make_paragraph("a", 30);
    a.metadata.footnotes = vec![
        FootnoteSource { id: "fa1".into(), content: "First".into() },
        FootnoteSource { id: "fa2".into(), content: "Second".into() },
    ];
    let mut b = make_paragraph("b", 30);
    b.metadata.footnotes = vec![FootnoteSource { id: "fb".into(), content: "Third".into() }];

    let layout = paginate(&default_doc(vec![a, b])).unwrap();
    let page = &layout.pages[0];
    let notes: Vec<(usize, &str, &str)> = page
        .footnotes
        .iter()
        .map(|n| (n.number, n.id.as_str(), n.source_block_id.as_str()))
        .collect();
    assert_eq!(notes, vec![(1, "fa1", "a"), (2, "fa2", "a"), (3, "fb", "b")]);
    assert!((page.footnote_height - 0.75).abs() < 1e-9);
    let column = &page.column_boxes[0];
    assert!(column.current_height + column.footnote_height <= column.height + 0.001);
}

#[test]
fn test_footnote_overflow_ends_column() {
    let mut small = make_figure("small", 0.1);
    small.metadata.footnotes = vec![FootnoteSource { id: "fs".into(), content: "Source".into() }];

    let layout = paginate(&default_doc(vec![make_figure("big", 8.4), small])).unwrap();
    assert_eq!(layout.total_pages, 2);
    assert_eq!(column_ids(&layout.pages[0], 0), vec!["big"]);
    assert_eq!(
        layout.pages[0].column_boxes[0].end_reason,
        Some(BreakReason::FootnoteOverflow)
    );
    assert!(layout.pages[0].footnotes.is_empty());
    assert_eq!(column_ids(&layout.pages[1], 0), vec!["small"]);
    assert_eq!(layout.pages[1].footnotes[0].source_block_id, "small");
    assert!(!layout.has_overflow);
}

#[test]
fn test_sections_continue_page_numbers_and_anchor() {
    let mut second = make_heading("h2", 2, "Appendix");
    second.metadata.anchor_id = Some("appendix".into());
    let landscape = PageMaster {
        orientation: Orientation::Landscape,
        ..Default::default()
    };
    let document = Document {
        title: None,
        sections: vec![
            make_section(PageMaster::default(), vec![make_paragraph("p", 1000)]),
            make_section(landscape, vec![second]),
        ],
    };
    let layout = paginate(&document).unwrap();
    assert_eq!(layout.total_pages, 3);
    assert_eq!(layout.anchors.page_of("appendix"), Some(3));
    assert_eq!(layout.pages[2].page_master.orientation, Orientation::Landscape);
    assert!((layout.pages[2].column_boxes[0].height - 6.5).abs() < 1e-9);
}

#[test]
fn test_forced_placement_sets_overflow() {
    let layout = paginate(&default_doc(vec![
        make_paragraph("before", 10),
        make_figure("poster", 20.0),
        make_paragraph("after", 10),
    ]))
    .unwrap();
    assert_eq!(layout.total_pages, 3);
    assert!(layout.has_overflow);
    let overflowing: Vec<usize> = layout
        .pages
        .iter()
        .filter(|p| p.has_overflow)
        .map(|p| p.page_number)
        .collect();
    assert_eq!(overflowing, vec![2]);
    assert_eq!(layout.statistics.forced_placements, 1);
}

// ─── Errors ─────────────────────────────────────────────────────

#[test]
fn test_stalled_layout_is_an_error() {
    let config = EngineConfig {
        force_place_unfittable: false,
        ..Default::default()
    };
    let err = paginate_with(&default_doc(vec![make_figure("poster", 20.0)]), &config).unwrap_err();
    assert!(matches!(err, FolioError::LayoutStalled { ref block_id, .. } if block_id == "poster"));
}

#[test]
fn test_page_cap_is_an_error() {
    let config = EngineConfig {
        max_pages_per_section: 2,
        ..Default::default()
    };
    let blocks = (0..5).map(|i| make_figure(&format!("f{}", i), 6.0)).collect();
    let err = paginate_with(&default_doc(blocks), &config).unwrap_err();
    match err {
        FolioError::LayoutResourceExhausted {
            section,
            max_pages,
            remaining_blocks,
        } => {
            assert_eq!((section, max_pages, remaining_blocks), (0, 2, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bad_json_reports_hint() {
    let err = paginate_json(r#"{ "sections": [ { "flows": [], } ] }"#).unwrap_err();
    assert!(matches!(err, FolioError::ParseError { .. }));
    assert!(err.to_string().contains("trailing commas"));
}

#[test]
fn test_invalid_config_is_rejected_before_layout() {
    let config = EngineConfig {
        max_steps: 0,
        ..Default::default()
    };
    let err = paginate_with(&default_doc(vec![]), &config).unwrap_err();
    assert!(matches!(err, FolioError::InvalidConfig(_)));
}

// ─── Extension ──────────────────────────────────────────────────

/// Pull quotes: one fixed inch, never split.
struct PullQuoteHandler;

impl ContentHandler for PullQuoteHandler {
    fn is_atomic(&self) -> bool {
        true
    }

    fn estimate_height(&self, _block: &Block, _column_width: f64) -> f64 {
        1.0
    }

    fn check_placement_rules(
        &self,
        _block: &Block,
        remaining_height: f64,
        _column: ColumnFrame,
        _next: Option<Lookahead<'_>>,
    ) -> PlacementResult {
        if remaining_height + 0.001 >= 1.0 {
            PlacementResult::place()
        } else {
            PlacementResult::refuse(BreakReason::AtomicBlock)
        }
    }
}

#[test]
fn test_registered_handler_drives_layout() {
    let kind = BlockKind::from("pull-quote".to_string());
    let mut engine = PourAndPaginateEngine::new();
    assert!(!engine.registry().is_registered(&kind));
    engine.registry_mut().register(kind.clone(), PullQuoteHandler);

    let blocks = (0..10)
        .map(|i| Block::text(format!("q{}", i), kind.clone(), &words(500)))
        .collect();
    let layout = engine.layout(&default_doc(blocks)).unwrap();
    // Nine one-inch quotes per 9in column
    assert_eq!(layout.total_pages, 2);
    assert_eq!(layout.pages[0].column_boxes[0].content.len(), 9);
    assert!(layout.placed_blocks().all(|b| !b.is_chunk()));
}

#[test]
fn test_unknown_kinds_flow_as_text() {
    let json = r#"{
      "sections": [{ "flows": [{ "blocks": [
        { "id": "eq", "type": "equation", "content": "E equals m c squared" }
      ] }] }]
    }"#;
    let layout = paginate_json(json).unwrap();
    let block = &layout.pages[0].column_boxes[0].content[0];
    assert_eq!(block.kind, BlockKind::Other("equation".into()));
    let out = serde_json::to_value(&layout).unwrap();
    assert_eq!(out["pages"][0]["columnBoxes"][0]["content"][0]["type"], "equation");
    assert_eq!(out["totalPages"], 1);
}
