//! # Folio CLI
//!
//! Usage:
//!   folio document.json -o layout.json
//!   echo '{ ... }' | folio --config engine.json
//!   folio --example > report.json
//!
//! Diagnostics go to stderr; set `RUST_LOG=folio=debug` to trace every
//! column break and split.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use folio::{Document, EngineConfig, PourAndPaginateEngine};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    if let Err(message) = run(&args) {
        eprintln!("✗ {}", message);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let input = match input_path(args) {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input file {}: {}", path, e))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buf
        }
    };

    let config = match flag_value(args, "--config") {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path, e))?;
            EngineConfig::from_json(&json).map_err(|e| format!("Invalid config: {}", e))?
        }
        None => EngineConfig::default(),
    };

    let document: Document = serde_json::from_str(&input)
        .map_err(|e| folio::FolioError::from(e).to_string())?;
    let layout = PourAndPaginateEngine::with_config(config)
        .layout(&document)
        .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&layout)
        .map_err(|e| format!("Failed to serialize layout: {}", e))?;

    match flag_value(args, "-o") {
        Some(path) => {
            fs::write(path, &json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
            eprintln!(
                "✓ Laid out {} page(s) to {}{}",
                layout.total_pages,
                path,
                if layout.has_overflow { " (with overflow)" } else { "" }
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).map_err(|e| format!("Failed to write stdout: {}", e))?;
        }
    }
    Ok(())
}

/// Flags that consume the argument after them.
const VALUE_FLAGS: [&str; 2] = ["-o", "--config"];

/// The first argument that is neither a flag nor a flag's value.
fn input_path(args: &[String]) -> Option<&str> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with('-') {
            return Some(arg.as_str());
        }
    }
    None
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn example_report_json() -> &'static str {
    r##"{
  "title": "Quarterly Field Report",
  "sections": [
    {
      "layoutIntent": "report",
      "pageMaster": {
        "pageSize": "Letter",
        "orientation": "portrait",
        "margins": { "top": 1.0, "right": 1.0, "bottom": 1.0, "left": 1.0 },
        "columns": 2,
        "columnGap": 0.25,
        "hasHeader": true,
        "hasFooter": true
      },
      "flows": [
        {
          "blocks": [
            {
              "id": "h-summary",
              "type": "heading",
              "order": 0,
              "content": "Summary",
              "metadata": { "level": 1, "anchorId": "summary" }
            },
            {
              "id": "p-summary",
              "type": "paragraph",
              "order": 1,
              "content": "Field teams completed inspections at all twelve sites this quarter. Water quality stayed within limits at ten of them; the remaining two are covered in detail below, along with the remediation schedule agreed with the regional office.",
              "metadata": {
                "footnotes": [
                  { "id": "fn-sites", "content": "Site list as of the March survey." }
                ]
              }
            },
            {
              "id": "c-tip",
              "type": "callout",
              "order": 2,
              "content": "Readings marked with an asterisk were taken after heavy rain.",
              "metadata": { "placement": "sidebar" }
            },
            {
              "id": "t-readings",
              "type": "table",
              "order": 3,
              "content": {
                "headers": ["Site", "pH", "Turbidity"],
                "rows": [
                  ["North Creek", "7.1", "3.2"],
                  ["Mill Pond", "6.8", "4.0"],
                  ["East Weir", "7.4", "2.1"],
                  ["Old Ford", "6.5", "8.9"],
                  ["Stone Bridge", "7.0", "3.7"]
                ]
              },
              "metadata": { "caption": "Table 1: Site readings" }
            },
            {
              "id": "f-map",
              "type": "figure",
              "order": 4,
              "content": { "src": "sites.png", "alt": "Map of inspection sites" },
              "metadata": { "width": 3.0, "height": 2.5, "caption": "Figure 1: Inspection sites" }
            },
            {
              "id": "h-next",
              "type": "heading",
              "order": 5,
              "content": "Next Steps",
              "metadata": { "level": 2 }
            },
            {
              "id": "p-next",
              "type": "paragraph",
              "order": 6,
              "content": "Old Ford and Mill Pond will be resampled monthly until turbidity returns to baseline. Results will be appended to the next report."
            }
          ]
        }
      ]
    }
  ]
}
"##
}
