//! Structured error types for the Folio layout engine.
//!
//! Placement refusals are ordinary values (see [`crate::layout::flow::Refusal`]),
//! so everything here is a genuine failure: bad input, bad configuration, or a
//! run that could not finish within its resource limits.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// JSON input failed to parse as a valid Folio document or config.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A section's page master describes an unusable geometry.
    #[error("Invalid page master in section {section}: {message}")]
    InvalidPageMaster { section: usize, message: String },

    /// The engine configuration holds a value the engine cannot work with.
    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),

    /// A section hit the page cap with content still queued.
    #[error(
        "Layout resources exhausted in section {section}: reached {max_pages} pages with {remaining_blocks} block(s) still queued"
    )]
    LayoutResourceExhausted {
        section: usize,
        max_pages: usize,
        remaining_blocks: usize,
    },

    /// An empty column refused a block and forced placement is disabled,
    /// so no later column could make progress either.
    #[error("Layout stalled on block '{block_id}' at page {page_number}: it cannot be placed in an empty column")]
    LayoutStalled { block_id: String, page_number: usize },

    /// The run popped more blocks off its queue than the configured budget.
    #[error("Layout step budget of {budget} exceeded")]
    StepBudgetExceeded { budget: usize },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Folio document schema. Check field names and block types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::ParseError { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse document"));
        assert!(msg.contains("trailing commas"), "got: {msg}");
    }

    #[test]
    fn truncated_input_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"sections\": [")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn exhausted_message_names_section() {
        let err = FolioError::LayoutResourceExhausted {
            section: 2,
            max_pages: 500,
            remaining_blocks: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("section 2"));
        assert!(msg.contains("500 pages"));
        assert!(msg.contains("7 block(s)"));
    }
}
