//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! yields a working engine. The CLI reads this from `--config <file>`.

use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::model::OversizedPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Upper bound on pages generated for one section.
    #[serde(default = "default_max_pages")]
    pub max_pages_per_section: usize,

    /// Route `placement: sidebar` callouts out of the columns.
    #[serde(default)]
    pub enable_sidebar_flow: bool,

    /// Policy tagged onto elements wider than their column.
    #[serde(default)]
    pub oversized_element_policy: OversizedPolicy,

    /// Place a block that cannot fit even an empty column anyway (and flag
    /// the page as overflowing) instead of failing the run.
    #[serde(default = "default_true")]
    pub force_place_unfittable: bool,

    /// Maximum number of queue pops in one run.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Height reserved per footnote, in inches.
    #[serde(default = "default_footnote_height")]
    pub footnote_height: f64,
}

fn default_max_pages() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_max_steps() -> usize {
    1_000_000
}

fn default_footnote_height() -> f64 {
    0.25
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pages_per_section: default_max_pages(),
            enable_sidebar_flow: false,
            oversized_element_policy: OversizedPolicy::default(),
            force_place_unfittable: true,
            max_steps: default_max_steps(),
            footnote_height: default_footnote_height(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FolioError> {
        if self.max_pages_per_section == 0 {
            return Err(FolioError::InvalidConfig(
                "maxPagesPerSection must be at least 1".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(FolioError::InvalidConfig(
                "maxSteps must be at least 1".to_string(),
            ));
        }
        if !(self.footnote_height.is_finite() && self.footnote_height >= 0.0) {
            return Err(FolioError::InvalidConfig(format!(
                "footnoteHeight must be a non-negative length, got {}",
                self.footnote_height
            )));
        }
        Ok(())
    }
}
