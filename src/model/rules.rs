//! Pagination rules: how a block may be broken across columns and pages.
//!
//! Blocks carry sparse overrides ([`PaginationRules`], every field optional).
//! Before layout they are resolved against the defaults of the block's content
//! handler into a [`ResolvedRules`] where every decision is concrete.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationRules {
    /// Keep this block in the same column as the block after it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_with_next: Option<bool>,
    /// Never split this block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_together: Option<bool>,
    /// Hint for renderers to avoid breaking inside this block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_avoid: Option<bool>,
    /// Minimum lines left at the bottom of a column before a break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_orphans: Option<u32>,
    /// Minimum lines carried to the top of the next column after a break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_widows: Option<u32>,
}

impl PaginationRules {
    /// Fill every unset field from `defaults`, keeping explicit overrides.
    pub fn merged_over(&self, defaults: &PaginationRules) -> PaginationRules {
        PaginationRules {
            keep_with_next: self.keep_with_next.or(defaults.keep_with_next),
            keep_together: self.keep_together.or(defaults.keep_together),
            break_avoid: self.break_avoid.or(defaults.break_avoid),
            min_orphans: self.min_orphans.or(defaults.min_orphans),
            min_widows: self.min_widows.or(defaults.min_widows),
        }
    }

    pub fn resolve(&self) -> ResolvedRules {
        ResolvedRules {
            keep_with_next: self.keep_with_next.unwrap_or(false),
            keep_together: self.keep_together.unwrap_or(false),
            break_avoid: self.break_avoid.unwrap_or(false),
            min_orphans: self.min_orphans.unwrap_or(1),
            min_widows: self.min_widows.unwrap_or(1),
        }
    }
}

/// Fully resolved pagination rules, every decision concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRules {
    pub keep_with_next: bool,
    pub keep_together: bool,
    pub break_avoid: bool,
    pub min_orphans: u32,
    pub min_widows: u32,
}
