//! # Column Break Decisions
//!
//! Line arithmetic for deciding when and how a text block breaks at the
//! bottom of a column. Both the paragraph splitter and the column's
//! orphan/widow admission check go through [`plan_line_break`], so the two
//! can never disagree about where a paragraph may break.

/// What to do with a text block at the current fill position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// The whole block fits.
    Place,
    /// Defer the whole block to the next column.
    MoveToNextColumn(MoveReason),
    /// Split the block: this many lines stay in the current column.
    Split { lines_on_current: usize },
}

/// Why a block that does not fit cannot be split here either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveReason {
    Unbreakable,
    /// Too few lines would be left at the bottom of this column.
    Orphans,
    /// Too few lines would be carried to the next column.
    Widows,
}

/// Given the lines that fit in the remaining height and the block's total
/// line count, decide how to break.
///
/// The first piece gets `available_lines - min_orphans` lines. If that leaves
/// fewer than `min_widows` lines for the continuation, the split point moves
/// back so the continuation has exactly `min_widows` lines. When no split
/// point satisfies both minimums the block moves whole.
pub fn plan_line_break(
    total_lines: usize,
    available_lines: usize,
    is_breakable: bool,
    min_orphans: usize,
    min_widows: usize,
) -> BreakDecision {
    if total_lines <= available_lines {
        return BreakDecision::Place;
    }

    if !is_breakable {
        return BreakDecision::MoveToNextColumn(MoveReason::Unbreakable);
    }

    if available_lines < min_orphans {
        return BreakDecision::MoveToNextColumn(MoveReason::Orphans);
    }

    let mut lines_on_current = available_lines - min_orphans;
    let mut reason = MoveReason::Orphans;

    // Widow control: pull lines back so the continuation is long enough
    if total_lines - lines_on_current < min_widows {
        lines_on_current = total_lines.saturating_sub(min_widows);
        reason = MoveReason::Widows;
    }

    if lines_on_current == 0 || lines_on_current < min_orphans {
        return BreakDecision::MoveToNextColumn(reason);
    }

    BreakDecision::Split { lines_on_current }
}
