//! Pick the time column of an unlabeled table and adjust it.
//!
//! The prompt tells the model the first column holds the times, but real
//! schedules put them anywhere and call them anything. Selection runs in two
//! tiers:
//!
//! 1. **Label** — the first header containing `time`, `slot` or `period`.
//! 2. **Content** — the header whose cells most often look like a time range;
//!    ties go to the leftmost header.
//!
//! If adjusting the chosen column changes nothing, the guess was probably
//! wrong, so every cell of every row is swept through the applicator. Text
//! without a known range passes through untouched, so the sweep is safe. It
//! can also rewrite an incidental range in an unrelated column, for example a
//! "Notes" cell, which is accepted.

use crate::table::{header_union, Row};
use crate::timeslots::adjust::{adjust_single_value, looks_like_time_range};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Case-insensitive label fragments that identify a time column.
pub const TIME_HEADER_SYNONYMS: &[&str] = &["time", "slot", "period"];

/// How the time column was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SelectionReason {
    /// The header label contains one of [`TIME_HEADER_SYNONYMS`].
    Synonym,
    /// Highest number of cells shaped like a time range.
    ContentScore(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnChoice {
    pub header: String,
    pub reason: SelectionReason,
}

/// Outcome of [`select_and_adjust`], surfaced in conversion stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdjustmentReport {
    pub column: Option<ColumnChoice>,
    /// Cells whose text changed.
    pub changed_cells: usize,
    /// True when the whole-table sweep ran.
    pub swept: bool,
}

/// Choose the time column among `headers`.
///
/// Returns `None` only when there are no headers at all.
pub fn select_time_column(rows: &[Row], headers: &[String]) -> Option<ColumnChoice> {
    let by_label = headers.iter().find(|h| {
        let lower = h.to_lowercase();
        TIME_HEADER_SYNONYMS.iter().any(|s| lower.contains(s))
    });
    if let Some(header) = by_label {
        return Some(ColumnChoice {
            header: header.clone(),
            reason: SelectionReason::Synonym,
        });
    }

    let mut best: Option<(&String, usize)> = None;
    for header in headers {
        let score = rows
            .iter()
            .filter(|r| r.get(header).is_some_and(looks_like_time_range))
            .count();
        // strict `>` keeps the leftmost header on ties
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((header, score));
        }
    }

    best.map(|(header, score)| ColumnChoice {
        header: header.clone(),
        reason: SelectionReason::ContentScore(score),
    })
}

/// Detect the time column, adjust it, and fall back to a full sweep.
pub fn select_and_adjust(mut rows: Vec<Row>) -> (Vec<Row>, AdjustmentReport) {
    let headers = header_union(&rows);
    let Some(choice) = select_time_column(&rows, &headers) else {
        return (rows, AdjustmentReport::default());
    };
    debug!("Time column: {:?} ({:?})", choice.header, choice.reason);

    let mut changed = 0usize;
    for row in &mut rows {
        if let Some(cell) = row.get_mut(&choice.header) {
            changed += rewrite(cell);
        }
    }

    let mut swept = false;
    if changed == 0 {
        warn!(
            "No adjustment in column {:?}; sweeping every cell",
            choice.header
        );
        swept = true;
        for row in &mut rows {
            for cell in row.values_mut() {
                changed += rewrite(cell);
            }
        }
    }

    info!("Adjusted {} cells across {} rows", changed, rows.len());
    let report = AdjustmentReport {
        column: Some(choice),
        changed_cells: changed,
        swept,
    };
    (rows, report)
}

/// Adjust one cell in place; returns 1 when the text changed.
fn rewrite(cell: &mut String) -> usize {
    let adjusted = adjust_single_value(cell);
    if adjusted == *cell {
        0
    } else {
        *cell = adjusted;
        1
    }
}
