//! Result types returned by the conversion entry points.

use crate::pipeline::input::SourceKind;
use crate::table::ScheduleTable;
use serde::Serialize;

/// The adjusted table and the rendered document.
#[derive(Debug, Clone)]
pub struct TimetableOutput {
    /// Rectangular, time-adjusted schedule.
    pub table: ScheduleTable,
    /// Complete PDF document.
    pub pdf: Vec<u8>,
    pub stats: ConversionStats,
}

/// How a conversion went.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub source_kind: SourceKind,
    /// "text" when a PDF text layer was sent, "images" otherwise.
    pub recognition_input: &'static str,
    /// Model whose answer was used.
    pub model: String,
    pub used_fallback: bool,
    pub rows: usize,
    pub columns: usize,
    /// Header of the column treated as the time column, if any.
    pub time_column: Option<String>,
    pub adjusted_cells: usize,
    /// Whether the whole table was swept because the time column had no hits.
    pub swept: bool,
    pub rendered_pages: usize,
    pub acquire_duration_ms: u64,
    pub recognition_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}
