//! # edgequake-timetable
//!
//! Re-time a class schedule for Ramadan hours using a vision LLM.
//!
//! ## Why this crate?
//!
//! Class routines arrive as scanned PDFs and phone photos, with time ranges
//! written as `8:00am-9:20 am`, `08:00 AM – 09:20 AM` or anything in between,
//! and with no reliable header telling which column holds them. This crate
//! lets a vision model read the table, then does the part a model should not
//! be trusted with (finding the time column and rewriting every range against
//! a fixed adjustment table) deterministically, and renders the result as a
//! clean paginated PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Acquire  PDF text layer, or rasterise scans / encode photos
//!  ├─ 3. Extract  vision model, primary then one fallback on service failure
//!  ├─ 4. Decode   tolerant JSON array decoding of the answer
//!  ├─ 5. Adjust   pick the time column, rewrite ranges, sweep if nothing hit
//!  ├─ 6. Table    header union → rectangular table (placeholder when empty)
//!  └─ 7. Render   paginated A4 PDF with repeated headers and zebra rows
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_timetable::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ConversionConfig::default();
//!     let output = convert_to_file("routine.pdf", "routine_ramadan.pdf", &config).await?;
//!     eprintln!("{} rows, {} cells adjusted by {}",
//!         output.stats.rows,
//!         output.stats.adjusted_cells,
//!         output.stats.model);
//!     Ok(())
//! }
//! ```
//!
//! The adjustment itself needs no model:
//!
//! ```rust
//! use edgequake_timetable::adjust_single_value;
//!
//! assert_eq!(adjust_single_value("8:00am-9:20 am"), "08:00 AM - 09:05 AM");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `timetable` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-timetable = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod table;
pub mod timeslots;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, LayoutConfig, PageSelection, Rgb};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file};
pub use error::TimetableError;
pub use output::{ConversionStats, TimetableOutput};
pub use pipeline::extract::{
    extract, ModelPlan, RecognitionInput, RecognitionRequest, RecognitionService,
};
pub use pipeline::llm::LlmRecognizer;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use render::{render_pdf, render_table, Canvas, PdfCanvas, RenderSummary};
pub use table::{normalize, Row, ScheduleTable};
pub use timeslots::{adjust_single_value, canonicalize, scan_and_replace_ranges, AdjustmentTable};
