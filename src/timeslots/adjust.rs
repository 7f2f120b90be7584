//! Two-tier adjustment of cell text.
//!
//! 1. **Exact tier** — the whole cell canonicalises to a table key: return
//!    the mapped target verbatim.
//! 2. **Scan tier** — otherwise find every embedded time range and rewrite
//!    each match on its own, leaving the surrounding text byte-identical.

use super::AdjustmentTable;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// General shape of a time range: `H:MM AM/PM <dash> H:MM AM/PM`.
pub(crate) static RE_TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{1,2}\s*:\s*\d{2}\s*[AP]M\s*[-\u{2013}\u{2014}\u{2212}]+\s*\d{1,2}\s*:\s*\d{2}\s*[AP]M",
    )
    .unwrap()
});

/// Whether `text` contains something shaped like a time range.
pub fn looks_like_time_range(text: &str) -> bool {
    RE_TIME_RANGE.is_match(text)
}

/// Adjust one cell. Unmatched text is returned unchanged.
pub fn adjust_single_value(text: &str) -> String {
    let table = AdjustmentTable::global();
    match table.lookup(text) {
        Some(target) => target.to_string(),
        None => scan_and_replace_ranges(text),
    }
}

/// Rewrite every embedded time range that has a table entry.
pub fn scan_and_replace_ranges(text: &str) -> String {
    let table = AdjustmentTable::global();
    RE_TIME_RANGE
        .replace_all(text, |caps: &Captures<'_>| {
            let found = &caps[0];
            table.lookup(found).unwrap_or(found).to_string()
        })
        .into_owned()
}
