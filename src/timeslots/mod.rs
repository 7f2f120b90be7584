//! Time-range canonicalisation and the slot adjustment table.
//!
//! Recognised schedules spell the same slot in many ways: `08:00 AM - 09:20 AM`,
//! `8:00am–9:20am`, `08 : 00 AM — 09:20 AM`. Rather than parsing these into
//! clock values, every range is reduced to one canonical string and compared
//! as text. The adjustment table is keyed by that canonical form.
//!
//! ```text
//! "08:00am –  09:20 am"  ──canonicalize──▶  "8:00 AM - 9:20 AM"
//! ```

pub mod adjust;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

pub use adjust::{adjust_single_value, scan_and_replace_ranges};

/// Regular (80-minute) class slots and their shortened replacements.
pub const CLASS_TIME_MAP: &[(&str, &str)] = &[
    ("08:00 AM - 09:20 AM", "08:00 AM - 09:05 AM"),
    ("09:30 AM - 10:50 AM", "09:15 AM - 10:20 AM"),
    ("11:00 AM - 12:20 PM", "10:30 AM - 11:35 AM"),
    ("12:30 PM - 01:50 PM", "11:45 AM - 12:50 PM"),
    ("02:00 PM - 03:20 PM", "01:00 PM - 02:05 PM"),
    ("03:30 PM - 04:50 PM", "02:15 PM - 03:20 PM"),
    ("05:00 PM - 06:20 PM", "03:30 PM - 04:35 PM"),
];

/// Lab (170-minute) slots and their shortened replacements.
pub const LAB_TIME_MAP: &[(&str, &str)] = &[
    ("08:00 AM - 10:50 AM", "08:00 AM - 10:20 AM"),
    ("11:00 AM - 01:50 PM", "10:30 AM - 12:50 PM"),
    ("02:00 PM - 04:50 PM", "01:00 PM - 03:20 PM"),
    ("05:00 PM - 07:50 PM", "03:30 PM - 05:50 PM"),
];

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[-\u{2013}\u{2014}\u{2212}]+\s*").unwrap());
static RE_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*:\s*").unwrap());
static RE_HOUR_ZERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0(\d:)").unwrap());
static RE_MERIDIEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)(AM|PM)").unwrap());

/// Reduce a time-range string to its canonical comparison form.
///
/// Steps, in order: collapse whitespace, unify dash variants to `" - "`,
/// tighten colons, drop the hour's leading zero, uppercase, then separate a
/// glued meridiem (`9:20AM` → `9:20 AM`). Total and side-effect free: text
/// that is not a time range comes back normalised under the same rules.
pub fn canonicalize(text: &str) -> String {
    let s = RE_WHITESPACE.replace_all(text, " ");
    let s = s.trim();
    let s = RE_DASH.replace_all(s, " - ");
    let s = RE_COLON.replace_all(&s, ":");
    let s = RE_HOUR_ZERO.replace_all(&s, "$1");
    let s = s.to_uppercase();
    RE_MERIDIEM.replace_all(&s, "$1 $2").into_owned()
}

/// Canonical-key lookup over the class and lab tables.
///
/// Built once per process and never mutated. When two source entries
/// canonicalise to the same key the class entry is kept, so lookup behaves
/// as "class table first, then lab table".
#[derive(Debug)]
pub struct AdjustmentTable {
    entries: HashMap<String, &'static str>,
}

static TABLE: Lazy<AdjustmentTable> =
    Lazy::new(|| AdjustmentTable::from_maps(CLASS_TIME_MAP, LAB_TIME_MAP));

impl AdjustmentTable {
    /// The process-wide table built from [`CLASS_TIME_MAP`] and [`LAB_TIME_MAP`].
    pub fn global() -> &'static AdjustmentTable {
        &TABLE
    }

    /// Build a table from two ordered maps; on collision the first map wins.
    pub fn from_maps(
        primary: &[(&str, &'static str)],
        secondary: &[(&str, &'static str)],
    ) -> Self {
        let mut entries = HashMap::with_capacity(primary.len() + secondary.len());
        for (source, target) in primary.iter().chain(secondary) {
            let key = canonicalize(source);
            if entries.contains_key(&key) {
                debug!("Adjustment key {:?} already mapped; keeping first entry", key);
                continue;
            }
            entries.insert(key, *target);
        }
        Self { entries }
    }

    /// Look up `text` by canonical form. Returns the target verbatim.
    pub fn lookup(&self, text: &str) -> Option<&'static str> {
        self.entries.get(&canonicalize(text)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
