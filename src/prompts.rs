//! System prompts for schedule extraction.
//!
//! The before → after table inside the prompt is generated from
//! [`crate::timeslots::CLASS_TIME_MAP`] and [`crate::timeslots::LAB_TIME_MAP`],
//! so the model and the local applicator always agree on the rules. The model
//! is asked to apply them itself; the local pass then corrects whatever it
//! got wrong.
//!
//! Callers can override the prompt via
//! [`crate::config::ConversionConfig::system_prompt`].

use crate::timeslots::{CLASS_TIME_MAP, LAB_TIME_MAP};
use std::fmt::Write as _;

/// What the model will be looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    /// Text extracted from a PDF's text layer.
    Text,
    /// One or more page images.
    Image,
}

const PREAMBLE: &str = "You are a schedule-processing assistant for university Ramadan timetable adjustments.";

const RULES: &str = r#"The FIRST COLUMN usually contains time ranges like "HH:MM AM - HH:MM PM".
All other columns contain days, subjects, rooms, or class names.
Extract the full table VERBATIM. Do NOT modify any column except the time column.

Replace ONLY the time ranges using these EXACT rules:"#;

const OUTPUT_FORMAT: &str = r#"If a time does not match exactly, leave it unchanged.
Return ONLY a valid JSON array using the table's original column headers as keys, like:
[{ "Time": "...", "Sunday": "...", "Monday": "..." }, ...]
Do not add commentary, explanations, or markdown fences."#;

/// User-turn instruction sent alongside the content.
pub const USER_INSTRUCTION: &str =
    "Extract the schedule table and apply the Ramadan time adjustments. Return ONLY the JSON array.";

/// Build the system prompt for a given input kind.
pub fn system_prompt(source: PromptSource) -> String {
    let intro = match source {
        PromptSource::Text => {
            "You will receive text extracted from a university class schedule PDF."
        }
        PromptSource::Image => "You will receive an image of a university class schedule table.",
    };

    let mut prompt = format!("{PREAMBLE}\n\n{intro}\n{RULES}\n\n");
    push_table(&mut prompt, "REGULAR CLASSES", CLASS_TIME_MAP);
    push_table(&mut prompt, "LAB CLASSES", LAB_TIME_MAP);
    prompt.push_str(OUTPUT_FORMAT);
    prompt
}

fn push_table(out: &mut String, heading: &str, table: &[(&str, &str)]) {
    let _ = writeln!(out, "{heading}:");
    for (before, after) in table {
        let _ = writeln!(out, "{before}  →  {after}");
    }
    out.push('\n');
}

/// Wrap extracted PDF text in the user message.
pub fn text_user_message(extracted: &str) -> String {
    format!(
        "Here is the schedule table extracted from the PDF:\n\n{}\n\n{}",
        extracted, USER_INSTRUCTION
    )
}
