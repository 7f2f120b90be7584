//! Text measurement for the standard Helvetica face.
//!
//! The PDF backend uses the non-embedded base-14 fonts, so widths come from
//! the Helvetica AFM table (units of 1/1000 em). Bold text is measured with
//! the regular table; header words set in Helvetica-Bold run up to ~7% wider
//! ("Course" is 3445 vs 3223 units) and the cell padding absorbs the
//! difference.

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Distance from the top of a line box to the baseline, in em.
pub const ASCENT: f32 = 0.718;

pub const ELLIPSIS: char = '…';

/// Advance width of `c` in 1/1000 em.
pub fn char_width(c: char) -> u16 {
    match c {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | '\\' | ']' | 'I' | 'f' | 't' => 278,
        '"' => 355,
        '#' | '$' | '0'..='9' | '?' | '_' => 556,
        '%' => 889,
        '&' | 'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        '\'' => 191,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' => 584,
        '@' => 1015,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        'L' => 556,
        'M' | 'm' => 833,
        'W' => 944,
        '^' => 469,
        'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 556,
        'i' | 'j' | 'l' => 222,
        'w' => 722,
        '{' | '}' => 334,
        '|' => 260,
        ELLIPSIS => 1000,
        _ => 556,
    }
}

/// Width of `text` at `font_size`, in points.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * font_size / 1000.0
}

pub fn line_height(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Greedy word wrap. Explicit newlines start a new line; a word wider than
/// `max_width` is split between characters.
pub fn wrap_lines(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = split_word(word, max_width, font_size);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_word(word: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if text_width(&piece, font_size) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    pieces.push(piece);
    pieces
}

/// Height of `text` wrapped to `width`. Blank text has no height.
pub fn wrapped_height(text: &str, width: f32, font_size: f32) -> f32 {
    wrap_lines(text, width, font_size).len() as f32 * line_height(font_size)
}

/// Shorten `text` so that it fits `max_width`, ending in an ellipsis.
pub fn truncate_to_width(text: &str, max_width: f32, font_size: f32) -> String {
    if text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    let budget = max_width - text_width(&ELLIPSIS.to_string(), font_size);
    let mut out = String::new();
    let mut used = 0.0;
    for c in text.chars() {
        let w = char_width(c) as f32 * font_size / 1000.0;
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    let kept = out.trim_end().len();
    out.truncate(kept);
    out.push(ELLIPSIS);
    out
}

/// The lines that fit a `width` × `height` box.
///
/// Without `wrap`, the text is collapsed to one line. With `truncate`, lines
/// below the box are dropped and the last visible line (or any line wider
/// than the box) ends in an ellipsis.
pub fn fit_lines(
    text: &str,
    width: f32,
    height: f32,
    font_size: f32,
    wrap: bool,
    truncate: bool,
) -> Vec<String> {
    let mut lines = if wrap {
        wrap_lines(text, width, font_size)
    } else {
        let single = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if single.is_empty() {
            Vec::new()
        } else {
            vec![single]
        }
    };
    if !truncate {
        return lines;
    }

    let max_lines = ((height / line_height(font_size)).floor() as usize).max(1);
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let marked = format!("{last}{ELLIPSIS}");
            *last = truncate_to_width(&marked, width, font_size);
            if !last.ends_with(ELLIPSIS) {
                last.push(ELLIPSIS);
            }
        }
    }
    for line in lines.iter_mut() {
        *line = truncate_to_width(line, width, font_size);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_afm() {
        assert_eq!(text_width("0", 1000.0), 556.0);
        assert!((text_width("Mil", 10.0) - (8.33 + 2.22 + 2.22)).abs() < 1e-3);
    }

    #[test]
    fn wrap_greedy_on_words() {
        // "CSE 110" is 7 chars, roughly 27pt at 7.5pt.
        let lines = wrap_lines("CSE 110 Room UB40201", 40.0, 7.5);
        assert_eq!(lines[0], "CSE 110");
        assert!(lines.iter().all(|l| text_width(l, 7.5) <= 40.0));
    }

    #[test]
    fn newline_forces_break_and_long_word_splits() {
        assert_eq!(wrap_lines("a\nb", 100.0, 10.0), vec!["a", "b"]);
        let lines = wrap_lines("WWWWWWWWWW", 30.0, 10.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, 10.0) <= 30.0));
        assert_eq!(lines.concat(), "WWWWWWWWWW");
    }

    #[test]
    fn blank_text_has_no_height() {
        assert_eq!(wrapped_height("", 50.0, 7.5), 0.0);
        assert_eq!(wrapped_height("   ", 50.0, 7.5), 0.0);
        assert!((wrapped_height("x", 50.0, 10.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn truncate_adds_ellipsis() {
        let t = truncate_to_width("Sunday and Tuesday", 40.0, 7.5);
        assert!(t.ends_with(ELLIPSIS));
        assert!(text_width(&t, 7.5) <= 40.0);
        assert_eq!(truncate_to_width("Sun", 40.0, 7.5), "Sun");
    }

    #[test]
    fn fit_lines_caps_to_box() {
        let text = "one two three four five six seven eight nine ten";
        let lines = fit_lines(text, 30.0, 20.0, 7.5, true, true);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(ELLIPSIS));

        let single = fit_lines("Time\nSlot", 100.0, 10.0, 7.5, false, true);
        assert_eq!(single, vec!["Time Slot"]);
    }
}
