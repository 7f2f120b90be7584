//! Paginated table layout over an injected drawing [`Canvas`].
//!
//! ## Layout pass
//!
//! ```text
//! title ──▶ header ──▶ row 0 ──▶ row 1 ──▶ … ──▶ row k ──┐
//!                                                       │ y + h > page bottom
//!            ┌──────────────────────────────────────────┘
//!            ▼
//!      start_new_page ──▶ header ──▶ row k ──▶ …
//! ```
//!
//! The pass is linear: each row's height is measured once, a page break is
//! decided from the running y offset alone, and a finished page is never
//! revisited. Zebra striping is keyed by the row's index in the table, so the
//! stripe sequence continues across page breaks.
//!
//! Coordinates are in points with a top-left origin; backends flip them as
//! needed.

pub mod metrics;
pub mod pdf;

pub use pdf::PdfCanvas;

use crate::config::{LayoutConfig, Rgb};
use crate::table::ScheduleTable;
use serde::Serialize;
use tracing::debug;

/// An axis-aligned box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: (self.width - 2.0 * dx).max(0.0),
            height: (self.height - 2.0 * dy).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub color: Rgb,
    /// Break lines at word boundaries to fit the box width.
    pub wrap: bool,
    /// Clip text that overflows the box, marking the cut with an ellipsis.
    pub truncate: bool,
    pub align: Align,
}

/// Drawing capability consumed by [`render_table`].
pub trait Canvas {
    /// `(width, height)` of the current page, in points.
    fn page_size(&self) -> (f32, f32);

    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    fn stroke_rect(&mut self, rect: Rect, color: Rgb);

    /// Draw `text` inside `rect`, top-aligned.
    fn draw_text(&mut self, text: &str, rect: Rect, style: &TextStyle);

    /// Height `text` occupies when wrapped to `width`.
    fn measure_wrapped_height(&self, text: &str, width: f32, font_size: f32, bold: bool) -> f32;

    fn start_new_page(&mut self);
}

/// What a render pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RenderSummary {
    pub pages: usize,
    pub rows_drawn: usize,
}

/// Column widths: a capped first column, the rest split evenly.
pub fn column_widths(columns: usize, layout: &LayoutConfig) -> Vec<f32> {
    let available = layout.available_width();
    match columns {
        0 => Vec::new(),
        1 => vec![available],
        n => {
            let first = layout
                .first_column_cap
                .min(available * layout.first_column_fraction);
            let other = (available - first) / (n - 1) as f32;
            std::iter::once(first)
                .chain(std::iter::repeat(other).take(n - 1))
                .collect()
        }
    }
}

/// Measured height of one data row and whether it had to be capped.
pub fn row_height(
    canvas: &dyn Canvas,
    cells: &[String],
    widths: &[f32],
    layout: &LayoutConfig,
) -> (f32, bool) {
    let content = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| {
            let inner = (w - 2.0 * layout.cell_padding_x).max(1.0);
            canvas.measure_wrapped_height(cell, inner, layout.font_size, false)
        })
        .fold(0.0_f32, f32::max);
    let height = (content + 2.0 * layout.cell_padding_y).max(layout.min_row_height);

    let body = layout.page_bottom() - layout.margin - layout.header_height;
    if height > body {
        (body, true)
    } else {
        (height, false)
    }
}

/// Lay out `table` under `title`, breaking pages as rows accumulate.
pub fn render_table(
    canvas: &mut dyn Canvas,
    table: &ScheduleTable,
    title: &str,
    layout: &LayoutConfig,
) -> RenderSummary {
    let widths = column_widths(table.column_count(), layout);
    let mut pages = 1;

    let title_style = TextStyle {
        font_size: layout.title_font_size,
        bold: true,
        color: layout.text,
        wrap: false,
        truncate: true,
        align: Align::Center,
    };
    let title_height = metrics::line_height(layout.title_font_size);
    canvas.draw_text(
        title,
        Rect::new(
            layout.margin,
            layout.margin,
            layout.available_width(),
            title_height,
        ),
        &title_style,
    );

    let mut y = layout.margin + title_height + layout.title_gap;
    draw_header(canvas, &table.headers, &widths, y, layout);
    y += layout.header_height;

    for (index, cells) in table.rows.iter().enumerate() {
        let (height, capped) = row_height(canvas, cells, &widths, layout);
        if y + height > layout.page_bottom() {
            canvas.start_new_page();
            pages += 1;
            y = layout.margin;
            draw_header(canvas, &table.headers, &widths, y, layout);
            y += layout.header_height;
            debug!("Page {} starts at row {}", pages, index);
        }
        if capped {
            debug!("Row {} exceeds a page body; text truncated", index);
        }
        draw_row(canvas, index, cells, &widths, y, height, layout);
        y += height;
    }

    RenderSummary {
        pages,
        rows_drawn: table.rows.len(),
    }
}

/// Render `table` into a complete PDF document.
pub fn render_pdf(table: &ScheduleTable, title: &str, layout: &LayoutConfig) -> (Vec<u8>, RenderSummary) {
    let mut canvas = PdfCanvas::new(layout.page_width, layout.page_height);
    let summary = render_table(&mut canvas, table, title, layout);
    (canvas.finish(), summary)
}

fn draw_header(
    canvas: &mut dyn Canvas,
    headers: &[String],
    widths: &[f32],
    y: f32,
    layout: &LayoutConfig,
) {
    let style = TextStyle {
        font_size: layout.font_size,
        bold: true,
        color: layout.header_text,
        wrap: false,
        truncate: true,
        align: Align::Left,
    };
    let mut x = layout.margin;
    for (header, &w) in headers.iter().zip(widths) {
        let cell = Rect::new(x, y, w, layout.header_height);
        canvas.fill_rect(cell, layout.header_fill);
        canvas.stroke_rect(cell, layout.header_fill);
        canvas.draw_text(
            header,
            cell.inset(layout.cell_padding_x, layout.cell_padding_y),
            &style,
        );
        x += w;
    }
}

fn draw_row(
    canvas: &mut dyn Canvas,
    index: usize,
    cells: &[String],
    widths: &[f32],
    y: f32,
    height: f32,
    layout: &LayoutConfig,
) {
    let fill = if index % 2 == 0 {
        layout.even_row_fill
    } else {
        layout.odd_row_fill
    };
    let style = TextStyle {
        font_size: layout.font_size,
        bold: false,
        color: layout.text,
        wrap: true,
        truncate: true,
        align: Align::Left,
    };
    let mut x = layout.margin;
    for (text, &w) in cells.iter().zip(widths) {
        let cell = Rect::new(x, y, w, height);
        canvas.fill_rect(cell, fill);
        canvas.stroke_rect(cell, layout.border);
        canvas.draw_text(
            text,
            cell.inset(layout.cell_padding_x, layout.cell_padding_y),
            &style,
        );
        x += w;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Op {
        Fill(Rect, Rgb),
        Stroke(Rect, Rgb),
        Text(String, Rect, bool),
        NewPage,
    }

    /// Records draw-ops; every non-empty line of text is 10pt tall.
    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub(crate) ops: Vec<Op>,
    }

    impl Canvas for RecordingCanvas {
        fn page_size(&self) -> (f32, f32) {
            (841.89, 595.28)
        }
        fn fill_rect(&mut self, rect: Rect, color: Rgb) {
            self.ops.push(Op::Fill(rect, color));
        }
        fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
            self.ops.push(Op::Stroke(rect, color));
        }
        fn draw_text(&mut self, text: &str, rect: Rect, style: &TextStyle) {
            self.ops.push(Op::Text(text.to_string(), rect, style.bold));
        }
        fn measure_wrapped_height(&self, text: &str, _w: f32, _fs: f32, _b: bool) -> f32 {
            text.lines().filter(|l| !l.trim().is_empty()).count() as f32 * 10.0
        }
        fn start_new_page(&mut self) {
            self.ops.push(Op::NewPage);
        }
    }

    fn table(rows: usize) -> ScheduleTable {
        ScheduleTable {
            headers: vec!["Time".into(), "Sunday".into()],
            rows: (0..rows)
                .map(|i| vec![format!("slot {i}"), "CSE".into()])
                .collect(),
        }
    }

    #[test]
    fn first_column_is_capped() {
        let layout = LayoutConfig::default();
        let widths = column_widths(4, &layout);
        assert_eq!(widths[0], 155.0);
        let rest = (layout.available_width() - 155.0) / 3.0;
        assert!(widths[1..].iter().all(|w| (*w - rest).abs() < 1e-3));
        assert!((widths.iter().sum::<f32>() - layout.available_width()).abs() < 1e-2);

        let portrait = LayoutConfig::portrait();
        let w = column_widths(2, &portrait);
        assert!((w[0] - portrait.available_width() * 0.24).abs() < 1e-3);
    }

    #[test]
    fn single_column_uses_full_width() {
        let layout = LayoutConfig::default();
        assert_eq!(column_widths(1, &layout), vec![layout.available_width()]);
    }

    #[test]
    fn row_height_floors_and_grows() {
        let layout = LayoutConfig::default();
        let canvas = RecordingCanvas::default();
        let widths = column_widths(2, &layout);
        let (h, capped) = row_height(&canvas, &["a".into(), "".into()], &widths, &layout);
        assert_eq!(h, 22.0);
        assert!(!capped);
        let (h, _) = row_height(&canvas, &["a\nb\nc".into(), "x".into()], &widths, &layout);
        assert_eq!(h, 38.0);
    }

    #[test]
    fn oversized_row_is_capped_to_page_body() {
        let layout = LayoutConfig::default();
        let canvas = RecordingCanvas::default();
        let tall = vec!["x"; 200].join("\n");
        let (h, capped) = row_height(&canvas, &[tall, "".into()], &column_widths(2, &layout), &layout);
        assert!(capped);
        assert_eq!(h, layout.page_bottom() - layout.margin - layout.header_height);
    }

    #[test]
    fn paginates_with_header_redraw_and_continuous_zebra() {
        let layout = LayoutConfig::default();
        // First page: 30 + 16.8 + 10 + 22 = 78.8, rows of 22 until 555.28 → 21 rows.
        let mut canvas = RecordingCanvas::default();
        let summary = render_table(&mut canvas, &table(30), "Ramadan Class Schedule", &layout);
        assert_eq!(summary, RenderSummary { pages: 2, rows_drawn: 30 });

        let breaks: Vec<usize> = canvas
            .ops
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == Op::NewPage)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(breaks.len(), 1);

        // Header cells are the first text drawn after the break.
        let after = &canvas.ops[breaks[0] + 1..];
        let header_texts: Vec<&str> = after
            .iter()
            .filter_map(|op| match op {
                Op::Text(t, _, true) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(header_texts, vec!["Time", "Sunday"]);
        assert!(matches!(&after[0], Op::Fill(r, c) if r.y == layout.margin && *c == layout.header_fill));

        // Row 21 is the first on page 2 and keeps the odd stripe.
        let first_row_fill = after
            .iter()
            .find_map(|op| match op {
                Op::Fill(r, c) if r.y > layout.margin => Some(*c),
                _ => None,
            })
            .unwrap();
        assert_eq!(first_row_fill, layout.odd_row_fill);
        assert!(after.iter().any(|op| matches!(op, Op::Text(t, _, false) if t == "slot 21")));
    }

    #[test]
    fn title_is_bold_and_centered_first() {
        let layout = LayoutConfig::default();
        let mut canvas = RecordingCanvas::default();
        render_table(&mut canvas, &ScheduleTable::placeholder(), "My Title", &layout);
        assert!(matches!(&canvas.ops[0], Op::Text(t, _, true) if t == "My Title"));
        assert!(!canvas.ops.contains(&Op::NewPage));
    }
}
