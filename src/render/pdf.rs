//! [`Canvas`] backend that writes a PDF with `pdf-writer`.
//!
//! Text uses the standard Helvetica and Helvetica-Bold Type1 fonts with
//! WinAnsiEncoding, so nothing is embedded. Characters outside that encoding
//! are drawn as `?`.

use super::metrics::{self, ASCENT};
use super::{Align, Canvas, Rect, TextStyle};
use crate::config::Rgb;
use pdf_writer::{Content, Name, Pdf, Rect as PdfRect, Ref, Str};
use tracing::debug;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// In-memory PDF document, one content stream per page.
pub struct PdfCanvas {
    width: f32,
    height: f32,
    finished_pages: Vec<Content>,
    current: Content,
}

impl PdfCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            finished_pages: Vec::new(),
            current: Content::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    /// Assemble the document and return its bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.finished_pages
            .push(std::mem::replace(&mut self.current, Content::new()));
        let page_total = self.finished_pages.len();

        let mut next_id = 1;
        let mut alloc = || {
            let id = Ref::new(next_id);
            next_id += 1;
            id
        };
        let catalog_id = alloc();
        let tree_id = alloc();
        let regular_id = alloc();
        let bold_id = alloc();
        let page_ids: Vec<Ref> = (0..page_total).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..page_total).map(|_| alloc()).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().copied())
            .count(page_total as i32);

        pdf.type1_font(regular_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(bold_id)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        for (i, content) in self.finished_pages.into_iter().enumerate() {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(PdfRect::new(0.0, 0.0, self.width, self.height))
                .parent(tree_id)
                .contents(content_ids[i]);
            {
                let mut resources = page.resources();
                let mut fonts = resources.fonts();
                fonts.pair(REGULAR, regular_id);
                fonts.pair(BOLD, bold_id);
            }
            drop(page);

            let raw = content.finish();
            pdf.stream(content_ids[i], &raw);
        }

        debug!("Assembled PDF with {} page(s)", page_total);
        pdf.finish()
    }

    /// Convert a top-left-origin y into PDF user space.
    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }
}

impl Canvas for PdfCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let bottom = self.flip(rect.y + rect.height);
        self.current
            .set_fill_rgb(color.0, color.1, color.2)
            .rect(rect.x, bottom, rect.width, rect.height)
            .fill_nonzero();
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        let bottom = self.flip(rect.y + rect.height);
        self.current
            .set_stroke_rgb(color.0, color.1, color.2)
            .set_line_width(0.5)
            .rect(rect.x, bottom, rect.width, rect.height)
            .stroke();
    }

    fn draw_text(&mut self, text: &str, rect: Rect, style: &TextStyle) {
        let lines = metrics::fit_lines(
            text,
            rect.width,
            rect.height,
            style.font_size,
            style.wrap,
            style.truncate,
        );
        if lines.is_empty() {
            return;
        }
        let font = if style.bold { BOLD } else { REGULAR };
        let line_height = metrics::line_height(style.font_size);

        self.current
            .set_fill_rgb(style.color.0, style.color.1, style.color.2);
        for (i, line) in lines.iter().enumerate() {
            let x = match style.align {
                Align::Left => rect.x,
                Align::Center => {
                    rect.x + (rect.width - metrics::text_width(line, style.font_size)) / 2.0
                }
                Align::Right => rect.x + rect.width - metrics::text_width(line, style.font_size),
            };
            let baseline = rect.y + i as f32 * line_height + style.font_size * ASCENT;
            let encoded = win_ansi(line);
            let y = self.flip(baseline);
            self.current
                .begin_text()
                .set_font(font, style.font_size)
                .next_line(x, y)
                .show(Str(&encoded))
                .end_text();
        }
    }

    fn measure_wrapped_height(&self, text: &str, width: f32, font_size: f32, _bold: bool) -> f32 {
        metrics::wrapped_height(text, width, font_size)
    }

    fn start_new_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Content::new());
        self.finished_pages.push(done);
    }
}

/// Encode `text` as WinAnsi (CP-1252) bytes.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '…' => 0x85,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::render::render_table;
    use crate::table::ScheduleTable;

    fn count_pages(bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
    }

    #[test]
    fn empty_canvas_is_one_page_pdf() {
        let canvas = PdfCanvas::new(595.28, 841.89);
        assert_eq!(canvas.page_count(), 1);
        let bytes = canvas.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(String::from_utf8_lossy(&bytes).contains("/Helvetica-Bold"));
    }

    #[test]
    fn rendered_table_has_matching_page_count() {
        let layout = LayoutConfig::default();
        let table = ScheduleTable {
            headers: vec!["Time".into(), "Sunday".into(), "Monday".into()],
            rows: (0..60)
                .map(|i| vec![format!("0{}:00 AM", i % 10), "CSE 110".into(), "".into()])
                .collect(),
        };
        let mut canvas = PdfCanvas::new(layout.page_width, layout.page_height);
        let summary = render_table(&mut canvas, &table, "Ramadan Class Schedule", &layout);
        assert_eq!(summary.pages, 3);
        assert_eq!(canvas.page_count(), 3);
        let bytes = canvas.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count_pages(&bytes), 3);
    }

    #[test]
    fn win_ansi_maps_common_punctuation() {
        assert_eq!(win_ansi("A – B…"), vec![b'A', b' ', 0x96, b' ', b'B', 0x85]);
        assert_eq!(win_ansi("é"), vec![0xe9]);
        assert_eq!(win_ansi("রুটিন"), vec![b'?'; 5]);
    }
}
