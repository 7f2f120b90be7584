//! Offline pipeline tests: a scripted recognition service stands in for the
//! vision model, so decode → select/adjust → normalize → render run for real
//! without network access or pdfium.

use edgequake_timetable::{
    convert_from_bytes, extract, normalize, render_table, Canvas, ConversionConfig,
    ConversionProgressCallback, LayoutConfig, ModelPlan, RecognitionInput, RecognitionRequest,
    RecognitionService, Rgb, ScheduleTable, TimetableError,
};
use edgequake_timetable::render::{Rect, TextStyle};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};

/// Route library logs through the test harness; `RUST_LOG=debug` to see them.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Answers every model from a fixed script; `None` means the model is down.
struct ScriptedService {
    script: Vec<(&'static str, Option<String>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new(script: Vec<(&'static str, Option<String>)>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RecognitionService for ScriptedService {
    fn recognize<'a>(
        &'a self,
        model: &'a str,
        _request: &'a RecognitionRequest,
    ) -> BoxFuture<'a, Result<String, TimetableError>> {
        self.calls.lock().unwrap().push(model.to_string());
        let reply = self
            .script
            .iter()
            .find(|(m, _)| *m == model)
            .and_then(|(_, r)| r.clone());
        async move {
            reply.ok_or_else(|| TimetableError::ServiceFailure {
                model: model.to_string(),
                detail: "503 Service Unavailable".into(),
            })
        }
        .boxed()
    }
}

#[derive(Default)]
struct CountingCanvas {
    pages: usize,
    header_draws: usize,
    fills: Vec<(f32, Rgb)>,
}

impl Canvas for CountingCanvas {
    fn page_size(&self) -> (f32, f32) {
        (841.89, 595.28)
    }
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.fills.push((rect.y, color));
    }
    fn stroke_rect(&mut self, _rect: Rect, _color: Rgb) {}
    fn draw_text(&mut self, text: &str, _rect: Rect, style: &TextStyle) {
        if style.bold && text == "Day" {
            self.header_draws += 1;
        }
    }
    fn measure_wrapped_height(&self, text: &str, _w: f32, _fs: f32, _b: bool) -> f32 {
        text.split('\n').count() as f32 * 9.0
    }
    fn start_new_page(&mut self) {
        self.pages += 1;
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ConversionProgressCallback for EventLog {
    fn on_input_ready(&self, kind: &str, parts: usize) {
        self.0.lock().unwrap().push(format!("input:{kind}:{parts}"));
    }
    fn on_recognition_start(&self, model: &str) {
        self.0.lock().unwrap().push(format!("start:{model}"));
    }
    fn on_fallback(&self, from: &str, to: &str, _error: &str) {
        self.0.lock().unwrap().push(format!("fallback:{from}->{to}"));
    }
    fn on_rows_ready(&self, rows: usize, adjusted: usize) {
        self.0.lock().unwrap().push(format!("rows:{rows}:{adjusted}"));
    }
    fn on_render_complete(&self, pages: usize) {
        self.0.lock().unwrap().push(format!("pages:{pages}"));
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

const ROUTINE_ANSWER: &str = r#"Here is the schedule you asked for:

```json
[
  {"Day": "Sunday", "Course": "CSE 110", "Slot": "8:00am-9:20am", "Room": "UB40201"},
  {"Day": "Sunday", "Course": "CSE 110L", "Slot": "11:00 AM – 01:50 PM", "Room": "Lab 3"},
  {"Day": "Monday", "Course": "MAT 120", "Slot": "02:00 PM - 03:20 PM"},
  {"Day": "Tuesday", "Course": "ENG 101", "Slot": "07:00 AM - 07:50 AM", "Notes": "online"}
]
```
Let me know if you need anything else."#;

fn text_request() -> RecognitionRequest {
    RecognitionRequest::for_input(RecognitionInput::Text("Day Course Slot Room".into()), None)
}

/// Smallest valid PNG: 1×1, RGBA.
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

// ── Extraction + normalisation ──────────────────────────────────────────────

#[tokio::test]
async fn prose_wrapped_answer_is_adjusted_and_normalised() {
    init_logging();
    let service = ScriptedService::new(vec![("gpt-4o", Some(ROUTINE_ANSWER.to_string()))]);
    let plan = ModelPlan::new("gpt-4o", Some("gpt-4.1-mini".into()));

    let extraction = extract(service.as_ref(), &plan, &text_request(), None)
        .await
        .expect("extraction should succeed");

    assert_eq!(extraction.model, "gpt-4o");
    assert!(!extraction.used_fallback);
    assert_eq!(extraction.adjustment.changed_cells, 3);
    assert_eq!(
        extraction.adjustment.column.as_ref().map(|c| c.header.as_str()),
        Some("Slot")
    );

    let table = normalize(&extraction.rows);
    assert_eq!(table.headers, vec!["Day", "Course", "Slot", "Room", "Notes"]);
    assert!(table.rows.iter().all(|r| r.len() == 5));
    assert_eq!(table.rows[0][2], "08:00 AM - 09:05 AM");
    assert_eq!(table.rows[1][2], "10:30 AM - 12:50 PM");
    assert_eq!(table.rows[2][2], "01:00 PM - 02:05 PM");
    // Unknown slot stays untouched; absent cells are blank.
    assert_eq!(table.rows[3][2], "07:00 AM - 07:50 AM");
    assert_eq!(table.rows[2][3], "");
    assert_eq!(table.rows[0][4], "");
}

#[tokio::test]
async fn down_primary_falls_back_once() {
    init_logging();
    let service = ScriptedService::new(vec![
        ("gpt-4o", None),
        ("gpt-4.1-mini", Some(ROUTINE_ANSWER.to_string())),
    ]);
    let plan = ModelPlan::new("gpt-4o", Some("gpt-4.1-mini".into()));

    let extraction = extract(service.as_ref(), &plan, &text_request(), None)
        .await
        .unwrap();

    assert!(extraction.used_fallback);
    assert_eq!(extraction.model, "gpt-4.1-mini");
    assert_eq!(service.calls(), vec!["gpt-4o", "gpt-4.1-mini"]);
}

#[tokio::test]
async fn malformed_answer_surfaces_with_excerpt() {
    init_logging();
    let long_prose = format!("Sorry, I can't read this image. {}", "x".repeat(1000));
    let service = ScriptedService::new(vec![("gpt-4o", Some(long_prose))]);
    let plan = ModelPlan::new("gpt-4o", Some("gpt-4.1-mini".into()));

    let err = extract(service.as_ref(), &plan, &text_request(), None)
        .await
        .unwrap_err();

    match err {
        TimetableError::MalformedResponse { excerpt, .. } => {
            assert!(excerpt.starts_with("Sorry, I can't read this image."));
            assert!(excerpt.chars().count() <= 301);
        }
        other => panic!("expected MalformedResponse, got {other:?}"),
    }
    assert_eq!(service.calls(), vec!["gpt-4o"]);
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[test]
fn long_schedule_paginates_with_repeated_header() {
    let layout = LayoutConfig::default();
    let table = ScheduleTable {
        headers: vec!["Day".into(), "Time".into(), "Course".into()],
        rows: (0..50)
            .map(|i| {
                vec![
                    format!("Day {i}"),
                    "08:00 AM - 09:05 AM".into(),
                    "CSE 110\nSection 4".into(),
                ]
            })
            .collect(),
    };

    let mut canvas = CountingCanvas::default();
    let summary = render_table(&mut canvas, &table, "Ramadan Class Schedule", &layout);

    // Every row is 2 × 9 + 8 = 26pt. First page: 78.8 + 18 × 26 = 546.8,
    // next pages hold (555.28 − 52) / 26 → 19 rows. 18 + 19 + 13 = 50.
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.rows_drawn, 50);
    assert_eq!(canvas.pages, 2);
    assert_eq!(canvas.header_draws, 3);

    // Zebra parity follows the global row index, not the page.
    let row_fills: Vec<Rgb> = canvas
        .fills
        .iter()
        .filter(|(_, c)| *c != layout.header_fill)
        .map(|(_, c)| *c)
        .collect();
    assert_eq!(row_fills.len(), 50 * 3);
    for (i, chunk) in row_fills.chunks(3).enumerate() {
        let expected = if i % 2 == 0 {
            layout.even_row_fill
        } else {
            layout.odd_row_fill
        };
        assert!(chunk.iter().all(|c| *c == expected), "row {i}");
    }
}

// ── Full conversion with an injected recognizer ─────────────────────────────

#[tokio::test]
async fn image_upload_converts_to_pdf() {
    init_logging();
    let service = ScriptedService::new(vec![("gpt-4o", Some(ROUTINE_ANSWER.to_string()))]);
    let events = Arc::new(EventLog::default());
    let config = ConversionConfig::builder()
        .recognizer(service.clone())
        .progress_callback(events.clone())
        .title("Spring Routine")
        .build()
        .unwrap();

    let output = convert_from_bytes(PNG_1X1, "routine.png", &config)
        .await
        .expect("conversion should succeed");

    assert!(output.pdf.starts_with(b"%PDF-"));
    assert_eq!(output.stats.rows, 4);
    assert_eq!(output.stats.columns, 5);
    assert_eq!(output.stats.adjusted_cells, 3);
    assert_eq!(output.stats.recognition_input, "images");
    assert_eq!(output.stats.rendered_pages, 1);
    assert_eq!(output.table.rows[0][2], "08:00 AM - 09:05 AM");

    let log = events.0.lock().unwrap().clone();
    assert_eq!(
        log,
        vec!["input:images:1", "start:gpt-4o", "rows:4:3", "pages:1"]
    );
}

#[tokio::test]
async fn empty_answer_array_renders_placeholder() {
    init_logging();
    let service = ScriptedService::new(vec![("gpt-4o", Some("[]".to_string()))]);
    let config = ConversionConfig::builder()
        .recognizer(service)
        .build()
        .unwrap();

    let output = convert_from_bytes(PNG_1X1, "scan.jpg", &config).await.unwrap();
    assert!(output.table.is_placeholder());
    assert_eq!(output.stats.rows, 0);
    assert!(output.pdf.starts_with(b"%PDF-"));
}
