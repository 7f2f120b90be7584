//! Conversion entry points.
//!
//! One request runs start to finish in sequence: acquire content, one
//! recognition plan (primary, then at most one fallback), decode and adjust,
//! normalise, render. Nothing is shared between requests except the
//! read-only adjustment table.

use crate::config::ConversionConfig;
use crate::error::TimetableError;
use crate::output::{ConversionStats, TimetableOutput};
use crate::pipeline::encode::{encode_image_bytes, encode_page};
use crate::pipeline::extract::{extract, RecognitionInput, RecognitionRequest, RecognitionService};
use crate::pipeline::input::{self, SourceKind};
use crate::pipeline::llm::LlmRecognizer;
use crate::pipeline::rasterize;
use crate::render::render_pdf;
use crate::table::normalize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a schedule (PDF or image, local path or URL) into an adjusted
/// table and a rendered PDF.
///
/// # Errors
/// Input problems (missing file, unsupported type, bad PDF), a recognition
/// failure that survived the fallback, or an unusable model answer. An answer
/// with no rows is not an error: the output holds the placeholder table.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TimetableOutput, TimetableError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_path(resolved.path(), resolved.kind(), config).await
}

/// Convert and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<TimetableOutput, TimetableError> {
    let output = convert(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.pdf).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TimetableOutput, TimetableError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TimetableError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert an uploaded file held in memory.
///
/// `file_name` only decides the input type by its extension; the bytes are
/// written to a managed temp file that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use edgequake_timetable::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("routine.jpg")?;
/// let output = convert_from_bytes(&bytes, "routine.jpg", &ConversionConfig::default()).await?;
/// std::fs::write("routine_ramadan.pdf", &output.pdf)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ConversionConfig,
) -> Result<TimetableOutput, TimetableError> {
    let kind = SourceKind::from_path(Path::new(file_name))?;
    if kind == SourceKind::Pdf && !bytes.starts_with(b"%PDF") {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(TimetableError::NotAPdf {
            path: file_name.into(),
            magic,
        });
    }

    let suffix = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix("timetable-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| TimetableError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| TimetableError::Internal(format!("tempfile write: {e}")))?;

    // `tmp` is dropped (and the file deleted) when `convert_path` returns
    convert_path(tmp.path(), &kind, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_path(
    path: &Path,
    kind: &SourceKind,
    config: &ConversionConfig,
) -> Result<TimetableOutput, TimetableError> {
    let total_start = Instant::now();

    // ── Step 1: Acquire content ──────────────────────────────────────────
    let acquire_start = Instant::now();
    let content = acquire_content(path, kind, config).await?;
    let acquire_duration_ms = acquire_start.elapsed().as_millis() as u64;
    info!(
        "Acquired {} input ({} part(s)) in {}ms",
        content.kind(),
        content.parts(),
        acquire_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_input_ready(content.kind(), content.parts());
    }
    let recognition_input = content.kind();

    // ── Step 2: Recognise, decode, adjust ────────────────────────────────
    let recognizer: Arc<dyn RecognitionService> = match config.recognizer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(LlmRecognizer::from_config(config)),
    };
    let request = RecognitionRequest::for_input(content, config.system_prompt.as_deref());

    let recognition_start = Instant::now();
    let extraction = extract(
        recognizer.as_ref(),
        &config.model_plan(),
        &request,
        config.progress_callback.as_ref(),
    )
    .await?;
    let recognition_duration_ms = recognition_start.elapsed().as_millis() as u64;

    // ── Step 3: Normalise ────────────────────────────────────────────────
    let table = normalize(&extraction.rows);
    if table.is_placeholder() {
        warn!("No schedule rows extracted; rendering placeholder table");
    }

    // ── Step 4: Render ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let (pdf, summary) = render_pdf(&table, &config.title, &config.layout);
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    debug!("Rendered {} bytes of PDF", pdf.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(summary.pages);
    }

    let stats = ConversionStats {
        source_kind: kind.clone(),
        recognition_input,
        model: extraction.model,
        used_fallback: extraction.used_fallback,
        rows: extraction.rows.len(),
        columns: table.column_count(),
        time_column: extraction.adjustment.column.map(|c| c.header),
        adjusted_cells: extraction.adjustment.changed_cells,
        swept: extraction.adjustment.swept,
        rendered_pages: summary.pages,
        acquire_duration_ms,
        recognition_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} rows, {} adjusted cells, {} page(s), {}ms total",
        stats.rows, stats.adjusted_cells, stats.rendered_pages, stats.total_duration_ms
    );

    Ok(TimetableOutput { table, pdf, stats })
}

/// Turn the resolved file into recognition content.
///
/// A PDF with a text layer is sent as text; a scanned PDF without one is
/// rasterised and sent as page images. Images are sent as-is.
async fn acquire_content(
    path: &Path,
    kind: &SourceKind,
    config: &ConversionConfig,
) -> Result<RecognitionInput, TimetableError> {
    match kind {
        SourceKind::Pdf => {
            let layer = rasterize::extract_text(path, config.password.as_deref(), &config.pages)
                .await?;
            if !layer.is_empty() {
                return Ok(RecognitionInput::Text(layer.text));
            }

            info!(
                "No text layer on {} page(s); rasterising for vision input",
                layer.page_indices.len()
            );
            let rendered = rasterize::render_pages(path, config, &layer.page_indices).await?;
            let images = rendered
                .iter()
                .map(|(_, img)| encode_page(img, &config.image_detail))
                .collect::<Result<Vec<_>, _>>()?;
            if images.is_empty() {
                return Err(TimetableError::NoPagesSelected {
                    total: layer.total_pages,
                });
            }
            Ok(RecognitionInput::Images(images))
        }
        SourceKind::Image { mime } => {
            let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => TimetableError::PermissionDenied {
                    path: path.to_path_buf(),
                },
                _ => TimetableError::FileNotFound {
                    path: path.to_path_buf(),
                },
            })?;
            let image = encode_image_bytes(&bytes, mime, &config.image_detail)?;
            Ok(RecognitionInput::Images(vec![image]))
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TimetableError> {
    let write_err = |e: std::io::Error| TimetableError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
