//! PDF access via pdfium: read the text layer, or rasterise pages when the
//! PDF is a scan without one.
//!
//! pdfium keeps thread-local state and is not async-safe, so every call runs
//! inside `tokio::task::spawn_blocking`.

use crate::config::{ConversionConfig, PageSelection};
use crate::error::TimetableError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text found on the selected pages of a PDF.
#[derive(Debug, Clone)]
pub struct TextLayer {
    /// Page texts joined with blank lines; empty for image-only PDFs.
    pub text: String,
    pub total_pages: usize,
    /// 0-based indices of the pages that were read.
    pub page_indices: Vec<usize>,
}

impl TextLayer {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read the text layer of the selected pages.
pub async fn extract_text(
    pdf_path: &Path,
    password: Option<&str>,
    pages: &PageSelection,
) -> Result<TextLayer, TimetableError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);
    let selection = pages.clone();

    tokio::task::spawn_blocking(move || extract_text_blocking(&path, pwd.as_deref(), &selection))
        .await
        .map_err(|e| TimetableError::Internal(format!("Text extraction task panicked: {}", e)))?
}

fn extract_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
) -> Result<TextLayer, TimetableError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let page_indices = selection.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(TimetableError::NoPagesSelected { total: total_pages });
    }

    let mut parts = Vec::with_capacity(page_indices.len());
    for &idx in &page_indices {
        let page = pages
            .get(idx as u16)
            .map_err(|e| TimetableError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
        let text = page.text();
        match text {
            Ok(text) => parts.push(text.all()),
            Err(e) => warn!("Page {}: no text layer ({:?})", idx + 1, e),
        }
    }

    let text = parts.join("\n\n");
    info!(
        "PDF text layer: {} chars from {}/{} pages",
        text.len(),
        page_indices.len(),
        total_pages
    );

    Ok(TextLayer {
        text,
        total_pages,
        page_indices,
    })
}

/// Rasterise selected pages of a PDF into images.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ConversionConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, TimetableError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| TimetableError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, TimetableError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = pages
            .get(idx as u16)
            .map_err(|e| TimetableError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width(page.width().value, dpi, max_pixels))
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            TimetableError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}

/// Bind pdfium: `PDFIUM_LIB_PATH` (a library file or its directory) first,
/// then the system library search path.
fn bind_pdfium() -> Result<Pdfium, TimetableError> {
    if let Some(path) = std::env::var_os("PDFIUM_LIB_PATH").filter(|p| !p.is_empty()) {
        let pb = PathBuf::from(path);
        let lib_path = if pb.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&pb)
        } else {
            pb
        };
        match Pdfium::bind_to_library(&lib_path) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => warn!("PDFIUM_LIB_PATH {}: {:?}", lib_path.display(), e),
        }
    }
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| TimetableError::PdfiumUnavailable {
            detail: format!("{:?}", e),
        })
}

/// Pixel width for a page `width_pt` points wide at `dpi`, capped at `max_pixels`.
fn target_width(width_pt: f32, dpi: u32, max_pixels: u32) -> i32 {
    let px = (width_pt / 72.0 * dpi as f32).round() as i32;
    px.clamp(1, max_pixels as i32)
}

/// Open a PDF, mapping pdfium's load errors onto the password/corrupt variants.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, TimetableError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                TimetableError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                TimetableError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            TimetableError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
