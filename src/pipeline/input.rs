//! Input resolution: normalise a user-supplied path or URL to a local file
//! and decide whether it is a PDF or an image.
//!
//! pdfium needs a file-system path, so URLs are downloaded into a `TempDir`
//! that lives as long as the [`ResolvedInput`]. PDFs are checked for the
//! `%PDF` magic bytes up front so a mislabelled upload fails with a clear
//! error instead of a pdfium crash.

use crate::error::TimetableError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Image extensions accepted as direct vision input.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// What kind of document the input is.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum SourceKind {
    Pdf,
    /// A raster image; `mime` is derived from the extension.
    Image { mime: String },
}

impl SourceKind {
    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Result<Self, TimetableError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if ext == "pdf" {
            return Ok(SourceKind::Pdf);
        }
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            let mime = match ext.as_str() {
                "jpg" | "jpeg" => "image/jpeg".to_string(),
                other => format!("image/{other}"),
            };
            return Ok(SourceKind::Image { mime });
        }
        Err(TimetableError::UnsupportedFileType {
            extension: if ext.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{ext}")
            },
        })
    }
}

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, kind: SourceKind },
    /// Input was a URL; the file lives in a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded {
        path: PathBuf,
        kind: SourceKind,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } => path,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &SourceKind {
        match self {
            ResolvedInput::Local { kind, .. } => kind,
            ResolvedInput::Downloaded { kind, .. } => kind,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local, classified file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TimetableError> {
    if input.trim().is_empty() {
        return Err(TimetableError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence, type and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, TimetableError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(TimetableError::FileNotFound { path });
    }
    let kind = SourceKind::from_path(&path)?;

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            if kind == SourceKind::Pdf {
                use std::io::Read;
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                    return Err(TimetableError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TimetableError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TimetableError::FileNotFound { path });
        }
    }

    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(ResolvedInput::Local { path, kind })
}

/// Download a URL to a temporary directory and classify it.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TimetableError> {
    info!("Downloading schedule from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TimetableError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TimetableError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            TimetableError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(TimetableError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = extract_filename(url, content_type.as_deref());
    let kind = SourceKind::from_path(Path::new(&filename))?;

    let temp_dir = TempDir::new().map_err(|e| TimetableError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TimetableError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if kind == SourceKind::Pdf && bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(TimetableError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| TimetableError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        kind,
        _temp_dir: temp_dir,
    })
}

/// Pick a filename from the URL path, or from the `Content-Type` header
/// when the URL has no usable extension.
fn extract_filename(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if SourceKind::from_path(Path::new(last)).is_ok() {
                    return last.to_string();
                }
            }
        }
    }

    let ext = match content_type.map(|c| c.split(';').next().unwrap_or("").trim()) {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/bmp") => "bmp",
        _ => "pdf",
    };
    format!("downloaded.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/routine.pdf"));
        assert!(is_url("http://example.com/routine.png"));
        assert!(!is_url("/tmp/routine.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn classify_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/b.PDF")).unwrap(), SourceKind::Pdf);
        assert_eq!(
            SourceKind::from_path(Path::new("scan.JPG")).unwrap(),
            SourceKind::Image { mime: "image/jpeg".into() }
        );
        assert_eq!(
            SourceKind::from_path(Path::new("scan.webp")).unwrap(),
            SourceKind::Image { mime: "image/webp".into() }
        );
        assert!(matches!(
            SourceKind::from_path(Path::new("notes.docx")),
            Err(TimetableError::UnsupportedFileType { extension }) if extension == ".docx"
        ));
        assert!(SourceKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn filename_from_url_or_content_type() {
        assert_eq!(extract_filename("https://x.org/files/routine.png", None), "routine.png");
        assert_eq!(
            extract_filename("https://x.org/download?id=4", Some("image/jpeg; charset=binary")),
            "downloaded.jpg"
        );
        assert_eq!(extract_filename("https://x.org/d/4", None), "downloaded.pdf");
    }

    #[tokio::test]
    async fn local_pdf_with_wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::File::create(&path).unwrap().write_all(b"GIF89a").unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.err().unwrap();
        assert!(matches!(err, TimetableError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn local_image_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routine.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.kind(), &SourceKind::Image { mime: "image/png".into() });
        assert_eq!(resolved.path(), path.as_path());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.err().unwrap();
        assert!(matches!(err, TimetableError::FileNotFound { .. }));
    }
}
