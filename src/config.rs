//! Configuration types for schedule conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Page geometry and colours for the
//! output document live in [`LayoutConfig`], nested inside it.

use crate::error::TimetableError;
use crate::pipeline::extract::{ModelPlan, RecognitionService};
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default primary model.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Default fallback model, tried once when the primary call fails.
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4.1-mini";
/// Default document title.
pub const DEFAULT_TITLE: &str = "Ramadan Class Schedule";

/// Configuration for a schedule conversion.
///
/// # Example
/// ```rust
/// use edgequake_timetable::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .model("gpt-4o")
///     .fallback_model("gpt-4.1-mini")
///     .title("Spring 2026 Routine")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Primary vision model. Default: `gpt-4o`.
    pub model: String,

    /// Model tried once if the primary call fails. Ignored when equal to
    /// `model`. Default: `gpt-4.1-mini`.
    pub fallback_model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    /// The same provider then serves both the primary and fallback attempts.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom recognition backend. Takes precedence over every LLM setting.
    pub recognizer: Option<Arc<dyn RecognitionService>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Transcription wants the model to copy what it sees, not to improvise.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A full weekly routine as JSON easily runs past 3 000 tokens; a
    /// truncated answer loses its closing `]` and fails to decode.
    pub max_tokens: usize,

    /// Per-call timeout for the recognition service in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in prompt for the input kind.
    pub system_prompt: Option<String>,

    /// Image detail hint passed to the vision API. Default: "auto".
    pub image_detail: String,

    /// Rendering DPI for scanned PDFs without a text layer. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rasterised page dimension in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pages of a PDF input to read. Default: all.
    pub pages: PageSelection,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Title printed above the table. Default: "Ramadan Class Schedule".
    pub title: String,

    /// Output page layout.
    pub layout: LayoutConfig,

    /// Optional progress callback for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            provider_name: None,
            provider: None,
            recognizer: None,
            temperature: 0.1,
            max_tokens: 8192,
            api_timeout_secs: 120,
            system_prompt: None,
            image_detail: "auto".to_string(),
            dpi: 150,
            max_rendered_pixels: 2000,
            password: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            title: DEFAULT_TITLE.to_string(),
            layout: LayoutConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("recognizer", &self.recognizer.as_ref().map(|_| "<dyn RecognitionService>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("image_detail", &self.image_detail)
            .field("dpi", &self.dpi)
            .field("pages", &self.pages)
            .field("title", &self.title)
            .field("layout", &self.layout)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The primary/fallback plan for the recognition call.
    pub fn model_plan(&self) -> ModelPlan {
        ModelPlan::new(self.model.clone(), self.fallback_model.clone())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.config.fallback_model = Some(model.into());
        self
    }

    /// Disable the fallback attempt entirely.
    pub fn no_fallback(mut self) -> Self {
        self.config.fallback_model = None;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn RecognitionService>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn image_detail(mut self, detail: impl Into<String>) -> Self {
        self.config.image_detail = detail.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, TimetableError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(TimetableError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(TimetableError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

/// An sRGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);

    /// Build a colour from a `0xRRGGBB` literal.
    pub const fn hex(v: u32) -> Self {
        Rgb(
            ((v >> 16) & 0xff) as f32 / 255.0,
            ((v >> 8) & 0xff) as f32 / 255.0,
            (v & 0xff) as f32 / 255.0,
        )
    }
}

/// Page geometry, typography and colours of the rendered table.
///
/// Units are PDF points (1/72 in). Defaults reproduce an A4 landscape sheet
/// with a dark header band and zebra-striped rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Left, right and top margin.
    pub margin: f32,
    /// Space kept free at the bottom of each page.
    pub bottom_reserve: f32,
    pub title_font_size: f32,
    /// Gap between the title and the table.
    pub title_gap: f32,
    pub font_size: f32,
    pub header_height: f32,
    pub min_row_height: f32,
    pub cell_padding_x: f32,
    pub cell_padding_y: f32,
    /// Upper bound for the first column width.
    pub first_column_cap: f32,
    /// First column share of the available width, before the cap.
    pub first_column_fraction: f32,
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub even_row_fill: Rgb,
    pub odd_row_fill: Rgb,
    pub border: Rgb,
    pub text: Rgb,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 841.89,
            page_height: 595.28,
            margin: 30.0,
            bottom_reserve: 40.0,
            title_font_size: 14.0,
            title_gap: 10.0,
            font_size: 7.5,
            header_height: 22.0,
            min_row_height: 22.0,
            cell_padding_x: 3.0,
            cell_padding_y: 4.0,
            first_column_cap: 155.0,
            first_column_fraction: 0.24,
            header_fill: Rgb::hex(0x2c3e50),
            header_text: Rgb::WHITE,
            even_row_fill: Rgb::hex(0xf0f4f8),
            odd_row_fill: Rgb::WHITE,
            border: Rgb::hex(0xcccccc),
            text: Rgb::BLACK,
        }
    }
}

impl LayoutConfig {
    /// A4 portrait variant of the default layout.
    pub fn portrait() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            ..Self::default()
        }
    }

    /// Width between the left and right margins.
    pub fn available_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Lowest y a row may reach before a page break.
    pub fn page_bottom(&self) -> f32 {
        self.page_height - self.bottom_reserve
    }

    fn validate(&self) -> Result<(), TimetableError> {
        if self.available_width() <= 0.0 {
            return Err(TimetableError::InvalidConfig(format!(
                "Margins ({}) leave no room on a {}pt wide page",
                self.margin, self.page_width
            )));
        }
        let body = self.page_bottom() - self.margin - self.header_height;
        if body < self.min_row_height {
            return Err(TimetableError::InvalidConfig(format!(
                "Page height {}pt cannot fit a header and one row",
                self.page_height
            )));
        }
        if self.font_size <= 0.0 || self.min_row_height <= 0.0 {
            return Err(TimetableError::InvalidConfig(
                "Font size and row height must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of a PDF input to read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.fallback_model.as_deref(), Some("gpt-4.1-mini"));
        assert_eq!(c.max_tokens, 8192);
        assert_eq!(c.layout.header_height, 22.0);
    }

    #[test]
    fn builder_clamps() {
        let c = ConversionConfig::builder()
            .dpi(10)
            .temperature(9.0)
            .api_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 72);
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.api_timeout_secs, 1);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ConversionConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, TimetableError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_impossible_layout() {
        let layout = LayoutConfig {
            page_height: 80.0,
            ..LayoutConfig::default()
        };
        assert!(ConversionConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn model_plan_follows_config() {
        let c = ConversionConfig::builder().model("a").no_fallback().build().unwrap();
        assert_eq!(c.model_plan().attempts(), vec!["a"]);
    }

    #[test]
    fn hex_colour() {
        assert_eq!(Rgb::hex(0xffffff), Rgb::WHITE);
        let Rgb(r, g, b) = Rgb::hex(0x2c3e50);
        assert!((r - 44.0 / 255.0).abs() < 1e-6);
        assert!((g - 62.0 / 255.0).abs() < 1e-6);
        assert!((b - 80.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(3), vec![1, 2]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(3), vec![0, 2]);
    }
}
