//! Extraction orchestrator: one request, a primary model, one fallback.
//!
//! ## Fallback policy
//!
//! The plan is an explicit value, [`ModelPlan`], rather than a retry loop:
//!
//! ```text
//! primary ──ok──▶ decode ──▶ select/adjust
//!    │
//!    └─ServiceFailure──▶ fallback (if distinct) ──ok──▶ decode ──▶ select/adjust
//!                             │
//!                             └─any error──▶ return the primary's error
//! ```
//!
//! Only [`TimetableError::ServiceFailure`] moves on to the fallback. An empty
//! or undecodable answer means the model did respond, so it is returned to
//! the caller as-is. There is never more than one call in flight and nothing
//! is cached between calls.

use crate::error::TimetableError;
use crate::pipeline::decode::decode;
use crate::pipeline::select::{select_and_adjust, AdjustmentReport};
use crate::progress::ProgressCallback;
use crate::prompts::{system_prompt, PromptSource};
use crate::table::Row;
use edgequake_llm::ImageData;
use futures::future::BoxFuture;
use std::fmt;
use tracing::{info, warn};

/// Content handed to the recognition service.
#[derive(Clone)]
pub enum RecognitionInput {
    /// Plain text, e.g. a PDF's text layer.
    Text(String),
    /// One or more inline images.
    Images(Vec<ImageData>),
}

impl fmt::Debug for RecognitionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionInput::Text(t) => write!(f, "Text({} bytes)", t.len()),
            RecognitionInput::Images(imgs) => write!(f, "Images({})", imgs.len()),
        }
    }
}

impl RecognitionInput {
    pub fn kind(&self) -> &'static str {
        match self {
            RecognitionInput::Text(_) => "text",
            RecognitionInput::Images(_) => "images",
        }
    }

    pub fn parts(&self) -> usize {
        match self {
            RecognitionInput::Text(_) => 1,
            RecognitionInput::Images(imgs) => imgs.len(),
        }
    }
}

/// System instruction plus the caller's content.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub system_prompt: String,
    pub input: RecognitionInput,
}

impl RecognitionRequest {
    /// Build a request with the built-in prompt for the input kind, or `custom_prompt`.
    pub fn for_input(input: RecognitionInput, custom_prompt: Option<&str>) -> Self {
        let source = match input {
            RecognitionInput::Text(_) => PromptSource::Text,
            RecognitionInput::Images(_) => PromptSource::Image,
        };
        let system_prompt = custom_prompt
            .map(str::to_string)
            .unwrap_or_else(|| system_prompt(source));
        Self {
            system_prompt,
            input,
        }
    }
}

/// Primary model and optional fallback, tried in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPlan {
    primary: String,
    fallback: Option<String>,
}

impl ModelPlan {
    pub fn new(primary: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback,
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// The fallback model, only when it differs from the primary.
    pub fn fallback(&self) -> Option<&str> {
        self.fallback
            .as_deref()
            .filter(|f| !f.is_empty() && *f != self.primary)
    }

    /// Models in the order they may be called.
    pub fn attempts(&self) -> Vec<&str> {
        std::iter::once(self.primary())
            .chain(self.fallback())
            .collect()
    }
}

/// The recognition capability: system prompt + content in, text blob out.
///
/// Implementations report transport and provider problems as
/// [`TimetableError::ServiceFailure`] so the orchestrator can apply the
/// fallback policy.
pub trait RecognitionService: Send + Sync {
    fn recognize<'a>(
        &'a self,
        model: &'a str,
        request: &'a RecognitionRequest,
    ) -> BoxFuture<'a, Result<String, TimetableError>>;
}

/// Adjusted rows plus how they were obtained.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub rows: Vec<Row>,
    /// Model whose answer was used.
    pub model: String,
    pub used_fallback: bool,
    pub adjustment: AdjustmentReport,
}

/// Run the model plan, decode the answer, then select and adjust the time column.
pub async fn extract(
    service: &dyn RecognitionService,
    plan: &ModelPlan,
    request: &RecognitionRequest,
    progress: Option<&ProgressCallback>,
) -> Result<Extraction, TimetableError> {
    info!(
        "Recognition request: {:?} via {}",
        request.input,
        plan.primary()
    );

    let (rows, model, used_fallback) = match attempt(service, plan.primary(), request, progress).await
    {
        Ok(rows) => (rows, plan.primary(), false),
        Err(primary_err) if primary_err.is_service_failure() => {
            let Some(fallback) = plan.fallback() else {
                return Err(primary_err);
            };
            warn!(
                "Model {} failed ({}); falling back to {}",
                plan.primary(),
                primary_err,
                fallback
            );
            if let Some(cb) = progress {
                cb.on_fallback(plan.primary(), fallback, &primary_err.to_string());
            }
            match attempt(service, fallback, request, progress).await {
                Ok(rows) => (rows, fallback, true),
                Err(fallback_err) => {
                    warn!("Fallback model {} also failed: {}", fallback, fallback_err);
                    return Err(primary_err);
                }
            }
        }
        Err(e) => return Err(e),
    };

    let (rows, adjustment) = select_and_adjust(rows);
    if let Some(cb) = progress {
        cb.on_rows_ready(rows.len(), adjustment.changed_cells);
    }

    Ok(Extraction {
        rows,
        model: model.to_string(),
        used_fallback,
        adjustment,
    })
}

async fn attempt(
    service: &dyn RecognitionService,
    model: &str,
    request: &RecognitionRequest,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<Row>, TimetableError> {
    if let Some(cb) = progress {
        cb.on_recognition_start(model);
    }
    let raw = service.recognize(model, request).await?;
    decode(&raw, model)
}
