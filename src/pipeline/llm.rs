//! Recognition over edgequake-llm: build vision messages and call the provider.
//!
//! [`LlmRecognizer`] is the production [`RecognitionService`]. It is
//! deliberately thin: prompt text lives in [`crate::prompts`], and the
//! primary/fallback policy lives in [`crate::pipeline::extract`]. This module
//! only turns a [`RecognitionRequest`] into chat messages, resolves a
//! provider for the requested model, and maps every provider error or timeout
//! to [`TimetableError::ServiceFailure`].

use crate::config::ConversionConfig;
use crate::error::TimetableError;
use crate::pipeline::extract::{RecognitionInput, RecognitionRequest, RecognitionService};
use crate::prompts::{text_user_message, USER_INSTRUCTION};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Where providers come from.
enum ProviderSource {
    /// Caller-built provider, used for every model.
    Fixed(Arc<dyn LLMProvider>),
    /// Named provider, instantiated per model.
    Named(String),
    /// Auto-detected from the environment.
    AutoDetect,
}

/// [`RecognitionService`] backed by an edgequake-llm vision provider.
pub struct LlmRecognizer {
    source: ProviderSource,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl LlmRecognizer {
    /// Build from the provider settings of `config`.
    ///
    /// Resolution order, most specific first:
    /// 1. `config.provider` — a pre-built provider, used as-is.
    /// 2. `config.provider_name` — instantiated per model via [`ProviderFactory`].
    /// 3. `EDGEQUAKE_LLM_PROVIDER` — provider named by the environment.
    /// 4. `OPENAI_API_KEY` present — OpenAI.
    /// 5. [`ProviderFactory::from_env`] full auto-detection.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let source = if let Some(ref provider) = config.provider {
            ProviderSource::Fixed(Arc::clone(provider))
        } else if let Some(ref name) = config.provider_name {
            ProviderSource::Named(name.clone())
        } else if let Some(name) = non_empty_env("EDGEQUAKE_LLM_PROVIDER") {
            ProviderSource::Named(name)
        } else if non_empty_env("OPENAI_API_KEY").is_some() {
            ProviderSource::Named("openai".to_string())
        } else {
            ProviderSource::AutoDetect
        };

        Self {
            source,
            options: build_options(config),
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, TimetableError> {
        match &self.source {
            ProviderSource::Fixed(p) => Ok(Arc::clone(p)),
            ProviderSource::Named(name) => ProviderFactory::create_llm_provider(name, model)
                .map_err(|e| TimetableError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: format!("{e}"),
                }),
            ProviderSource::AutoDetect => {
                let (llm_provider, _embedding) =
                    ProviderFactory::from_env().map_err(|e| TimetableError::ProviderNotConfigured {
                        provider: "auto".to_string(),
                        hint: format!(
                            "No LLM provider could be auto-detected from environment.\n\
                            Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                            Error: {}",
                            e
                        ),
                    })?;
                Ok(llm_provider)
            }
        }
    }

    async fn call(&self, model: &str, request: &RecognitionRequest) -> Result<String, TimetableError> {
        let provider = self.provider_for(model)?;
        let messages = build_messages(request);
        let start = Instant::now();

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| TimetableError::ServiceFailure {
            model: model.to_string(),
            detail: format!("timed out after {}s", self.timeout_secs),
        })?
        .map_err(|e| TimetableError::ServiceFailure {
            model: model.to_string(),
            detail: format!("{e}"),
        })?;

        debug!(
            "Model {}: {} input tokens, {} output tokens, {:?}",
            model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

impl RecognitionService for LlmRecognizer {
    fn recognize<'a>(
        &'a self,
        model: &'a str,
        request: &'a RecognitionRequest,
    ) -> BoxFuture<'a, Result<String, TimetableError>> {
        self.call(model, request).boxed()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// System message, then one user message carrying the text or the images.
fn build_messages(request: &RecognitionRequest) -> Vec<ChatMessage> {
    let user = match &request.input {
        RecognitionInput::Text(text) => ChatMessage::user(&text_user_message(text)),
        RecognitionInput::Images(images) => {
            ChatMessage::user_with_images(USER_INSTRUCTION, images.clone())
        }
    };
    vec![ChatMessage::system(request.system_prompt.as_str()), user]
}

/// Build `CompletionOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
