//! The text-completion collaborator: one instruction in, one response out.
//!
//! The rest of the crate is synchronous, so the model sits behind the
//! blocking [`CompletionBackend`] trait. [`ProviderBackend`] adapts any
//! `edgequake-llm` provider to it by driving the async client on a private
//! current-thread runtime. Tests and embedders plug in their own backend
//! through [`crate::config::GeneratorConfig::backend`].
//!
//! There is no retry policy. A failed or timed-out request is reported to the
//! caller as-is.

use crate::config::{GeneratorConfig, DEFAULT_MODEL};
use crate::error::Srs2TestError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A model response and its token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Sends a single instruction and blocks until the model answers.
pub trait CompletionBackend: Send + Sync {
    /// Model identifier, for logs and progress events.
    fn model(&self) -> &str;

    fn complete(&self, instruction: &str) -> Result<Completion, Srs2TestError>;
}

/// [`CompletionBackend`] over an `edgequake-llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl fmt::Debug for ProviderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBackend")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GeneratorConfig) -> Result<Self, Srs2TestError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Srs2TestError::Internal(format!("Failed to start async runtime: {e}")))?;

        // The provider may have picked its model from the environment.
        let model = match provider.model() {
            "" => config.model_or_default().to_string(),
            name => name.to_string(),
        };

        Ok(Self {
            provider,
            model,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
            runtime,
        })
    }
}

impl CompletionBackend for ProviderBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, instruction: &str) -> Result<Completion, Srs2TestError> {
        let messages = vec![ChatMessage::user(instruction)];
        let start = Instant::now();

        let call = self.provider.chat(&messages, Some(&self.options));
        let response = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, call).await })
            .map_err(|_| Srs2TestError::ModelTimeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| Srs2TestError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(Completion {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Build `CompletionOptions` from the config.
///
/// Unset values are left to the provider.
fn build_options(config: &GeneratorConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Resolve the completion backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in a [`ProviderBackend`].
/// 3. **Named provider** (`config.provider_name`) with the configured model,
///    created by [`ProviderFactory::create_llm_provider`] which reads the
///    matching API key from the environment.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`,
///    when both are set and no model was configured explicitly.
/// 5. **OpenAI** when `OPENAI_API_KEY` is set, so users holding several keys
///    land on the default model's provider.
/// 6. **Full auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_backend(config: &GeneratorConfig) -> Result<Arc<dyn CompletionBackend>, Srs2TestError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let provider = resolve_provider(config)?;
    let backend = ProviderBackend::new(provider, config)?;
    info!("Using model {}", backend.model());
    Ok(Arc::new(backend))
}

fn resolve_provider(config: &GeneratorConfig) -> Result<Arc<dyn LLMProvider>, Srs2TestError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if config.model.is_none() {
        if let (Ok(prov), Ok(env_model)) = (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            if !prov.is_empty() && !env_model.is_empty() {
                return create_provider(&prov, &env_model);
            }
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Srs2TestError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Srs2TestError> {
    debug!("Creating provider '{}' for model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Srs2TestError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
