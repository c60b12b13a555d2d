//! Model gateway: one structured request to the inference service.
//!
//! The gateway is the only stage with network I/O. It is built once per run
//! by whoever drives the report compiler and handed to every task by
//! reference, so the provider handle has a single, explicit owner.
//!
//! ## Layers
//!
//! ```text
//! task ──▶ ModelGateway::request::<T>() ──▶ InferenceBackend::complete()
//!            (cleanup + parse + typed)        (provider transport)
//! ```
//!
//! [`InferenceBackend`] is the seam: production uses [`ProviderBackend`] over
//! an `edgequake-llm` provider; tests plug in a scripted backend.

use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, GatewayError};
use crate::pipeline::postprocess::clean_json_reply;
use crate::prompts::json_directive;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One prompt plus the JSON schema the reply must follow.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    pub prompt: String,
    pub schema: Value,
}

/// Raw reply from a backend, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A parsed, typed reply plus its token accounting.
#[derive(Debug, Clone)]
pub struct Structured<T> {
    pub value: T,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Transport to an inference service.
///
/// Implementations must be `Send + Sync`: the compiler issues the three task
/// requests concurrently against one backend.
pub trait InferenceBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send one request and return the raw reply text.
    fn complete<'a>(
        &'a self,
        request: &'a StructuredRequest,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>>;
}

/// [`InferenceBackend`] over an `edgequake-llm` provider.
pub struct ProviderBackend {
    name: String,
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ProviderBackend {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            name: name.into(),
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl InferenceBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(
        &'a self,
        request: &'a StructuredRequest,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(json_directive(&request.schema)),
                ChatMessage::user(request.prompt.as_str()),
            ];
            let options = self.build_options();

            let call = self.provider.chat(&messages, Some(&options));
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(response)) => Ok(Completion {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                }),
                Ok(Err(e)) => Err(GatewayError::Request {
                    backend: self.name.clone(),
                    detail: format!("{}", e),
                }),
                Err(_) => Err(GatewayError::Timeout {
                    secs: self.timeout.as_secs(),
                }),
            }
        })
    }
}

/// Handle to the inference service for one run.
#[derive(Clone)]
pub struct ModelGateway {
    backend: Arc<dyn InferenceBackend>,
    model: String,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .finish()
    }
}

impl ModelGateway {
    /// Wrap an already-built backend.
    pub fn with_backend(backend: Arc<dyn InferenceBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Initialise the inference client described by `config`.
    ///
    /// Resolution order:
    ///
    /// 1. **Pre-built backend** (`config.backend`) — used as-is.
    /// 2. **Pre-built provider** (`config.provider`) — wrapped in a
    ///    [`ProviderBackend`].
    /// 3. **Named provider + model** — [`ProviderFactory::create_llm_provider`]
    ///    reads the provider's API key from the environment.
    ///
    /// A failure here aborts the whole run: no task is attempted.
    pub fn connect(config: &AnalysisConfig) -> Result<Self, AnalyzerError> {
        if let Some(ref backend) = config.backend {
            return Ok(Self::with_backend(Arc::clone(backend), config.model.clone()));
        }

        if let Some(ref provider) = config.provider {
            let backend = ProviderBackend::new(
                config.provider_name.clone(),
                Arc::clone(provider),
                config,
            );
            return Ok(Self::with_backend(Arc::new(backend), config.model.clone()));
        }

        let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
            .map_err(|e| AnalyzerError::ClientInit {
                provider: config.provider_name.clone(),
                hint: format!(
                    "Check your {} ({})",
                    api_key_hint(&config.provider_name),
                    e
                ),
            })?;

        info!(
            "Inference client ready: provider={}, model={}",
            config.provider_name, config.model
        );
        let backend = ProviderBackend::new(config.provider_name.clone(), provider, config);
        Ok(Self::with_backend(Arc::new(backend), config.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Send `prompt` with `schema` and parse the reply into `T`.
    ///
    /// The reply is cleaned (fences, surrounding prose), parsed as JSON and
    /// then deserialized; a reply that parses but has the wrong shape is a
    /// [`GatewayError::SchemaMismatch`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Value,
    ) -> Result<Structured<T>, GatewayError> {
        let start = Instant::now();
        let request = StructuredRequest {
            model: self.model.clone(),
            prompt,
            schema,
        };

        let completion = self.backend.complete(&request).await.map_err(|e| {
            warn!("{}: request failed — {}", self.backend.name(), e);
            e
        })?;
        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.backend.name(),
            completion.input_tokens,
            completion.output_tokens,
            start.elapsed()
        );

        let value = parse_reply(&completion.content)?;
        Ok(Structured {
            value,
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
        })
    }
}

/// Clean, parse and type a raw reply.
pub fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, GatewayError> {
    let cleaned = clean_json_reply(content);
    if cleaned.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    let json: Value = serde_json::from_str(&cleaned).map_err(|e| GatewayError::MalformedJson {
        detail: e.to_string(),
    })?;
    serde_json::from_value(json).map_err(|e| GatewayError::SchemaMismatch {
        detail: e.to_string(),
    })
}

/// Environment variable a provider reads its key from, for error hints.
fn api_key_hint(provider: &str) -> String {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" => "GEMINI_API_KEY".to_string(),
        "openai" => "OPENAI_API_KEY".to_string(),
        "anthropic" => "ANTHROPIC_API_KEY".to_string(),
        "mistral" => "MISTRAL_API_KEY".to_string(),
        "azure" => "AZURE_OPENAI_API_KEY".to_string(),
        "ollama" | "lmstudio" => "local server configuration".to_string(),
        other => format!("{}_API_KEY", other.to_ascii_uppercase()),
    }
}
