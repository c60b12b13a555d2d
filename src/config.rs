//! Configuration types for an analysis run.
//!
//! All run behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config between the CLI and the upload surface and to log it.

use crate::error::AnalyzerError;
use crate::pipeline::gateway::InferenceBackend;
use crate::progress::ProgressCallback;
use crate::prompts::MAX_INPUT_CHARS;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Configuration for one analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use act_analyzer::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .provider_name("gemini")
///     .model("gemini-2.5-flash")
///     .sequential_tasks(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM provider name (e.g. "gemini", "openai", "anthropic"). Default: "gemini".
    ///
    /// The provider reads its API key from the environment when the client is
    /// initialised (`GEMINI_API_KEY`, `OPENAI_API_KEY`, ...).
    pub provider_name: String,

    /// LLM model identifier. Default: "gemini-2.5-pro".
    pub model: String,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed inference backend. Takes precedence over `provider`.
    pub backend: Option<Arc<dyn InferenceBackend>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Extraction and rule checking want the model to stay close to the text.
    pub temperature: f32,

    /// Maximum tokens the model may generate per task. Default: 8192.
    pub max_tokens: usize,

    /// Maximum characters of document text embedded in each prompt. Default: 15000.
    pub max_input_chars: usize,

    /// Per-request timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Run the three tasks one after another instead of concurrently. Default: false.
    ///
    /// The tasks share no data, so the report is the same either way. Enable
    /// this when the provider rejects parallel requests on your quota.
    pub sequential_tasks: bool,

    /// Optional per-task progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_input_chars: MAX_INPUT_CHARS,
            api_timeout_secs: 120,
            sequential_tasks: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("sequential_tasks", &self.sequential_tasks)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.config.backend = Some(backend);
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

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn sequential_tasks(mut self, v: bool) -> Self {
        self.config.sequential_tasks = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalyzerError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Model must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_input_chars == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
