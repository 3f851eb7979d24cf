//! Configuration for conversion and prompt generation.
//!
//! Everything a run needs — which model to call, where the style exemplars
//! live, which pages to read — is carried in one [`GeneratorConfig`] value
//! and passed to the component that needs it. Nothing is read from global
//! state after start-up; the binary maps its flags and environment onto a
//! config and hands it down.

use crate::error::Srs2TestError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Default location of the Java exemplars, relative to the project root.
pub const DEFAULT_EXAMPLE_PREFIX: &str = "src/test/java/com/sdp/m1";

/// Configuration for SRS conversion and test-prompt generation.
///
/// Built via [`GeneratorConfig::builder()`] or using
/// [`GeneratorConfig::default()`].
///
/// # Example
/// ```rust
/// use srs2test::GeneratorConfig;
///
/// let config = GeneratorConfig::builder()
///     .model("gpt-5-mini")
///     .api_timeout_secs(300)
///     .split_sections(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    // ── Model access ─────────────────────────────────────────────────────
    /// LLM model identifier, e.g. "gpt-5-mini". If None, [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed completion backend. Takes precedence over everything
    /// else; the usual way to run the pipeline without a network.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Sampling temperature. Default: None (provider default).
    ///
    /// Some reasoning models only accept their default temperature, so
    /// nothing is sent unless this is set.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. Default: None (provider default).
    pub max_tokens: Option<usize>,

    /// Timeout for the single completion request in seconds. Default: 600.
    ///
    /// A whole SRS goes out in one request and the structured answer can run
    /// to tens of thousands of tokens.
    pub api_timeout_secs: u64,

    // ── PDF input ────────────────────────────────────────────────────────
    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pages to extract. Default: all.
    pub pages: PageSelection,

    /// Custom parser instruction. If None, [`crate::prompts::SRS_PARSER_PROMPT`].
    pub parser_prompt: Option<String>,

    // ── Conversion output ────────────────────────────────────────────────
    /// Where to write the structured JSON. If None, `<input stem>.json`.
    pub output: Option<PathBuf>,

    /// Also split the structured JSON into one file per section. Default: false.
    pub split_sections: bool,

    // ── Prompt generation ────────────────────────────────────────────────
    /// Directory the exemplar paths are resolved against. If None, the
    /// current working directory.
    pub project_root: Option<PathBuf>,

    /// Java package directory holding the exemplar classes.
    /// Default: [`DEFAULT_EXAMPLE_PREFIX`].
    pub example_prefix: String,

    /// Custom generation template. If None, [`crate::prompts::TEST_GENERATION_PROMPT`].
    pub generation_prompt: Option<String>,

    /// Progress events for the conversion pipeline. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: None,
            max_tokens: None,
            api_timeout_secs: 600,
            download_timeout_secs: 120,
            password: None,
            pages: PageSelection::default(),
            parser_prompt: None,
            output: None,
            split_sections: false,
            project_root: None,
            example_prefix: DEFAULT_EXAMPLE_PREFIX.to_string(),
            generation_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn CompletionBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("output", &self.output)
            .field("split_sections", &self.split_sections)
            .field("project_root", &self.project_root)
            .field("example_prefix", &self.example_prefix)
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
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

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
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

    pub fn parser_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.parser_prompt = Some(prompt.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn split_sections(mut self, v: bool) -> Self {
        self.config.split_sections = v;
        self
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.project_root = Some(root.into());
        self
    }

    pub fn example_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.example_prefix = prefix.into();
        self
    }

    pub fn generation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.generation_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, Srs2TestError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(Srs2TestError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(Srs2TestError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == Some(0) {
            return Err(Srs2TestError::InvalidConfig(
                "max_tokens must be ≥ 1 when set".into(),
            ));
        }
        if let Some(ref model) = c.model {
            if model.trim().is_empty() {
                return Err(Srs2TestError::InvalidConfig("model name is empty".into()));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to extract.
///
/// Long SRS documents often carry cover pages, revision tables and
/// appendices that only cost tokens; selecting the requirement chapters
/// keeps the single request small.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Extract all pages (default).
    #[default]
    All,
    /// Extract a single page (1-indexed).
    Single(usize),
    /// Extract a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Extract specific pages (1-indexed, deduplicated).
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

impl std::str::FromStr for PageSelection {
    type Err = Srs2TestError;

    /// Parse `all`, `5`, `3-15` or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let bad = |msg: String| Srs2TestError::InvalidConfig(msg);
        let page = |p: &str| -> Result<usize, Srs2TestError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| bad(format!("Invalid page number: '{}'", p.trim())))?;
            if n < 1 {
                return Err(bad(format!("Pages are 1-indexed, minimum is 1 (got {n})")));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(bad(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(page(&s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GeneratorConfig::default();
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
        assert_eq!(c.api_timeout_secs, 600);
        assert_eq!(c.example_prefix, "src/test/java/com/sdp/m1");
        assert_eq!(c.pages, PageSelection::All);
        assert!(!c.split_sections);
        assert!(c.temperature.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = GeneratorConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, Some(2.0));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = GeneratorConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, Srs2TestError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_blank_model() {
        assert!(GeneratorConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = GeneratorConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"), "got: {dbg}");
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(3, 10).to_indices(4), vec![2, 3]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn page_selection_parses() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!(" 5 ".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!("3-15".parse::<PageSelection>().unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            "1,3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn page_selection_rejects_bad_input() {
        assert!("0".parse::<PageSelection>().is_err());
        assert!("9-3".parse::<PageSelection>().is_err());
        assert!("1,x".parse::<PageSelection>().is_err());
        assert!("".parse::<PageSelection>().is_err());
    }
}
