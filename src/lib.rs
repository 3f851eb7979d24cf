//! # srs2test
//!
//! Turn Software Requirements Specification documents into structured JSON
//! and assemble the prompts that ask a language model for Cucumber feature
//! files, Selenium page objects and step definitions.
//!
//! ## Modes
//!
//! ```text
//! SRS PDF ──▶ convert ──▶ srs.json ──▶ split ──▶ srs_sections/<id>-<name>.json
//!                            │
//! UI JSON ×N ──▶ merge ──────┼──▶ prompt ──▶ (stdout | file | model)
//!                            │
//! exemplar .feature/.java ───┘
//! ```
//!
//! - [`convert()`] — extract PDF text, send it through the parser prompt once,
//!   write the answer verbatim and optionally split it.
//! - [`split_file`] — one file per top-level section of a requirements JSON.
//! - [`merge_ui_documents`] — fold page-state snapshots into one document
//!   keyed by selector.
//! - [`generate_test_prompt`] / [`generate_test_artifacts`] — build the
//!   test-generation prompt and optionally send it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use srs2test::{convert, generate_test_prompt, GeneratorConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = GeneratorConfig::builder().split_sections(true).build()?;
//!     let output = convert("srs.pdf", &config)?;
//!     eprintln!("wrote {} ({} sections)", output.json_path.display(), output.sections.len());
//!
//!     let prompt = generate_test_prompt(
//!         Path::new("srs_sections/2-Provisioning_Module.json"),
//!         &["register_empty.json", "register_errors.json"],
//!         &config,
//!     )?;
//!     println!("{prompt}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `srs2test` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! srs2test = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod generate;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod sections;
pub mod template;
pub mod ui;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GeneratorConfig, GeneratorConfigBuilder, PageSelection};
pub use convert::{convert, convert_extracted, write_atomic};
pub use error::{Srs2TestError, TemplateError};
pub use generate::{generate_test_artifacts, generate_test_prompt};
pub use merge::{load_ui_documents, merge_ui_documents, merge_ui_files, to_pretty_json};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::llm::{Completion, CompletionBackend, ProviderBackend};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sections::{split_file, split_sections};
pub use template::assemble;
pub use ui::{Component, Descriptor, UiDocument};
