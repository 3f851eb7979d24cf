//! CLI binary for srs2test.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! `GeneratorConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use srs2test::{
    convert, generate_test_artifacts, generate_test_prompt, merge_ui_files, split_file,
    to_pretty_json, write_atomic, ConversionProgressCallback, GeneratorConfig,
    GeneratorConfigBuilder, PageSelection, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the conversion stages. The model call is a
/// single request that can run for minutes, so the spinner shows elapsed
/// time rather than a bar.
struct CliProgressCallback {
    bar: ProgressBar,
    request_started: std::sync::Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            request_started: std::sync::Mutex::new(None),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize, selected_pages: usize) {
        self.bar.set_prefix("Extracting");
        self.bar
            .set_message(format!("{selected_pages} of {total_pages} pages"));
    }

    fn on_extraction_complete(&self, extracted_pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Text extracted  {}",
            green("✓"),
            dim(&format!("{extracted_pages} pages, {chars} chars")),
        ));
    }

    fn on_model_request(&self, model: &str, prompt_len: usize) {
        if let Ok(mut started) = self.request_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix("Parsing");
        self.bar
            .set_message(format!("{model} ← {} KB prompt", prompt_len / 1024));
    }

    fn on_model_response(&self, response_len: usize) {
        let elapsed = self
            .request_started
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.bar.println(format!(
            "  {} Model answered  {}  {}",
            green("✓"),
            dim(&format!("{response_len:>6} chars")),
            dim(&format!("{elapsed:.1}s")),
        ));
    }

    fn on_model_error(&self, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.finish_and_clear();
        eprintln!("  {} Model call failed  {}", red("✗"), red(&msg));
    }

    fn on_section_written(&self, file_name: &str) {
        self.bar.println(format!("  {} {}", green("✓"), dim(file_name)));
    }

    fn on_conversion_complete(&self, output_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} SRS JSON ready  {}",
            green("✔"),
            dim(&format!("{output_bytes} bytes")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # SRS PDF → structured JSON (writes srs.json beside the PDF)
  srs2test convert srs.pdf

  # Also split into one file per top-level section
  srs2test convert srs.pdf --split -o out/srs.json

  # Only the requirement chapters, with a specific model
  srs2test convert --pages 5-40 --model gpt-4.1 --provider openai srs.pdf

  # Split an existing requirements JSON
  srs2test split srs.json -o srs_sections

  # Merge page-state captures into one UI document
  srs2test merge --ui register_empty.json --ui register_errors.json -o merged_page_data.json

  # Build the test-generation prompt (stdout)
  srs2test prompt --srs srs_sections/2-Provisioning_Module.json \
      --ui register_empty.json --ui register_errors.json > prompt.txt

  # Build the prompt and send it; the answer is written verbatim
  srs2test prompt --srs section.json --ui page.json --send -o artifacts.md

EXEMPLAR FILES (read relative to --root, default: current directory):
  src/test/resources/Features/service_provider_registration.feature
  <prefix>/Pages/ServiceProviderRegistrationPage.java
  <prefix>/Steps/ServiceProviderRegistrationSteps.java
  <prefix>/Utils/TestConfigs.java
  <prefix>/Utils/TestUtils.java
  <prefix>/Hooks/Hooks.java
  Missing files are replaced by a "// Example file not found at: ..." marker.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Turn SRS documents into structured JSON and test-generation prompts.
#[derive(Parser, Debug)]
#[command(
    name = "srs2test",
    version,
    about = "Turn SRS documents into structured JSON and LLM prompts for test automation",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SRS2TEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SRS2TEST_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an SRS PDF (path or URL) to structured JSON
    Convert {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Where to write the JSON (default: <input stem>.json).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write one file per top-level section to <output stem>_sections/.
        #[arg(long)]
        split: bool,

        /// Page selection: all, 5, 3-15, or 1,3,5,7.
        #[arg(long, env = "SRS2TEST_PAGES", default_value = "all")]
        pages: String,

        /// PDF user password for encrypted documents.
        #[arg(long, env = "SRS2TEST_PASSWORD")]
        password: Option<String>,

        /// Path to a text file containing a custom parser prompt ({context} placeholder).
        #[arg(long)]
        parser_prompt: Option<PathBuf>,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "SRS2TEST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,

        /// Print ConversionOutput as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Disable the progress spinner.
        #[arg(long, env = "SRS2TEST_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Split a requirements JSON into one file per top-level section
    Split {
        /// Requirements JSON (an array of sections).
        json: PathBuf,

        /// Output directory (default: <stem>_sections beside the input).
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,
    },

    /// Assemble the test-generation prompt
    Prompt {
        /// Requirements JSON for the feature under test.
        #[arg(long)]
        srs: PathBuf,

        /// UI structure JSON; repeat for each captured page state.
        #[arg(long, required = true, num_args = 1..)]
        ui: Vec<PathBuf>,

        /// Java package directory of the exemplar classes.
        #[arg(long, env = "SRS2TEST_PREFIX", default_value = srs2test::config::DEFAULT_EXAMPLE_PREFIX)]
        prefix: String,

        /// Project root the exemplar paths are resolved against.
        #[arg(long, env = "SRS2TEST_ROOT")]
        root: Option<PathBuf>,

        /// Path to a text file containing a custom generation template.
        #[arg(long)]
        template: Option<PathBuf>,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Send the prompt to the model and output its answer instead.
        #[arg(long)]
        send: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Merge UI structure JSON files into one document
    Merge {
        /// UI structure JSON; repeat for each captured page state.
        #[arg(long, required = true, num_args = 1..)]
        ui: Vec<PathBuf>,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM model ID (default: gpt-5-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0). Default: provider default.
    #[arg(long, env = "SRS2TEST_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens. Default: provider default.
    #[arg(long, env = "SRS2TEST_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// LLM call timeout in seconds.
    #[arg(long, env = "SRS2TEST_API_TIMEOUT", default_value_t = 600)]
    api_timeout: u64,
}

impl ModelArgs {
    fn apply(&self, mut builder: GeneratorConfigBuilder) -> GeneratorConfigBuilder {
        if let Some(ref m) = self.model {
            builder = builder.model(m);
        }
        if let Some(ref p) = self.provider {
            builder = builder.provider_name(p);
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(n) = self.max_tokens {
            builder = builder.max_tokens(n);
        }
        builder.api_timeout_secs(self.api_timeout)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; it
    // provides the feedback that matters.
    let show_progress = match &cli.command {
        Commands::Convert {
            json, no_progress, ..
        } => !cli.quiet && !*no_progress && !*json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            ref input,
            ref output,
            split,
            ref pages,
            ref password,
            ref parser_prompt,
            download_timeout,
            json,
            no_progress: _,
            ref model,
        } => {
            let mut builder = model
                .apply(GeneratorConfig::builder())
                .download_timeout_secs(download_timeout)
                .split_sections(split)
                .pages(
                    pages
                        .parse::<PageSelection>()
                        .context("Invalid --pages value")?,
                );
            if let Some(ref o) = output {
                builder = builder.output(o);
            }
            if let Some(ref p) = password {
                builder = builder.password(p);
            }
            if let Some(ref path) = parser_prompt {
                builder = builder.parser_prompt(read_text(path, "parser prompt")?);
            }
            if show_progress {
                let cb = CliProgressCallback::new();
                builder = builder.progress_callback(cb as ProgressCallback);
            }
            let config = builder.build().context("Invalid configuration")?;

            let result = convert(input, &config).context("Conversion failed")?;

            if json {
                let text =
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
                println!("{text}");
            } else if !cli.quiet {
                eprintln!(
                    "{}  {}/{} pages  {}ms  →  {}",
                    green("✔"),
                    result.stats.extracted_pages,
                    result.stats.total_pages,
                    result.stats.total_duration_ms,
                    bold(&result.json_path.display().to_string()),
                );
                eprintln!(
                    "   {} tokens in  /  {} tokens out",
                    dim(&result.stats.input_tokens.to_string()),
                    dim(&result.stats.output_tokens.to_string()),
                );
                if !result.sections.is_empty() {
                    eprintln!("   {} section files", cyan(&result.sections.len().to_string()));
                }
            }
        }

        Commands::Split {
            ref json,
            ref output_dir,
        } => {
            let written = split_file(json, output_dir.as_deref())
                .with_context(|| format!("Failed to split {}", json.display()))?;
            if !cli.quiet {
                eprintln!("{} {} section files", green("✔"), bold(&written.len().to_string()));
            }
        }

        Commands::Prompt {
            ref srs,
            ref ui,
            ref prefix,
            ref root,
            ref template,
            ref output,
            send,
            ref model,
        } => {
            let mut builder = model.apply(GeneratorConfig::builder()).example_prefix(prefix);
            if let Some(ref r) = root {
                builder = builder.project_root(r);
            }
            if let Some(ref path) = template {
                builder = builder.generation_prompt(read_text(path, "template")?);
            }
            let config = builder.build().context("Invalid configuration")?;

            let prompt =
                generate_test_prompt(srs, ui, &config).context("Failed to assemble prompt")?;

            let text = if send {
                generate_test_artifacts(&prompt, &config).context("Test generation failed")?
            } else {
                prompt
            };
            emit(&text, output.as_deref())?;
        }

        Commands::Merge { ref ui, ref output } => {
            let merged = merge_ui_files(ui).context("Failed to merge UI files")?;
            let text = to_pretty_json(&merged)?;
            emit(&text, output.as_deref())?;
        }
    }

    Ok(())
}

fn read_text(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {what} from {path:?}"))
}

/// Write to `output` atomically, or to stdout with a trailing newline.
fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_atomic(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}
