//! Test-generation prompt: requirements, merged UI structure and style exemplars.
//!
//! The prompt shows the model six files from an existing test project (a
//! feature file, a page object, step definitions, two utility classes and the
//! Cucumber hooks) so the generated code follows the house style. Exemplars
//! are optional. A missing one is replaced by a comment marker and the prompt
//! is still produced, just with less guidance.

use crate::config::GeneratorConfig;
use crate::error::Srs2TestError;
use crate::merge::{load_ui_documents, merge_ui_documents, to_pretty_json};
use crate::pipeline::llm;
use crate::prompts::TEST_GENERATION_PROMPT;
use crate::template;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Feature-file exemplar, relative to the project root.
pub const FEATURE_EXAMPLE_PATH: &str =
    "src/test/resources/Features/service_provider_registration.feature";

/// Template placeholder and project-relative path of each exemplar.
pub fn exemplar_paths(prefix: &str) -> [(&'static str, String); 6] {
    let prefix = prefix.trim_end_matches('/');
    [
        ("feature_example", FEATURE_EXAMPLE_PATH.to_string()),
        (
            "page_object_example",
            format!("{prefix}/Pages/ServiceProviderRegistrationPage.java"),
        ),
        (
            "steps_example",
            format!("{prefix}/Steps/ServiceProviderRegistrationSteps.java"),
        ),
        ("configs_example", format!("{prefix}/Utils/TestConfigs.java")),
        ("utils_example", format!("{prefix}/Utils/TestUtils.java")),
        ("hooks_example", format!("{prefix}/Hooks/Hooks.java")),
    ]
}

/// Marker inserted in place of a file that does not exist.
pub fn missing_file_marker(path: &str) -> String {
    format!("// Example file not found at: {path}")
}

/// Read `root/relative`, or a marker comment when it cannot be read.
///
/// The marker names the path as given, not the joined one, so prompts do not
/// leak the local directory layout.
pub fn read_or_marker(root: &Path, relative: &str) -> String {
    let full = root.join(relative);
    match std::fs::read_to_string(&full) {
        Ok(content) => {
            debug!("Read {} ({} bytes)", full.display(), content.len());
            content
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Example file not found at {}. Prompt will be less detailed.",
                full.display()
            );
            missing_file_marker(relative)
        }
        Err(e) => {
            warn!("Error reading {}: {}", full.display(), e);
            format!("// Error reading example file: {relative}")
        }
    }
}

fn project_root(config: &GeneratorConfig) -> PathBuf {
    config.project_root.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Assemble the test-generation prompt.
///
/// The requirements file is embedded as-is; it is not parsed. UI files are
/// loaded, merged and embedded as 4-space indented JSON.
///
/// # Errors
/// - `InvalidJson` when a UI file is malformed
/// - `Template` when a custom template names a placeholder with no value
pub fn generate_test_prompt<P: AsRef<Path>>(
    srs_json_path: &Path,
    ui_json_paths: &[P],
    config: &GeneratorConfig,
) -> Result<String, Srs2TestError> {
    let root = project_root(config);
    let mut values: HashMap<&str, String> = HashMap::new();

    for (placeholder, relative) in exemplar_paths(&config.example_prefix) {
        values.insert(placeholder, read_or_marker(&root, &relative));
    }

    values.insert(
        "srs_json",
        read_or_marker(Path::new(""), &srs_json_path.to_string_lossy()),
    );

    let documents = load_ui_documents(ui_json_paths)?;
    let merged = merge_ui_documents(&documents);
    info!(
        "Merged {} UI files into {} components",
        documents.len(),
        merged.components.len()
    );
    values.insert("ui_json", to_pretty_json(&merged)?);

    let template_text = config
        .generation_prompt
        .as_deref()
        .unwrap_or(TEST_GENERATION_PROMPT);
    let prompt = template::assemble(template_text, &values)?;
    debug!("Test-generation prompt: {} bytes", prompt.len());
    Ok(prompt)
}

/// Send an assembled prompt to the model and return the answer verbatim.
///
/// The answer is not parsed or checked; an empty one is an error.
pub fn generate_test_artifacts(prompt: &str, config: &GeneratorConfig) -> Result<String, Srs2TestError> {
    let backend = llm::resolve_backend(config)?;
    info!("Sending {} byte prompt to {}", prompt.len(), backend.model());

    let completion = backend.complete(prompt)?;
    if completion.content.trim().is_empty() {
        return Err(Srs2TestError::EmptyModelResponse);
    }
    info!(
        "Received {} bytes ({} in / {} out tokens)",
        completion.content.len(),
        completion.input_tokens,
        completion.output_tokens
    );
    Ok(completion.content)
}
