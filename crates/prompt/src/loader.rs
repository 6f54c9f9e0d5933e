//! Prompt loader for YAML prompt definitions.
//!
//! Prompts resolve in two places: a workspace override at
//! `.tutor/prompts/<id>.yml`, then the definitions compiled into this crate.

use crate::types::PromptDefinition;
use std::path::Path;
use tutor_core::{AppError, AppResult};

/// Prompts shipped with the binary, as `(id, yaml)` pairs.
const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    "course.assistant",
    include_str!("../prompts/course.assistant.yml"),
)];

/// Directory (relative to the workspace) holding prompt overrides.
pub const PROMPTS_DIR: &str = ".tutor/prompts";

/// Load a prompt definition by ID.
///
/// A workspace file `.tutor/prompts/<id>.yml` takes precedence over the
/// built-in definition with the same ID.
///
/// # Example
/// ```no_run
/// use tutor_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "course.assistant")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        let definition = parse_prompt(&contents, &format!("{:?}", prompt_file))?;

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id)
}

/// Load one of the built-in prompt definitions.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, yaml) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))?;

    parse_prompt(yaml, &format!("built-in prompt '{}'", prompt_id))
}

/// List all available prompt IDs (built-in and workspace), sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let prompts_dir = workspace_path.join(PROMPTS_DIR);
    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
