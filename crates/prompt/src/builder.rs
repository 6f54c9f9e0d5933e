//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use tutor_core::{AppError, AppResult};

/// Variable holding the rendered conversation history.
pub const HISTORY_VAR: &str = "history";

/// Variable holding the user's question.
pub const QUERY_VAR: &str = "query";

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Renders the system template (if any) with the provided variables
/// 2. Renders the user template with the same variables
/// 3. Returns a `BuiltPrompt` ready for LLM execution
///
/// An empty or missing `history` variable renders as if no history existed,
/// so `{{#if history}}` sections are omitted.
///
/// # Example
/// ```no_run
/// use tutor_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What is MCP?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    // Blank history must not satisfy `{{#if history}}`
    let history_included = match variables.get(HISTORY_VAR) {
        Some(history) if !history.trim().is_empty() => true,
        Some(_) => {
            variables.remove(HISTORY_VAR);
            false
        }
        None => false,
    };

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        history_included,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
