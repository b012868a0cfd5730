//! Prompt rendering for retrieval-augmented answering.

use crate::preambles::preamble_for_role;
use askdesk_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Fixed template for the user-facing part of the prompt. Instructs the
/// model to answer strictly from the supplied context, to say when the
/// context is insufficient, and to cite sources.
const QUERY_TEMPLATE: &str = "\
Based on the following context, please answer the user's question. \
If the context doesn't contain enough information to answer the question, \
say so and suggest what additional information might be needed. \
Do not use any knowledge that is not in the context.

Context:
{{context}}

User Question: {{question}}

Please provide a comprehensive answer and cite the sources you used.";

/// A rendered prompt, split into system and user parts.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    /// Role preamble (system message)
    pub system: String,

    /// Rendered question + context (user message)
    pub user: String,
}

/// Template variables for the query prompt.
#[derive(Serialize)]
struct QueryVars<'a> {
    question: &'a str,
    context: &'a str,
}

/// Build the prompt for one query.
///
/// The system part is the role's preamble, extended with the role
/// description when the policy table has one configured. The user part
/// is the fixed template rendered with the question and the assembled
/// context block.
pub fn build_query_prompt(
    role: &str,
    role_description: Option<&str>,
    question: &str,
    context: &str,
) -> AppResult<BuiltPrompt> {
    let mut system = preamble_for_role(role).to_string();
    if let Some(description) = role_description {
        system.push_str("\n\nYour role: ");
        system.push_str(description);
    }

    let user = render_template(
        QUERY_TEMPLATE,
        &QueryVars { question, context },
    )?;

    tracing::debug!("Built prompt for role '{}' ({} context chars)", role, context.len());

    Ok(BuiltPrompt { system, user })
}

/// Render a Handlebars template with variables.
fn render_template<T: Serialize>(template: &str, variables: &T) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("query", template)
        .map_err(|e| AppError::Other(format!("Failed to register prompt template: {}", e)))?;

    handlebars
        .render("query", variables)
        .map_err(|e| AppError::Other(format!("Failed to render prompt template: {}", e)))
}
