/// Base prompts an Activity can reference by name. Order is the listing order
/// of `stories prompts`.
pub const PROMPT_LIBRARY: &[(&str, &str)] = &[
    (
        "generate-ui",
        "Given the following spec, generate minimal HTML/TSX with Tailwind:",
    ),
    (
        "lint-code",
        "Given the code below, check for lint issues and suggest fixes:",
    ),
    (
        "create-component",
        "Create a React component with the following requirements:",
    ),
    (
        "setup-database",
        "Set up a database with the following schema:",
    ),
    (
        "write-tests",
        "Write comprehensive tests for the following code:",
    ),
    (
        "refactor-code",
        "Refactor the following code to improve readability and maintainability:",
    ),
    (
        "debug-issue",
        "Debug the following issue and provide a solution:",
    ),
    (
        "optimize-performance",
        "Analyze and optimize the performance of the following code:",
    ),
    (
        "validate-outcome",
        "Validate that the following outcome has been achieved:",
    ),
    (
        "update-state",
        "Update the current state based on the following changes:",
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("unknown prompt type: {0}")]
    UnknownPrompt(String),
}

pub fn prompt_template(name: &str) -> Option<&'static str> {
    PROMPT_LIBRARY
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, text)| *text)
}

pub fn prompt_names() -> impl Iterator<Item = &'static str> {
    PROMPT_LIBRARY.iter().map(|(name, _)| *name)
}

/// The named base prompt, followed by a blank line and `context` when one is
/// given and non-empty.
pub fn render_prompt(name: &str, context: Option<&str>) -> Result<String, PromptError> {
    let base =
        prompt_template(name).ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;
    Ok(match context {
        Some(context) if !context.is_empty() => format!("{base}\n\n{context}"),
        _ => base.to_string(),
    })
}
