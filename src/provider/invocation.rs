use crate::provider::{InvocationSpec, ProviderDescriptor};

pub const PROMPT_TOKEN: &str = "{prompt}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsRule {
    /// Built-in recipes: fixed leading arguments, prompt passed as one final
    /// argument.
    Fixed { prefix: Vec<String> },
    /// Custom recipes, rebuilt from the stored template on load.
    Template(String),
}

impl ArgsRule {
    pub fn build(&self, prompt: &str) -> Vec<String> {
        match self {
            ArgsRule::Fixed { prefix } => {
                let mut args = prefix.clone();
                args.push(prompt.to_string());
                args
            }
            ArgsRule::Template(template) => template_args(template, prompt),
        }
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            ArgsRule::Fixed { .. } => None,
            ArgsRule::Template(template) => Some(template),
        }
    }
}

/// Substitutes the first `{prompt}` token and splits the result on single
/// spaces. A prompt containing spaces is split too; existing custom agent
/// configurations depend on this, so it is kept as is.
fn template_args(template: &str, prompt: &str) -> Vec<String> {
    if template.contains(PROMPT_TOKEN) {
        return template
            .replacen(PROMPT_TOKEN, prompt, 1)
            .split(' ')
            .map(str::to_string)
            .collect();
    }
    vec![template.to_string(), prompt.to_string()]
}

pub fn build_invocation(descriptor: &ProviderDescriptor, prompt: &str) -> InvocationSpec {
    InvocationSpec {
        command: descriptor.command.clone(),
        args: descriptor.build_args(prompt),
    }
}
