use std::path::Path;

pub mod invocation;
pub mod output_parse;
pub mod registry;
pub mod runner;

pub use invocation::{build_invocation, ArgsRule, PROMPT_TOKEN};
pub use output_parse::ResponseRule;
pub use registry::{builtin_providers, AgentRegistry, CustomProviderRecord, ProviderEntry};
pub use runner::{
    detect_all_available, is_command_available, probe_available, AgentInvoker,
    DEFAULT_AGENT_TIMEOUT,
};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
    #[error("cannot remove built-in provider: {0}")]
    BuiltInProvider(String),
    #[error("failed to spawn agent process for {provider} (`{command}`): {source}")]
    SpawnFailed {
        provider: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("agent execution failed for {provider} with code {exit_code}: {stderr}")]
    NonZeroExit {
        provider: String,
        exit_code: i32,
        stderr: String,
        log: Box<InvocationLog>,
    },
    #[error("agent execution for {provider} timed out after {timeout_ms}ms")]
    Timeout {
        provider: String,
        timeout_ms: u64,
        log: Box<InvocationLog>,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid custom agent file {path}: {reason}")]
    InvalidCustomFile { path: String, reason: String },
}

/// A provider's launch recipe. The argument rule is data, so customs can be
/// written back to disk and rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub label: String,
    pub command: String,
    pub args: ArgsRule,
    pub response: ResponseRule,
}

impl ProviderDescriptor {
    pub fn fixed(label: &str, command: &str, prefix: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            command: command.to_string(),
            args: ArgsRule::Fixed {
                prefix: prefix.iter().map(|arg| arg.to_string()).collect(),
            },
            response: ResponseRule::Trim,
        }
    }

    pub fn from_template(label: &str, command: &str, template: &str) -> Self {
        Self {
            label: label.to_string(),
            command: command.to_string(),
            args: ArgsRule::Template(template.to_string()),
            response: ResponseRule::Trim,
        }
    }

    pub fn build_args(&self, prompt: &str) -> Vec<String> {
        self.args.build(prompt)
    }
}

#[derive(Debug, Clone)]
pub struct InvocationSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl InvocationSpec {
    pub fn command_form(&self) -> String {
        if self.args.is_empty() {
            return self.command.clone();
        }
        format!("{} {}", self.command, self.args.join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct InvocationLog {
    pub provider: String,
    pub command_form: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub message: String,
    pub log: InvocationLog,
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> ProviderError {
    ProviderError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_descriptor_appends_prompt_without_splitting() {
        let claude = ProviderDescriptor::fixed("Claude CLI", "claude", &["-p"]);
        assert_eq!(
            claude.build_args("two words"),
            vec!["-p".to_string(), "two words".to_string()]
        );
    }

    #[test]
    fn command_form_joins_arguments() {
        let spec = InvocationSpec {
            command: "ollama".to_string(),
            args: vec!["run".to_string(), "llama2".to_string(), "hi".to_string()],
        };
        assert_eq!(spec.command_form(), "ollama run llama2 hi");
    }

    #[test]
    fn spawn_failures_are_worded_apart_from_exit_failures() {
        let spawn = ProviderError::SpawnFailed {
            provider: "ghost".to_string(),
            command: "ghost-cli".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(spawn.to_string().starts_with("failed to spawn agent process"));
    }
}
