use super::ConfigError;
use crate::runtime::StatePaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AGENT_PROVIDER: &str = "aichat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Minimal,
    #[default]
    Normal,
    Verbose,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Normal => "normal",
            Self::Verbose => "verbose",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err("log level must be one of: minimal, normal, verbose".to_string()),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub execution: ExecutionSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// `model`, `temperature` and `max_tokens` are recorded for display only; the
/// agent CLIs are launched with their own defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecutionSettings {
    #[serde(default = "default_pause_between_steps_ms")]
    pub pause_between_steps_ms: u64,
    #[serde(default = "default_true")]
    pub auto_confirm: bool,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            pause_between_steps_ms: default_pause_between_steps_ms(),
            auto_confirm: true,
            log_level: LogLevel::default(),
        }
    }
}

impl ExecutionSettings {
    pub fn pause_between_steps(&self) -> Duration {
        Duration::from_millis(self.pause_between_steps_ms)
    }

    /// Applies one `config execution <key> <value>` assignment.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "auto-confirm" | "auto_confirm" => {
                self.auto_confirm = parse_bool(value).ok_or_else(|| {
                    ConfigError::Settings(format!("auto-confirm expects true or false, got `{value}`"))
                })?;
            }
            "pause-ms" | "pause_between_steps_ms" => {
                self.pause_between_steps_ms = value.trim().parse().map_err(|_| {
                    ConfigError::Settings(format!(
                        "pause-ms expects a non-negative integer, got `{value}`"
                    ))
                })?;
            }
            "log-level" | "log_level" => {
                self.log_level = LogLevel::parse(value).map_err(ConfigError::Settings)?;
            }
            other => {
                return Err(ConfigError::Settings(format!(
                    "unknown execution setting `{other}`; expected auto-confirm, pause-ms or log-level"
                )))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_provider() -> String {
    DEFAULT_AGENT_PROVIDER.to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_max_tokens() -> Option<u32> {
    Some(2000)
}

fn default_pause_between_steps_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.provider.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`agent.provider` must be non-empty".to_string(),
            ));
        }
        if let Some(temperature) = self.agent.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::Settings(
                    "`agent.temperature` must be between 0.0 and 2.0".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// A relative `database.path` is resolved against the state root.
    pub fn resolve_database_path(&self, paths: &StatePaths) -> PathBuf {
        match &self.database.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => paths.root.join(path),
            None => paths.default_database_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let settings: Settings = serde_yaml::from_str(
            r#"
agent:
  provider: claude
execution:
  auto_confirm: false
"#,
        )
        .expect("parse settings");

        assert_eq!(settings.agent.provider, "claude");
        assert_eq!(settings.agent.temperature, Some(0.7));
        assert_eq!(settings.agent.max_tokens, Some(2000));
        assert!(!settings.execution.auto_confirm);
        assert_eq!(settings.execution.pause_between_steps_ms, 1000);
        assert_eq!(settings.execution.log_level, LogLevel::Normal);
        assert_eq!(settings.database.path, None);
    }

    #[test]
    fn execution_assignments_are_typed() {
        let mut execution = ExecutionSettings::default();
        execution.apply("auto-confirm", "no").expect("auto-confirm");
        execution.apply("pause-ms", "0").expect("pause");
        execution.apply("log-level", "Verbose").expect("log level");

        assert!(!execution.auto_confirm);
        assert_eq!(execution.pause_between_steps(), Duration::ZERO);
        assert_eq!(execution.log_level, LogLevel::Verbose);

        assert!(execution.apply("pause-ms", "-5").is_err());
        assert!(execution.apply("log-level", "chatty").is_err());
        assert!(execution.apply("speed", "fast").is_err());
    }

    #[test]
    fn database_path_resolves_against_state_root() {
        let paths = StatePaths::new("/tmp/state");
        let mut settings = Settings::default();
        assert_eq!(
            settings.resolve_database_path(&paths),
            PathBuf::from("/tmp/state/stories.db")
        );

        settings.database.path = Some(PathBuf::from("data/custom.db"));
        assert_eq!(
            settings.resolve_database_path(&paths),
            PathBuf::from("/tmp/state/data/custom.db")
        );

        settings.database.path = Some(PathBuf::from("/var/lib/stories.db"));
        assert_eq!(
            settings.resolve_database_path(&paths),
            PathBuf::from("/var/lib/stories.db")
        );
    }
}
