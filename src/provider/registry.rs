use crate::provider::{io_error, ProviderDescriptor, ProviderError, PROMPT_TOKEN};
use crate::shared::fs_atomic::atomic_write_file;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk shape of one custom provider in `custom-agents.json`. Older files
/// stored the label under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomProviderRecord {
    #[serde(alias = "name")]
    pub label: String,
    pub command: String,
    #[serde(default = "default_args_template")]
    pub args_template: String,
}

fn default_args_template() -> String {
    PROMPT_TOKEN.to_string()
}

impl CustomProviderRecord {
    fn from_descriptor(descriptor: &ProviderDescriptor) -> Self {
        Self {
            label: descriptor.label.clone(),
            command: descriptor.command.clone(),
            args_template: descriptor
                .args
                .template()
                .map(str::to_string)
                .unwrap_or_else(default_args_template),
        }
    }

    fn into_descriptor(self) -> ProviderDescriptor {
        ProviderDescriptor::from_template(&self.label, &self.command, &self.args_template)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderEntry<'a> {
    pub name: &'a str,
    pub descriptor: &'a ProviderDescriptor,
    pub is_custom: bool,
}

pub fn builtin_providers() -> Vec<(String, ProviderDescriptor)> {
    [
        ("aichat", ProviderDescriptor::fixed("AI Chat", "aichat", &[])),
        ("claude", ProviderDescriptor::fixed("Claude CLI", "claude", &["-p"])),
        ("gpt", ProviderDescriptor::fixed("GPT CLI", "gpt", &[])),
        (
            "gemini",
            ProviderDescriptor::fixed("Gemini CLI", "gemini", &["--prompt"]),
        ),
        (
            "ollama",
            ProviderDescriptor::fixed("Ollama (Local)", "ollama", &["run", "llama2"]),
        ),
        ("llm", ProviderDescriptor::fixed("Universal LLM CLI", "llm", &[])),
    ]
    .into_iter()
    .map(|(name, descriptor)| (name.to_string(), descriptor))
    .collect()
}

/// Built-in and custom providers, resolved by name. Customs shadow built-ins
/// on lookup; built-ins can never be removed. Every custom mutation rewrites
/// the whole custom file.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    builtins: Vec<(String, ProviderDescriptor)>,
    customs: Vec<(String, ProviderDescriptor)>,
    custom_file: Option<PathBuf>,
}

impl AgentRegistry {
    /// A registry without durable customs; registrations live in memory only.
    pub fn in_memory() -> Self {
        Self {
            builtins: builtin_providers(),
            customs: Vec::new(),
            custom_file: None,
        }
    }

    pub fn load(custom_file: &Path) -> Result<Self, ProviderError> {
        let customs = if custom_file.exists() {
            read_custom_file(custom_file)?
        } else {
            Vec::new()
        };
        Ok(Self {
            builtins: builtin_providers(),
            customs,
            custom_file: Some(custom_file.to_path_buf()),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&ProviderDescriptor> {
        find(&self.customs, name).or_else(|| find(&self.builtins, name))
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        find(&self.builtins, name).is_some()
    }

    pub fn is_custom(&self, name: &str) -> bool {
        find(&self.customs, name).is_some()
    }

    pub fn register(
        &mut self,
        name: &str,
        label: &str,
        command: &str,
        args_template: &str,
    ) -> Result<(), ProviderError> {
        let descriptor = ProviderDescriptor::from_template(label, command, args_template);
        match self.customs.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.customs.push((name.to_string(), descriptor)),
        }
        self.persist()
    }

    pub fn unregister(&mut self, name: &str) -> Result<bool, ProviderError> {
        if self.is_builtin(name) {
            return Err(ProviderError::BuiltInProvider(name.to_string()));
        }
        let Some(index) = self.customs.iter().position(|(existing, _)| existing == name) else {
            return Ok(false);
        };
        self.customs.remove(index);
        self.persist()?;
        Ok(true)
    }

    /// Built-ins in declaration order, then customs in insertion order. A
    /// custom that shadows a built-in appears twice.
    pub fn list_all(&self) -> Vec<ProviderEntry<'_>> {
        let builtins = self.builtins.iter().map(|(name, descriptor)| ProviderEntry {
            name,
            descriptor,
            is_custom: false,
        });
        let customs = self.customs.iter().map(|(name, descriptor)| ProviderEntry {
            name,
            descriptor,
            is_custom: true,
        });
        builtins.chain(customs).collect()
    }

    /// Distinct provider names in listing order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in self.list_all() {
            if !names.contains(&entry.name) {
                names.push(entry.name);
            }
        }
        names
    }

    fn persist(&self) -> Result<(), ProviderError> {
        let Some(path) = &self.custom_file else {
            return Ok(());
        };
        let mut body = Map::new();
        for (name, descriptor) in &self.customs {
            let record = CustomProviderRecord::from_descriptor(descriptor);
            let value = serde_json::to_value(record).map_err(|err| {
                ProviderError::InvalidCustomFile {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                }
            })?;
            body.insert(name.clone(), value);
        }
        let encoded = serde_json::to_vec_pretty(&Value::Object(body)).map_err(|err| {
            ProviderError::InvalidCustomFile {
                path: path.display().to_string(),
                reason: err.to_string(),
            }
        })?;
        atomic_write_file(path, &encoded).map_err(|err| io_error(path, err))
    }
}

fn find<'a>(
    providers: &'a [(String, ProviderDescriptor)],
    name: &str,
) -> Option<&'a ProviderDescriptor> {
    providers
        .iter()
        .find(|(existing, _)| existing == name)
        .map(|(_, descriptor)| descriptor)
}

fn read_custom_file(path: &Path) -> Result<Vec<(String, ProviderDescriptor)>, ProviderError> {
    let raw = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let invalid = |reason: String| ProviderError::InvalidCustomFile {
        path: path.display().to_string(),
        reason,
    };
    let value: Value = serde_json::from_str(&raw).map_err(|err| invalid(err.to_string()))?;
    let Value::Object(entries) = value else {
        return Err(invalid("expected a JSON object keyed by agent name".to_string()));
    };

    let mut customs = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        let record: CustomProviderRecord = serde_json::from_value(entry)
            .map_err(|err| invalid(format!("agent `{name}`: {err}")))?;
        customs.push((name, record.into_descriptor()));
    }
    Ok(customs)
}
