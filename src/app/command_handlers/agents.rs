use crate::app::command_support::{ensure_state_root, load_registry, load_settings, save_settings};
use crate::provider::{probe_available, AgentRegistry, ProviderError, PROMPT_TOKEN};
use crate::runtime::StatePaths;
use crate::shared::ids::validate_identifier_value;

pub fn cmd_agent(args: &[String]) -> Result<String, String> {
    let Some(action) = args.first() else {
        return cmd_agent_list();
    };

    match action.as_str() {
        "list" => cmd_agent_list(),
        "add" => cmd_agent_add(&args[1..]),
        "remove" => {
            if args.len() != 2 {
                return Err("usage: agent remove <name>".to_string());
            }
            let paths = ensure_state_root()?;
            let mut registry = load_registry(&paths)?;
            match registry.unregister(&args[1]) {
                Ok(true) => Ok(format!("removed agent: {}", args[1])),
                Ok(false) => Ok(format!("agent not found: {}", args[1])),
                Err(err) => Err(err.to_string()),
            }
        }
        "switch" => {
            if args.len() != 2 {
                return Err("usage: agent switch <name>".to_string());
            }
            let paths = ensure_state_root()?;
            let registry = load_registry(&paths)?;
            switch_provider(&paths, &registry, &args[1])
        }
        other => Err(format!(
            "unknown agent action `{other}`; use list, add, remove or switch"
        )),
    }
}

fn cmd_agent_list() -> Result<String, String> {
    let paths = ensure_state_root()?;
    let registry = load_registry(&paths)?;
    let current = load_settings(&paths)?.agent.provider;

    let mut lines = vec!["Available agents:".to_string()];
    for entry in registry.list_all() {
        let status = if probe_available(&registry, entry.name) {
            "available"
        } else {
            "missing"
        };
        let kind = if entry.is_custom { "custom" } else { "built-in" };
        let marker = if entry.name == current { "*" } else { " " };
        lines.push(format!("{marker} {} [{kind}] {status}", entry.name));
        lines.push(format!("    command={}", entry.descriptor.command));
        lines.push(format!("    label={}", entry.descriptor.label));
    }
    Ok(lines.join("\n"))
}

fn cmd_agent_add(args: &[String]) -> Result<String, String> {
    const USAGE: &str = "usage: agent add <name> <command> [--args <template>]";
    let (name, command, args_template) = match args {
        [name, command] => (name, command, PROMPT_TOKEN.to_string()),
        [name, command, flag, template] if flag == "--args" => {
            (name, command, template.clone())
        }
        _ => return Err(USAGE.to_string()),
    };
    validate_identifier_value("agent name", name)?;
    if command.trim().is_empty() {
        return Err("agent command must be non-empty".to_string());
    }

    let paths = ensure_state_root()?;
    let mut registry = load_registry(&paths)?;
    registry
        .register(name, &format!("Custom {name}"), command, &args_template)
        .map_err(|e| e.to_string())?;
    Ok(format!(
        "added custom agent: {name}\ncommand={command}\nargs_template={args_template}"
    ))
}

/// Points `agent.provider` at `name` once it is registered and installed.
pub(crate) fn switch_provider(
    paths: &StatePaths,
    registry: &AgentRegistry,
    name: &str,
) -> Result<String, String> {
    let descriptor = registry.lookup(name).ok_or_else(|| {
        format!(
            "{}; available agents: {}",
            ProviderError::UnknownProvider(name.to_string()),
            registry.names().join(", ")
        )
    })?;
    if !probe_available(registry, name) {
        return Err(format!(
            "agent `{name}` CLI not found: {}",
            descriptor.command
        ));
    }

    let mut settings = load_settings(paths)?;
    settings.agent.provider = name.to_string();
    save_settings(paths, &settings)?;
    Ok(format!("switched to agent: {name}"))
}
