use crate::app::command_handlers::agents::switch_provider;
use crate::app::command_support::{ensure_state_root, load_registry, load_settings, save_settings};
use crate::provider::detect_all_available;

pub fn cmd_config(args: &[String]) -> Result<String, String> {
    match args {
        [] => cmd_config_show(),
        [section] if section == "agent" => cmd_config_agent(),
        [section, action, name] if section == "agent" && action == "set" => {
            let paths = ensure_state_root()?;
            let registry = load_registry(&paths)?;
            switch_provider(&paths, &registry, name)
        }
        [section, key, value] if section == "execution" => {
            let paths = ensure_state_root()?;
            let mut settings = load_settings(&paths)?;
            settings
                .execution
                .apply(key, value)
                .map_err(|e| e.to_string())?;
            save_settings(&paths, &settings)?;
            Ok(format!("execution setting updated\n{key}={value}"))
        }
        _ => Err(
            "usage: config [agent [set <name>] | execution <auto-confirm|pause-ms|log-level> <value>]"
                .to_string(),
        ),
    }
}

fn cmd_config_show() -> Result<String, String> {
    let paths = ensure_state_root()?;
    let settings = load_settings(&paths)?;
    let agent = &settings.agent;
    let execution = &settings.execution;

    let lines = vec![
        "Current configuration:".to_string(),
        "agent:".to_string(),
        format!("  provider={}", agent.provider),
        format!("  model={}", agent.model.as_deref().unwrap_or("default")),
        format!(
            "  temperature={}",
            agent
                .temperature
                .map(|t| t.to_string())
                .unwrap_or_else(|| "default".to_string())
        ),
        format!(
            "  max_tokens={}",
            agent
                .max_tokens
                .map(|t| t.to_string())
                .unwrap_or_else(|| "default".to_string())
        ),
        "execution:".to_string(),
        format!("  auto_confirm={}", execution.auto_confirm),
        format!(
            "  pause_between_steps_ms={}",
            execution.pause_between_steps_ms
        ),
        format!("  log_level={}", execution.log_level),
        "database:".to_string(),
        format!(
            "  path={}",
            settings.resolve_database_path(&paths).display()
        ),
        format!("config_file={}", paths.settings_file().display()),
    ];
    Ok(lines.join("\n"))
}

fn cmd_config_agent() -> Result<String, String> {
    let paths = ensure_state_root()?;
    let registry = load_registry(&paths)?;
    let current = load_settings(&paths)?.agent.provider;
    let available = detect_all_available(&registry);

    let mut lines = vec![format!("current provider={current}"), String::new()];
    lines.push("Available AI CLIs:".to_string());
    for name in &available {
        if let Some(descriptor) = registry.lookup(name) {
            lines.push(format!("  {name} - {} ({})", descriptor.label, descriptor.command));
        }
    }

    let missing: Vec<_> = registry
        .names()
        .into_iter()
        .filter(|name| !available.iter().any(|found| found == name))
        .collect();
    if !missing.is_empty() {
        lines.push(String::new());
        lines.push("Not installed:".to_string());
        for name in missing {
            if let Some(descriptor) = registry.lookup(name) {
                lines.push(format!("  {name} - {} ({})", descriptor.label, descriptor.command));
            }
        }
    }

    if available.is_empty() {
        lines.push(String::new());
        lines.push(
            "No AI CLIs found. Install one of the agents above, or register your own with `stories agent add`."
                .to_string(),
        );
    } else {
        lines.push(String::new());
        lines.push("Set the provider with: stories config agent set <name>".to_string());
    }
    Ok(lines.join("\n"))
}
