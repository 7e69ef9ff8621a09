use crate::app::console::ConsoleObserver;
use crate::config::{
    load_settings as config_load_settings, save_settings as config_save_settings, ConfigError,
    Settings,
};
use crate::orchestration::{FanOutObserver, RunLogObserver, StoryRunner};
use crate::provider::AgentRegistry;
use crate::runtime::{bootstrap_state_root, default_state_root_path, StatePaths};
use crate::storage::StoryStore;
use std::path::PathBuf;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

fn state_root() -> Result<PathBuf, String> {
    default_state_root_path().map_err(|e| e.to_string())
}

pub fn ensure_state_root() -> Result<StatePaths, String> {
    let paths = StatePaths::new(state_root()?);
    bootstrap_state_root(&paths).map_err(|e| e.to_string())?;
    Ok(paths)
}

pub fn load_settings(paths: &StatePaths) -> Result<Settings, String> {
    config_load_settings(paths).map_err(map_config_err)
}

pub fn save_settings(paths: &StatePaths, settings: &Settings) -> Result<PathBuf, String> {
    config_save_settings(paths, settings).map_err(map_config_err)
}

pub fn open_store(paths: &StatePaths, settings: &Settings) -> Result<StoryStore, String> {
    StoryStore::open(&settings.resolve_database_path(paths)).map_err(|e| e.to_string())
}

pub fn load_registry(paths: &StatePaths) -> Result<AgentRegistry, String> {
    AgentRegistry::load(&paths.custom_agents_file()).map_err(|e| e.to_string())
}

/// A runner wired to the console and the run log, resolving the configured
/// agent on first use.
pub fn build_runner(paths: &StatePaths) -> Result<StoryRunner, String> {
    let settings = load_settings(paths)?;
    let store = open_store(paths, &settings)?;
    let registry = load_registry(paths)?;
    let observer = FanOutObserver::new()
        .with(ConsoleObserver::new(settings.execution.log_level))
        .with(RunLogObserver::new(paths.clone()));
    Ok(StoryRunner::new(store, registry, &settings, observer))
}
