use super::RuntimeError;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        vec![self.root.clone(), self.logs_dir()]
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn default_database_path(&self) -> PathBuf {
        self.root.join("stories.db")
    }

    pub fn custom_agents_file(&self) -> PathBuf {
        self.root.join("custom-agents.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn runs_log_path(&self) -> PathBuf {
        self.logs_dir().join("runs.log")
    }
}

pub const DEFAULT_STATE_ROOT_DIR: &str = ".stories";

pub fn default_state_root_path() -> Result<PathBuf, RuntimeError> {
    let home = std::env::var_os("HOME").ok_or(RuntimeError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(DEFAULT_STATE_ROOT_DIR))
}

pub fn bootstrap_state_root(paths: &StatePaths) -> Result<(), RuntimeError> {
    for path in paths.required_directories() {
        fs::create_dir_all(&path).map_err(|source| RuntimeError::CreateDir {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bootstrap_creates_root_and_logs() {
        let dir = tempdir().expect("tempdir");
        let paths = StatePaths::new(dir.path().join(DEFAULT_STATE_ROOT_DIR));

        bootstrap_state_root(&paths).expect("bootstrap");

        assert!(paths.root.is_dir());
        assert!(paths.logs_dir().is_dir());
        assert_eq!(
            paths.runs_log_path(),
            dir.path().join(".stories/logs/runs.log")
        );
    }
}
