use super::{ConfigError, Settings};
use crate::runtime::StatePaths;

/// Reads `config.yaml` from the state root. A missing file is not an error:
/// the defaults apply until the first `save_settings`.
pub fn load_settings(paths: &StatePaths) -> Result<Settings, ConfigError> {
    let path = paths.settings_file();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let settings = Settings::from_path(&path)?;
    settings.validate()?;
    Ok(settings)
}
