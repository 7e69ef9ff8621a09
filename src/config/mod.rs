pub mod error;
pub mod load;
pub mod save;
pub mod settings;

pub use error::ConfigError;
pub use load::load_settings;
pub use save::save_settings;
pub use settings::{
    AgentSettings, DatabaseSettings, ExecutionSettings, LogLevel, Settings,
    DEFAULT_AGENT_PROVIDER,
};
