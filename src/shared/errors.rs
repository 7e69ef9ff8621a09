#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to create state path {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve home directory for the stories state root")]
    HomeDirectoryUnavailable,
}
