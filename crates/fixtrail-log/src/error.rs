use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("open fix log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("fix log is stopped")]
    Stopped,

    #[error("writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Record lines need sample/fix times, satellites and residual, which
    /// only observed fixes carry.
    #[error("fix has no observation data")]
    NotObserved,

    #[error("format timestamp: {0}")]
    Time(#[from] time::error::Format),
}
