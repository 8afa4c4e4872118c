use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContribError>;

#[derive(Error, Debug)]
pub enum ContribError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("Run cancelled")]
    Cancelled,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Settings error: {0}")]
    Settings(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ContribError {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<gix::discover::Error> for ContribError {
    fn from(err: gix::discover::Error) -> Self {
        ContribError::GitDiscover(Box::new(err))
    }
}
