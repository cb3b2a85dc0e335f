use thiserror::Error;

/// Result type for bridge startup and transport operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Fatal errors: anything that aborts the bridge rather than failing a
/// single command.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Db(#[from] sqlink_db::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BridgeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Helper trait for adding context to IO errors
pub trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BridgeError::io(f(), e))
    }
}
