use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdjusterError {
    #[error("{os} is not supported")]
    UnsupportedOs { os: String },

    #[error("Malformed interface description '{descriptor}': {reason}")]
    MalformedSpec { descriptor: String, reason: String },

    #[error("Operation ({operation}) not defined for {family}")]
    MissingOperation { family: String, operation: String },

    #[error("Guest error during {operation}: {cause}")]
    Guest { operation: String, cause: String },

    #[error("Configuration tree error at {path}: {message}")]
    Tree { path: String, message: String },

    #[error("Domain descriptor error: {0}")]
    Descriptor(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AdjusterError>;

impl AdjusterError {
    pub fn guest(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        AdjusterError::Guest {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    pub fn tree(path: impl Into<String>, message: impl Into<String>) -> Self {
        AdjusterError::Tree {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Errors that must stop the run before the image is touched.
    pub fn is_fatal_before_mutation(&self) -> bool {
        matches!(
            self,
            AdjusterError::UnsupportedOs { .. } | AdjusterError::MalformedSpec { .. }
        )
    }
}
