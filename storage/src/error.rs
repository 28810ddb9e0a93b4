use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// The remote store has no object under the requested key.
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("{operation} failed: {message}")]
    Request { operation: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn request(operation: &str, message: impl ToString) -> Self {
        StorageError::Request {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
