//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the claude-context service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// Vector database operation error
    #[error("Vector database error: {message}")]
    VectorDb {
        /// Description of the vector database error
        message: String,
    },

    /// Dense embedding service error (transport or protocol)
    #[error("Embedding service error: {message}")]
    Embedding {
        /// Description of the embedding error
        message: String,
    },

    /// Dense embedding service rejected our credentials
    #[error("Embedding service authentication failed: {message}")]
    EmbeddingAuth {
        /// Description of the authentication failure
        message: String,
    },

    /// Relational store error
    #[error("Database error: {message}")]
    Database {
        /// Description of the database error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unique-constraint conflict on concurrent writes
    #[error("Store conflict: {message}")]
    Conflict {
        /// Description of the conflicting write
        message: String,
    },

    /// Network-level error talking to an external collaborator
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Crawler runtime error
    #[error("Crawl error: {message}")]
    Crawl {
        /// Description of the crawl error
        message: String,
    },

    /// LLM synthesis error
    #[error("LLM error: {message}")]
    Llm {
        /// Description of the LLM error
        message: String,
    },

    /// Operation exceeded its deadline
    #[error("Timeout: {message}")]
    Timeout {
        /// What timed out
        message: String,
    },

    /// Operation was cancelled by the caller
    #[error("Cancelled: {message}")]
    Cancelled {
        /// What was cancelled
        message: String,
    },
}

impl Error {
    /// Create an I/O error from a message
    pub fn io<S: Into<String>>(message: S) -> Self {
        Error::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error wrapping a source error
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Error::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Error::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a vector database error
    pub fn vector_db<S: Into<String>>(message: S) -> Self {
        Error::VectorDb {
            message: message.into(),
        }
    }

    /// Create an embedding service error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Error::Embedding {
            message: message.into(),
        }
    }

    /// Create an embedding authentication error
    pub fn embedding_auth<S: Into<String>>(message: S) -> Self {
        Error::EmbeddingAuth {
            message: message.into(),
        }
    }

    /// Create a database error from a message
    pub fn database<S: Into<String>>(message: S) -> Self {
        Error::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error wrapping a source error
    pub fn database_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Error::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a store-conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Error::Conflict {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Error::Network {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Create a crawl error
    pub fn crawl<S: Into<String>>(message: S) -> Self {
        Error::Crawl {
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Error::Llm {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Error::Timeout {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Error::Cancelled {
            message: message.into(),
        }
    }

    /// Whether this error is a caller-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Whether this error is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Whether this error is a unique-constraint conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinct_from_timeout() {
        let cancelled = Error::cancelled("indexing aborted");
        let timed_out = Error::timeout("status read");
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_timeout());
        assert!(timed_out.is_timeout());
        assert!(!timed_out.is_cancelled());
    }

    #[test]
    fn auth_errors_render_distinctly() {
        let auth = Error::embedding_auth("401 from /embed");
        let transport = Error::embedding("connection refused");
        assert!(auth.to_string().contains("authentication"));
        assert!(!transport.to_string().contains("authentication"));
    }
}
