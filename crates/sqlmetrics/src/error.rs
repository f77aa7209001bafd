//! Error types for sqlmetrics

use thiserror::Error;

/// Result type alias for driver and proxy operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised by wrapped database objects and by the proxy layer itself.
///
/// Failures coming from a real driver pass through the proxies untouched: the
/// caller sees exactly the error the driver produced.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Generic driver failure
    #[error("Driver error: {0}")]
    Driver(String),

    /// SQLite driver failure
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An intercepted argument was requested as a type it does not hold
    #[error("Argument {index} of {method} is {found}, not {expected}")]
    ArgumentType {
        method: &'static str,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// An intercepted argument was requested past the end of the argument list
    #[error("{method} has no argument at index {index}")]
    ArgumentIndex { method: &'static str, index: usize },

    /// A delegate call produced a value of the wrong kind for its method
    #[error("{method} returned {found}, expected {expected}")]
    ReturnType {
        method: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The object is not a wrapper for the requested capability
    #[error("Not a wrapper for {0}")]
    Unwrap(&'static str),

    /// Column lookup failed
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// The object was already closed
    #[error("{0} is closed")]
    Closed(&'static str),

    /// The driver does not support this operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Check if this is an unsupported unwrap error
    pub fn is_unwrap(&self) -> bool {
        matches!(self, Self::Unwrap(_))
    }

    /// Check if this is an argument type mismatch
    pub fn is_argument_type(&self) -> bool {
        matches!(self, Self::ArgumentType { .. })
    }

    /// Check if this is a closed-object error
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl From<toml::de::Error> for SqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
