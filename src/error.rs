use std::fmt;

use thiserror::Error;

/// Row-count expectation that a cardinality helper enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// At least one row.
    Many,
    /// Exactly one row.
    One,
    /// Zero or one row.
    OneOrNone,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Many => f.write_str("at least one"),
            Expectation::One => f.write_str("exactly one"),
            Expectation::OneOrNone => f.write_str("at most one"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SqlMapperError {
    #[error("Please pass the missing parameter `{name}': {template}")]
    MissingParameter { name: String, template: String },

    #[error("Unsupported type {0}")]
    UnsupportedValueType(String),

    #[error("Unknown connection")]
    UnknownConnection,

    #[error("Cardinality violated: expected {expected} row(s), got {actual}")]
    Cardinality {
        expected: Expectation,
        actual: usize,
    },

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error raised by caller code running inside a transaction.
    #[error(transparent)]
    Work(Box<dyn std::error::Error + Send + Sync>),

    /// A failure that happened while handling an earlier one. `primary` is what
    /// the caller sees first; `secondary` is the error that was being handled.
    #[error("{primary} (secondary: {secondary})")]
    Suppressed {
        primary: Box<SqlMapperError>,
        secondary: Box<SqlMapperError>,
    },
}

impl SqlMapperError {
    /// Wrap an application error so it can travel through a transaction.
    pub fn work<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        SqlMapperError::Work(err.into())
    }

    /// Attach `secondary` to this error, keeping `self` as the primary cause.
    #[must_use]
    pub fn with_secondary(self, secondary: SqlMapperError) -> Self {
        SqlMapperError::Suppressed {
            primary: Box::new(self),
            secondary: Box::new(secondary),
        }
    }

    /// The primary cause; `self` unless this is a `Suppressed` wrapper.
    #[must_use]
    pub fn primary(&self) -> &SqlMapperError {
        match self {
            SqlMapperError::Suppressed { primary, .. } => primary,
            other => other,
        }
    }

    /// The error that was being handled when the primary one happened, if any.
    #[must_use]
    pub fn secondary(&self) -> Option<&SqlMapperError> {
        match self {
            SqlMapperError::Suppressed { secondary, .. } => Some(secondary),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unknown_connection(&self) -> bool {
        matches!(self.primary(), SqlMapperError::UnknownConnection)
    }

    #[must_use]
    pub fn is_cardinality(&self) -> bool {
        matches!(self.primary(), SqlMapperError::Cardinality { .. })
    }
}
