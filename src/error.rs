//! Error types for the grid engine

/// Errors raised while deriving markup from a cell's content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// An element carries a tag name that cannot be written as HTML.
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    /// An element carries an attribute name that cannot be written as HTML.
    #[error("invalid attribute name: {0:?}")]
    InvalidAttributeName(String),
}

/// Errors that can occur while building tables or serving grid requests.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// No table is registered under the requested identity.
    #[error("no such table: {0}")]
    TableNotFound(String),

    /// A row does not have exactly one cell per table column.
    #[error("row has {actual} cells but the table has {expected} columns")]
    ColumnCountMismatch {
        /// Column count declared by the table.
        expected: usize,
        /// Number of cells supplied for the row.
        actual: usize,
    },

    /// A column definition targets a column the table does not have.
    #[error("column definition targets column {target}, table has {column_count} columns")]
    ColumnTargetOutOfRange {
        /// The offending target index.
        target: usize,
        /// Column count declared by the table.
        column_count: usize,
    },

    /// A regex search term does not compile.
    #[error("invalid search pattern {pattern:?}: {source}")]
    InvalidSearchPattern {
        /// The search term as sent by the client.
        pattern: String,
        /// Compiler error.
        #[source]
        source: regex::Error,
    },

    /// A cell's content could not be rendered.
    #[error("cell content error: {0}")]
    Content(#[from] ContentError),

    /// A request parameter has a value that cannot be used.
    #[error("invalid value {value:?} for parameter {name}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Raw value.
        value: String,
    },

    /// CSV input could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GridError {
    /// Creates a new invalid-parameter error.
    pub fn invalid_parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns true if this error means the table identity did not resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;
