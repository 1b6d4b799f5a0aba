use std::fmt;
use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// ValidationError / ValidationErrors
// ---------------------------------------------------------------------------

/// A single field-level validation failure.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub expected: String,
    pub received: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"Validation failed at "{}": expected {}, received {}"#,
            self.path, self.expected, self.received
        )
    }
}

impl std::error::Error for ValidationError {}

/// A collection of one or more `ValidationError`s.
#[derive(Debug, Clone)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed:")?;
        for e in &self.0 {
            write!(f, "\n  - {}: expected {}, received {}", e.path, e.expected, e.received)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// SchemaError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(
        "Collection \"{collection}\" is already registered with a different schema \
         (stored fingerprint {stored}, requested {requested})"
    )]
    Mismatch {
        collection: String,
        stored: String,
        requested: String,
    },
}

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error(
        "Unique constraint violation on index \"{index}\" in collection \"{collection}\": \
         value already exists in record \"{existing_id}\""
    )]
    UniqueConstraint {
        collection: String,
        index: String,
        existing_id: String,
        value: serde_json::Value,
    },

    #[error("Storage corruption in {collection}/{id}: failed to parse \"{field}\" field")]
    Corruption {
        collection: String,
        id: String,
        field: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(
        "Database \"{0}\" is already open in this process. \
         Set ignore_duplicate to share the existing storage."
    )]
    DuplicateDatabase(String),

    #[error("Invalid database name \"{0}\": must be lowercase and start with a letter")]
    InvalidDatabaseName(String),

    #[error("Collection \"{0}\" was not registered on this database.")]
    CollectionNotRegistered(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

// ---------------------------------------------------------------------------
// QueryError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Operator {operator} expects {expected}")]
    InvalidOperand { operator: String, expected: String },
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Failures owned by the gateway itself rather than the store underneath it.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Initialization failed; the gateway never becomes ready. The same
    /// underlying error is handed to every operation that waits on it.
    #[error("Gateway initialization failed: {0}")]
    Initialization(Arc<WalletDbError>),

    /// The initialization task ended without resolving the readiness signal.
    #[error("Gateway initialization was abandoned before completing")]
    Abandoned,

    #[error("Storage task failed: {0}")]
    TaskJoin(String),
}

// ---------------------------------------------------------------------------
// WalletDbError: top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WalletDbError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletDbError {
    /// True for a primary-key or unique-index violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Storage(StorageError::UniqueConstraint { .. }))
    }
}

/// Convenience alias: the default error type is `WalletDbError`.
pub type Result<T, E = WalletDbError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
