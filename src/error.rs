//! Error types for schema resolution and rendering

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema-uml operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while loading, resolving, or rendering schemas
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A composite type tag that is neither `array` nor `map`, found before
    /// the owning field is known.
    #[error("Invalid composite type: {kind}")]
    InvalidComposite { kind: String },

    #[error("Malformed type in {entity}.{field}: invalid composite type {kind}")]
    MalformedField {
        entity: String,
        field: String,
        kind: String,
    },

    #[error("Schema source not found: {label} (expected at {path})")]
    MissingSource { label: String, path: PathBuf },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Attach the owning entity and field to a bare composite error.
    pub(crate) fn in_field(self, entity: &str, field: &str) -> Self {
        match self {
            SchemaError::InvalidComposite { kind } => SchemaError::MalformedField {
                entity: entity.to_string(),
                field: field.to_string(),
                kind,
            },
            other => other,
        }
    }
}
