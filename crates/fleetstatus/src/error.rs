//! Error types for fleetstatus.
//!
//! This module defines all error types used throughout the fleetstatus crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ValidationError;

/// The main error type for fleetstatus operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// Failed to open or create the document store.
    #[error("failed to open document store at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The repository has no store handle.
    #[error("database not connected")]
    NotConnected,

    /// A document with the same `_id` already exists in the collection.
    #[error("duplicate id '{id}' in collection '{collection}'")]
    DuplicateId {
        /// Collection name.
        collection: String,
        /// The conflicting identifier.
        id: String,
    },

    /// A document is missing its `_id` field or it is not a string.
    #[error("document for collection '{collection}' has no string _id")]
    MissingId {
        /// Collection name.
        collection: String,
    },

    /// A stored document body could not be decoded.
    #[error("corrupt document '{id}' in collection '{collection}': {source}")]
    CorruptDocument {
        /// Collection name.
        collection: String,
        /// Identifier of the document.
        id: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A field path in an update or filter was rejected.
    #[error("invalid field path '{path}': {message}")]
    InvalidFieldPath {
        /// The offending path.
        path: String,
        /// Description of the problem.
        message: String,
    },

    // === Record Errors ===
    /// A record payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Photo Errors ===
    /// A vehicle photo could not be processed.
    #[error("photo processing failed: {0}")]
    Image(#[from] image::ImageError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fleetstatus operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an invalid field path error.
    #[must_use]
    pub fn invalid_field_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error indicates the store is not connected.
    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected | Self::DatabaseOpen { .. })
    }

    /// Check if this error is a rejected record payload.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
