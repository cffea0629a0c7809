// Fixture catalog error types and constants

use crate::error::ErrorCode;
use std::fmt;
use std::path::PathBuf;

/// Catalog error code constants
///
/// Single source of truth for the codes surfaced by catalog loading,
/// fixture definition validation and suite selection.
///
/// Error code range: 2001-2006
pub struct CatalogErrorCodes {}

impl CatalogErrorCodes {
    /// Fixture matrix could not be read from disk
    pub const UNREADABLE: i32 = 2001;

    /// Fixture matrix is not valid JSON or has the wrong shape
    pub const MALFORMED: i32 = 2002;

    /// Fixture matrix contains zero fixtures
    pub const EMPTY: i32 = 2003;

    /// A fixture definition is missing or has an invalid required field
    pub const INVALID_DEFINITION: i32 = 2004;

    /// Two fixture definitions share the same id
    pub const DUPLICATE_ID: i32 = 2005;

    /// Suite filter selected zero fixtures
    pub const EMPTY_SELECTION: i32 = 2006;
}

/// Errors raised while loading, validating or filtering the fixture matrix.
///
/// All of these are fatal and surface before any build or download work.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The matrix file could not be read
    Unreadable { path: PathBuf, reason: String },

    /// The matrix contents failed to parse
    Malformed { reason: String },

    /// The matrix parsed but lists no fixtures
    Empty,

    /// A single fixture definition was rejected
    InvalidDefinition { id: String, reason: String },

    /// A fixture id appears more than once
    DuplicateId { id: String },

    /// No fixture carries the requested suite tag
    EmptySelection { suite: String },
}

impl ErrorCode for CatalogError {
    fn code(&self) -> i32 {
        match self {
            CatalogError::Unreadable { .. } => CatalogErrorCodes::UNREADABLE,
            CatalogError::Malformed { .. } => CatalogErrorCodes::MALFORMED,
            CatalogError::Empty => CatalogErrorCodes::EMPTY,
            CatalogError::InvalidDefinition { .. } => CatalogErrorCodes::INVALID_DEFINITION,
            CatalogError::DuplicateId { .. } => CatalogErrorCodes::DUPLICATE_ID,
            CatalogError::EmptySelection { .. } => CatalogErrorCodes::EMPTY_SELECTION,
        }
    }

    fn message(&self) -> String {
        match self {
            CatalogError::Unreadable { path, reason } => {
                format!("Failed to read fixture matrix {}: {}", path.display(), reason)
            }
            CatalogError::Malformed { reason } => {
                format!("Failed to parse fixture matrix JSON: {}", reason)
            }
            CatalogError::Empty => "No fixtures found in matrix file.".to_string(),
            CatalogError::InvalidDefinition { id, reason } => {
                format!("Fixture {} is invalid: {}", id, reason)
            }
            CatalogError::DuplicateId { id } => {
                format!("Duplicate fixture id detected: {}", id)
            }
            CatalogError::EmptySelection { suite } => {
                format!("No fixtures selected for suite '{}'.", suite)
            }
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for CatalogError {}
