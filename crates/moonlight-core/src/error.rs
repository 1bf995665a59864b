//! Error types.

use crate::shapes::ElementId;
use thiserror::Error;

/// Errors surfaced by the engine's host API.
///
/// No-op conditions (undo on an empty stack, a short connect drag) are not
/// errors and never produce one.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Element {id} does not allow {action}")]
    CapabilityDenied { id: ElementId, action: &'static str },
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Reasons an SVG document is rejected. A rejected import leaves the scene
/// untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("Document has no <svg> root element")]
    MissingRoot,
    #[error("Invalid number {value:?} in attribute {attribute}")]
    InvalidNumber { attribute: String, value: String },
    #[error("Invalid metadata {value:?} in attribute {attribute}")]
    InvalidMetadata { attribute: String, value: String },
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
