//! Error types for scanmark library.

use std::io;
use thiserror::Error;

/// Result type alias for scanmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A bounding box violates `0 <= min < max <= 1` or holds a non-finite value.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A layout label that maps to no element kind.
    #[error("Unknown layout label: {0}")]
    UnknownLabel(String),

    /// An external model or OCR engine failed.
    #[error("{stage} failed: {message}")]
    Collaborator {
        /// Pipeline stage that invoked the collaborator
        stage: Stage,
        /// Message reported by the collaborator
        message: String,
    },

    /// Error decoding, cropping or encoding a raster image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An image key was supplied twice within one document.
    #[error("Duplicate image key: {0}")]
    DuplicateImageKey(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a collaborator error for the given stage.
    pub fn collaborator(stage: Stage, message: impl Into<String>) -> Self {
        Error::Collaborator {
            stage,
            message: message.into(),
        }
    }
}

/// Pipeline stage backed by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Page layout detection
    Layout,
    /// Equation detection
    EquationDetection,
    /// Table structure recognition
    TableStructure,
    /// Text OCR
    TextRecognition,
    /// LaTeX OCR
    LatexRecognition,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Layout => write!(f, "layout detection"),
            Stage::EquationDetection => write!(f, "equation detection"),
            Stage::TableStructure => write!(f, "table structure recognition"),
            Stage::TextRecognition => write!(f, "text recognition"),
            Stage::LatexRecognition => write!(f, "LaTeX recognition"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
