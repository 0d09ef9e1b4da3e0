//! Contracts for the external models the pipeline drives.
//!
//! The layout detector, equation detector, table-structure model and the two
//! recognizers are black boxes. Implement these traits to plug a model in;
//! every implementation must be shareable across threads because pages may
//! be processed in parallel.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::page::PageImage;
use crate::error::{Error, Result, Stage};
use crate::model::BBox;

/// Error type returned by collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by collaborators.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Detects typed regions (text, title, table, figure, equation) on a page.
pub trait LayoutDetector: Send + Sync {
    fn detect(&self, page: &PageImage) -> CollaboratorResult<Vec<Detection>>;
}

/// Detects equations on a page and classifies them as embedded or isolated.
pub trait EquationDetector: Send + Sync {
    fn detect(&self, page: &PageImage) -> CollaboratorResult<Vec<EquationDetection>>;
}

/// Finds row and column boxes in a cropped table image.
pub trait TableStructureModel: Send + Sync {
    fn analyze(&self, table: &RgbImage) -> CollaboratorResult<Vec<StructureBox>>;
}

/// Reads plain text from a cropped image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> CollaboratorResult<String>;
}

/// Reads LaTeX source from a cropped equation image.
pub trait LatexRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> CollaboratorResult<String>;
}

/// Coordinate space of a [`RawBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Pixels of the page raster
    #[default]
    Pixel,
    /// Fractions of the page raster's width and height
    Normalized,
}

/// A box as reported by a detector, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    #[serde(default)]
    pub space: CoordinateSpace,
}

impl RawBox {
    /// Box in page pixels.
    pub fn pixels(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            space: CoordinateSpace::Pixel,
        }
    }

    /// Box already normalized to `[0, 1]`.
    pub fn normalized(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            space: CoordinateSpace::Normalized,
        }
    }

    /// Validate and normalize against a `width` x `height` raster.
    pub fn normalize(&self, width: u32, height: u32) -> Result<BBox> {
        match self.space {
            CoordinateSpace::Pixel => {
                BBox::from_pixels(self.x_min, self.y_min, self.x_max, self.y_max, width, height)
            }
            CoordinateSpace::Normalized => {
                BBox::new(self.x_min, self.y_min, self.x_max, self.y_max)
            }
        }
    }
}

/// An untyped layout detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: RawBox,

    /// Detector label, e.g. "Text", "Title", "Table", "Figure"
    pub label: String,

    /// Detector confidence, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Detection {
    pub fn new(bbox: RawBox, label: impl Into<String>) -> Self {
        Self {
            bbox,
            label: label.into(),
            score: None,
        }
    }

    /// Attach a detector confidence.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Whether this detection clears `min_score`.
    ///
    /// Detections without a score always pass.
    pub fn meets_score(&self, min_score: Option<f32>) -> bool {
        match (self.score, min_score) {
            (Some(score), Some(min)) => score >= min,
            _ => true,
        }
    }
}

/// An equation detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationDetection {
    pub bbox: RawBox,

    /// True if the equation sits inside running text
    pub is_embedded: bool,
}

impl EquationDetection {
    pub fn embedded(bbox: RawBox) -> Self {
        Self {
            bbox,
            is_embedded: true,
        }
    }

    pub fn isolated(bbox: RawBox) -> Self {
        Self {
            bbox,
            is_embedded: false,
        }
    }
}

/// Label of a table structure box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureLabel {
    #[serde(rename = "table row")]
    Row,
    #[serde(rename = "table column")]
    Column,
    /// Any other structure the model reports (headers, spanning cells, ...)
    #[serde(other)]
    Other,
}

/// A row or column box in the pixel space of a cropped table image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub label: StructureLabel,
}

impl StructureBox {
    pub fn row(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            label: StructureLabel::Row,
        }
    }

    pub fn column(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            label: StructureLabel::Column,
        }
    }
}

/// Wrap a collaborator failure with the stage that produced it.
pub(crate) fn stage_error(stage: Stage) -> impl Fn(CollaboratorError) -> Error {
    move |err| Error::collaborator(stage, err.to_string())
}
