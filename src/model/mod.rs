//! Document model types for assembled page content.
//!
//! This module defines the typed element tree that sits between raw model
//! detections and the renderers. Every element carries a normalized
//! [`BBox`]; ordering and containment are computed from it.

mod document;
mod element;
mod figure;
mod geometry;
mod table;

pub use document::Document;
pub use element::{Content, Element, ElementKind, Equation, ImageBlock, TableBlock, TextBlock};
pub use figure::{Figure, ImageKeys};
pub use geometry::{sort_by_reading_order, BBox, PixelRect, DEFAULT_INTERSECTION_THRESHOLD};
pub use table::Table;
