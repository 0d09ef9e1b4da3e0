//! Image payloads for figure elements.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Encoded image bytes extracted from a page region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Key unique within the document; also the output file stem
    pub unique_key: String,

    /// Encoded image bytes
    #[serde(skip)]
    pub data: Vec<u8>,

    /// File extension without the dot (e.g., "png")
    pub extension: String,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,
}

impl Figure {
    /// Create a figure, detecting the extension from the data's magic bytes.
    pub fn new(unique_key: impl Into<String>, data: Vec<u8>) -> Self {
        let extension = Self::detect_extension(&data).unwrap_or("bin").to_string();
        Self {
            unique_key: unique_key.into(),
            data,
            extension,
            width: None,
            height: None,
        }
    }

    /// Create a PNG figure.
    pub fn png(unique_key: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            unique_key: unique_key.into(),
            data,
            extension: "png".to_string(),
            width: None,
            height: None,
        }
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Name of the file this figure is written to.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.unique_key, self.extension)
    }

    /// Get the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if the figure carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Detect a file extension from data magic bytes.
    pub fn detect_extension(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("png");
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("jpg");
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("gif");
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("tiff");
        }
        if data.starts_with(b"BM") {
            return Some("bmp");
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("webp");
        }

        None
    }
}

/// Hands out image keys that are unique within one document.
///
/// Generated keys follow `img_{page}_{n}` with `n` counting per page.
/// Explicit keys are accepted once.
#[derive(Debug, Default)]
pub struct ImageKeys {
    seen: HashSet<String>,
    per_page: HashMap<u32, u32>,
}

impl ImageKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next free key for a page.
    pub fn next(&mut self, page_number: u32) -> String {
        loop {
            let n = self.per_page.entry(page_number).or_insert(0);
            let key = format!("img_{}_{}", page_number, n);
            *n += 1;
            if self.seen.insert(key.clone()) {
                return key;
            }
        }
    }

    /// Register an explicit key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateImageKey`] if the key was already handed out.
    pub fn claim(&mut self, key: &str) -> Result<()> {
        if !self.seen.insert(key.to_string()) {
            return Err(Error::DuplicateImageKey(key.to_string()));
        }
        Ok(())
    }

    /// Number of keys handed out so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
