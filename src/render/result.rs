//! Rendering result with statistics.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::ElementKind;

/// Result of rendering a document, including content and statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered content (Markdown, text, etc.)
    pub content: String,

    /// Image files written while rendering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PathBuf>,

    /// Rendering statistics
    pub stats: RenderStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, stats: RenderStats) -> Self {
        Self {
            content,
            images: Vec::new(),
            stats,
        }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of pages rendered
    pub page_count: u32,

    pub text_count: u32,
    pub title_count: u32,
    pub table_count: u32,
    pub equation_count: u32,
    pub image_count: u32,

    /// Elements rendered as an empty placeholder
    pub empty_count: u32,

    /// Image files written
    pub images_written: u32,

    /// Embedded equations absorbed by their host and not rendered
    pub swallowed_equations: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Increment the counter for one element kind.
    pub fn add_element(&mut self, kind: ElementKind) {
        match kind {
            ElementKind::Text => self.text_count += 1,
            ElementKind::Title => self.title_count += 1,
            ElementKind::Table => self.table_count += 1,
            ElementKind::Equation => self.equation_count += 1,
            ElementKind::Image => self.image_count += 1,
        }
    }

    /// Increment empty placeholder count.
    pub fn add_empty(&mut self) {
        self.empty_count += 1;
    }

    /// Increment written image count.
    pub fn add_image_written(&mut self) {
        self.images_written += 1;
    }

    /// Increment swallowed equation count.
    pub fn add_swallowed_equation(&mut self) {
        self.swallowed_equations += 1;
    }

    /// Total number of rendered elements.
    pub fn element_count(&self) -> u32 {
        self.text_count + self.title_count + self.table_count + self.equation_count + self.image_count
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stats_count_text() {
        let mut stats = RenderStats::new();
        stats.count_text("Hello, world! This is a test.");

        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.char_count, 24);
    }

    #[test]
    fn test_render_stats_add_element() {
        let mut stats = RenderStats::new();
        for kind in ElementKind::ALL {
            stats.add_element(kind);
        }
        stats.add_element(ElementKind::Text);
        assert_eq!(stats.text_count, 2);
        assert_eq!(stats.element_count(), 6);
    }
}
