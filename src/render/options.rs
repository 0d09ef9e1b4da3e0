//! Rendering options and configuration.

use super::{CleanupOptions, CleanupPreset};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Options for rendering an assembled document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory to save image files into
    ///
    /// When unset, [`to_markdown`](super::to_markdown) writes no files and
    /// [`write_markdown`](super::write_markdown) uses the output directory.
    pub image_dir: Option<PathBuf>,

    /// Prefix for image paths in output (e.g., "./images/")
    pub image_path_prefix: String,

    /// Heading level used for titles (1-6)
    pub title_heading_level: u8,

    /// Text cleanup applied to OCR text blocks
    pub cleanup: Option<CleanupOptions>,

    /// Page selection
    pub page_selection: PageSelection,

    /// Escape special Markdown characters in OCR text
    pub escape_special_chars: bool,

    /// Collect rendering statistics
    pub collect_stats: bool,

    /// Name of the Markdown file written by `write_markdown`
    pub file_name: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Set the heading level used for titles.
    pub fn with_title_heading(mut self, level: u8) -> Self {
        self.title_heading_level = level.clamp(1, 6);
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup_preset(mut self, preset: CleanupPreset) -> Self {
        self.cleanup = Some(CleanupOptions::from_preset(preset));
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Enable statistics collection during rendering.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }

    /// Set the Markdown output file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_dir: None,
            image_path_prefix: String::new(),
            title_heading_level: 2,
            cleanup: None,
            page_selection: PageSelection::All,
            escape_special_chars: false,
            collect_stats: false,
            file_name: "output.md".to_string(),
        }
    }
}

/// Page selection, by page number as stored in the document (0-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "0-9", "0,2,4-6").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                if start > end {
                    return Err(format!("Invalid page range: {}-{}", start, end));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| "Invalid page number")?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}
