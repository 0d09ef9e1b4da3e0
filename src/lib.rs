//! # scanmark
//!
//! Assembles the output of document-layout models into reading-ordered
//! Markdown.
//!
//! Layout, equation, table-structure and OCR models are external
//! collaborators behind the traits in [`parser`]. This crate turns their
//! detections into typed elements, resolves which equations are embedded in
//! which text, rebuilds tables from row and column bands, orders everything
//! in column-aware reading order and renders the result.
//!
//! ## Quick Start
//!
//! Detections can be assembled without any model in the loop from a
//! pre-computed dump (see [`parser::dump`]):
//!
//! ```no_run
//! use scanmark::{assemble_file, render};
//!
//! fn main() -> scanmark::Result<()> {
//!     let doc = assemble_file("detections.json")?;
//!
//!     let options = render::RenderOptions::default();
//!     let markdown = render::to_markdown(&doc, &options)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! With live models, implement the collaborator traits and drive them with
//! [`DocumentParser`]:
//!
//! ```ignore
//! let parser = DocumentParser::new(layout, equations, table_structure, ocr, latex)
//!     .with_options(ParseOptions::new().with_parallel(true));
//! let doc = parser.parse(&pages)?;
//! render::write_markdown(&doc, "out", &RenderOptions::default())?;
//! ```
//!
//! ## Features
//!
//! - **Reading order**: column-aware ordering scoped to each page
//! - **Equation containment**: embedded equations attach to their host
//! - **Table grids**: cells from row/column intersections, OCR padding ladder
//! - **Multiple output formats**: Markdown, plain text, JSON
//! - **Parallel processing**: Uses Rayon for multi-page documents

pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result, Stage};
pub use model::{
    BBox, Content, Document, Element, ElementKind, Equation, Figure, ImageBlock, Table,
    TableBlock, TextBlock,
};
pub use parser::{
    ContainmentConfig, DocumentDump, DocumentParser, ErrorMode, HostSelection, PageImage,
    ParseOptions, TableGridConfig,
};
pub use render::{
    CleanupOptions, CleanupPreset, JsonFormat, PageSelection, RenderOptions, RenderResult,
    RenderStats,
};

use std::path::{Path, PathBuf};

/// Assemble a document from a detection dump file.
///
/// Image paths inside the dump are resolved against the dump's directory.
///
/// # Example
///
/// ```no_run
/// use scanmark::assemble_file;
///
/// let doc = assemble_file("detections.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    assemble_file_with_options(path, &ParseOptions::default())
}

/// Assemble a document from a detection dump file with custom options.
///
/// # Example
///
/// ```no_run
/// use scanmark::{assemble_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().lenient();
/// let doc = assemble_file_with_options("detections.json", &options).unwrap();
/// ```
pub fn assemble_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<Document> {
    let path = path.as_ref();
    let dump = DocumentDump::load(path)?;
    parser::assemble(&dump, options, path.parent())
}

/// Assemble a document from a detection dump in JSON form.
///
/// Relative image paths are resolved against the current directory.
pub fn assemble_json(json: &str, options: &ParseOptions) -> Result<Document> {
    let dump = DocumentDump::from_json(json)?;
    parser::assemble(&dump, options, None)
}

/// Convert a detection dump file to Markdown.
///
/// # Example
///
/// ```no_run
/// use scanmark::to_markdown;
///
/// let markdown = to_markdown("detections.json").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = assemble_file(path)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Convert a detection dump file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = assemble_file(path)?;
    render::to_text(&doc, options)
}

/// Convert a detection dump file to JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = assemble_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for assembling and rendering documents.
///
/// # Example
///
/// ```no_run
/// use scanmark::Scanmark;
///
/// let result = Scanmark::new()
///     .lenient()
///     .with_title_heading(1)
///     .assemble("detections.json")?
///     .write_markdown("out")?;
/// println!("{} images written", result.images.len());
/// # Ok::<(), scanmark::Error>(())
/// ```
pub struct Scanmark {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Scanmark {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Enable lenient mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Process pages in parallel.
    pub fn parallel(mut self) -> Self {
        self.parse_options = self.parse_options.with_parallel(true);
        self
    }

    /// Set parse options, replacing any set so far.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Set render options, replacing any set so far.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.render_options = self.render_options.with_image_dir(dir);
        self
    }

    /// Set the heading level used for titles.
    pub fn with_title_heading(mut self, level: u8) -> Self {
        self.render_options = self.render_options.with_title_heading(level);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup(mut self, preset: CleanupPreset) -> Self {
        self.render_options = self.render_options.with_cleanup_preset(preset);
        self
    }

    /// Set page selection for both assembly and rendering.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse_options = self.parse_options.with_pages(pages.clone());
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Assemble a detection dump file.
    pub fn assemble<P: AsRef<Path>>(self, path: P) -> Result<ScanmarkResult> {
        let document = assemble_file_with_options(path, &self.parse_options)?;
        Ok(ScanmarkResult {
            document,
            render_options: self.render_options,
        })
    }

    /// Run a parser over page images.
    ///
    /// The parser's own options are replaced by this builder's.
    pub fn parse(self, parser: DocumentParser, pages: &[PageImage]) -> Result<ScanmarkResult> {
        let document = parser.with_options(self.parse_options).parse(pages)?;
        Ok(ScanmarkResult {
            document,
            render_options: self.render_options,
        })
    }
}

impl Default for Scanmark {
    fn default() -> Self {
        Self::new()
    }
}

/// An assembled document plus the options to render it with.
pub struct ScanmarkResult {
    /// The assembled document
    pub document: Document,
    render_options: RenderOptions,
}

impl ScanmarkResult {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Write Markdown and image files into `output_dir`.
    pub fn write_markdown(&self, output_dir: impl AsRef<Path>) -> Result<RenderResult> {
        render::write_markdown(&self.document, output_dir, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get plain text without cleanup.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
