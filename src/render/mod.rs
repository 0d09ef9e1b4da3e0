//! Rendering module for converting assembled documents to output formats.

mod cleanup;
mod json;
mod markdown;
mod options;
mod result;
mod text;

pub use cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, to_markdown_with_stats, write_markdown, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions};
pub use result::{RenderResult, RenderStats};
pub use text::to_text;
