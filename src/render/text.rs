//! Plain text rendering for assembled documents.

use crate::error::Result;
use crate::model::Document;

use super::{CleanupPipeline, RenderOptions};

/// Convert a document to plain text.
///
/// Element contents are joined in reading order, one blank line apart.
/// Cleanup, when configured, runs on each element's text separately.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let pipeline = options.cleanup.clone().map(CleanupPipeline::new).transpose()?;

    let mut blocks = Vec::new();
    for page in doc.page_numbers() {
        if !options.page_selection.includes(page) {
            continue;
        }
        for element in doc.get_ordered_elements(page) {
            let Some(text) = element.plain_text() else {
                continue;
            };
            let text = match &pipeline {
                Some(pipeline) => pipeline.process(&text),
                None => text.trim().to_string(),
            };
            if !text.is_empty() {
                blocks.push(text);
            }
        }
    }

    Ok(blocks.join("\n\n"))
}
