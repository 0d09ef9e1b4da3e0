//! Markdown rendering for assembled documents.
//!
//! Pages are rendered in ascending order and elements in reading order, one
//! per-kind renderer per [`Content`] variant. The output is the plain
//! concatenation of every element's rendering, so a given document always
//! yields the same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{Content, Document, Element, Equation, ImageBlock, TableBlock, TextBlock};

use super::{CleanupPipeline, RenderOptions, RenderResult, RenderStats};

/// Convert a document to Markdown.
///
/// Image files are only written when [`RenderOptions::image_dir`] is set.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Convert a document to Markdown with statistics.
pub fn to_markdown_with_stats(doc: &Document, options: &RenderOptions) -> Result<RenderResult> {
    let mut options = options.clone();
    options.collect_stats = true;
    let renderer = MarkdownRenderer::new(options);
    renderer.render_with_stats(doc)
}

/// Render a document into `output_dir`.
///
/// Writes the Markdown once, to [`RenderOptions::file_name`], plus one
/// `{unique_key}.{extension}` file per rendered image (into
/// [`RenderOptions::image_dir`] when set, else next to the Markdown file).
pub fn write_markdown(
    doc: &Document,
    output_dir: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<RenderResult> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut options = options.clone();
    if options.image_dir.is_none() {
        options.image_dir = Some(output_dir.to_path_buf());
    }
    let file_name = options.file_name.clone();

    let result = MarkdownRenderer::new(options).render_with_stats(doc)?;

    let path = output_dir.join(file_name);
    fs::write(&path, &result.content)?;
    log::debug!(
        "Markdown: wrote {} ({} bytes, {} images)",
        path.display(),
        result.content_len(),
        result.images.len()
    );
    Ok(result)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
    cleanup: Option<CleanupPipeline>,
    stats: RenderStats,
    images: Vec<PathBuf>,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            cleanup: None,
            stats: RenderStats::new(),
            images: Vec::new(),
        }
    }

    /// Render a document to Markdown.
    pub fn render(mut self, doc: &Document) -> Result<String> {
        self.render_internal(doc)
    }

    /// Render a document to Markdown with statistics.
    pub fn render_with_stats(mut self, doc: &Document) -> Result<RenderResult> {
        self.options.collect_stats = true;
        let content = self.render_internal(doc)?;
        self.stats.count_text(&content);

        let mut result = RenderResult::new(content, self.stats);
        result.images = self.images;
        Ok(result)
    }

    fn render_internal(&mut self, doc: &Document) -> Result<String> {
        self.cleanup = self.options.cleanup.clone().map(CleanupPipeline::new).transpose()?;
        let mut output = String::new();

        for page in doc.page_numbers() {
            if !self.options.page_selection.includes(page) {
                continue;
            }
            if self.options.collect_stats {
                self.stats.add_page();
            }
            for element in doc.get_ordered_elements(page) {
                self.render_element(&mut output, element)?;
            }
        }

        Ok(output)
    }

    fn render_element(&mut self, output: &mut String, element: &Element) -> Result<()> {
        if self.options.collect_stats {
            self.stats.add_element(element.kind());
        }
        match &element.content {
            Content::Text(block) => self.render_text(output, block, element.page_number),
            Content::Title(block) => self.render_title(output, block, element.page_number),
            Content::Table(block) => self.render_table(output, block, element.page_number),
            Content::Equation(eq) => self.render_equation(output, eq, element.page_number),
            Content::Image(block) => return self.render_image(output, block, element.page_number),
        }
        Ok(())
    }

    fn render_text(&mut self, output: &mut String, block: &TextBlock, page: u32) {
        self.count_hosted_equation(block.equation_inside.is_some());
        match self.prepare_text(block.text.as_deref()) {
            Some(text) => {
                output.push_str(&text);
                output.push_str("\n\n");
            }
            None => self.empty_placeholder(output, "text", page),
        }
    }

    fn render_title(&mut self, output: &mut String, block: &TextBlock, page: u32) {
        self.count_hosted_equation(block.equation_inside.is_some());
        match self.prepare_text(block.text.as_deref()) {
            Some(text) => {
                let level = self.options.title_heading_level.clamp(1, 6) as usize;
                output.push_str(&"#".repeat(level));
                output.push(' ');
                output.push_str(&text);
                output.push_str("\n\n");
            }
            None => self.empty_placeholder(output, "title", page),
        }
    }

    fn render_table(&mut self, output: &mut String, block: &TableBlock, page: u32) {
        self.count_hosted_equation(block.equation_inside.is_some());
        let table = match &block.data {
            Some(table) if !table.is_empty() => table,
            _ => {
                self.empty_placeholder(output, "table", page);
                return;
            }
        };

        let header: Vec<String> = table.header.iter().map(|c| self.table_cell(c)).collect();
        push_table_row(output, &header);
        output.push('|');
        for _ in &header {
            output.push_str(" --- |");
        }
        output.push('\n');
        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(|c| self.table_cell(c)).collect();
            push_table_row(output, &cells);
        }
        output.push('\n');
    }

    fn render_equation(&mut self, output: &mut String, eq: &Equation, page: u32) {
        match eq.latex.as_deref().map(str::trim) {
            Some(latex) if !latex.is_empty() => {
                output.push_str("$$\n");
                output.push_str(latex);
                output.push_str("\n$$\n\n");
            }
            _ => self.empty_placeholder(output, "equation", page),
        }
    }

    fn render_image(&mut self, output: &mut String, block: &ImageBlock, page: u32) -> Result<()> {
        // Equations inside the image are rendered on their own.
        if !block.equations_inside.is_empty() {
            output.push('\n');
            return Ok(());
        }

        let figure = match &block.figure {
            Some(figure) if !figure.is_empty() => figure,
            _ => {
                self.empty_placeholder(output, "image", page);
                return Ok(());
            }
        };

        let file_name = figure.file_name();
        if let Some(dir) = &self.options.image_dir {
            fs::create_dir_all(dir)?;
            let path = dir.join(&file_name);
            fs::write(&path, &figure.data)?;
            log::debug!("Markdown: wrote image {} ({} bytes)", path.display(), figure.size());
            self.images.push(path);
            if self.options.collect_stats {
                self.stats.add_image_written();
            }
        }

        output.push_str(&format!(
            "\n![image]({}{})\n\n",
            self.options.image_path_prefix, file_name
        ));
        Ok(())
    }

    /// Cleaned and escaped text, or `None` when there is nothing to render.
    fn prepare_text(&self, text: Option<&str>) -> Option<String> {
        let text = text?;
        let text = match &self.cleanup {
            Some(pipeline) => pipeline.process(text),
            None => text.to_string(),
        };
        if text.trim().is_empty() {
            return None;
        }
        Some(if self.options.escape_special_chars {
            escape_markdown(&text)
        } else {
            text
        })
    }

    fn table_cell(&self, cell: &str) -> String {
        let text = match &self.cleanup {
            Some(pipeline) => pipeline.process(cell),
            None => cell.trim().to_string(),
        };
        let text = text.replace(['\n', '\r'], " ");
        if self.options.escape_special_chars {
            escape_markdown(&text)
        } else {
            text.replace('|', "\\|")
        }
    }

    fn empty_placeholder(&mut self, output: &mut String, what: &str, page: u32) {
        log::warn!("Markdown: empty {} on page {}, rendering a blank placeholder", what, page);
        if self.options.collect_stats {
            self.stats.add_empty();
        }
        output.push_str("\n\n");
    }

    fn count_hosted_equation(&mut self, hosted: bool) {
        if hosted && self.options.collect_stats {
            self.stats.add_swallowed_equation();
        }
    }
}

fn push_table_row(output: &mut String, cells: &[String]) {
    output.push('|');
    for cell in cells {
        output.push(' ');
        output.push_str(cell);
        output.push_str(" |");
    }
    output.push('\n');
}

/// Escape special Markdown characters.
/// Only characters that could be misinterpreted as Markdown syntax inside a
/// block are escaped.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Figure, Table};

    fn bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BBox {
        BBox::new(x_min, y_min, x_max, y_max).unwrap()
    }

    fn text(b: BBox, content: &str) -> Element {
        let mut element = Element::text(b, 0);
        element.content = Content::Text(TextBlock::with_text(content));
        element
    }

    fn title(b: BBox, content: &str) -> Element {
        let mut element = Element::title(b, 0);
        element.content = Content::Title(TextBlock::with_text(content));
        element
    }

    fn table(b: BBox, rows: Vec<Vec<&str>>) -> Element {
        let mut element = Element::table(b, 0);
        if let Content::Table(block) = &mut element.content {
            block.data = Some(Table::from_rows(rows));
        }
        element
    }

    fn equation(b: BBox, latex: Option<&str>, embedded: bool) -> Element {
        let mut element = Element::equation(b, 0, embedded);
        if let Content::Equation(eq) = &mut element.content {
            eq.latex = latex.map(str::to_string);
        }
        element
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
    }

    #[test]
    fn test_round_trip_title_text_table() {
        let mut doc = Document::new();
        // Inserted out of order on purpose.
        doc.add_element(0, table(bbox(0.1, 0.5, 0.9, 0.7), vec![vec!["A", "B"], vec!["1", "2"]]));
        doc.add_element(0, text(bbox(0.1, 0.2, 0.9, 0.4), "Body."));
        doc.add_element(0, title(bbox(0.1, 0.05, 0.9, 0.1), "Intro"));

        let md = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(
            md,
            "## Intro\n\nBody.\n\n| A | B |\n| --- | --- |\n| 1 | 2 |\n\n"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut doc = Document::new();
        doc.add_element(0, text(bbox(0.1, 0.2, 0.9, 0.4), "Body."));
        let mut eq = equation(bbox(0.2, 0.2, 0.8, 0.3), Some("E = mc^2"), false);
        eq.page_number = 1;
        doc.add_element(1, eq);

        let options = RenderOptions::default();
        let first = to_markdown(&doc, &options).unwrap();
        let second = to_markdown(&doc, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Body.\n\n$$\nE = mc^2\n$$\n\n");
    }

    #[test]
    fn test_empty_content_renders_placeholder() {
        let mut doc = Document::new();
        doc.add_element(0, Element::text(bbox(0.1, 0.1, 0.9, 0.2), 0));
        doc.add_element(0, equation(bbox(0.1, 0.3, 0.9, 0.4), None, false));
        doc.add_element(0, Element::table(bbox(0.1, 0.5, 0.9, 0.6), 0));

        let result = to_markdown_with_stats(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(result.content, "\n\n\n\n\n\n");
        assert_eq!(result.stats.empty_count, 3);
    }

    #[test]
    fn test_table_swallows_embedded_equation() {
        let mut host = table(bbox(0.1, 0.1, 0.9, 0.5), vec![vec!["x"], vec!["1"]]);
        if let Content::Table(block) = &mut host.content {
            block.equation_inside = Some(Box::new(equation(
                bbox(0.2, 0.2, 0.3, 0.3),
                Some("\\alpha"),
                true,
            )));
        }
        let mut doc = Document::new();
        doc.add_element(0, host);

        let result = to_markdown_with_stats(&doc, &RenderOptions::default()).unwrap();
        assert!(!result.content.contains("alpha"));
        assert_eq!(result.stats.swallowed_equations, 1);
    }

    #[test]
    fn test_image_with_equation_renders_newline() {
        let mut image = Element::image(bbox(0.1, 0.1, 0.9, 0.5), 0);
        if let Content::Image(block) = &mut image.content {
            block.figure = Some(Figure::png("img_0_0", vec![1, 2, 3]));
            block
                .equations_inside
                .push(equation(bbox(0.2, 0.2, 0.8, 0.4), Some("x"), false));
        }
        let mut doc = Document::new();
        doc.add_element(0, image);

        assert_eq!(to_markdown(&doc, &RenderOptions::default()).unwrap(), "\n");
    }

    #[test]
    fn test_image_reference_without_writing() {
        let mut image = Element::image(bbox(0.1, 0.1, 0.9, 0.5), 0);
        if let Content::Image(block) = &mut image.content {
            block.figure = Some(Figure::png("img_0_0", vec![1, 2, 3]));
        }
        let mut doc = Document::new();
        doc.add_element(0, image);

        let options = RenderOptions::default().with_image_prefix("./images/");
        let result = to_markdown_with_stats(&doc, &options).unwrap();
        assert_eq!(result.content, "\n![image](./images/img_0_0.png)\n\n");
        assert_eq!(result.stats.images_written, 0);
        assert!(result.images.is_empty());
    }

    #[test]
    fn test_title_heading_level_and_cleanup() {
        let mut doc = Document::new();
        doc.add_element(0, title(bbox(0.1, 0.1, 0.9, 0.2), "ﬁrst  steps"));

        let options = RenderOptions::default()
            .with_title_heading(1)
            .with_cleanup_preset(crate::render::CleanupPreset::Standard);
        assert_eq!(to_markdown(&doc, &options).unwrap(), "# first steps\n\n");
    }

    #[test]
    fn test_table_cell_pipes_are_escaped() {
        let mut doc = Document::new();
        doc.add_element(0, table(bbox(0.1, 0.1, 0.9, 0.5), vec![vec!["a|b"], vec!["c\nd"]]));

        let md = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(md, "| a\\|b |\n| --- |\n| c d |\n\n");
    }

    #[test]
    fn test_page_selection() {
        let mut doc = Document::new();
        doc.add_element(0, text(bbox(0.1, 0.1, 0.9, 0.2), "zero"));
        let mut one = text(bbox(0.1, 0.1, 0.9, 0.2), "one");
        one.page_number = 1;
        doc.add_element(1, one);

        let options = RenderOptions::default().with_page_range(1..=1);
        assert_eq!(to_markdown(&doc, &options).unwrap(), "one\n\n");
    }
}
