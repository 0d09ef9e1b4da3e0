//! Per-page assembly pipeline.
//!
//! For each page: layout detection, typing, equation detection, containment
//! resolution, then one extraction call per element, dispatched on its kind.
//! Pages are independent; with [`ParseOptions::parallel`] they run on the
//! rayon pool and the results are added to the [`Document`] afterwards, in
//! ascending page order, on the calling thread.

use image::{ImageFormat, RgbImage};
use rayon::prelude::*;
use std::io::Cursor;

use super::cell_ocr::clean_cell_text;
use super::collaborators::{
    stage_error, EquationDetector, LatexRecognizer, LayoutDetector, TableStructureModel,
    TextRecognizer,
};
use super::containment::ContainmentResolver;
use super::options::{ErrorMode, ParseOptions};
use super::page::PageImage;
use super::table_grid::TableGridReconstructor;
use super::typing::{type_detection, type_equation};
use crate::error::{Result, Stage};
use crate::model::{Content, Document, Element, ElementKind, Figure, ImageKeys};

/// Drives the external models over page images and assembles a [`Document`].
pub struct DocumentParser {
    layout: Box<dyn LayoutDetector>,
    equations: Box<dyn EquationDetector>,
    table_structure: Box<dyn TableStructureModel>,
    text: Box<dyn TextRecognizer>,
    latex: Box<dyn LatexRecognizer>,
    options: ParseOptions,
}

impl DocumentParser {
    /// Create a parser with default options.
    pub fn new(
        layout: impl LayoutDetector + 'static,
        equations: impl EquationDetector + 'static,
        table_structure: impl TableStructureModel + 'static,
        text: impl TextRecognizer + 'static,
        latex: impl LatexRecognizer + 'static,
    ) -> Self {
        Self {
            layout: Box::new(layout),
            equations: Box::new(equations),
            table_structure: Box::new(table_structure),
            text: Box::new(text),
            latex: Box::new(latex),
            options: ParseOptions::default(),
        }
    }

    /// Set parse options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Process every selected page and assemble the document.
    pub fn parse(&self, pages: &[PageImage]) -> Result<Document> {
        self.options.validate()?;

        let selected: Vec<&PageImage> = pages
            .iter()
            .filter(|p| self.options.pages.includes(p.page_number()))
            .collect();
        log::debug!(
            "DocumentParser: processing {} of {} pages{}",
            selected.len(),
            pages.len(),
            if self.options.parallel { " in parallel" } else { "" }
        );

        let mut results: Vec<(u32, Result<Vec<Element>>)> = if self.options.parallel {
            selected
                .par_iter()
                .map(|page| (page.page_number(), self.parse_page(page)))
                .collect()
        } else {
            selected
                .iter()
                .map(|page| (page.page_number(), self.parse_page(page)))
                .collect()
        };
        results.sort_by_key(|(page_number, _)| *page_number);

        let mut document = Document::new();
        let mut keys = ImageKeys::new();
        for (page_number, result) in results {
            for mut element in result? {
                self.register_image_key(&mut element, &mut keys)?;
                document.add_element(page_number, element);
            }
        }
        Ok(document)
    }

    /// Detect, resolve and extract the elements of one page.
    pub fn parse_page(&self, page: &PageImage) -> Result<Vec<Element>> {
        let page_number = page.page_number();
        let (width, height) = (page.width(), page.height());

        let detections = self
            .layout
            .detect(page)
            .map_err(stage_error(Stage::Layout))?;
        let equation_detections = self
            .equations
            .detect(page)
            .map_err(stage_error(Stage::EquationDetection))?;
        log::debug!(
            "DocumentParser: page {}: {} layout detections, {} equations",
            page_number,
            detections.len(),
            equation_detections.len()
        );

        let min_score = self.options.min_score;
        let mut elements = Vec::with_capacity(detections.len() + equation_detections.len());
        for detection in &detections {
            if !detection.meets_score(min_score) {
                log::debug!(
                    "DocumentParser: page {}: dropping {} detection scored {:?}",
                    page_number,
                    detection.label,
                    detection.score
                );
                continue;
            }
            if let Some(element) =
                self.skip_if_lenient(type_detection(detection, page_number, width, height), page_number)?
            {
                elements.push(element);
            }
        }
        let mut equations = Vec::with_capacity(equation_detections.len());
        for detection in &equation_detections {
            if let Some(element) =
                self.skip_if_lenient(type_equation(detection, page_number, width, height), page_number)?
            {
                equations.push(element);
            }
        }

        let resolver = ContainmentResolver::with_config(self.options.containment.clone());
        let report = resolver.resolve(&mut elements, equations);
        log::debug!("DocumentParser: page {}: {:?}", page_number, report);

        let mut keys = ImageKeys::new();
        for element in &mut elements {
            let result = self.extract(page, element, &mut keys);
            if let Err(e) = result {
                if self.options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
                log::warn!(
                    "Failed to extract {} on page {}: {}",
                    element.kind(),
                    page_number,
                    e
                );
            }
            if let Some(step) = self.options.pipeline_step {
                stamp_pipeline_step(element, step);
            }
        }

        Ok(elements)
    }

    /// Fill an element's content slot.
    fn extract(&self, page: &PageImage, element: &mut Element, keys: &mut ImageKeys) -> Result<()> {
        match element.kind() {
            ElementKind::Text => self.extract_text(page, element),
            ElementKind::Title => self.extract_title(page, element),
            ElementKind::Table => self.extract_table(page, element),
            ElementKind::Equation => self.extract_equation(page, element),
            ElementKind::Image => self.extract_image(page, element, keys),
        }
    }

    fn extract_text(&self, page: &PageImage, element: &mut Element) -> Result<()> {
        let raw = self.recognize_text(&page.crop(&element.bbox))?;
        if let Content::Text(block) = &mut element.content {
            block.text = Some(raw.trim().to_string());
            if let Some(eq) = block.equation_inside.as_deref_mut() {
                self.extract_equation(page, eq)?;
            }
        }
        Ok(())
    }

    fn extract_title(&self, page: &PageImage, element: &mut Element) -> Result<()> {
        let raw = self.recognize_text(&page.crop(&element.bbox))?;
        if let Content::Title(block) = &mut element.content {
            block.text = Some(join_lines(&raw));
            if let Some(eq) = block.equation_inside.as_deref_mut() {
                self.extract_equation(page, eq)?;
            }
        }
        Ok(())
    }

    fn extract_table(&self, page: &PageImage, element: &mut Element) -> Result<()> {
        let reconstructor = TableGridReconstructor::new(
            self.table_structure.as_ref(),
            self.text.as_ref(),
            &self.options.table_grid,
        );
        let table = reconstructor.reconstruct(page, &element.bbox)?;
        if let Content::Table(block) = &mut element.content {
            block.data = Some(table);
            if let Some(eq) = block.equation_inside.as_deref_mut() {
                self.extract_equation(page, eq)?;
            }
        }
        Ok(())
    }

    fn extract_equation(&self, page: &PageImage, element: &mut Element) -> Result<()> {
        let raw = self
            .latex
            .recognize(&page.crop(&element.bbox))
            .map_err(stage_error(Stage::LatexRecognition))?;
        if let Content::Equation(eq) = &mut element.content {
            let latex = raw.trim();
            eq.latex = (!latex.is_empty()).then(|| latex.to_string());
        }
        Ok(())
    }

    fn extract_image(&self, page: &PageImage, element: &mut Element, keys: &mut ImageKeys) -> Result<()> {
        let crop = page.crop(&element.bbox);
        let data = encode_png(&crop)?;
        let key = keys.next(page.page_number());
        if let Content::Image(block) = &mut element.content {
            block.figure = Some(Figure::png(key, data).with_dimensions(crop.width(), crop.height()));
        }
        Ok(())
    }

    fn recognize_text(&self, crop: &RgbImage) -> Result<String> {
        self.text
            .recognize(crop)
            .map_err(stage_error(Stage::TextRecognition))
    }

    /// Claim an image's key for the whole document.
    ///
    /// Keys are generated per page, so a clash means two page images share
    /// a page number. Lenient mode re-keys the figure instead of failing.
    fn register_image_key(&self, element: &mut Element, keys: &mut ImageKeys) -> Result<()> {
        let page_number = element.page_number;
        let figure = match &mut element.content {
            Content::Image(block) => match block.figure.as_mut() {
                Some(figure) => figure,
                None => return Ok(()),
            },
            _ => return Ok(()),
        };
        match keys.claim(&figure.unique_key) {
            Ok(()) => Ok(()),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                let key = keys.next(page_number);
                log::warn!("{}, renaming to {}", e, key);
                figure.unique_key = key;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Pass a value through, or in lenient mode turn an error into a skip.
    fn skip_if_lenient<T>(&self, result: Result<T>, page_number: u32) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping detection on page {}: {}", page_number, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// PNG-encode a raster.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Collapse OCR lines into a single line.
fn join_lines(raw: &str) -> String {
    raw.lines()
        .map(clean_cell_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tag an element and anything embedded in it with a pipeline step.
pub(crate) fn stamp_pipeline_step(element: &mut Element, step: u32) {
    element.pipeline_step = Some(step);
    match &mut element.content {
        Content::Text(block) | Content::Title(block) => {
            if let Some(eq) = block.equation_inside.as_deref_mut() {
                eq.pipeline_step = Some(step);
            }
        }
        Content::Table(block) => {
            if let Some(eq) = block.equation_inside.as_deref_mut() {
                eq.pipeline_step = Some(step);
            }
        }
        Content::Image(block) => {
            for eq in &mut block.equations_inside {
                eq.pipeline_step = Some(step);
            }
        }
        Content::Equation(_) => {}
    }
}
