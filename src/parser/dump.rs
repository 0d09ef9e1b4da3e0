//! Pre-computed detections.
//!
//! A dump records what the models reported for each page, together with the
//! content they extracted. Assembling a dump runs typing, containment
//! resolution and document assembly without any model in the loop.
//!
//! ```json
//! {
//!   "pages": [{
//!     "page_number": 0, "width": 1000, "height": 1400,
//!     "elements": [
//!       {"bbox": {"x_min": 80, "y_min": 60, "x_max": 900, "y_max": 110}, "label": "Title", "text": "Intro"},
//!       {"bbox": {"x_min": 80, "y_min": 700, "x_max": 900, "y_max": 900}, "label": "Table", "rows": [["A", "B"], ["1", "2"]]}
//!     ],
//!     "equations": [
//!       {"bbox": {"x_min": 200, "y_min": 400, "x_max": 600, "y_max": 450}, "is_embedded": false, "latex": "E = mc^2"}
//!     ]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::collaborators::{Detection, EquationDetection, RawBox};
use super::containment::ContainmentResolver;
use super::options::{ErrorMode, ParseOptions};
use super::pipeline::stamp_pipeline_step;
use super::typing::{type_detection, type_equation};
use crate::error::Result;
use crate::model::{Content, Document, Element, Figure, ImageKeys, Table};

/// Detections and extracted content for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDump {
    pub pages: Vec<PageDump>,
}

/// Detections and extracted content for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDump {
    pub page_number: u32,

    /// Page raster width in pixels
    pub width: u32,

    /// Page raster height in pixels
    pub height: u32,

    #[serde(default)]
    pub elements: Vec<ElementDump>,

    #[serde(default)]
    pub equations: Vec<EquationDump>,
}

/// A layout detection plus its extracted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDump {
    pub bbox: RawBox,
    pub label: String,

    /// Text or title content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Table content, header row first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,

    /// LaTeX for equations found by the layout detector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,

    /// Image file, relative to the dump's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,

    /// Explicit image key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// An equation detection plus its recognized LaTeX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationDump {
    pub bbox: RawBox,
    pub is_embedded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
}

impl DocumentDump {
    /// Parse a dump from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a dump from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the dump to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total number of layout and equation detections.
    pub fn detection_count(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.elements.len() + p.equations.len())
            .sum()
    }
}

/// Assemble a document from a dump.
///
/// Image paths are resolved against `base_dir` (the current directory when
/// `None`). Explicit image keys are claimed before any key is generated.
pub fn assemble(dump: &DocumentDump, options: &ParseOptions, base_dir: Option<&Path>) -> Result<Document> {
    options.validate()?;
    let resolver = ContainmentResolver::with_config(options.containment.clone());
    let lenient = options.error_mode == ErrorMode::Lenient;

    let pages: Vec<&PageDump> = dump
        .pages
        .iter()
        .filter(|p| options.pages.includes(p.page_number))
        .collect();

    let mut keys = ImageKeys::new();
    for key in pages
        .iter()
        .flat_map(|p| p.elements.iter())
        .filter_map(|e| e.key.as_deref())
    {
        keys.claim(key)?;
    }

    let mut document = Document::new();
    let mut ordered = pages;
    ordered.sort_by_key(|p| p.page_number);
    for page in ordered {
        let mut elements = Vec::with_capacity(page.elements.len());
        for dumped in &page.elements {
            match element_from_dump(dumped, page, base_dir, &mut keys) {
                Ok(element) => elements.push(element),
                Err(e) if lenient => {
                    log::warn!("Skipping detection on page {}: {}", page.page_number, e)
                }
                Err(e) => return Err(e),
            }
        }

        let mut equations = Vec::with_capacity(page.equations.len());
        for dumped in &page.equations {
            match equation_from_dump(dumped, page) {
                Ok(element) => equations.push(element),
                Err(e) if lenient => {
                    log::warn!("Skipping equation on page {}: {}", page.page_number, e)
                }
                Err(e) => return Err(e),
            }
        }

        let report = resolver.resolve(&mut elements, equations);
        log::debug!("assemble: page {}: {:?}", page.page_number, report);

        for mut element in elements {
            if let Some(step) = options.pipeline_step {
                stamp_pipeline_step(&mut element, step);
            }
            document.add_element(page.page_number, element);
        }
    }

    Ok(document)
}

fn element_from_dump(
    dumped: &ElementDump,
    page: &PageDump,
    base_dir: Option<&Path>,
    keys: &mut ImageKeys,
) -> Result<Element> {
    let detection = Detection::new(dumped.bbox, dumped.label.clone());
    let mut element = type_detection(&detection, page.page_number, page.width, page.height)?;

    match &mut element.content {
        Content::Text(block) | Content::Title(block) => block.text = dumped.text.clone(),
        Content::Table(block) => block.data = dumped.rows.clone().map(Table::from_rows),
        Content::Equation(eq) => eq.latex = dumped.latex.clone(),
        Content::Image(block) => {
            if let Some(path) = &dumped.image {
                let path = match base_dir {
                    Some(dir) => dir.join(path),
                    None => path.clone(),
                };
                let data = fs::read(&path)?;
                let key = match &dumped.key {
                    Some(key) => key.clone(),
                    None => keys.next(page.page_number),
                };
                block.figure = Some(Figure::new(key, data));
            }
        }
    }

    Ok(element)
}

fn equation_from_dump(dumped: &EquationDump, page: &PageDump) -> Result<Element> {
    let detection = EquationDetection {
        bbox: dumped.bbox,
        is_embedded: dumped.is_embedded,
    };
    let mut element = type_equation(&detection, page.page_number, page.width, page.height)?;
    if let Content::Equation(eq) = &mut element.content {
        eq.latex = dumped.latex.clone();
    }
    Ok(element)
}
