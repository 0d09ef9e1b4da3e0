//! Typed page elements.

use serde::{Deserialize, Serialize};

use super::{BBox, Figure, Table};

/// A detected region on one page plus its extracted content.
///
/// Coordinates are fixed at creation; only the content slot is filled in
/// later by an extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Normalized bounding box
    pub bbox: BBox,

    /// Page number (0-indexed)
    pub page_number: u32,

    /// Provenance tag of the pipeline step that produced this element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_step: Option<u32>,

    /// Kind-specific content
    pub content: Content,
}

impl Element {
    /// Create an element with the given content.
    pub fn new(bbox: BBox, page_number: u32, content: Content) -> Self {
        Self {
            bbox,
            page_number,
            pipeline_step: None,
            content,
        }
    }

    /// Create an empty text element.
    pub fn text(bbox: BBox, page_number: u32) -> Self {
        Self::new(bbox, page_number, Content::Text(TextBlock::default()))
    }

    /// Create an empty title element.
    pub fn title(bbox: BBox, page_number: u32) -> Self {
        Self::new(bbox, page_number, Content::Title(TextBlock::default()))
    }

    /// Create an empty table element.
    pub fn table(bbox: BBox, page_number: u32) -> Self {
        Self::new(bbox, page_number, Content::Table(TableBlock::default()))
    }

    /// Create an empty equation element.
    ///
    /// `is_inside_text` is true when the detector classified the equation as
    /// embedded in running text rather than isolated.
    pub fn equation(bbox: BBox, page_number: u32, is_inside_text: bool) -> Self {
        Self::new(
            bbox,
            page_number,
            Content::Equation(Equation {
                latex: None,
                is_inside_text,
            }),
        )
    }

    /// Create an empty image element.
    pub fn image(bbox: BBox, page_number: u32) -> Self {
        Self::new(bbox, page_number, Content::Image(ImageBlock::default()))
    }

    /// Set the pipeline step and return self.
    pub fn with_pipeline_step(mut self, step: u32) -> Self {
        self.pipeline_step = Some(step);
        self
    }

    /// Get the element kind.
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Whether more than `threshold` percent of this element lies inside `other`.
    pub fn is_in(&self, other: &Element, threshold: f64) -> bool {
        self.bbox.is_in(&other.bbox, threshold)
    }

    /// Reading-order comparison, scoped to a single page.
    ///
    /// Elements on different pages never compare: both directions are false.
    pub fn reads_before(&self, other: &Element) -> bool {
        self.page_number == other.page_number && self.bbox.reads_before(&other.bbox)
    }

    /// Get the equation payload if this is an equation.
    pub fn as_equation(&self) -> Option<&Equation> {
        match &self.content {
            Content::Equation(eq) => Some(eq),
            _ => None,
        }
    }

    /// Whether an embedded equation has been attached to this element.
    pub fn has_equation_inside(&self) -> bool {
        match &self.content {
            Content::Text(block) | Content::Title(block) => block.equation_inside.is_some(),
            Content::Table(block) => block.equation_inside.is_some(),
            Content::Image(block) => !block.equations_inside.is_empty(),
            Content::Equation(_) => false,
        }
    }

    /// Plain text content, if any was extracted.
    pub fn plain_text(&self) -> Option<String> {
        match &self.content {
            Content::Text(block) | Content::Title(block) => block.text.clone(),
            Content::Table(block) => block.data.as_ref().map(|t| t.plain_text()),
            Content::Equation(eq) => eq.latex.clone(),
            Content::Image(_) => None,
        }
    }
}

/// Fieldless mirror of [`Content`] used for dispatch and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Title,
    Table,
    Equation,
    Image,
}

impl ElementKind {
    /// All kinds, in declaration order.
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Text,
        ElementKind::Title,
        ElementKind::Table,
        ElementKind::Equation,
        ElementKind::Image,
    ];

    /// Whether an embedded equation may be attached to elements of this kind.
    pub fn can_host_equation(self) -> bool {
        !matches!(self, ElementKind::Equation)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Text => write!(f, "text"),
            ElementKind::Title => write!(f, "title"),
            ElementKind::Table => write!(f, "table"),
            ElementKind::Equation => write!(f, "equation"),
            ElementKind::Image => write!(f, "image"),
        }
    }
}

/// Kind-specific content slot of an [`Element`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Body text
    Text(TextBlock),

    /// Section title
    Title(TextBlock),

    /// Table
    Table(TableBlock),

    /// Equation
    Equation(Equation),

    /// Figure
    Image(ImageBlock),
}

impl Content {
    /// Get the kind of this content.
    pub fn kind(&self) -> ElementKind {
        match self {
            Content::Text(_) => ElementKind::Text,
            Content::Title(_) => ElementKind::Title,
            Content::Table(_) => ElementKind::Table,
            Content::Equation(_) => ElementKind::Equation,
            Content::Image(_) => ElementKind::Image,
        }
    }
}

/// Content of a text or title element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Extracted text
    pub text: Option<String>,

    /// Equation embedded in this block (always an equation element)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation_inside: Option<Box<Element>>,
}

impl TextBlock {
    /// Create a block with text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            equation_inside: None,
        }
    }
}

/// Content of a table element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    /// Reconstructed tabular value
    pub data: Option<Table>,

    /// Equation embedded in this table (always an equation element)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation_inside: Option<Box<Element>>,
}

/// Content of an equation element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Recognized LaTeX source, without math delimiters
    pub latex: Option<String>,

    /// True if the detector classified the equation as embedded in text
    pub is_inside_text: bool,
}

/// Content of an image element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Image payload, once extracted
    pub figure: Option<Figure>,

    /// Equations found inside this image region
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equations_inside: Vec<Element>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BBox {
        BBox::new(x_min, y_min, x_max, y_max).unwrap()
    }

    #[test]
    fn test_constructors_set_kind() {
        let b = bbox(0.1, 0.1, 0.2, 0.2);
        assert_eq!(Element::text(b, 0).kind(), ElementKind::Text);
        assert_eq!(Element::title(b, 0).kind(), ElementKind::Title);
        assert_eq!(Element::table(b, 0).kind(), ElementKind::Table);
        assert_eq!(Element::equation(b, 0, true).kind(), ElementKind::Equation);
        assert_eq!(Element::image(b, 0).kind(), ElementKind::Image);
    }

    #[test]
    fn test_reads_before_scoped_to_page() {
        let top = Element::text(bbox(0.1, 0.1, 0.5, 0.2), 0);
        let bottom = Element::text(bbox(0.1, 0.5, 0.5, 0.6), 0);
        let other_page = Element::text(bbox(0.1, 0.5, 0.5, 0.6), 1);

        assert!(top.reads_before(&bottom));
        assert!(!bottom.reads_before(&top));
        assert!(!top.reads_before(&other_page));
        assert!(!other_page.reads_before(&top));
    }

    #[test]
    fn test_has_equation_inside() {
        let b = bbox(0.1, 0.1, 0.5, 0.5);
        let mut text = Element::text(b, 0);
        assert!(!text.has_equation_inside());

        if let Content::Text(block) = &mut text.content {
            block.equation_inside = Some(Box::new(Element::equation(b, 0, true)));
        }
        assert!(text.has_equation_inside());
    }

    #[test]
    fn test_pipeline_step() {
        let e = Element::text(bbox(0.1, 0.1, 0.2, 0.2), 3).with_pipeline_step(2);
        assert_eq!(e.pipeline_step, Some(2));
        assert_eq!(e.page_number, 3);
    }

    #[test]
    fn test_equation_cannot_host() {
        assert!(!ElementKind::Equation.can_host_equation());
        assert!(ElementKind::Table.can_host_equation());
    }
}
