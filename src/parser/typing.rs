//! Typing of raw detections into elements.
//!
//! This is the boundary where detector output is normalized to `[0, 1]` and
//! validated. Anything that survives is a well-formed [`Element`].

use super::collaborators::{Detection, EquationDetection};
use crate::error::{Error, Result};
use crate::model::{Element, ElementKind};

/// Map a layout label to an element kind (case-insensitive).
pub fn kind_for_label(label: &str) -> Result<ElementKind> {
    match label.trim().to_ascii_lowercase().as_str() {
        "text" | "list" => Ok(ElementKind::Text),
        "title" => Ok(ElementKind::Title),
        "table" => Ok(ElementKind::Table),
        "figure" | "image" => Ok(ElementKind::Image),
        "equation" => Ok(ElementKind::Equation),
        _ => Err(Error::UnknownLabel(label.to_string())),
    }
}

/// Type a layout detection on a `width` x `height` page.
///
/// Equations reported by the layout detector are treated as isolated.
pub fn type_detection(
    detection: &Detection,
    page_number: u32,
    width: u32,
    height: u32,
) -> Result<Element> {
    let kind = kind_for_label(&detection.label)?;
    let bbox = detection.bbox.normalize(width, height)?;
    Ok(match kind {
        ElementKind::Text => Element::text(bbox, page_number),
        ElementKind::Title => Element::title(bbox, page_number),
        ElementKind::Table => Element::table(bbox, page_number),
        ElementKind::Equation => Element::equation(bbox, page_number, false),
        ElementKind::Image => Element::image(bbox, page_number),
    })
}

/// Type an equation detection on a `width` x `height` page.
pub fn type_equation(
    detection: &EquationDetection,
    page_number: u32,
    width: u32,
    height: u32,
) -> Result<Element> {
    let bbox = detection.bbox.normalize(width, height)?;
    Ok(Element::equation(bbox, page_number, detection.is_embedded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::collaborators::RawBox;

    #[test]
    fn test_label_map() {
        assert_eq!(kind_for_label("Text").unwrap(), ElementKind::Text);
        assert_eq!(kind_for_label("list").unwrap(), ElementKind::Text);
        assert_eq!(kind_for_label("TITLE").unwrap(), ElementKind::Title);
        assert_eq!(kind_for_label("Figure").unwrap(), ElementKind::Image);
        assert_eq!(kind_for_label(" table ").unwrap(), ElementKind::Table);
        assert!(matches!(
            kind_for_label("Footnote"),
            Err(Error::UnknownLabel(l)) if l == "Footnote"
        ));
    }

    #[test]
    fn test_type_detection() {
        let det = Detection::new(RawBox::pixels(10.0, 20.0, 110.0, 60.0), "Title");
        let element = type_detection(&det, 3, 200, 100).unwrap();
        assert_eq!(element.kind(), ElementKind::Title);
        assert_eq!(element.page_number, 3);
        assert!((element.bbox.x_max() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_type_detection_rejects_bad_geometry() {
        let det = Detection::new(RawBox::pixels(10.0, 20.0, 300.0, 60.0), "Text");
        assert!(matches!(
            type_detection(&det, 0, 200, 100),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_type_equation() {
        let det = EquationDetection::embedded(RawBox::normalized(0.1, 0.1, 0.2, 0.2));
        let element = type_equation(&det, 0, 100, 100).unwrap();
        assert!(element.as_equation().unwrap().is_inside_text);
    }
}
