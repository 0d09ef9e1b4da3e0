//! Document-level types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{sort_by_reading_order, Element, ElementKind};

/// An assembled document: per-page, unordered element collections.
///
/// Insertion order is irrelevant; the reading order is computed on demand by
/// [`Document::get_ordered_elements`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Elements keyed by page number (0-indexed)
    pub pages: BTreeMap<u32, Vec<Element>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element to a page, creating the page on first use.
    ///
    /// The element must belong to `page_number`; ordering compares boxes
    /// only within one page.
    pub fn add_element(&mut self, page_number: u32, element: Element) {
        debug_assert_eq!(
            element.page_number, page_number,
            "element from page {} filed under page {}",
            element.page_number, page_number
        );
        self.pages.entry(page_number).or_default().push(element);
    }

    /// Elements of a page in reading order.
    ///
    /// Returns an empty list for a page that has no elements.
    pub fn get_ordered_elements(&self, page_number: u32) -> Vec<&Element> {
        let mut elements: Vec<&Element> = match self.pages.get(&page_number) {
            Some(elements) => elements.iter().collect(),
            None => return Vec::new(),
        };
        sort_by_reading_order(&mut elements, |e| &e.bbox);
        elements
    }

    /// Page numbers in ascending order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Get the number of pages that hold at least one element slot.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get the total number of top-level elements.
    pub fn element_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Count top-level elements of one kind.
    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.pages
            .values()
            .flatten()
            .filter(|e| e.kind() == kind)
            .count()
    }

    /// Check if the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Get plain text content of the entire document in reading order.
    pub fn plain_text(&self) -> String {
        self.page_numbers()
            .map(|page| {
                self.get_ordered_elements(page)
                    .into_iter()
                    .filter_map(Element::plain_text)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
