//! Containment resolution between equations and the elements around them.
//!
//! Runs once per page, after layout typing and equation detection:
//!
//! - An embedded equation (`is_inside_text`) is attached to the first element
//!   it lies inside. With no host it stays standalone.
//! - An isolated equation already swallowed by a placed element is a
//!   duplicate detection and is dropped. When the swallowing element is an
//!   image, the equation is kept standalone and recorded on the image so the
//!   image itself renders nothing.

use super::options::{ContainmentConfig, HostSelection};
use crate::model::{Content, Element, ElementKind};

/// Outcome counts of one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Equations attached to a text, title or table host
    pub embedded: usize,
    /// Equations kept as standalone elements
    pub standalone: usize,
    /// Isolated equations dropped as duplicates
    pub discarded: usize,
    /// Equations also recorded on an image they lie in
    pub inside_images: usize,
}

/// Attaches equation detections to their host elements.
#[derive(Debug, Clone, Default)]
pub struct ContainmentResolver {
    config: ContainmentConfig,
}

impl ContainmentResolver {
    /// Create a resolver with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(config: ContainmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContainmentConfig {
        &self.config
    }

    /// Merge a page's equations into its elements.
    ///
    /// `elements` are the page's already placed elements; standalone
    /// equations are appended to it. Anything in `equations` that is not an
    /// equation is appended unchanged.
    ///
    /// Isolated equations swallowed by an image are the one swallowed case
    /// that survives: they are recorded in the image's `equations_inside`
    /// and also kept standalone.
    pub fn resolve(&self, elements: &mut Vec<Element>, equations: Vec<Element>) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for equation in equations {
            let inside_text = match equation.as_equation() {
                Some(eq) => eq.is_inside_text,
                None => {
                    elements.push(equation);
                    continue;
                }
            };

            let host = if inside_text {
                self.find_host(elements, &equation, ElementKind::can_host_equation)
            } else {
                self.find_host(elements, &equation, |_| true)
            };

            match host {
                None => {
                    log::debug!(
                        "Containment: no host for {} equation on page {}, keeping standalone",
                        if inside_text { "embedded" } else { "isolated" },
                        equation.page_number
                    );
                    report.standalone += 1;
                    elements.push(equation);
                }
                // An isolated equation inside an image is not dropped as a
                // duplicate: the image renders as a bare newline once it
                // holds equations, so the standalone copy carries the LaTeX.
                Some(idx) if elements[idx].kind() == ElementKind::Image => {
                    if let Content::Image(block) = &mut elements[idx].content {
                        block.equations_inside.push(equation.clone());
                    }
                    log::debug!(
                        "Containment: equation on page {} lies in image #{}, keeping standalone",
                        equation.page_number,
                        idx
                    );
                    report.inside_images += 1;
                    report.standalone += 1;
                    elements.push(equation);
                }
                Some(idx) if inside_text => {
                    let host = &mut elements[idx];
                    log::debug!(
                        "Containment: attaching equation to {} #{} on page {}",
                        host.kind(),
                        idx,
                        host.page_number
                    );
                    attach(host, equation);
                    report.embedded += 1;
                }
                Some(idx) => {
                    log::debug!(
                        "Containment: dropping isolated equation swallowed by {} #{} on page {}",
                        elements[idx].kind(),
                        idx,
                        equation.page_number
                    );
                    report.discarded += 1;
                }
            }
        }

        report
    }

    /// Index of the element `equation` lies inside, per the host selection policy.
    fn find_host<P>(&self, elements: &[Element], equation: &Element, eligible: P) -> Option<usize>
    where
        P: Fn(ElementKind) -> bool,
    {
        let threshold = self.config.intersection_threshold;
        let mut candidates = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| eligible(e.kind()) && equation.is_in(e, threshold));

        match self.config.host_selection {
            HostSelection::FirstMatch => candidates.next().map(|(idx, _)| idx),
            HostSelection::SmallestArea => {
                let mut best: Option<(usize, f64)> = None;
                for (idx, e) in candidates {
                    let area = e.bbox.area();
                    if best.map_or(true, |(_, best_area)| area < best_area) {
                        best = Some((idx, area));
                    }
                }
                best.map(|(idx, _)| idx)
            }
        }
    }
}

/// Store an embedded equation in its host's slot.
fn attach(host: &mut Element, equation: Element) {
    let slot = match &mut host.content {
        Content::Text(block) | Content::Title(block) => &mut block.equation_inside,
        Content::Table(block) => &mut block.equation_inside,
        Content::Image(block) => {
            block.equations_inside.push(equation);
            return;
        }
        Content::Equation(_) => return,
    };
    if slot.is_some() {
        log::debug!("Containment: host already holds an equation, replacing it");
    }
    *slot = Some(Box::new(equation));
}
