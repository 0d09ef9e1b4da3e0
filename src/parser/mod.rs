//! Page parsing: from model detections to typed, resolved elements.

pub mod cell_ocr;
pub mod collaborators;
pub mod containment;
pub mod dump;
mod options;
mod page;
mod pipeline;
pub mod table_grid;
pub mod typing;

pub use collaborators::{
    CollaboratorError, CollaboratorResult, CoordinateSpace, Detection, EquationDetection,
    EquationDetector, LatexRecognizer, LayoutDetector, RawBox, StructureBox, StructureLabel,
    TableStructureModel, TextRecognizer,
};
pub use containment::{ContainmentResolver, ResolutionReport};
pub use dump::{assemble, DocumentDump, ElementDump, EquationDump, PageDump};
pub use options::{ContainmentConfig, ErrorMode, HostSelection, ParseOptions, TableGridConfig};
pub use page::PageImage;
pub use pipeline::{encode_png, DocumentParser};
pub use table_grid::{Cell, TableGridReconstructor};
