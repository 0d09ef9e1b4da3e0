//! Scripted collaborators and a synthetic page shared by the integration tests.

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use scanmark::parser::{
    CollaboratorResult, Detection, EquationDetection, EquationDetector, LatexRecognizer,
    LayoutDetector, RawBox, StructureBox, TableStructureModel, TextRecognizer,
};
use scanmark::{DocumentParser, PageImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

pub const TITLE: Rgb<u8> = Rgb([200, 0, 0]);
pub const BODY: Rgb<u8> = Rgb([0, 200, 0]);
pub const INLINE_EQ: Rgb<u8> = Rgb([0, 0, 200]);
pub const BLOCK_EQ: Rgb<u8> = Rgb([200, 200, 0]);
pub const CELLS: [Rgb<u8>; 6] = [
    Rgb([10, 20, 30]),
    Rgb([40, 50, 60]),
    Rgb([70, 80, 90]),
    Rgb([100, 110, 120]),
    Rgb([130, 140, 150]),
    Rgb([160, 170, 180]),
];

/// Centers of the six table cells on the page, row-major.
const CELL_CENTERS: [(u32, u32); 6] = [
    (143, 622),
    (250, 622),
    (357, 622),
    (143, 682),
    (250, 682),
    (357, 682),
];

/// A 1000x1000 white page with a small colored marker at the center of every
/// region the recognizers are expected to read.
pub fn synthetic_page(page_number: u32) -> PageImage {
    let mut image = RgbImage::from_pixel(1000, 1000, WHITE);
    mark(&mut image, 500, 75, TITLE);
    mark(&mut image, 500, 300, BODY);
    mark(&mut image, 200, 350, INLINE_EQ);
    mark(&mut image, 500, 500, BLOCK_EQ);
    for (&(x, y), &color) in CELL_CENTERS.iter().zip(CELLS.iter()) {
        mark(&mut image, x, y, color);
    }
    PageImage::new(page_number, image)
}

fn mark(image: &mut RgbImage, cx: u32, cy: u32, color: Rgb<u8>) {
    for y in cy - 3..=cy + 3 {
        for x in cx - 3..=cx + 3 {
            image.put_pixel(x, y, color);
        }
    }
}

/// Title, text, table and figure, top to bottom, in a scrambled order.
pub struct ScriptedLayout;

impl LayoutDetector for ScriptedLayout {
    fn detect(&self, _page: &PageImage) -> CollaboratorResult<Vec<Detection>> {
        Ok(vec![
            Detection::new(RawBox::pixels(100.0, 600.0, 400.0, 700.0), "Table"),
            Detection::new(RawBox::pixels(100.0, 800.0, 900.0, 950.0), "Figure"),
            Detection::new(RawBox::pixels(100.0, 200.0, 900.0, 400.0), "Text"),
            Detection::new(RawBox::pixels(100.0, 50.0, 900.0, 100.0), "Title"),
        ])
    }
}

/// The scripted layout with confidences; the figure is a weak detection.
pub struct ScoredLayout;

impl LayoutDetector for ScoredLayout {
    fn detect(&self, page: &PageImage) -> CollaboratorResult<Vec<Detection>> {
        let detections = ScriptedLayout.detect(page)?;
        Ok(detections
            .into_iter()
            .map(|d| {
                let score = if d.label == "Figure" { 0.2 } else { 0.9 };
                d.with_score(score)
            })
            .collect())
    }
}

/// One equation embedded in the text block and one isolated below it.
pub struct ScriptedEquations;

impl EquationDetector for ScriptedEquations {
    fn detect(&self, _page: &PageImage) -> CollaboratorResult<Vec<EquationDetection>> {
        Ok(vec![
            EquationDetection::embedded(RawBox::pixels(150.0, 320.0, 250.0, 380.0)),
            EquationDetection::isolated(RawBox::pixels(150.0, 450.0, 850.0, 550.0)),
        ])
    }
}

/// Splits any table crop into two rows and three columns.
pub struct TwoByThree;

impl TableStructureModel for TwoByThree {
    fn analyze(&self, table: &RgbImage) -> CollaboratorResult<Vec<StructureBox>> {
        let (w, h) = (table.width() as f64, table.height() as f64);
        Ok(vec![
            StructureBox::row(0.0, 0.0, w, h / 2.0),
            StructureBox::row(0.0, h / 2.0, w, h),
            StructureBox::column(0.0, 0.0, w / 3.0, h),
            StructureBox::column(w / 3.0, 0.0, 2.0 * w / 3.0, h),
            StructureBox::column(2.0 * w / 3.0, 0.0, w, h),
        ])
    }
}

/// Reads the color at the center of the image and looks it up.
#[derive(Clone)]
pub struct MarkerReader {
    labels: Vec<(Rgb<u8>, &'static str)>,
}

impl MarkerReader {
    pub fn text() -> Self {
        Self {
            labels: vec![
                (TITLE, "Intro"),
                (BODY, "Body."),
                (CELLS[0], "A"),
                (CELLS[1], "B"),
                (CELLS[2], "C"),
                (CELLS[3], "1"),
                (CELLS[4], "2"),
                (CELLS[5], "3"),
            ],
        }
    }

    pub fn latex() -> Self {
        Self {
            labels: vec![(INLINE_EQ, "x^2"), (BLOCK_EQ, "E = mc^2")],
        }
    }

    fn read(&self, image: &RgbImage) -> String {
        let center = *image.get_pixel(image.width() / 2, image.height() / 2);
        self.labels
            .iter()
            .find(|(color, _)| *color == center)
            .map(|(_, label)| label.to_string())
            .unwrap_or_default()
    }
}

impl TextRecognizer for MarkerReader {
    fn recognize(&self, image: &RgbImage) -> CollaboratorResult<String> {
        Ok(self.read(image))
    }
}

impl LatexRecognizer for MarkerReader {
    fn recognize(&self, image: &RgbImage) -> CollaboratorResult<String> {
        Ok(self.read(image))
    }
}

/// A LaTeX model that is down.
pub struct BrokenLatex;

impl LatexRecognizer for BrokenLatex {
    fn recognize(&self, _image: &RgbImage) -> CollaboratorResult<String> {
        Err("latex model unavailable".into())
    }
}

pub fn scripted_parser() -> DocumentParser {
    DocumentParser::new(
        ScriptedLayout,
        ScriptedEquations,
        TwoByThree,
        MarkerReader::text(),
        MarkerReader::latex(),
    )
}

pub const EXPECTED_MARKDOWN: &str = "## Intro\n\nBody.\n\n$$\nE = mc^2\n$$\n\n\
| A | B | C |\n| --- | --- | --- |\n| 1 | 2 | 3 |\n\n\
\n![image](img_0_0.png)\n\n";
