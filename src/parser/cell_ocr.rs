//! OCR of single table cells.
//!
//! Grid lines and tight crops both confuse text recognizers, so every cell
//! is read through a ladder of white paddings. Each attempt pads the crop,
//! paints detected grid lines out in white, and runs OCR; the first
//! non-empty result wins.

use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

use super::collaborators::{stage_error, TextRecognizer};
use super::options::TableGridConfig;
use crate::error::{Error, Result, Stage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Reads cell text with the padding ladder.
pub struct CellReader<'a> {
    recognizer: &'a dyn TextRecognizer,
    config: &'a TableGridConfig,
}

impl<'a> CellReader<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, config: &'a TableGridConfig) -> Self {
        Self { recognizer, config }
    }

    /// OCR a cropped cell, returning an empty string if every attempt is blank.
    pub fn read(&self, cell: &RgbImage) -> Result<String> {
        for (attempt, &pad) in self.config.padding_ladder.iter().enumerate() {
            let padded = pad_with_white(cell, pad)?;
            let cleaned = remove_table_lines(&padded, self.config);
            let raw = self
                .recognizer
                .recognize(&cleaned)
                .map_err(stage_error(Stage::TextRecognition))?;
            let text = clean_cell_text(&raw);
            if !text.is_empty() {
                log::debug!(
                    "CellReader: read {:?} on attempt {} (pad {})",
                    text,
                    attempt + 1,
                    pad
                );
                return Ok(text);
            }
            log::debug!("CellReader: attempt {} (pad {}) was blank", attempt + 1, pad);
        }
        Ok(String::new())
    }
}

/// Surround an image with `pad` pixels of white on every side.
pub fn pad_with_white(image: &RgbImage, pad: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    let grow = |side: u32| {
        pad.checked_mul(2)
            .and_then(|border| side.checked_add(border))
            .ok_or_else(|| Error::Config(format!("cell padding {} overflows the canvas", pad)))
    };
    let mut padded = RgbImage::from_pixel(grow(width)?, grow(height)?, WHITE);
    imageops::replace(&mut padded, image, pad as i64, pad as i64);
    Ok(padded)
}

/// Paint table grid lines out in white.
///
/// Lines are found with a Hough transform over the inverted grayscale image,
/// so dark strokes vote and white background does not.
pub fn remove_table_lines(image: &RgbImage, config: &TableGridConfig) -> RgbImage {
    let mut inverted: GrayImage = imageops::grayscale(image);
    imageops::invert(&mut inverted);

    let lines = detect_lines(
        &inverted,
        LineDetectionOptions {
            vote_threshold: config.line_vote_threshold,
            suppression_radius: config.line_suppression_radius,
        },
    );

    let mut cleaned = image.clone();
    if !lines.is_empty() {
        log::debug!("CellReader: erasing {} grid lines", lines.len());
    }
    for line in &lines {
        erase_line(&mut cleaned, line, config.line_stroke);
    }
    cleaned
}

/// Draw a polar line across the whole image in white, `stroke` pixels wide.
fn erase_line(image: &mut RgbImage, line: &PolarLine, stroke: u32) {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (a, b) = (theta.cos(), theta.sin());
    let (x0, y0) = (a * line.r, b * line.r);
    let reach = (image.width() + image.height()) as f32;

    let start = (x0 - reach * b, y0 + reach * a);
    let end = (x0 + reach * b, y0 - reach * a);

    // Thick strokes are drawn as parallel one-pixel lines along the normal.
    let half = stroke as f32 / 2.0;
    let steps = stroke.max(1);
    for i in 0..steps {
        let offset = i as f32 - half + 0.5;
        let (dx, dy) = (offset * a, offset * b);
        draw_line_segment_mut(
            image,
            (start.0 + dx, start.1 + dy),
            (end.0 + dx, end.1 + dy),
            WHITE,
        );
    }
}

/// Trim OCR output and drop line breaks.
pub fn clean_cell_text(raw: &str) -> String {
    raw.trim().replace(['\n', '\r'], "")
}
