//! Table grid reconstruction from row and column boxes.
//!
//! The table-structure model only reports row and column bands. Cells are
//! recovered by intersecting every row with every column, regrouped into
//! rows by vertical proximity, read one by one with [`CellReader`], and
//! assembled into a [`Table`] whose first row is the header.

use super::cell_ocr::CellReader;
use super::collaborators::{stage_error, StructureBox, StructureLabel, TableStructureModel, TextRecognizer};
use super::options::TableGridConfig;
use super::page::PageImage;
use crate::error::{Result, Stage};
use crate::model::{BBox, PixelRect, Table};

/// A table cell in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Cell {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Integer pixel rectangle on a `width` x `height` raster, if any of the
    /// cell lies on it.
    pub fn to_rect(&self, width: u32, height: u32) -> Option<PixelRect> {
        let (w, h) = (width as f64, height as f64);
        let x0 = self.x_min.floor().clamp(0.0, w) as u32;
        let y0 = self.y_min.floor().clamp(0.0, h) as u32;
        let x1 = self.x_max.ceil().clamp(0.0, w) as u32;
        let y1 = self.y_max.ceil().clamp(0.0, h) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Intersect every row box with every column box.
///
/// Every structure box's bottom edge is first extended by `bottom_extension`
/// pixels. Pairs without a positive-area overlap yield no cell. Cells are
/// translated by `(offset_x, offset_y)`, the crop origin on the page.
pub fn synthesize_cells(
    structure: &[StructureBox],
    offset_x: f64,
    offset_y: f64,
    bottom_extension: f64,
) -> Vec<Cell> {
    let extend = |b: &StructureBox| StructureBox {
        y_max: b.y_max + bottom_extension,
        ..*b
    };
    let rows: Vec<StructureBox> = structure
        .iter()
        .filter(|b| b.label == StructureLabel::Row)
        .map(extend)
        .collect();
    let columns: Vec<StructureBox> = structure
        .iter()
        .filter(|b| b.label == StructureLabel::Column)
        .map(extend)
        .collect();

    let mut cells = Vec::with_capacity(rows.len() * columns.len());
    for row in &rows {
        for column in &columns {
            let x_min = row.x_min.max(column.x_min);
            let y_min = row.y_min.max(column.y_min);
            let x_max = row.x_max.min(column.x_max);
            let y_max = row.y_max.min(column.y_max);

            if x_min < x_max && y_min < y_max {
                cells.push(Cell {
                    x_min: offset_x + x_min,
                    y_min: offset_y + y_min,
                    x_max: offset_x + x_max,
                    y_max: offset_y + y_max,
                });
            }
        }
    }

    log::debug!(
        "TableGrid: {} rows x {} columns -> {} cells",
        rows.len(),
        columns.len(),
        cells.len()
    );
    cells
}

/// Group cells into rows by vertical proximity.
///
/// Cells are sorted by `y_min`; a new row starts whenever a cell's `y_min`
/// differs from the previous cell's by more than `threshold_percentage`
/// times the mean cell height. Each row is then sorted by `x_min`.
pub fn cluster_rows(mut cells: Vec<Cell>, threshold_percentage: f64) -> Vec<Vec<Cell>> {
    if cells.is_empty() {
        return Vec::new();
    }

    cells.sort_by(|a, b| a.y_min.total_cmp(&b.y_min));
    let avg_height = cells.iter().map(Cell::height).sum::<f64>() / cells.len() as f64;
    let threshold = threshold_percentage * avg_height;

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut last_y_min: Option<f64> = None;
    for cell in cells {
        match (last_y_min, rows.last_mut()) {
            (Some(last), Some(row)) if (cell.y_min - last).abs() <= threshold => row.push(cell),
            _ => rows.push(vec![cell]),
        }
        last_y_min = Some(cell.y_min);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
    }

    log::debug!(
        "TableGrid: clustered into {} row groups (threshold {:.2}px)",
        rows.len(),
        threshold
    );
    rows
}

/// Build a table from row-major cell texts; the first row is the header.
///
/// Data rows are padded or truncated to the header width.
pub fn assemble_table(rows: Vec<Vec<String>>) -> Table {
    let table = Table::from_rows(rows);
    if table.is_empty() {
        log::warn!("TableGrid: no cells found, table is empty");
    }
    table
}

/// Reconstructs tables from page regions.
pub struct TableGridReconstructor<'a> {
    structure: &'a dyn TableStructureModel,
    recognizer: &'a dyn TextRecognizer,
    config: &'a TableGridConfig,
}

impl<'a> TableGridReconstructor<'a> {
    pub fn new(
        structure: &'a dyn TableStructureModel,
        recognizer: &'a dyn TextRecognizer,
        config: &'a TableGridConfig,
    ) -> Self {
        Self {
            structure,
            recognizer,
            config,
        }
    }

    /// Reconstruct the table covering `bbox` on `page`.
    ///
    /// A structure model that finds no rows or no columns yields an empty
    /// table, not an error.
    pub fn reconstruct(&self, page: &PageImage, bbox: &BBox) -> Result<Table> {
        let crop_rect = page.expanded_rect(bbox, self.config.expansion_margin);
        let crop = page.crop_rect(crop_rect);

        let structure = self
            .structure
            .analyze(&crop)
            .map_err(stage_error(Stage::TableStructure))?;

        let cells = synthesize_cells(
            &structure,
            crop_rect.x as f64,
            crop_rect.y as f64,
            self.config.row_bottom_extension,
        );
        let groups = cluster_rows(cells, self.config.row_threshold_percentage);

        let reader = CellReader::new(self.recognizer, self.config);
        let mut rows = Vec::with_capacity(groups.len());
        for group in &groups {
            let mut texts = Vec::with_capacity(group.len());
            for cell in group {
                let text = match cell.to_rect(page.width(), page.height()) {
                    Some(rect) => reader.read(&page.crop_rect(rect))?,
                    None => String::new(),
                };
                texts.push(text);
            }
            rows.push(texts);
        }

        Ok(assemble_table(rows))
    }
}
