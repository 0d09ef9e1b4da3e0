//! Page rasters.

use image::{imageops, RgbImage};
use std::path::Path;

use crate::error::Result;
use crate::model::{BBox, PixelRect};

/// A rendered page: its number plus an RGB raster.
#[derive(Debug, Clone)]
pub struct PageImage {
    page_number: u32,
    image: RgbImage,
}

impl PageImage {
    pub fn new(page_number: u32, image: RgbImage) -> Self {
        Self { page_number, image }
    }

    /// Load a page raster from an image file.
    pub fn open(page_number: u32, path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path)?.to_rgb8();
        Ok(Self::new(page_number, image))
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel rectangle of a normalized box on this page.
    pub fn pixel_rect(&self, bbox: &BBox) -> PixelRect {
        bbox.to_pixels(self.width(), self.height())
    }

    /// Crop the region covered by a normalized box.
    pub fn crop(&self, bbox: &BBox) -> RgbImage {
        self.crop_rect(self.pixel_rect(bbox))
    }

    /// Crop a pixel rectangle, clamped to the raster.
    pub fn crop_rect(&self, rect: PixelRect) -> RgbImage {
        imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height).to_image()
    }

    /// Pixel rectangle of a box grown by `margin` on every side, clamped to the page.
    pub fn expanded_rect(&self, bbox: &BBox, margin: u32) -> PixelRect {
        let rect = self.pixel_rect(bbox);
        let x = rect.x.saturating_sub(margin);
        let y = rect.y.saturating_sub(margin);
        let x_max = (rect.x + rect.width).saturating_add(margin).min(self.width());
        let y_max = (rect.y + rect.height).saturating_add(margin).min(self.height());
        PixelRect {
            x,
            y,
            width: x_max.saturating_sub(x).max(1),
            height: y_max.saturating_sub(y).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_matches_box() {
        let page = PageImage::new(0, RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
        let bbox = BBox::new(0.25, 0.5, 0.75, 1.0).unwrap();
        let crop = page.crop(&bbox);
        assert_eq!(crop.dimensions(), (100, 50));
    }

    #[test]
    fn test_open_page_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(40, 30, Rgb([10, 20, 30])).save(&path).unwrap();

        let page = PageImage::open(3, &path).unwrap();
        assert_eq!(page.page_number(), 3);
        assert_eq!((page.width(), page.height()), (40, 30));
        assert_eq!(page.image().get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(PageImage::open(0, "/nonexistent/page.png").is_err());
    }

    #[test]
    fn test_expanded_rect_clamps_to_page() {
        let page = PageImage::new(0, RgbImage::new(200, 100));
        let bbox = BBox::new(0.02, 0.5, 0.5, 0.95).unwrap();
        let rect = page.expanded_rect(&bbox, 10);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 40);
        assert_eq!(rect.x + rect.width, 110);
        assert_eq!(rect.y + rect.height, 100);
    }
}
