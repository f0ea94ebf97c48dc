/// Pixel markup on source images
///
/// The close-up action sends the source with an orange rectangle drawn
/// around the region of interest. Inpainting masks are rasterised here
/// from a lasso polygon or from brush strokes. Shapes are given in percent
/// of the image size so they are independent of the display scale.

use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use std::io::Cursor;

use super::data::SourceImage;
use super::edit::BrushStroke;
use crate::error::Result;

const MARKER_COLOR: Rgba<u8> = Rgba([255, 140, 0, 255]);

/// A rectangle in percent of the image size, `0..=100` on both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    /// Build a region from two corners, in any order
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let x = a.0.min(b.0).clamp(0.0, 100.0);
        let y = a.1.min(b.1).clamp(0.0, 100.0);
        Self {
            x,
            y,
            width: (a.0.max(b.0).clamp(0.0, 100.0) - x),
            height: (a.1.max(b.1).clamp(0.0, 100.0) - y),
        }
    }

    /// Ignore accidental clicks
    pub fn is_meaningful(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }

    /// Pixel bounds `(x0, y0, x1, y1)`, exclusive end, inside the image
    fn pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let px = |pct: f32, size: u32| ((pct / 100.0 * size as f32).round() as u32).min(size);
        let x0 = px(self.x, width);
        let y0 = px(self.y, height);
        let x1 = px(self.x + self.width, width).max(x0 + 1).min(width);
        let y1 = px(self.y + self.height, height).max(y0 + 1).min(height);
        (x0, y0, x1, y1)
    }
}

fn encode_png(buffer: impl FnOnce(&mut Cursor<Vec<u8>>) -> image::ImageResult<()>) -> Result<SourceImage> {
    let mut out = Cursor::new(Vec::new());
    buffer(&mut out)?;
    Ok(SourceImage::from_bytes(&out.into_inner())?)
}

/// Copy of `image` with an orange frame around `region`
pub fn mark_area(image: &SourceImage, region: Region) -> Result<SourceImage> {
    let mut canvas: RgbaImage = image::load_from_memory(&image.decode()?)?.to_rgba8();
    let (width, height) = canvas.dimensions();
    let (x0, y0, x1, y1) = region.pixels(width, height);
    let thickness = (width.max(height) / 200).max(2);

    for y in y0..y1 {
        for x in x0..x1 {
            let near_edge = x < x0 + thickness
                || x + thickness >= x1
                || y < y0 + thickness
                || y + thickness >= y1;
            if near_edge {
                canvas.put_pixel(x, y, MARKER_COLOR);
            }
        }
    }
    encode_png(|out| canvas.write_to(out, ImageFormat::Png))
}

/// Size of the decoded image in pixels
fn pixel_size(image: &SourceImage) -> Result<(u32, u32)> {
    let decoded = image::load_from_memory(&image.decode()?)?;
    Ok((decoded.width(), decoded.height()))
}

fn to_pixels(points: &[(f32, f32)], width: u32, height: u32) -> Vec<(f32, f32)> {
    points
        .iter()
        .map(|(x, y)| (x / 100.0 * width as f32, y / 100.0 * height as f32))
        .collect()
}

/// Even-odd test of a point against a closed polygon
fn polygon_contains(polygon: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, &(xi, yi)) in polygon.iter().enumerate() {
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Black mask the size of `image`, white inside the closed `polygon`
///
/// Vertices are in percent of the image size. Fewer than three vertices
/// give an all-black mask.
pub fn polygon_mask(image: &SourceImage, polygon: &[(f32, f32)]) -> Result<SourceImage> {
    let (width, height) = pixel_size(image)?;
    let mask = if polygon.len() < 3 {
        GrayImage::new(width, height)
    } else {
        let polygon = to_pixels(polygon, width, height);
        GrayImage::from_fn(width, height, |x, y| {
            let inside = polygon_contains(&polygon, x as f32 + 0.5, y as f32 + 0.5);
            Luma([if inside { 255 } else { 0 }])
        })
    };
    encode_png(|out| mask.write_to(out, ImageFormat::Png))
}

/// Paint a filled disc
fn stamp(mask: &mut GrayImage, (cx, cy): (f32, f32), radius: f32) {
    let (width, height) = mask.dimensions();
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width);
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
}

/// Black mask the size of `image` with every stroke painted white
///
/// Each stroke is a chain of discs of its brush diameter, spaced closely
/// enough along every segment to leave no gaps.
pub fn stroke_mask(image: &SourceImage, strokes: &[BrushStroke]) -> Result<SourceImage> {
    let (width, height) = pixel_size(image)?;
    let mut mask = GrayImage::new(width, height);

    for stroke in strokes {
        let radius = (stroke.size as f32 / 2.0).max(0.5);
        let spacing = (radius / 2.0).max(0.5);
        let points = to_pixels(&stroke.points, width, height);

        if let Some(&first) = points.first() {
            stamp(&mut mask, first, radius);
        }
        for pair in points.windows(2) {
            let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
            let length = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
            let steps = (length / spacing).ceil().max(1.0) as u32;
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                stamp(&mut mask, (ax + (bx - ax) * t, ay + (by - ay) * t), radius);
            }
        }
    }
    encode_png(|out| mask.write_to(out, ImageFormat::Png))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_source(width: u32, height: u32) -> SourceImage {
        let img = RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        SourceImage::from_bytes(&out.into_inner()).unwrap()
    }

    fn decode(image: &SourceImage) -> image::DynamicImage {
        image::load_from_memory(&image.decode().unwrap()).unwrap()
    }

    #[test]
    fn test_region_from_any_corners() {
        let region = Region::from_corners((80.0, 10.0), (20.0, 60.0));
        assert_eq!(region, Region { x: 20.0, y: 10.0, width: 60.0, height: 50.0 });
        assert!(!Region::from_corners((5.0, 5.0), (5.2, 30.0)).is_meaningful());
    }

    #[test]
    fn test_mark_area_draws_frame_only() {
        let source = gray_source(100, 100);
        let marked = decode(&mark_area(&source, Region::from_corners((20.0, 20.0), (80.0, 80.0))).unwrap()).to_rgba8();

        assert_eq!(*marked.get_pixel(20, 50), MARKER_COLOR);
        assert_eq!(*marked.get_pixel(50, 50), Rgba([90, 90, 90, 255]));
        assert_eq!(*marked.get_pixel(5, 5), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_polygon_mask_fills_inside_only() {
        let source = gray_source(40, 20);
        let triangle = [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)];
        let mask = decode(&polygon_mask(&source, &triangle).unwrap()).to_luma8();

        assert_eq!(mask.dimensions(), (40, 20));
        assert_eq!(mask.get_pixel(2, 2).0, [255]);
        assert_eq!(mask.get_pixel(37, 18).0, [0]);
    }

    #[test]
    fn test_degenerate_polygon_masks_nothing() {
        let source = gray_source(10, 10);
        let mask = decode(&polygon_mask(&source, &[(0.0, 0.0), (100.0, 100.0)]).unwrap()).to_luma8();
        assert!(mask.pixels().all(|p| p.0 == [0]));
    }

    #[test]
    fn test_stroke_mask_paints_brush_width() {
        let source = gray_source(100, 100);
        let stroke = BrushStroke {
            points: vec![(10.0, 50.0), (90.0, 50.0)],
            size: 10,
        };
        let mask = decode(&stroke_mask(&source, &[stroke]).unwrap()).to_luma8();

        // Continuous along the segment, about five pixels either side
        assert!((10..90).all(|x| mask.get_pixel(x, 50).0 == [255]));
        assert_eq!(mask.get_pixel(50, 53).0, [255]);
        assert_eq!(mask.get_pixel(50, 58).0, [0]);
        assert_eq!(mask.get_pixel(50, 10).0, [0]);
    }

    #[test]
    fn test_single_click_stroke_is_a_dot() {
        let source = gray_source(50, 50);
        let dot = BrushStroke { points: vec![(50.0, 50.0)], size: 6 };
        let mask = decode(&stroke_mask(&source, &[dot]).unwrap()).to_luma8();

        assert_eq!(mask.get_pixel(25, 25).0, [255]);
        assert_eq!(mask.get_pixel(25, 31).0, [0]);
    }
}
