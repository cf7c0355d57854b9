//! Display geometry: fitting an image into the canvas and mapping points
//! between canvas space and image pixel space.
//!
//! The image is scaled uniformly so that it fits entirely inside the canvas
//! and is centered on the leftover axis (letterboxing).
//!
//! # Coordinate Systems
//!
//! - Canvas space: logical display pixels, origin at the canvas top-left,
//!   fractional values allowed.
//! - Image space: integer pixel indices, origin at the image top-left.
//!   Translated points may fall outside the image; clamping is left to the
//!   region builders.

/// A point in canvas (display) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A pixel position in the source image. May lie outside the image bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImagePoint {
    pub x: i64,
    pub y: i64,
}

impl ImagePoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas coordinates, `min` top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub min: CanvasPoint,
    pub max: CanvasPoint,
}

impl CanvasRect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Canvas and image sizes the projection is derived from.
///
/// Never stored across frames; rebuilt whenever the canvas is resized or a
/// new image is loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub image_width: u32,
    pub image_height: u32,
}

impl DisplayGeometry {
    pub fn new(canvas_width: f32, canvas_height: f32, image_width: u32, image_height: u32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            image_width,
            image_height,
        }
    }

    /// Compute the scale and centering offsets for this geometry.
    ///
    /// Returns `None` when there is nothing to display: a zero, negative or
    /// non-finite canvas dimension, or an empty image. Callers must neither
    /// render nor translate points in that state.
    pub fn projection(&self) -> Option<Projection> {
        let canvas_w = f64::from(self.canvas_width);
        let canvas_h = f64::from(self.canvas_height);
        if !(canvas_w.is_finite() && canvas_h.is_finite()) || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return None;
        }
        if self.image_width == 0 || self.image_height == 0 {
            return None;
        }

        let image_w = f64::from(self.image_width);
        let image_h = f64::from(self.image_height);

        // Fit the whole image: letterbox on the shorter axis
        let scale = (canvas_w / image_w).min(canvas_h / image_h);

        Some(Projection {
            scale,
            offset_x: ((canvas_w - image_w * scale) / 2.0).max(0.0),
            offset_y: ((canvas_h - image_h * scale) / 2.0).max(0.0),
        })
    }
}

/// Uniform scale plus centering offsets for a valid [`DisplayGeometry`].
///
/// Holding a `Projection` means the scale is defined, so both translation
/// directions are always safe to call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Projection {
    /// Map a canvas point to an image pixel index.
    ///
    /// Fractions are truncated toward zero, so anything within one pixel
    /// outside the top or left edge still maps to row or column 0.
    pub fn to_image_space(&self, point: CanvasPoint) -> ImagePoint {
        let x = (f64::from(point.x) - self.offset_x) / self.scale;
        let y = (f64::from(point.y) - self.offset_y) / self.scale;
        ImagePoint::new(x.trunc() as i64, y.trunc() as i64)
    }

    /// Map an image pixel position to its top-left corner on the canvas.
    pub fn to_canvas_space(&self, point: ImagePoint) -> CanvasPoint {
        CanvasPoint::new(
            (point.x as f64 * self.scale + self.offset_x) as f32,
            (point.y as f64 * self.scale + self.offset_y) as f32,
        )
    }

    /// Size of `len` image pixels on the canvas.
    pub fn scaled(&self, len: u32) -> f32 {
        (f64::from(len) * self.scale) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_wide_image_in_square_canvas() {
        let p = DisplayGeometry::new(800.0, 800.0, 1000, 500)
            .projection()
            .unwrap();
        assert!(approx(p.scale, 0.8));
        assert!(approx(p.offset_x, 0.0));
        assert!(approx(p.offset_y, 200.0));
    }

    #[test]
    fn test_tall_image_letterboxes_horizontally() {
        let p = DisplayGeometry::new(800.0, 600.0, 300, 600)
            .projection()
            .unwrap();
        assert!(approx(p.scale, 1.0));
        assert!(approx(p.offset_x, 250.0));
        assert!(approx(p.offset_y, 0.0));
    }

    #[test]
    fn test_same_aspect_has_no_offsets() {
        let p = DisplayGeometry::new(400.0, 300.0, 800, 600)
            .projection()
            .unwrap();
        assert!(approx(p.scale, 0.5));
        assert!(approx(p.offset_x, 0.0));
        assert!(approx(p.offset_y, 0.0));
    }

    #[test]
    fn test_upscales_small_images() {
        let p = DisplayGeometry::new(800.0, 600.0, 100, 100)
            .projection()
            .unwrap();
        assert!(approx(p.scale, 6.0));
        assert!(approx(p.offset_x, 100.0));
    }

    #[test]
    fn test_no_projection_for_empty_canvas() {
        assert!(DisplayGeometry::new(0.0, 600.0, 100, 100).projection().is_none());
        assert!(DisplayGeometry::new(800.0, 0.0, 100, 100).projection().is_none());
        assert!(DisplayGeometry::new(-5.0, 600.0, 100, 100).projection().is_none());
        assert!(DisplayGeometry::new(f32::NAN, 600.0, 100, 100).projection().is_none());
    }

    #[test]
    fn test_no_projection_for_empty_image() {
        assert!(DisplayGeometry::new(800.0, 600.0, 0, 100).projection().is_none());
    }

    #[test]
    fn test_to_image_space_applies_offset_and_scale() {
        let p = DisplayGeometry::new(500.0, 500.0, 1000, 500)
            .projection()
            .unwrap();
        assert_eq!(p.to_image_space(CanvasPoint::new(250.0, 250.0)), ImagePoint::new(500, 250));
        assert_eq!(p.to_image_space(CanvasPoint::new(0.0, 125.0)), ImagePoint::new(0, 0));
        assert_eq!(p.to_image_space(CanvasPoint::new(0.75, 125.75)), ImagePoint::new(1, 1));
    }

    #[test]
    fn test_to_image_space_truncates_toward_zero() {
        let p = DisplayGeometry::new(500.0, 500.0, 1000, 500)
            .projection()
            .unwrap();
        // Less than one image pixel above the image is still row 0
        assert_eq!(p.to_image_space(CanvasPoint::new(0.0, 124.75)).y, 0);
        assert_eq!(p.to_image_space(CanvasPoint::new(0.0, 124.5)).y, -1);
        assert_eq!(p.to_image_space(CanvasPoint::new(0.0, 124.0)).y, -2);
        assert_eq!(p.to_image_space(CanvasPoint::new(0.0, 0.0)).y, -250);
    }

    #[test]
    fn test_to_canvas_space() {
        let p = DisplayGeometry::new(500.0, 500.0, 1000, 500)
            .projection()
            .unwrap();
        assert_eq!(p.to_canvas_space(ImagePoint::new(1000, 500)), CanvasPoint::new(500.0, 375.0));
        assert_eq!(p.to_canvas_space(ImagePoint::new(0, 0)), CanvasPoint::new(0.0, 125.0));
        assert_eq!(p.scaled(40), 20.0);
    }
}
