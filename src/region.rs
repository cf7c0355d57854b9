//! Crop region construction.
//!
//! Turns pointer input (a click plus a fixed size, or the two ends of a drag)
//! into a rectangle of image pixels, clamped to the image bounds.
//!
//! Builders return `None` instead of a zero-area rectangle, so every
//! [`CropRectangle`] in circulation can be cropped.

use crate::error::{CropError, Result};
use crate::geometry::{CanvasPoint, CanvasRect, ImagePoint, Projection};

/// A non-empty rectangle of image pixels, right/bottom exclusive.
///
/// Holds `0 <= left < right <= width` and `0 <= top < bottom <= height` for
/// the image it was built against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CropRectangle {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl CropRectangle {
    /// Build a rectangle from edges already inside `[0, width] x [0, height]`.
    ///
    /// Returns `None` if the rectangle would be empty.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        (left < right && top < bottom).then_some(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Clamp each edge into the image independently, then build.
    fn clamped(
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let clamp_x = |v: i64| v.clamp(0, i64::from(image_width)) as u32;
        let clamp_y = |v: i64| v.clamp(0, i64::from(image_height)) as u32;
        Self::new(clamp_x(left), clamp_y(top), clamp_x(right), clamp_y(bottom))
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// The same rectangle in canvas coordinates, for drawing.
    pub fn to_canvas(&self, projection: &Projection) -> CanvasRect {
        CanvasRect {
            min: projection.to_canvas_space(ImagePoint::new(self.left.into(), self.top.into())),
            max: projection.to_canvas_space(ImagePoint::new(self.right.into(), self.bottom.into())),
        }
    }
}

/// A rectangle of `size` pixels centered on the clicked pixel.
///
/// Both sides use `size / 2` (integer division), so odd sizes lose their
/// remainder and `size == 1` yields nothing. Near an edge the rectangle is
/// clipped, not shifted back inside the image.
pub fn fixed_size_click(
    center: CanvasPoint,
    size: u32,
    projection: &Projection,
    image_width: u32,
    image_height: u32,
) -> Option<CropRectangle> {
    if size == 0 {
        return None;
    }
    let c = projection.to_image_space(center);
    let half = i64::from(size / 2);

    CropRectangle::clamped(
        c.x - half,
        c.y - half,
        c.x + half,
        c.y + half,
        image_width,
        image_height,
    )
}

/// The rectangle spanned by two drag endpoints, in either order.
pub fn freehand_drag(
    start: CanvasPoint,
    end: CanvasPoint,
    projection: &Projection,
    image_width: u32,
    image_height: u32,
) -> Option<CropRectangle> {
    let a = projection.to_image_space(start);
    let b = projection.to_image_space(end);

    CropRectangle::clamped(
        a.x.min(b.x),
        a.y.min(b.y),
        a.x.max(b.x),
        a.y.max(b.y),
        image_width,
        image_height,
    )
}

/// Parse crop size text as typed by the user.
///
/// Accepts only a positive whole number (surrounding whitespace is ignored).
pub fn parse_crop_size(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let invalid = || CropError::InvalidSize {
        input: input.to_string(),
    };

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match trimmed.parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(size) => Ok(size),
    }
}
