//! Display-space to pixel-space mapping and crop rectangle arithmetic.

/// A point on the source image's native pixel grid.
///
/// Signed: a pointer dragged past the edge of the rendered image maps to
/// coordinates outside the image. Bounds are enforced at crop time, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Maps a position inside the rendered (scaled) image to the source image's
/// native pixel grid, rounding to the nearest pixel.
///
/// Returns `None` while the image has no laid-out size, so callers never
/// divide by zero before the first layout pass.
pub fn display_to_pixel(
    display_x: f32,
    display_y: f32,
    rendered_width: f32,
    rendered_height: f32,
    pixel_width: u32,
    pixel_height: u32,
) -> Option<PixelPoint> {
    if rendered_width <= 0.0 || rendered_height <= 0.0 {
        return None;
    }
    let x = (display_x as f64 * pixel_width as f64 / rendered_width as f64).round() as i32;
    let y = (display_y as f64 * pixel_height as f64 / rendered_height as f64).round() as i32;
    Some(PixelPoint::new(x, y))
}

/// A selection rectangle in pixel space: min corner plus non-negative extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    /// Canonical rectangle spanned by two drag endpoints, in either order.
    pub fn from_points(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// A click with no movement (or a purely horizontal/vertical drag)
    /// selects nothing.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies fully inside an image of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= image_width as i64
            && self.y as i64 + self.height as i64 <= image_height as i64
    }
}
