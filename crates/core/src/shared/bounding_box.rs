/// An axis-aligned half-open rectangle: `[x0, x1) × [y0, y1)`.
///
/// Detector output arrives in both corner and `(x, y, w, h)` form; the
/// rest of the pipeline only ever sees this normalized representation,
/// with `x1 >= x0` and `y1 >= y0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    /// Builds a box from two corners, swapping coordinates if needed so
    /// the invariant `x1 >= x0, y1 >= y0` holds.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Zero-area boxes carry no face and are dropped before matching.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Clamps the box to `[0, width) × [0, height)` frame bounds.
    pub fn clamp(&self, frame_width: u32, frame_height: u32) -> Self {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        Self {
            x0: self.x0.clamp(0.0, fw),
            y0: self.y0.clamp(0.0, fh),
            x1: self.x1.clamp(0.0, fw),
            y1: self.y1.clamp(0.0, fh),
        }
    }

    /// Intersection over union of two half-open rectangles.
    ///
    /// Returns 0.0 when the rectangles do not overlap, including
    /// degenerate (zero-width or zero-height) intersections.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);

        let inter = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}
