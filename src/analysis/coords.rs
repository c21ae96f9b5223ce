//! Relative-to-pixel coordinate mapping.
//!
//! One mapping routine is shared by the line profiler and the region
//! selector so the two can never disagree about where a relative
//! coordinate lands on the pixel grid.

/// Vertical axis convention: where relative coordinate `v = 0` lands.
///
/// `TopLeft` is the default: `v = 0` maps to image row 0, the top row,
/// matching the array layout the FITS decoder produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    TopLeft,
    BottomLeft,
}

/// A position expressed as fractions of image width and height.
///
/// `u` and `v` are nominally in `[0, 1]`; out-of-range values are mapped
/// by linear extrapolation, never clamped, so slightly-outside diagnostic
/// lines stay meaningful.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativePoint {
    pub u: f64,
    pub v: f64,
}

impl RelativePoint {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// A pixel-space position. Not necessarily integral, not necessarily
/// inside `[0, width-1] x [0, height-1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Converts relative coordinates into pixel coordinates for a given
/// image shape, under a fixed [`Orientation`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateMapper {
    orientation: Orientation,
}

impl CoordinateMapper {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    /// Map a relative point onto the pixel extent of an `height x width`
    /// grid: `x = u * (width - 1)`, `y = v * (height - 1)`, inclusive of
    /// both edge pixels. `BottomLeft` flips the vertical coordinate.
    pub fn to_pixel(&self, point: RelativePoint, height: usize, width: usize) -> PixelPoint {
        let x = point.u * (width - 1) as f64;
        let y = point.v * (height - 1) as f64;
        let y = match self.orientation {
            Orientation::TopLeft => y,
            Orientation::BottomLeft => (height - 1) as f64 - y,
        };
        PixelPoint { x, y }
    }

    /// Map a start/end pair in one call.
    pub fn map_line(
        &self,
        start: RelativePoint,
        end: RelativePoint,
        height: usize,
        width: usize,
    ) -> (PixelPoint, PixelPoint) {
        (
            self.to_pixel(start, height, width),
            self.to_pixel(end, height, width),
        )
    }
}
