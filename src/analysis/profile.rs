//! Intensity profiles sampled along a line segment.

use crate::analysis::coords::{CoordinateMapper, PixelPoint, RelativePoint};
use crate::error::AppError;
use ndarray::ArrayView2;

/// Fill value for samples that fall outside the valid pixel index range.
/// Out-of-bounds positions are reported with this constant rather than
/// clamped or rejected, so a diagnostic line may run off the image edge.
pub const OUT_OF_BOUNDS_FILL: f64 = -1.0;

/// Compute the intensity profile between two relative points.
///
/// The mapper resolves pixel coordinates, then the line is sampled with
/// [`sample_line`]. The returned sequence runs start to end inclusive.
pub fn compute_profile(
    image: &ArrayView2<'_, f64>,
    start: RelativePoint,
    end: RelativePoint,
    mapper: &CoordinateMapper,
) -> Result<Vec<f64>, AppError> {
    let (height, width) = image.dim();
    if height == 0 || width == 0 {
        return Err(AppError::InvalidGeometry(
            "image has a zero-size dimension".to_string(),
        ));
    }

    let (p0, p1) = mapper.map_line(start, end, height, width);
    sample_line(image, p0, p1)
}

/// Sample intensity values along the straight line from `p0` to `p1`.
///
/// The number of samples is `ceil(length) + 1` (at least 2, so a
/// zero-length segment still yields both endpoints). Each sample is
/// bilinearly interpolated from the four nearest grid cells; samples
/// outside the grid are assigned [`OUT_OF_BOUNDS_FILL`].
pub fn sample_line(
    image: &ArrayView2<'_, f64>,
    p0: PixelPoint,
    p1: PixelPoint,
) -> Result<Vec<f64>, AppError> {
    let (height, width) = image.dim();
    if height == 0 || width == 0 {
        return Err(AppError::InvalidGeometry(
            "image has a zero-size dimension".to_string(),
        ));
    }

    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let length = (dx * dx + dy * dy).sqrt();
    let num_samples = ((length.ceil() as usize) + 1).max(2);

    let mut profile = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / (num_samples - 1) as f64;
        let x = p0.x + t * dx;
        let y = p0.y + t * dy;
        profile.push(sample_bilinear(image, x, y));
    }

    Ok(profile)
}

/// Bilinear interpolation at a fractional pixel position, with the
/// sentinel policy for positions outside `[0, width-1] x [0, height-1]`.
fn sample_bilinear(image: &ArrayView2<'_, f64>, x: f64, y: f64) -> f64 {
    let (height, width) = image.dim();

    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return OUT_OF_BOUNDS_FILL;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    // At the exact upper edge the off-grid neighbor has zero weight;
    // clamp its index so the lookup stays valid.
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let top = image[[y0, x0]] * (1.0 - fx) + image[[y0, x1]] * fx;
    let bottom = image[[y1, x0]] * (1.0 - fx) + image[[y1, x1]] * fx;

    top * (1.0 - fy) + bottom * fy
}
