//! Rectangular sub-region extraction and region statistics.

use crate::analysis::coords::{CoordinateMapper, RelativePoint};
use crate::error::AppError;
use ndarray::{s, Array2, ArrayView2};
use serde::Serialize;

/// Extract the rectangular sub-array bounded by two opposite corners
/// given in relative coordinates.
///
/// Corner coordinates go through the same [`CoordinateMapper`] as the
/// line profiler, so the two subsystems share one pixel convention.
/// Boundary indices round half away from zero (`f64::round`), and the
/// upper pixel is included, so corners `(0,0)`-`(1,1)` reproduce the
/// source image exactly.
pub fn extract_region(
    image: &ArrayView2<'_, f64>,
    corner0: RelativePoint,
    corner1: RelativePoint,
    mapper: &CoordinateMapper,
) -> Result<Array2<f64>, AppError> {
    let (height, width) = image.dim();
    if height == 0 || width == 0 {
        return Err(AppError::InvalidGeometry(
            "image has a zero-size dimension".to_string(),
        ));
    }

    let p0 = mapper.to_pixel(corner0, height, width);
    let p1 = mapper.to_pixel(corner1, height, width);

    let x_lo = clamp_index(p0.x.min(p1.x), width);
    let x_hi = clamp_index(p0.x.max(p1.x), width);
    let y_lo = clamp_index(p0.y.min(p1.y), height);
    let y_hi = clamp_index(p0.y.max(p1.y), height);

    if x_lo == x_hi || y_lo == y_hi {
        return Err(AppError::InvalidGeometry(format!(
            "sub-region corners collapse to a single {} after rounding",
            if x_lo == x_hi { "column" } else { "row" }
        )));
    }

    Ok(image.slice(s![y_lo..y_hi + 1, x_lo..x_hi + 1]).to_owned())
}

/// Round half away from zero and clamp into the valid index range.
fn clamp_index(coord: f64, len: usize) -> usize {
    let rounded = coord.round();
    rounded.clamp(0.0, (len - 1) as f64) as usize
}

/// Named scalar statistics over a set of pixel values.
#[derive(Clone, Debug, Serialize)]
pub struct RegionStats {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub median_abs_deviation: f64,
}

/// Compute [`RegionStats`] over every pixel of `values`.
///
/// `std` is the population standard deviation; the median absolute
/// deviation is unscaled, matching PixInsight's MAD readout. `mode` is
/// the most frequent exact value, smallest value winning ties.
pub fn compute_region_stats(values: &ArrayView2<'_, f64>) -> Result<RegionStats, AppError> {
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    if sorted.is_empty() {
        return Err(AppError::InvalidGeometry(
            "cannot compute statistics over an empty region".to_string(),
        ));
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let median = median_of_sorted(&sorted);
    let std = (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

    let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - median).abs()).collect();
    deviations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_abs_deviation = median_of_sorted(&deviations);

    Ok(RegionStats {
        mean,
        median,
        mode: mode_of_sorted(&sorted),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std,
        median_abs_deviation,
    })
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Longest run of equal values in sorted data; the first (smallest)
/// value wins ties.
fn mode_of_sorted(sorted: &[f64]) -> f64 {
    let mut mode = sorted[0];
    let mut best_count = 0usize;
    let mut run_value = sorted[0];
    let mut run_count = 0usize;

    for &v in sorted {
        if v == run_value {
            run_count += 1;
        } else {
            run_value = v;
            run_count = 1;
        }
        if run_count > best_count {
            best_count = run_count;
            mode = run_value;
        }
    }

    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_image(height: usize, width: usize) -> Array2<f64> {
        Array2::from_shape_fn((height, width), |(row, col)| (row * width + col) as f64)
    }

    #[test]
    fn full_region_reproduces_source_image() {
        let image = ramp_image(5, 8);
        let region = extract_region(
            &image.view(),
            RelativePoint::new(0.0, 0.0),
            RelativePoint::new(1.0, 1.0),
            &CoordinateMapper::default(),
        )
        .unwrap();

        assert_eq!(region, image);
    }

    #[test]
    fn selector_bounds_agree_with_mapper_pixels() {
        // On a 9x9 grid, (0.25, 0.25)-(0.75, 0.75) maps to pixels 2 and 6;
        // the slice must cover exactly rows/cols 2..=6.
        let image = ramp_image(9, 9);
        let mapper = CoordinateMapper::default();

        let p_lo = mapper.to_pixel(RelativePoint::new(0.25, 0.25), 9, 9);
        let p_hi = mapper.to_pixel(RelativePoint::new(0.75, 0.75), 9, 9);
        assert_eq!((p_lo.x.round(), p_lo.y.round()), (2.0, 2.0));
        assert_eq!((p_hi.x.round(), p_hi.y.round()), (6.0, 6.0));

        let region = extract_region(
            &image.view(),
            RelativePoint::new(0.25, 0.25),
            RelativePoint::new(0.75, 0.75),
            &mapper,
        )
        .unwrap();

        assert_eq!(region.dim(), (5, 5));
        assert_eq!(region[[0, 0]], image[[2, 2]]);
        assert_eq!(region[[4, 4]], image[[6, 6]]);
    }

    #[test]
    fn swapped_corners_select_the_same_region() {
        let image = ramp_image(9, 9);
        let mapper = CoordinateMapper::default();

        let a = extract_region(
            &image.view(),
            RelativePoint::new(0.25, 0.75),
            RelativePoint::new(0.75, 0.25),
            &mapper,
        )
        .unwrap();
        let b = extract_region(
            &image.view(),
            RelativePoint::new(0.75, 0.25),
            RelativePoint::new(0.25, 0.75),
            &mapper,
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn collapsed_corners_are_invalid_geometry() {
        let image = ramp_image(9, 9);
        let result = extract_region(
            &image.view(),
            RelativePoint::new(0.5, 0.0),
            RelativePoint::new(0.5, 1.0),
            &CoordinateMapper::default(),
        );

        assert!(matches!(result, Err(AppError::InvalidGeometry(_))));
    }

    #[test]
    fn stats_on_known_values() {
        let image = Array2::from_shape_vec((1, 5), vec![1.0, 2.0, 2.0, 3.0, 4.0]).unwrap();
        let stats = compute_region_stats(&image.view()).unwrap();

        assert_relative_eq!(stats.mean, 2.4);
        assert_relative_eq!(stats.median, 2.0);
        assert_relative_eq!(stats.mode, 2.0);
        assert_relative_eq!(stats.min, 1.0);
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.std, 1.04_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.median_abs_deviation, 1.0);
    }

    #[test]
    fn even_length_median_averages_middle_values() {
        let image = Array2::from_shape_vec((2, 2), vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        let stats = compute_region_stats(&image.view()).unwrap();

        assert_relative_eq!(stats.median, 2.5);
    }

    #[test]
    fn mode_tie_prefers_smallest_value() {
        let image = Array2::from_shape_vec((1, 5), vec![3.0, 1.0, 2.0, 1.0, 2.0]).unwrap();
        let stats = compute_region_stats(&image.view()).unwrap();

        assert_relative_eq!(stats.mode, 1.0);
    }

    #[test]
    fn empty_region_is_invalid_geometry() {
        let image = Array2::<f64>::zeros((0, 0));
        assert!(matches!(
            compute_region_stats(&image.view()),
            Err(AppError::InvalidGeometry(_))
        ));
    }
}
