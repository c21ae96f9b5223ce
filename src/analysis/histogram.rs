//! Clipped histograms with automatic bin sizing.

use crate::error::AppError;
use ndarray::ArrayView2;
use serde::Serialize;

/// Bin-count ceiling for auto sizing, chosen so the front-end graph
/// stays responsive.
const MAX_BINS: usize = 5000;

/// Bin counts plus the bin edges that define them. Bin `i` covers the
/// half-open interval `[edges[i], edges[i+1])`, so there is always one
/// more edge than there are counts.
#[derive(Clone, Debug, Serialize)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub edges: Vec<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct HistogramOptions {
    /// Intensity width of each bin; `None` selects a size automatically.
    pub bin_size: Option<f64>,
    /// Fraction of extreme intensities to exclude from each tail before
    /// binning (e.g. 0.05 skips the top and bottom 5%).
    pub clip_fraction: Option<f64>,
    /// Bump a zero lower bound to 1, skipping the pedestal bin of
    /// integer-valued sensor data.
    pub exclude_zero: bool,
}

/// How many bins of `bin_size` cover `[min_val, max_val]`. One more
/// than the quotient, so the bins span strictly past the range.
pub fn num_bins(bin_size: f64, min_val: f64, max_val: f64) -> usize {
    ((max_val - min_val) / bin_size).floor() as usize + 1
}

/// Compute a histogram of the image's intensity values.
pub fn compute_histogram(
    image: &ArrayView2<'_, f64>,
    opts: &HistogramOptions,
) -> Result<Histogram, AppError> {
    let values: Vec<f64> = image.iter().copied().collect();
    if values.is_empty() {
        return Err(AppError::InvalidGeometry(
            "cannot compute a histogram over an empty image".to_string(),
        ));
    }

    let mut low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if let Some(fraction) = opts.clip_fraction {
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let percent = fraction * 100.0;
        low = percentile_of_sorted(&sorted, percent);
        high = percentile_of_sorted(&sorted, 100.0 - percent);
    }

    if opts.exclude_zero && low == 0.0 {
        low += 1.0;
    }

    let bin_size = match opts.bin_size {
        Some(size) => {
            if !size.is_finite() || size <= 0.0 {
                return Err(AppError::InvalidGeometry(format!(
                    "bin size must be a positive number, got {size}"
                )));
            }
            size
        }
        None => auto_bin_size(low, high),
    };

    let bins = num_bins(bin_size, low, high);
    let edges: Vec<f64> = (0..=bins).map(|i| low + i as f64 * bin_size).collect();

    let mut counts = vec![0u64; bins];
    for &v in &values {
        if v < low {
            continue;
        }
        let idx = ((v - low) / bin_size).floor() as usize;
        if idx < bins {
            counts[idx] += 1;
        }
    }

    Ok(Histogram { counts, edges })
}

/// Smallest integer bin size in 1..20 that keeps the bin count under
/// [`MAX_BINS`]; falls back to the exact size that hits the cap for
/// very wide ranges.
fn auto_bin_size(low: f64, high: f64) -> f64 {
    for candidate in 1..20 {
        if num_bins(candidate as f64, low, high) < MAX_BINS {
            return candidate as f64;
        }
    }
    ((high - low) / (MAX_BINS - 1) as f64).ceil()
}

/// Linear-interpolation percentile over pre-sorted values.
fn percentile_of_sorted(sorted: &[f64], percent: f64) -> f64 {
    let rank = percent / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 < sorted.len() {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[sorted.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn bin_count_covers_range_with_one_extra() {
        assert_eq!(num_bins(1.0, 0.0, 10.0), 11);
        assert_eq!(num_bins(3.0, 0.0, 10.0), 4);
        assert_eq!(num_bins(2.0, 5.0, 5.0), 1);
    }

    #[test]
    fn one_more_edge_than_counts() {
        let image = Array2::from_shape_fn((4, 4), |(row, col)| (row * 4 + col) as f64);
        let hist = compute_histogram(&image.view(), &HistogramOptions::default()).unwrap();

        assert_eq!(hist.edges.len(), hist.counts.len() + 1);
    }

    #[test]
    fn half_open_bins_count_known_values() {
        let image = Array2::from_shape_vec((1, 4), vec![0.0, 1.0, 1.0, 2.0]).unwrap();
        let opts = HistogramOptions {
            bin_size: Some(1.0),
            ..Default::default()
        };
        let hist = compute_histogram(&image.view(), &opts).unwrap();

        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(hist.counts, vec![1, 2, 1]);
    }

    #[test]
    fn auto_sizing_keeps_bins_under_cap() {
        // Range 0..20000: sizes 1..=4 give 5000+ bins, 5 gives 4001.
        let mut values = vec![0.0; 18];
        values.push(0.0);
        values.push(20000.0);
        let image = Array2::from_shape_vec((4, 5), values).unwrap();
        let hist = compute_histogram(&image.view(), &HistogramOptions::default()).unwrap();

        assert!(hist.counts.len() < MAX_BINS);
        assert_eq!(hist.counts.len(), 4001);
        assert_eq!(hist.edges[1] - hist.edges[0], 5.0);
    }

    #[test]
    fn clipping_shrinks_the_binned_range() {
        let image = Array2::from_shape_fn((1, 101), |(_, col)| col as f64);
        let opts = HistogramOptions {
            bin_size: Some(1.0),
            clip_fraction: Some(0.05),
            ..Default::default()
        };
        let hist = compute_histogram(&image.view(), &opts).unwrap();

        assert!((hist.edges[0] - 5.0).abs() < 1e-9);
        // Values below the clip point are excluded entirely.
        let total: u64 = hist.counts.iter().sum();
        assert!(total < 101);
    }

    #[test]
    fn exclude_zero_bumps_the_lower_bound() {
        let image = Array2::from_shape_vec((1, 4), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let opts = HistogramOptions {
            bin_size: Some(1.0),
            exclude_zero: true,
            ..Default::default()
        };
        let hist = compute_histogram(&image.view(), &opts).unwrap();

        assert_eq!(hist.edges[0], 1.0);
        assert_eq!(hist.counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn nonpositive_bin_size_is_rejected() {
        let image = Array2::from_shape_vec((1, 2), vec![0.0, 1.0]).unwrap();
        let opts = HistogramOptions {
            bin_size: Some(0.0),
            ..Default::default()
        };

        assert!(matches!(
            compute_histogram(&image.view(), &opts),
            Err(AppError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn empty_image_is_invalid_geometry() {
        let image = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            compute_histogram(&image.view(), &HistogramOptions::default()),
            Err(AppError::InvalidGeometry(_))
        ));
    }
}
