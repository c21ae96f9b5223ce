//! Automatic midtones-transfer-function stretch.
//!
//! Linear FITS data is mostly sky background; an unstretched rendering
//! is black. The display path computes shadows/highlights/midtones from
//! median and MADN statistics and maps pixels through the standard MTF.

use ndarray::ArrayView2;

const MAX_SAMPLES: usize = 500_000;
/// Shadow clipping point, in MADN units below the median.
const SHADOW_CLIP: f64 = -2.8;
/// Normalized background level the stretched median lands on.
const TARGET_BACKGROUND: f64 = 0.25;

/// Stretch parameters for one channel, all in normalized [0, 1] units.
#[derive(Clone, Copy, Debug)]
pub struct StretchParams {
    pub shadows: f64,
    pub highlights: f64,
    pub midtones: f64,
}

impl StretchParams {
    /// Identity transfer (no stretching).
    pub fn identity() -> Self {
        StretchParams {
            shadows: 0.0,
            highlights: 1.0,
            midtones: 0.5,
        }
    }

    /// Compute parameters from median-based statistics over `data`,
    /// subsampled to at most 500k values.
    pub fn compute_auto(data: &[f64], max_input: f64) -> Self {
        if data.is_empty() || max_input <= 0.0 {
            return Self::identity();
        }

        let mut samples: Vec<f64> = if data.len() <= MAX_SAMPLES {
            data.to_vec()
        } else {
            let step = data.len() / MAX_SAMPLES;
            (0..MAX_SAMPLES).map(|i| data[i * step]).collect()
        };

        let median = select_median(&mut samples);

        let mut deviations: Vec<f64> = samples.iter().map(|&v| (v - median).abs()).collect();
        let madn = 1.4826 * select_median(&mut deviations);

        let norm_median = median / max_input;
        let norm_madn = madn / max_input;

        let upper_half = norm_median > 0.5;

        let shadows = if upper_half || norm_madn == 0.0 {
            0.0
        } else {
            (norm_median + SHADOW_CLIP * norm_madn).clamp(0.0, 1.0)
        };

        let highlights = if !upper_half || norm_madn == 0.0 {
            1.0
        } else {
            (norm_median - SHADOW_CLIP * norm_madn).clamp(0.0, 1.0)
        };

        // Solve for the midtones value that puts the median at the
        // target background level.
        let (x, m) = if !upper_half {
            (norm_median - shadows, TARGET_BACKGROUND)
        } else {
            (TARGET_BACKGROUND, highlights - norm_median)
        };

        let midtones = if x == 0.0 {
            0.0
        } else if x == m {
            0.5
        } else if x == 1.0 {
            1.0
        } else {
            ((m - 1.0) * x) / ((2.0 * m - 1.0) * x - m)
        };

        StretchParams {
            shadows,
            highlights,
            midtones,
        }
    }

    /// Apply the midtones transfer function to a normalized value.
    pub fn apply(&self, normalized: f64) -> f64 {
        if normalized <= self.shadows {
            return 0.0;
        }
        if normalized >= self.highlights {
            return 1.0;
        }

        let x = (normalized - self.shadows) / (self.highlights - self.shadows);
        if self.midtones == 0.5 {
            x
        } else {
            ((self.midtones - 1.0) * x) / ((2.0 * self.midtones - 1.0) * x - self.midtones)
        }
    }
}

/// Full-scale ceiling for the data's bit depth: 255 or 65535 for
/// integer-range data, the data maximum otherwise.
pub fn calculate_max_input(data: &[f64]) -> f64 {
    let max_val = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max_val <= 255.0 {
        255.0
    } else if max_val <= 65535.0 {
        65535.0
    } else {
        max_val
    }
}

/// Auto-stretch a 2-D image into 8-bit grayscale, row-major.
pub fn stretch_to_gray(image: &ArrayView2<'_, f64>) -> Vec<u8> {
    let flat: Vec<f64> = image.iter().copied().collect();
    let max_input = calculate_max_input(&flat);
    let params = StretchParams::compute_auto(&flat, max_input);

    flat.iter()
        .map(|&v| {
            let stretched = params.apply(v / max_input);
            (stretched * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Median via `select_nth_unstable` (reorders the slice).
fn select_median(values: &mut [f64]) -> f64 {
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| {
        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
    });
    *median
}
