//! Histogram endpoint: /histogram

use crate::analysis::histogram::{compute_histogram, Histogram, HistogramOptions};
use crate::error::AppError;
use crate::handlers::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Deserialize)]
pub struct HistogramRequest {
    pub filename: String,
    /// Intensity width of each bin; sized automatically when absent.
    pub bin_size: Option<f64>,
    /// Fraction of extreme intensities to exclude from each tail,
    /// in [0, 0.5).
    pub clip_percent: Option<f64>,
    #[serde(default)]
    pub exclude_zero: bool,
}

#[derive(Serialize)]
pub struct HistogramResponse {
    pub filename: String,
    #[serde(flatten)]
    pub histogram: Histogram,
    pub elapsed_ms: f64,
}

/// POST /histogram - Clipped histogram of the image's intensities
pub async fn histogram(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistogramRequest>,
) -> Result<Json<HistogramResponse>, AppError> {
    let start = Instant::now();

    if let Some(size) = req.bin_size {
        if !size.is_finite() || size <= 0.0 {
            return Err(AppError::BadRequest(
                "bin_size must be a positive number".to_string(),
            ));
        }
    }
    if let Some(fraction) = req.clip_percent {
        if !(0.0..0.5).contains(&fraction) {
            return Err(AppError::BadRequest(
                "clip_percent must be within [0, 0.5)".to_string(),
            ));
        }
    }

    if !state.loader.exists(&req.filename).await? {
        return Err(AppError::NotFound(format!(
            "no object named {}",
            req.filename
        )));
    }

    let image = state.loader.load(&req.filename).await?;

    let opts = HistogramOptions {
        bin_size: req.bin_size,
        clip_fraction: req.clip_percent,
        exclude_zero: req.exclude_zero,
    };
    let histogram = compute_histogram(&image.view(), &opts)?;

    Ok(Json(HistogramResponse {
        filename: req.filename,
        histogram,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}
