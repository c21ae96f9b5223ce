//! Region statistics endpoint: /stats

use crate::analysis::coords::RelativePoint;
use crate::analysis::region::{compute_region_stats, extract_region, RegionStats};
use crate::error::AppError;
use crate::handlers::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Deserialize)]
pub struct StatsRequest {
    pub filename: String,
    /// Optional rectangular sub-region; statistics cover the whole
    /// image when absent.
    pub region: Option<RegionCorners>,
}

/// Two opposite corners in relative coordinates, each in [0, 1].
#[derive(Clone, Copy, Deserialize)]
pub struct RegionCorners {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub filename: String,
    pub stats: RegionStats,
    pub elapsed_ms: f64,
}

/// POST /stats - Region statistics over the image or a sub-region
pub async fn region_stats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StatsRequest>,
) -> Result<Json<StatsResponse>, AppError> {
    let start = Instant::now();

    if let Some(corners) = &req.region {
        let coords = [corners.x0, corners.y0, corners.x1, corners.y1];
        if coords.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(AppError::BadRequest(
                "region corners must be within [0, 1]".to_string(),
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

    let stats = match req.region {
        Some(corners) => {
            let sub = extract_region(
                &image.view(),
                RelativePoint::new(corners.x0, corners.y0),
                RelativePoint::new(corners.x1, corners.y1),
                &state.mapper,
            )?;
            compute_region_stats(&sub.view())?
        }
        None => compute_region_stats(&image.view())?,
    };

    Ok(Json(StatsResponse {
        filename: req.filename,
        stats,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}
