//! Intensity profile endpoint: /profile

use crate::analysis::coords::RelativePoint;
use crate::analysis::profile::compute_profile;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::render::overlay::render_line_overlay;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub filename: String,
    /// Relative [x, y] of the line start, each nominally in [0, 1].
    /// Slightly out-of-range diagnostic lines are allowed; samples off
    /// the image report the sentinel fill value.
    pub start: [f64; 2],
    /// Relative [x, y] of the line end.
    pub end: [f64; 2],
    /// Also return a rendered overlay of the line on the image.
    #[serde(default)]
    pub include_plot: bool,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub filename: String,
    pub profile: Vec<f64>,
    /// base64 PNG data URI, present when requested and rendering succeeded.
    pub plot: Option<String>,
    pub elapsed_ms: f64,
}

/// POST /profile - Intensity profile between two relative points
pub async fn intensity_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let start = Instant::now();

    if req
        .start
        .iter()
        .chain(req.end.iter())
        .any(|c| !c.is_finite())
    {
        return Err(AppError::BadRequest(
            "line coordinates must be finite numbers".to_string(),
        ));
    }

    // Existence check first, so a missing file is a client error rather
    // than a failed fetch.
    if !state.loader.exists(&req.filename).await? {
        return Err(AppError::NotFound(format!(
            "no object named {}",
            req.filename
        )));
    }

    let image = state.loader.load(&req.filename).await?;
    let line_start = RelativePoint::new(req.start[0], req.start[1]);
    let line_end = RelativePoint::new(req.end[0], req.end[1]);

    let profile = compute_profile(&image.view(), line_start, line_end, &state.mapper)?;

    // Rendering is cosmetic; a failure must never affect the profile.
    let plot = if req.include_plot {
        let (height, width) = image.dim();
        let (p0, p1) = state.mapper.map_line(line_start, line_end, height, width);
        match render_line_overlay(&image.view(), p0, p1) {
            Ok(uri) => Some(uri),
            Err(err) => {
                tracing::warn!("overlay rendering failed: {err}");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(ProfileResponse {
        filename: req.filename,
        profile,
        plot,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}
