//! HTTP endpoints.

pub mod health;
pub mod histogram;
pub mod profile;
pub mod stats;

use crate::analysis::coords::CoordinateMapper;
use crate::storage::loader::ImageLoader;

/// Shared state handed to every handler: the one image loader and the
/// one coordinate mapper constructed at startup.
pub struct AppState {
    pub loader: ImageLoader,
    pub mapper: CoordinateMapper,
}
