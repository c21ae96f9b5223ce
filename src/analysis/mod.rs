//! Pure, request-scoped image analysis: coordinate mapping, line
//! profiles, sub-region extraction, statistics, and histograms.
//!
//! Nothing in this tree performs I/O or holds state across calls; the
//! handlers pass each request its own image view and collect the result.

pub mod coords;
pub mod histogram;
pub mod profile;
pub mod region;
