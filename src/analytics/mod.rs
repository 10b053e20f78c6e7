//! Derived scores computed on demand from stored rows
//!
//! Nothing in here touches the database. Services fetch rows, hand them to
//! these functions and return the result; scores are never cached.
//!
//! - `alignment` - objective linkage score, redundancy and suggestions
//! - `maturity` - weighted readiness checklist and recommendation
//! - `phase_progress` - per-phase delay and progress, sample delay rate
//! - `indicators` - dashboard rollups over project and alert collections

pub mod alignment;
pub mod maturity;
pub mod phase_progress;
pub mod indicators;

/// Round a non-negative score to the nearest integer, halves away from zero
pub(crate) fn round_score(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.round() as u32
    }
}
