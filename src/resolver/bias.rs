// =============================================================================
// Bias Resolver — STRUCTURE tier to one global directional bias
// =============================================================================
//
//   score    = Σ w(h) · sign(h) · confidence(h)     h ∈ {180d, 365d}
//   dir      = BULL if score > ε, BEAR if score < -ε, else NEUTRAL
//   strength = |score| clamped to [0, 1]
//
// 365d carries the larger weight, and wins ties for the dominant horizon.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::weighted_reduce;
use crate::config::BiasParams;
use crate::horizon::{Horizon, Tier};
use crate::signal::HorizonSet;
use crate::types::Direction;

/// Long-term structural directional view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bias {
    #[serde(with = "crate::types::bias")]
    pub dir: Direction,
    pub strength: f64,
    pub dominant_horizon: Horizon,
}

pub fn resolve_bias(set: &HorizonSet, params: &BiasParams) -> Bias {
    let (score, dominant_horizon) =
        weighted_reduce(set, Tier::Structure.horizons(), &params.weights);

    let dir = Direction::from_score(score, params.epsilon);
    let strength = score.abs().clamp(0.0, 1.0);

    trace!(
        score = format!("{:.4}", score),
        dir = dir.bias_label(),
        dominant = %dominant_horizon,
        "bias resolved"
    );

    Bias {
        dir,
        strength,
        dominant_horizon,
    }
}
