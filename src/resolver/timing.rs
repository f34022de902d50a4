// =============================================================================
// Timing Resolver — 7d / 14d / 30d to one entry / exit / wait action
// =============================================================================
//
// 30d is the nearest TACTICAL horizon and the primary actionable one, so it is
// read here alongside the TIMING tier and carries the largest weight.
//
// State machine:
//   any blocker on 7d/14d/30d  => WAIT (score still reported)
//   score > 0                  => ENTER
//   score < 0                  => EXIT
//   otherwise                  => WAIT

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::weighted_reduce;
use crate::config::TimingParams;
use crate::horizon::{Horizon, TIMING_HORIZONS};
use crate::signal::HorizonSet;
use crate::types::{Blocker, Direction};

/// Short-term actionable signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// ENTER / EXIT / WAIT.
    #[serde(with = "crate::types::timing")]
    pub action: Direction,
    pub score: f64,
    pub strength: f64,
    pub dominant_horizon: Horizon,
    /// Union of blockers across 7d/14d/30d.
    pub blockers: Vec<Blocker>,
}

impl Timing {
    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }
}

pub fn resolve_timing(set: &HorizonSet, params: &TimingParams) -> Timing {
    let (score, dominant_horizon) = weighted_reduce(set, &TIMING_HORIZONS, &params.weights);

    let blockers: BTreeSet<Blocker> = TIMING_HORIZONS
        .iter()
        .flat_map(|h| set.get(*h).blockers.iter().copied())
        .collect();

    let action = if !blockers.is_empty() {
        debug!(
            blockers = ?blockers,
            score = format!("{:.4}", score),
            "timing blocked"
        );
        Direction::Flat
    } else {
        Direction::from_score(score, 0.0)
    };

    let strength = score.abs().clamp(0.0, 1.0);

    trace!(
        score = format!("{:.4}", score),
        action = action.timing_label(),
        dominant = %dominant_horizon,
        "timing resolved"
    );

    Timing {
        action,
        score,
        strength,
        dominant_horizon,
        blockers: blockers.into_iter().collect(),
    }
}
