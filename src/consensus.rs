// =============================================================================
// Consensus Engine — symmetric vote aggregation over all six horizons
// =============================================================================
//
// Each horizon casts one vote:
//
//   effectiveWeight = baseWeight(h) · reliability · Π (1 - penalty(blocker))
//   contribution    = effectiveWeight · sign(direction)
//
// BUY / SELL / HOLD weights are normalised by their total; the argmax is the
// consensus direction and its share the score. Ties resolve BUY > SELL > HOLD.
// Unlike the hierarchical resolver there are no tiers and no gating here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{weight, ConsensusParams};
use crate::error::KernelError;
use crate::horizon::{Horizon, Tier};
use crate::signal::{HorizonMap, HorizonSet};
use crate::types::{Blocker, Direction};

/// One horizon's ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub horizon: Horizon,
    pub tier: Tier,
    #[serde(with = "crate::types::trade")]
    pub direction: Direction,
    pub raw_confidence: f64,
    pub effective_weight: f64,
    /// Blockers that cut this vote's weight, in the order applied.
    pub penalties: Vec<Blocker>,
    pub contribution: f64,
}

/// Agreement across all horizons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub score: f64,
    #[serde(with = "crate::types::trade")]
    pub dir: Direction,
    pub dispersion: f64,
    pub buy_weight: f64,
    pub sell_weight: f64,
    pub hold_weight: f64,
    pub votes: Vec<Vote>,
}

/// Raw (un-normalised) directional weight totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Tally {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl Tally {
    pub fn add(&mut self, direction: Direction, weight: f64) {
        match direction {
            Direction::Up => self.buy += weight,
            Direction::Down => self.sell += weight,
            Direction::Flat => self.hold += weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.buy + self.sell + self.hold
    }

    /// Weight behind `direction`.
    pub fn of(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Up => self.buy,
            Direction::Down => self.sell,
            Direction::Flat => self.hold,
        }
    }

    /// Argmax direction with BUY > SELL > HOLD tie-break. An empty tally
    /// has no dominant side and reads as HOLD.
    pub fn dominant(&self) -> Direction {
        if self.total() <= 0.0 {
            Direction::Flat
        } else if self.buy >= self.sell && self.buy >= self.hold {
            Direction::Up
        } else if self.sell >= self.hold {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// Validate the six signals and compute the consensus.
pub fn compute_consensus(
    signals: &HorizonMap,
    params: &ConsensusParams,
) -> Result<ConsensusResult, KernelError> {
    let set = HorizonSet::from_map(signals)?;
    Ok(compute_consensus_set(&set, params))
}

pub fn compute_consensus_set(set: &HorizonSet, params: &ConsensusParams) -> ConsensusResult {
    let mut votes = Vec::with_capacity(Horizon::ALL.len());
    let mut tally = Tally::default();

    for (horizon, signal) in set.iter() {
        let mut effective_weight = weight(&params.weights, horizon) * signal.reliability;
        let mut penalties = Vec::with_capacity(signal.blockers.len());

        for blocker in &signal.blockers {
            let cut = params
                .blocker_penalties
                .get(blocker)
                .copied()
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            effective_weight *= 1.0 - cut;
            penalties.push(*blocker);
        }

        tally.add(signal.direction, effective_weight);

        votes.push(Vote {
            horizon,
            tier: horizon.tier(),
            direction: signal.direction,
            raw_confidence: signal.confidence,
            effective_weight,
            penalties,
            contribution: effective_weight * signal.direction.sign(),
        });
    }

    let total = tally.total();
    let (buy_weight, sell_weight, hold_weight) = if total > 0.0 {
        (tally.buy / total, tally.sell / total, tally.hold / total)
    } else {
        (0.0, 0.0, 0.0)
    };

    let dir = tally.dominant();
    let score = if total > 0.0 {
        (tally.of(dir) / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    debug!(
        dir = dir.trade_label(),
        score = format!("{:.4}", score),
        buy = format!("{:.4}", buy_weight),
        sell = format!("{:.4}", sell_weight),
        hold = format!("{:.4}", hold_weight),
        "consensus computed"
    );

    ConsensusResult {
        score,
        dir,
        dispersion: 1.0 - score,
        buy_weight,
        sell_weight,
        hold_weight,
        votes,
    }
}
