// =============================================================================
// Horizon Signals — kernel input contract
// =============================================================================
//
// A `HorizonSignal` is produced upstream (see `derive`) and is never computed
// by the reducers. `ResolveInput` carries all six horizons plus the
// regime-level risk context. Validation turns either into a `HorizonSet`,
// which is the only thing the reducers accept: once a `HorizonSet` exists,
// every horizon is present and every scalar is in range.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_unit, KernelError};
use crate::horizon::Horizon;
use crate::types::{Blocker, Direction};

/// One horizon's externally computed estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonSignal {
    #[serde(with = "crate::types::position", alias = "dir")]
    pub direction: Direction,
    #[serde(default)]
    pub expected_return: f64,
    pub confidence: f64,
    pub reliability: f64,
    #[serde(default, alias = "entropy")]
    pub phase_risk: f64,
    #[serde(default)]
    pub blockers: BTreeSet<Blocker>,
}

impl HorizonSignal {
    pub fn new(direction: Direction, confidence: f64, reliability: f64) -> Self {
        Self {
            direction,
            expected_return: 0.0,
            confidence,
            reliability,
            phase_risk: 0.0,
            blockers: BTreeSet::new(),
        }
    }

    pub fn with_blocker(mut self, blocker: Blocker) -> Self {
        self.blockers.insert(blocker);
        self
    }

    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    fn validate(&self, horizon: Horizon) -> Result<(), KernelError> {
        ensure_finite(format!("{horizon}.expectedReturn"), self.expected_return)?;
        ensure_unit(format!("{horizon}.confidence"), self.confidence)?;
        ensure_unit(format!("{horizon}.reliability"), self.reliability)?;
        ensure_unit(format!("{horizon}.phaseRisk"), self.phase_risk)?;
        Ok(())
    }
}

/// Horizon signals keyed by horizon, as received from callers.
pub type HorizonMap = BTreeMap<Horizon, HorizonSignal>;

/// Input of one `resolve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInput {
    pub horizons: HorizonMap,
    /// Regime-level disorder in `[0, 1]`.
    pub global_entropy: f64,
    /// 95th-percentile simulated max drawdown in `[0, 1]`.
    #[serde(rename = "mcP95_DD")]
    pub mc_p95_dd: f64,
}

impl ResolveInput {
    /// Validate the full contract: six horizons, every scalar in range.
    pub fn validate(&self) -> Result<HorizonSet, KernelError> {
        let set = HorizonSet::from_map(&self.horizons)?;
        ensure_unit("globalEntropy", self.global_entropy)?;
        ensure_unit("mcP95_DD", self.mc_p95_dd)?;
        Ok(set)
    }
}

/// Validated signals for all six horizons, indexed by `Horizon::index`.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonSet {
    signals: [HorizonSignal; 6],
}

impl HorizonSet {
    pub fn from_map(map: &HorizonMap) -> Result<Self, KernelError> {
        for horizon in Horizon::ALL {
            map.get(&horizon)
                .ok_or(KernelError::MissingHorizon { horizon })?
                .validate(horizon)?;
        }
        // Every key was checked above.
        let signals = Horizon::ALL.map(|h| map[&h].clone());
        Ok(Self { signals })
    }

    pub fn get(&self, horizon: Horizon) -> &HorizonSignal {
        &self.signals[horizon.index()]
    }

    /// `(horizon, signal)` pairs, shortest horizon first.
    pub fn iter(&self) -> impl Iterator<Item = (Horizon, &HorizonSignal)> {
        Horizon::ALL.into_iter().zip(self.signals.iter())
    }
}
