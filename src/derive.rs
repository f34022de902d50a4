// =============================================================================
// Signal Derivation — forward-outcome statistics to HorizonSignal
// =============================================================================
//
// The pattern-matching engine reports, per horizon, the distribution of
// forward returns and drawdowns observed after the top-K historical matches.
// This module turns those statistics into the kernel's input contract:
//
//   winRate    = 0.5 ± 0.3 · |p50| / (p90 - p10)        clamped [0.1, 0.9]
//   entropy    = 1 - |2·winRate - 1|
//   confidence = |2·winRate - 1| · (0.5 + 0.5·max(0, 1 - spread)) · min(1, n / full)
//   reliability= base(horizon) · (1 - 0.2·entropy)
//   phaseRisk  = 0.5 · entropy
//
// Missing or degenerate statistics, and drawdowns outside [0, 1], yield the
// INSUFFICIENT_DATA signal. Received values are never clamped.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DerivationParams;
use crate::horizon::Horizon;
use crate::signal::{HorizonMap, HorizonSignal, ResolveInput};
use crate::types::{Blocker, Direction};

// ── Upstream statistics ──────────────────────────────────────────────────────

fn default_p10() -> f64 {
    -0.1
}
fn default_p90() -> f64 {
    0.1
}
fn default_dd_p95() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "default_p10")]
    pub p10: f64,
    #[serde(default)]
    pub p50: f64,
    #[serde(default = "default_p90")]
    pub p90: f64,
}

impl Default for ReturnStats {
    fn default() -> Self {
        Self {
            mean: 0.0,
            p10: default_p10(),
            p50: 0.0,
            p90: default_p90(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    #[serde(default = "default_dd_p95")]
    pub p95: f64,
}

impl Default for DrawdownStats {
    fn default() -> Self {
        Self {
            p95: default_dd_p95(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardStats {
    #[serde(rename = "return", default)]
    pub returns: ReturnStats,
    #[serde(default)]
    pub drawdown: DrawdownStats,
}

impl ForwardStats {
    fn is_finite(&self) -> bool {
        [
            self.returns.mean,
            self.returns.p10,
            self.returns.p50,
            self.returns.p90,
            self.drawdown.p95,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// One horizon's matcher output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonStats {
    #[serde(default)]
    pub forward_stats: Option<ForwardStats>,
    #[serde(default)]
    pub match_count: usize,
}

// ── Derived signal ───────────────────────────────────────────────────────────

/// A derived `HorizonSignal` plus the diagnostics it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSignal {
    pub signal: HorizonSignal,
    pub entropy: f64,
    pub tail_risk: f64,
    pub stability: f64,
}

impl DerivedSignal {
    /// Signal used when a horizon has no usable statistics.
    pub fn insufficient_data() -> Self {
        let mut signal =
            HorizonSignal::new(Direction::Flat, 0.0, 0.5).with_blocker(Blocker::InsufficientData);
        signal.phase_risk = 0.5;
        Self {
            signal,
            entropy: 1.0,
            tail_risk: 0.5,
            stability: 0.5,
        }
    }
}

fn base_reliability(horizon: Horizon) -> f64 {
    match horizon.days() {
        d if d >= 180 => 0.85,
        d if d >= 90 => 0.80,
        d if d >= 30 => 0.75,
        _ => 0.70,
    }
}

/// Derive one horizon's signal from its matcher statistics.
pub fn derive_signal(
    horizon: Horizon,
    stats: &HorizonStats,
    params: &DerivationParams,
) -> DerivedSignal {
    let fs = match &stats.forward_stats {
        Some(fs) if fs.is_finite() => fs,
        Some(_) => {
            warn!(horizon = %horizon, "non-finite forward stats, using insufficient-data signal");
            return DerivedSignal::insufficient_data();
        }
        None => return DerivedSignal::insufficient_data(),
    };

    let tail_risk = fs.drawdown.p95;
    if !(0.0..=1.0).contains(&tail_risk) {
        warn!(
            horizon = %horizon,
            p95 = format!("{:.4}", tail_risk),
            "drawdown p95 outside [0, 1], using insufficient-data signal"
        );
        return DerivedSignal::insufficient_data();
    }

    let r = &fs.returns;
    let spread = r.p90 - r.p10;
    if spread <= 0.0 {
        warn!(
            horizon = %horizon,
            p10 = format!("{:.4}", r.p10),
            p90 = format!("{:.4}", r.p90),
            "degenerate return spread, using insufficient-data signal"
        );
        return DerivedSignal::insufficient_data();
    }

    let edge = 0.3 * r.p50.abs() / spread;
    let win_rate = (if r.p50 > 0.0 { 0.5 + edge } else { 0.5 - edge }).clamp(0.1, 0.9);
    let skew = (2.0 * win_rate - 1.0).abs();
    let entropy = (1.0 - skew).clamp(0.0, 1.0);

    let effective_n = stats.match_count.min(params.top_k);
    let sample_floor = if params.full_sample == 0 {
        1.0
    } else {
        (effective_n as f64 / params.full_sample as f64).min(1.0)
    };
    let spread_factor = (1.0 - spread).max(0.0);
    let confidence = (skew * (0.5 + 0.5 * spread_factor) * sample_floor).clamp(0.0, 1.0);

    let stability = 1.0 - entropy * 0.5;

    let direction = if confidence > params.min_confidence && r.mean > params.min_abs_return {
        Direction::Up
    } else if confidence > params.min_confidence && r.mean < -params.min_abs_return {
        Direction::Down
    } else {
        Direction::Flat
    };

    let mut signal = HorizonSignal::new(
        direction,
        confidence,
        (base_reliability(horizon) * (1.0 - entropy * 0.2)).clamp(0.0, 1.0),
    );
    signal.expected_return = r.mean;
    signal.phase_risk = entropy * 0.5;

    if confidence < params.min_confidence {
        signal.blockers.insert(Blocker::LowConfidence);
    }
    if entropy > params.max_entropy {
        signal.blockers.insert(Blocker::HighEntropy);
    }
    if tail_risk > params.max_tail_risk {
        signal.blockers.insert(Blocker::HighTailRisk);
    }
    if effective_n < params.min_sample {
        signal.blockers.insert(Blocker::LowSample);
    }

    debug!(
        horizon = %horizon,
        dir = direction.position_label(),
        confidence = format!("{:.4}", confidence),
        entropy = format!("{:.4}", entropy),
        n = effective_n,
        blockers = signal.blockers.len(),
        "horizon signal derived"
    );

    DerivedSignal {
        signal,
        entropy,
        tail_risk,
        stability,
    }
}

/// Derive all six horizons; absent horizons get the insufficient-data signal.
pub fn derive_all(
    stats: &BTreeMap<Horizon, HorizonStats>,
    params: &DerivationParams,
) -> BTreeMap<Horizon, DerivedSignal> {
    Horizon::ALL
        .into_iter()
        .map(|h| {
            let derived = stats
                .get(&h)
                .map(|s| derive_signal(h, s, params))
                .unwrap_or_else(DerivedSignal::insufficient_data);
            (h, derived)
        })
        .collect()
}

/// Assemble a full `ResolveInput`. The 30d derivation, the primary
/// actionable horizon, supplies the regime-level entropy and tail risk.
pub fn build_resolve_input(
    stats: &BTreeMap<Horizon, HorizonStats>,
    params: &DerivationParams,
) -> ResolveInput {
    input_from_derived(&derive_all(stats, params))
}

pub(crate) fn input_from_derived(derived: &BTreeMap<Horizon, DerivedSignal>) -> ResolveInput {
    let horizons: HorizonMap = derived
        .iter()
        .map(|(h, d)| (*h, d.signal.clone()))
        .collect();
    let (global_entropy, mc_p95_dd) = derived
        .get(&Horizon::D30)
        .map(|d| (d.entropy, d.tail_risk))
        .unwrap_or((1.0, 0.5));

    ResolveInput {
        horizons,
        global_entropy,
        mc_p95_dd,
    }
}
