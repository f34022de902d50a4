// =============================================================================
// Hierarchical Resolver
// =============================================================================
//
// Tiered, asymmetric reduction of the six horizon signals:
// - Bias: STRUCTURE tier -> global directional bias
// - Timing: 7d/14d/30d -> entry / exit / wait, gated by blockers
// - Final mode: bias + timing + regime risk -> trade mode and size
//
// Independent from the consensus engine; the two only share `HorizonSignal`.

pub mod bias;
pub mod final_mode;
pub mod timing;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{weight, KernelConfig};
use crate::error::KernelError;
use crate::horizon::Horizon;
use crate::signal::{HorizonSet, ResolveInput};

pub use bias::{resolve_bias, Bias};
pub use final_mode::{resolve_final, FinalDecision};
pub use timing::{resolve_timing, Timing};

/// Output of one `resolve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub bias: Bias,
    pub timing: Timing,
    #[serde(rename = "final")]
    pub final_decision: FinalDecision,
}

/// Validate `input` and run bias, timing and final-mode resolution.
pub fn resolve(input: &ResolveInput, config: &KernelConfig) -> Result<ResolveResult, KernelError> {
    let set = input.validate()?;
    Ok(resolve_set(&set, input.global_entropy, input.mc_p95_dd, config))
}

/// Resolution over an already validated set.
pub fn resolve_set(
    set: &HorizonSet,
    global_entropy: f64,
    mc_p95_dd: f64,
    config: &KernelConfig,
) -> ResolveResult {
    let bias = resolve_bias(set, &config.bias);
    let timing = resolve_timing(set, &config.timing);
    let final_decision = resolve_final(&bias, &timing, global_entropy, mc_p95_dd, &config.sizing);

    debug!(
        bias = bias.dir.bias_label(),
        timing = timing.action.timing_label(),
        action = final_decision.action.trade_label(),
        mode = %final_decision.mode,
        size = format!("{:.4}", final_decision.size_multiplier),
        "hierarchical resolve complete"
    );

    ResolveResult {
        bias,
        timing,
        final_decision,
    }
}

/// Weighted signed sum `Σ w·sign·confidence` over `horizons` (shortest first),
/// plus the horizon with the largest `|w·sign·confidence|`. Ties go to the
/// longer horizon.
pub(crate) fn weighted_reduce(
    set: &HorizonSet,
    horizons: &[Horizon],
    weights: &BTreeMap<Horizon, f64>,
) -> (f64, Horizon) {
    let mut score = 0.0;
    let mut dominant = None;
    let mut best = f64::NEG_INFINITY;

    for &h in horizons {
        let signal = set.get(h);
        let contribution = weight(weights, h) * signal.direction.sign() * signal.confidence;
        score += contribution;
        if contribution.abs() >= best {
            best = contribution.abs();
            dominant = Some(h);
        }
    }

    let dominant = dominant
        .or_else(|| horizons.last().copied())
        .unwrap_or(Horizon::D365);
    (score, dominant)
}
