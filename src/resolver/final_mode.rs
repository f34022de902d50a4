// =============================================================================
// Final Mode Resolver — bias + timing to trade mode and size multiplier
// =============================================================================
//
// Branches (first match wins):
//   timing WAIT              => HOLD / HOLD / 0            "blocked:..."
//   bias NEUTRAL             => TREND_FOLLOW, timing.strength · neutral factor
//   bias agrees with timing  => TREND_FOLLOW, min(bias, timing) strength
//   bias opposes timing      => COUNTER_TREND, min(...) · counter-trend factor
//
// The action always follows timing. The base multiplier is then discounted by
// regime risk:
//
//   size = base · (1 - globalEntropy·k1) · (1 - mcP95_DD·k2), clamped [0, 1]

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bias::Bias;
use super::timing::Timing;
use crate::config::SizingParams;
use crate::types::{Direction, TradeMode};

/// The resolver's actionable decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDecision {
    /// BUY / SELL / HOLD.
    #[serde(with = "crate::types::trade")]
    pub action: Direction,
    pub mode: TradeMode,
    pub size_multiplier: f64,
    /// Machine-readable tag of the branch that fired.
    pub reason: String,
}

impl FinalDecision {
    fn hold(reason: String) -> Self {
        Self {
            action: Direction::Flat,
            mode: TradeMode::Hold,
            size_multiplier: 0.0,
            reason,
        }
    }
}

/// `(1 - globalEntropy·k1) · (1 - mcP95_DD·k2)`.
pub fn risk_factor(global_entropy: f64, mc_p95_dd: f64, params: &SizingParams) -> f64 {
    (1.0 - global_entropy * params.entropy_penalty) * (1.0 - mc_p95_dd * params.tail_risk_penalty)
}

pub fn resolve_final(
    bias: &Bias,
    timing: &Timing,
    global_entropy: f64,
    mc_p95_dd: f64,
    params: &SizingParams,
) -> FinalDecision {
    if timing.action == Direction::Flat {
        let reason = if timing.is_blocked() {
            let codes: Vec<&str> = timing.blockers.iter().map(|b| b.as_str()).collect();
            format!("blocked:{}", codes.join("+"))
        } else {
            "blocked:no_timing_edge".to_string()
        };
        return FinalDecision::hold(reason);
    }

    let structure = tag(bias.dir);
    let timing_tag = tag(timing.action);

    let (mode, base, reason) = if bias.dir == Direction::Flat {
        (
            TradeMode::TrendFollow,
            timing.strength * params.neutral_bias_factor,
            format!("neutral_bias:timing_{timing_tag}"),
        )
    } else if bias.dir == timing.action {
        (
            TradeMode::TrendFollow,
            bias.strength.min(timing.strength),
            format!("trend_follow:structure_{structure}_timing_{timing_tag}"),
        )
    } else {
        (
            TradeMode::CounterTrend,
            bias.strength.min(timing.strength) * params.counter_trend_factor,
            format!("counter_trend:structure_{structure}_timing_{timing_tag}"),
        )
    };

    let size_multiplier = (base * risk_factor(global_entropy, mc_p95_dd, params)).clamp(0.0, 1.0);

    debug!(
        mode = %mode,
        action = timing.action.trade_label(),
        base = format!("{:.4}", base),
        size = format!("{:.4}", size_multiplier),
        reason = %reason,
        "final mode resolved"
    );

    FinalDecision {
        action: timing.action,
        mode,
        size_multiplier,
        reason,
    }
}

/// Lower-case bias label used inside reason tags.
fn tag(dir: Direction) -> String {
    dir.bias_label().to_lowercase()
}
