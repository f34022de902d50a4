// =============================================================================
// Decision Kernel — validated facade over resolver, consensus and conflict
// =============================================================================
//
// `DecisionKernel` owns a validated `KernelConfig` and exposes each engine on
// its own plus `evaluate`, which runs all three over one input and reports
// them side by side. The three outputs are never merged into one decision:
// the resolver's `final` stays the authoritative action, while consensus and
// conflict are advisory overlays for sizing and review.
// =============================================================================

use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{weight, KernelConfig};
use crate::conflict::{self, ConflictInput, ConflictResult};
use crate::consensus::{self, ConsensusResult};
use crate::derive::{self, DerivedSignal, HorizonStats};
use crate::error::KernelError;
use crate::horizon::{Horizon, Tier};
use crate::multiplier::{conflict_to_sizing_multiplier, consensus_to_multiplier};
use crate::resolver::{self, ResolveResult};
use crate::signal::{HorizonMap, HorizonSet, ResolveInput};
use crate::types::{Blocker, Direction};

/// STRUCTURE horizons at or below this confidence are left out of `explain`.
const EXPLAIN_MIN_CONFIDENCE: f64 = 0.1;

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureView {
    #[serde(with = "crate::types::bias")]
    pub global_bias: Direction,
    pub bias_strength: f64,
    pub dominant_horizon: Horizon,
    pub explain: Vec<String>,
}

/// One row of the horizon matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonRow {
    pub horizon: Horizon,
    pub tier: Tier,
    #[serde(with = "crate::types::position")]
    pub direction: Direction,
    pub expected_return: f64,
    pub confidence: f64,
    pub reliability: f64,
    pub phase_risk: f64,
    pub blockers: Vec<Blocker>,
    /// Consensus base weight.
    pub weight: f64,
    /// Derivation diagnostics, present when the row came from matcher stats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusView {
    #[serde(flatten)]
    pub result: ConsensusResult,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictView {
    #[serde(flatten)]
    pub result: ConflictResult,
    pub sizing_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionKernelView {
    pub consensus: ConsensusView,
    pub conflict: ConflictView,
}

/// Everything the kernel knows about one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelReport {
    pub resolver: ResolveResult,
    pub structure: StructureView,
    pub horizon_matrix: Vec<HorizonRow>,
    pub decision_kernel: DecisionKernelView,
}

// ── Kernel ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DecisionKernel {
    config: KernelConfig,
}

impl DecisionKernel {
    /// Build a kernel; the config is validated once here.
    pub fn new(config: KernelConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid kernel config")?;
        info!("decision kernel ready");
        Ok(Self { config })
    }

    pub fn resolve(&self, input: &ResolveInput) -> Result<ResolveResult, KernelError> {
        resolver::resolve(input, &self.config)
    }

    pub fn compute_consensus(&self, signals: &HorizonMap) -> Result<ConsensusResult, KernelError> {
        consensus::compute_consensus(signals, &self.config.consensus)
    }

    pub fn compute_conflict_policy(
        &self,
        input: &ConflictInput<'_>,
    ) -> Result<ConflictResult, KernelError> {
        conflict::compute_conflict_policy(input, &self.config.conflict)
    }

    /// Run every engine over `input`. Pure: equal inputs give equal reports.
    pub fn evaluate(&self, input: &ResolveInput) -> Result<KernelReport, KernelError> {
        self.evaluate_with(input, None)
    }

    /// Derive signals from matcher statistics, then evaluate. The horizon
    /// matrix also carries each horizon's entropy, tail risk and stability.
    pub fn evaluate_stats(
        &self,
        stats: &BTreeMap<Horizon, HorizonStats>,
    ) -> Result<KernelReport, KernelError> {
        let derived = derive::derive_all(stats, &self.config.derivation);
        let input = derive::input_from_derived(&derived);
        self.evaluate_with(&input, Some(&derived))
    }

    fn evaluate_with(
        &self,
        input: &ResolveInput,
        derived: Option<&BTreeMap<Horizon, DerivedSignal>>,
    ) -> Result<KernelReport, KernelError> {
        let set = input.validate()?;
        let resolved =
            resolver::resolve_set(&set, input.global_entropy, input.mc_p95_dd, &self.config);
        let consensus = consensus::compute_consensus_set(&set, &self.config.consensus);
        let conflict = conflict::compute_conflict_policy(
            &ConflictInput {
                consensus: &consensus,
                global_entropy: input.global_entropy,
                mc_p95_dd: input.mc_p95_dd,
            },
            &self.config.conflict,
        )?;

        let structure = structure_view(&set, &resolved);
        let horizon_matrix = self.horizon_matrix(&set, derived);

        let consensus_multiplier =
            consensus_to_multiplier(consensus.score, &self.config.multipliers.consensus_curve);
        let sizing_multiplier =
            conflict_to_sizing_multiplier(conflict.level, &self.config.conflict.sizing_penalties);

        debug!(
            action = resolved.final_decision.action.trade_label(),
            consensus = consensus.dir.trade_label(),
            conflict = %conflict.level,
            consensus_multiplier = format!("{:.4}", consensus_multiplier),
            sizing_multiplier = format!("{:.4}", sizing_multiplier),
            "kernel evaluation complete"
        );

        Ok(KernelReport {
            resolver: resolved,
            structure,
            horizon_matrix,
            decision_kernel: DecisionKernelView {
                consensus: ConsensusView {
                    result: consensus,
                    multiplier: consensus_multiplier,
                },
                conflict: ConflictView {
                    result: conflict,
                    sizing_multiplier,
                },
            },
        })
    }

    fn horizon_matrix(
        &self,
        set: &HorizonSet,
        derived: Option<&BTreeMap<Horizon, DerivedSignal>>,
    ) -> Vec<HorizonRow> {
        set.iter()
            .map(|(horizon, s)| {
                let diag = derived.and_then(|d| d.get(&horizon));
                HorizonRow {
                    horizon,
                    tier: horizon.tier(),
                    direction: s.direction,
                    expected_return: s.expected_return,
                    confidence: s.confidence,
                    reliability: s.reliability,
                    phase_risk: s.phase_risk,
                    blockers: s.blockers.iter().copied().collect(),
                    weight: weight(&self.config.consensus.weights, horizon),
                    entropy: diag.map(|d| d.entropy),
                    tail_risk: diag.map(|d| d.tail_risk),
                    stability: diag.map(|d| d.stability),
                }
            })
            .collect()
    }
}

fn structure_view(set: &HorizonSet, resolved: &ResolveResult) -> StructureView {
    let bias = &resolved.bias;
    let mut explain = vec![match bias.dir {
        Direction::Up => "Long-term horizons indicate a bullish regime".to_string(),
        Direction::Down => "Long-term horizons indicate a bearish regime".to_string(),
        Direction::Flat => "Long-term horizons are mixed or neutral".to_string(),
    }];
    for &horizon in Tier::Structure.horizons() {
        let s = set.get(horizon);
        if s.confidence > EXPLAIN_MIN_CONFIDENCE {
            explain.push(format!(
                "{horizon}: {} (conf {:.0}%)",
                s.direction.bias_label(),
                s.confidence * 100.0
            ));
        }
    }

    StructureView {
        global_bias: bias.dir,
        bias_strength: bias.strength,
        dominant_horizon: bias.dominant_horizon,
        explain,
    }
}
