// =============================================================================
// Conflict Policy Engine — structure vs timing divergence classification
// =============================================================================
//
// Works on the consensus votes, restricted per tier: each tier's dominant
// direction is the argmax of its effective weights (same tie-break as the
// consensus), its strength the confidence-weighted share of that side.
//
// Divergence of STRUCTURE vs TIMING:
//
//   disagreement = 1 (BUY vs SELL), partial (one side HOLD), 0 (equal)
//   raw          = disagreement · (floor + slope · mean tier strength)
//   divergence   = raw · (1 + a_e·globalEntropy + a_t·mcP95_DD), clamped [0, 1]
//
// Buckets:   NONE < MINOR < MODERATE < MAJOR < SEVERE
// Modes:     NONE/MINOR -> TREND_FOLLOW, MODERATE/MAJOR -> COUNTER_TREND,
//            SEVERE -> WAIT

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConflictParams;
use crate::consensus::{ConsensusResult, Tally, Vote};
use crate::error::{ensure_unit, KernelError};
use crate::horizon::Tier;
use crate::types::{ConflictLevel, ConflictMode, Direction};

/// Input of one conflict policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ConflictInput<'a> {
    pub consensus: &'a ConsensusResult,
    pub global_entropy: f64,
    pub mc_p95_dd: f64,
}

/// Dominant direction of one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    #[serde(with = "crate::types::trade")]
    pub dominant_dir: Direction,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureVsTiming {
    pub aligned: bool,
    #[serde(with = "crate::types::trade")]
    pub structure_dir: Direction,
    #[serde(with = "crate::types::trade")]
    pub timing_dir: Direction,
    pub divergence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub level: ConflictLevel,
    pub mode: ConflictMode,
    pub sizing_penalty: f64,
    pub structure_vs_timing: StructureVsTiming,
    pub structure: TierSummary,
    pub tactical: TierSummary,
    pub timing: TierSummary,
    pub explain: Vec<String>,
    pub recommendation: String,
}

/// How two tier directions relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Aligned,
    Partial,
    Opposed,
}

impl Relation {
    fn of(structure: Direction, timing: Direction) -> Self {
        if structure == timing {
            Self::Aligned
        } else if structure.is_directional() && timing.is_directional() {
            Self::Opposed
        } else {
            Self::Partial
        }
    }
}

/// Summarise one tier from the consensus votes.
pub fn tier_summary(votes: &[Vote], tier: Tier) -> TierSummary {
    let mut tally = Tally::default();
    for v in votes.iter().filter(|v| v.tier == tier) {
        tally.add(v.direction, v.effective_weight);
    }

    let dominant_dir = tally.dominant();
    let total = tally.total();
    let strength = if total > 0.0 {
        let backing: f64 = votes
            .iter()
            .filter(|v| v.tier == tier && v.direction == dominant_dir)
            .map(|v| v.effective_weight * v.raw_confidence)
            .sum();
        (backing / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    TierSummary {
        dominant_dir,
        strength,
    }
}

/// Validate the risk context and classify the structure/timing conflict.
pub fn compute_conflict_policy(
    input: &ConflictInput<'_>,
    params: &ConflictParams,
) -> Result<ConflictResult, KernelError> {
    let global_entropy = ensure_unit("globalEntropy", input.global_entropy)?;
    let mc_p95_dd = ensure_unit("mcP95_DD", input.mc_p95_dd)?;

    let votes = &input.consensus.votes;
    let structure = tier_summary(votes, Tier::Structure);
    let tactical = tier_summary(votes, Tier::Tactical);
    let timing = tier_summary(votes, Tier::Timing);

    let relation = Relation::of(structure.dominant_dir, timing.dominant_dir);
    let disagreement = match relation {
        Relation::Aligned => 0.0,
        Relation::Partial => params.partial_disagreement,
        Relation::Opposed => 1.0,
    };
    let intensity = (structure.strength + timing.strength) / 2.0;
    let raw = disagreement * (params.divergence_floor + params.strength_slope * intensity);
    let amplification = 1.0
        + params.entropy_amplification * global_entropy
        + params.tail_risk_amplification * mc_p95_dd;
    let divergence_score = (raw * amplification).clamp(0.0, 1.0);

    let level = params.thresholds.classify(divergence_score);
    let aligned = relation == Relation::Aligned;
    let mode = match level {
        _ if aligned => ConflictMode::TrendFollow,
        ConflictLevel::None | ConflictLevel::Minor => ConflictMode::TrendFollow,
        ConflictLevel::Moderate | ConflictLevel::Major => ConflictMode::CounterTrend,
        ConflictLevel::Severe => ConflictMode::Wait,
    };
    let sizing_penalty = params.sizing_penalties.get(level);

    let mut explain = Vec::with_capacity(votes.len() + 4);
    for (name, summary) in [
        ("structure", &structure),
        ("tactical", &tactical),
        ("timing", &timing),
    ] {
        explain.push(format!(
            "{name}: {} (strength {:.2})",
            summary.dominant_dir.trade_label(),
            summary.strength
        ));
    }
    for v in votes {
        explain.push(describe_vote(v));
    }
    explain.push(format!(
        "divergence {:.2} = raw {:.2} x risk amplification {:.2} (entropy {:.2}, mcP95_DD {:.2})",
        divergence_score, raw, amplification, global_entropy, mc_p95_dd
    ));

    let recommendation = recommend(
        relation,
        level,
        structure.dominant_dir,
        timing.dominant_dir,
        sizing_penalty,
    );

    debug!(
        level = %level,
        mode = %mode,
        structure = structure.dominant_dir.trade_label(),
        timing = timing.dominant_dir.trade_label(),
        divergence = format!("{:.4}", divergence_score),
        "conflict policy computed"
    );

    Ok(ConflictResult {
        level,
        mode,
        sizing_penalty,
        structure_vs_timing: StructureVsTiming {
            aligned,
            structure_dir: structure.dominant_dir,
            timing_dir: timing.dominant_dir,
            divergence_score,
        },
        structure,
        tactical,
        timing,
        explain,
        recommendation,
    })
}

fn describe_vote(v: &Vote) -> String {
    let mut line = format!(
        "{} [{}]: {} conf {:.2} weight {:.3}",
        v.horizon,
        v.tier,
        v.direction.trade_label(),
        v.raw_confidence,
        v.effective_weight
    );
    if !v.penalties.is_empty() {
        let names: Vec<&str> = v.penalties.iter().map(|b| b.as_str()).collect();
        line.push_str(&format!(" penalised by {}", names.join(", ")));
    }
    line
}

fn recommend(
    relation: Relation,
    level: ConflictLevel,
    structure: Direction,
    timing: Direction,
    sizing_penalty: f64,
) -> String {
    let (s, t) = (structure.trade_label(), timing.trade_label());
    let cut = (sizing_penalty * 100.0).round();
    match (relation, level) {
        (Relation::Aligned, _) if structure == Direction::Flat => {
            "Structure and timing both HOLD: no directional edge on either side".to_string()
        }
        (Relation::Aligned, _) => {
            format!("Structure and timing aligned on {s}: trend-follow at full size")
        }
        (_, ConflictLevel::None) => {
            format!("Negligible divergence (structure {s} vs timing {t}): trend-follow")
        }
        (_, ConflictLevel::Minor) => format!(
            "Minor divergence (structure {s} vs timing {t}): trend-follow with size cut {cut}%"
        ),
        (_, ConflictLevel::Moderate) | (_, ConflictLevel::Major) => format!(
            "{level} conflict (structure {s} vs timing {t}): counter-trend only, size cut {cut}%"
        ),
        (_, ConflictLevel::Severe) => format!(
            "SEVERE conflict (structure {s} vs timing {t}): stand aside until tiers realign"
        ),
    }
}
