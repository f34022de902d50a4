// =============================================================================
// Kernel Configuration — every tunable constant of the decision kernel
// =============================================================================
//
// Weight tables, dead bands, penalty coefficients and severity thresholds all
// live here as named tables so they can be tuned and unit-tested apart from
// the reduction logic.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
//
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::horizon::{Horizon, Tier, BIAS_WEIGHTS, CONSENSUS_WEIGHTS, TIMING_HORIZONS, TIMING_WEIGHTS};
use crate::types::{Blocker, ConflictLevel};

/// Tolerance for "sums to 1".
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bias_weights() -> BTreeMap<Horizon, f64> {
    BIAS_WEIGHTS.into_iter().collect()
}

fn default_timing_weights() -> BTreeMap<Horizon, f64> {
    TIMING_WEIGHTS.into_iter().collect()
}

fn default_consensus_weights() -> BTreeMap<Horizon, f64> {
    CONSENSUS_WEIGHTS.into_iter().collect()
}

fn default_bias_epsilon() -> f64 {
    0.02
}

fn default_neutral_bias_factor() -> f64 {
    0.5
}

fn default_counter_trend_factor() -> f64 {
    0.3
}

fn default_entropy_penalty() -> f64 {
    0.5
}

fn default_tail_risk_penalty() -> f64 {
    0.5
}

fn default_blocker_penalties() -> BTreeMap<Blocker, f64> {
    [
        (Blocker::LowConfidence, 0.5),
        (Blocker::HighEntropy, 0.4),
        (Blocker::HighTailRisk, 0.3),
        (Blocker::LowSample, 0.3),
        (Blocker::InsufficientData, 1.0),
    ]
    .into_iter()
    .collect()
}

fn default_partial_disagreement() -> f64 {
    0.5
}

fn default_divergence_floor() -> f64 {
    0.25
}

fn default_strength_slope() -> f64 {
    0.5
}

fn default_entropy_amplification() -> f64 {
    0.25
}

fn default_tail_risk_amplification() -> f64 {
    0.25
}

fn default_consensus_curve() -> Vec<CurvePoint> {
    [(0.0, 0.0), (0.4, 0.25), (0.6, 0.6), (0.8, 0.9), (1.0, 1.0)]
        .into_iter()
        .map(|(score, multiplier)| CurvePoint { score, multiplier })
        .collect()
}

fn default_min_confidence() -> f64 {
    0.05
}

fn default_min_abs_return() -> f64 {
    0.015
}

fn default_max_entropy() -> f64 {
    0.8
}

fn default_max_tail_risk() -> f64 {
    0.55
}

fn default_min_sample() -> usize {
    5
}

fn default_full_sample() -> usize {
    10
}

fn default_top_k() -> usize {
    25
}

// =============================================================================
// Resolver parameters
// =============================================================================

/// Bias reduction over the STRUCTURE tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasParams {
    /// Per-horizon weights; must cover exactly 180d/365d and sum to 1.
    #[serde(default = "default_bias_weights")]
    pub weights: BTreeMap<Horizon, f64>,

    /// Dead band around zero inside which the bias is NEUTRAL.
    #[serde(default = "default_bias_epsilon")]
    pub epsilon: f64,
}

impl Default for BiasParams {
    fn default() -> Self {
        Self {
            weights: default_bias_weights(),
            epsilon: default_bias_epsilon(),
        }
    }
}

/// Timing reduction over 7d/14d/30d.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingParams {
    #[serde(default = "default_timing_weights")]
    pub weights: BTreeMap<Horizon, f64>,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            weights: default_timing_weights(),
        }
    }
}

/// Final-mode sizing factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingParams {
    /// Base multiplier scale when the structural bias is NEUTRAL (<= 0.5).
    #[serde(default = "default_neutral_bias_factor")]
    pub neutral_bias_factor: f64,

    /// Discount applied when trading against the structural bias (<= 0.3).
    #[serde(default = "default_counter_trend_factor")]
    pub counter_trend_factor: f64,

    /// k1 in `(1 - globalEntropy * k1)`.
    #[serde(default = "default_entropy_penalty")]
    pub entropy_penalty: f64,

    /// k2 in `(1 - mcP95_DD * k2)`.
    #[serde(default = "default_tail_risk_penalty")]
    pub tail_risk_penalty: f64,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            neutral_bias_factor: default_neutral_bias_factor(),
            counter_trend_factor: default_counter_trend_factor(),
            entropy_penalty: default_entropy_penalty(),
            tail_risk_penalty: default_tail_risk_penalty(),
        }
    }
}

// =============================================================================
// Consensus & conflict parameters
// =============================================================================

/// Flat vote aggregation over all six horizons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
    #[serde(default = "default_consensus_weights")]
    pub weights: BTreeMap<Horizon, f64>,

    /// Fractional weight cut per blocker, applied multiplicatively.
    #[serde(default = "default_blocker_penalties")]
    pub blocker_penalties: BTreeMap<Blocker, f64>,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            weights: default_consensus_weights(),
            blocker_penalties: default_blocker_penalties(),
        }
    }
}

/// Lower bounds of each severity bucket. NONE starts at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub minor: f64,
    pub moderate: f64,
    pub major: f64,
    pub severe: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            minor: 0.15,
            moderate: 0.35,
            major: 0.6,
            severe: 0.8,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, divergence: f64) -> ConflictLevel {
        if divergence >= self.severe {
            ConflictLevel::Severe
        } else if divergence >= self.major {
            ConflictLevel::Major
        } else if divergence >= self.moderate {
            ConflictLevel::Moderate
        } else if divergence >= self.minor {
            ConflictLevel::Minor
        } else {
            ConflictLevel::None
        }
    }
}

/// One value per conflict level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTable {
    pub none: f64,
    pub minor: f64,
    pub moderate: f64,
    pub major: f64,
    pub severe: f64,
}

impl Default for LevelTable {
    /// Default sizing penalties: 0 at NONE up to 1 at SEVERE.
    fn default() -> Self {
        Self {
            none: 0.0,
            minor: 0.15,
            moderate: 0.35,
            major: 0.6,
            severe: 1.0,
        }
    }
}

impl LevelTable {
    pub fn get(&self, level: ConflictLevel) -> f64 {
        match level {
            ConflictLevel::None => self.none,
            ConflictLevel::Minor => self.minor,
            ConflictLevel::Moderate => self.moderate,
            ConflictLevel::Major => self.major,
            ConflictLevel::Severe => self.severe,
        }
    }
}

/// Structure-vs-timing conflict classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictParams {
    #[serde(default)]
    pub thresholds: SeverityThresholds,

    #[serde(default)]
    pub sizing_penalties: LevelTable,

    /// Disagreement weight when exactly one tier is HOLD.
    #[serde(default = "default_partial_disagreement")]
    pub partial_disagreement: f64,

    /// Divergence of a disagreement between two zero-strength tiers.
    #[serde(default = "default_divergence_floor")]
    pub divergence_floor: f64,

    /// Extra divergence per unit of mean tier strength.
    #[serde(default = "default_strength_slope")]
    pub strength_slope: f64,

    /// Divergence amplification per unit of global entropy.
    #[serde(default = "default_entropy_amplification")]
    pub entropy_amplification: f64,

    /// Divergence amplification per unit of mcP95_DD.
    #[serde(default = "default_tail_risk_amplification")]
    pub tail_risk_amplification: f64,
}

impl Default for ConflictParams {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            sizing_penalties: LevelTable::default(),
            partial_disagreement: default_partial_disagreement(),
            divergence_floor: default_divergence_floor(),
            strength_slope: default_strength_slope(),
            entropy_amplification: default_entropy_amplification(),
            tail_risk_amplification: default_tail_risk_amplification(),
        }
    }
}

// =============================================================================
// Multiplier mapping
// =============================================================================

/// One breakpoint of the consensus-to-multiplier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub score: f64,
    pub multiplier: f64,
}

/// Sizing overlays reported next to the consensus and conflict results.
///
/// The conflict sizing multiplier is `1 - conflict.sizing_penalties[level]`,
/// so it has no table of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierParams {
    /// Breakpoints ascending in score from 0 to 1; linear in between.
    #[serde(default = "default_consensus_curve")]
    pub consensus_curve: Vec<CurvePoint>,
}

impl Default for MultiplierParams {
    fn default() -> Self {
        Self {
            consensus_curve: default_consensus_curve(),
        }
    }
}

// =============================================================================
// Signal derivation parameters
// =============================================================================

/// Thresholds for turning forward-return statistics into a `HorizonSignal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationParams {
    /// Below this confidence a horizon is HOLD and LOW_CONFIDENCE.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Mean forward return needed to call a direction.
    #[serde(default = "default_min_abs_return")]
    pub min_abs_return: f64,

    /// Entropy above which HIGH_ENTROPY is raised.
    #[serde(default = "default_max_entropy")]
    pub max_entropy: f64,

    /// p95 drawdown above which HIGH_TAIL_RISK is raised.
    #[serde(default = "default_max_tail_risk")]
    pub max_tail_risk: f64,

    /// Fewer effective matches than this raises LOW_SAMPLE.
    #[serde(default = "default_min_sample")]
    pub min_sample: usize,

    /// Effective matches at which the sample-size floor reaches 1.
    #[serde(default = "default_full_sample")]
    pub full_sample: usize,

    /// Matches the upstream engine is asked for per horizon.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for DerivationParams {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_abs_return: default_min_abs_return(),
            max_entropy: default_max_entropy(),
            max_tail_risk: default_max_tail_risk(),
            min_sample: default_min_sample(),
            full_sample: default_full_sample(),
            top_k: default_top_k(),
        }
    }
}

// =============================================================================
// KernelConfig
// =============================================================================

/// Top-level configuration of the decision kernel.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub bias: BiasParams,

    #[serde(default)]
    pub timing: TimingParams,

    #[serde(default)]
    pub sizing: SizingParams,

    #[serde(default)]
    pub consensus: ConsensusParams,

    #[serde(default)]
    pub conflict: ConflictParams,

    #[serde(default)]
    pub multipliers: MultiplierParams,

    #[serde(default)]
    pub derivation: DerivationParams,
}

impl KernelConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read kernel config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse kernel config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bias_epsilon = config.bias.epsilon,
            counter_trend_factor = config.sizing.counter_trend_factor,
            "kernel config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise kernel config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "kernel config saved (atomic)");
        Ok(())
    }

    /// Check every table for the shape the reducers rely on.
    pub fn validate(&self) -> Result<()> {
        check_weights("bias.weights", &self.bias.weights, Tier::Structure.horizons())?;
        ensure!(
            weight(&self.bias.weights, Horizon::D365) > weight(&self.bias.weights, Horizon::D180),
            "bias.weights: 365d must outweigh 180d"
        );
        ensure!(
            self.bias.epsilon.is_finite() && (0.0..1.0).contains(&self.bias.epsilon),
            "bias.epsilon must be in [0, 1)"
        );

        check_weights("timing.weights", &self.timing.weights, &TIMING_HORIZONS)?;
        let w30 = weight(&self.timing.weights, Horizon::D30);
        ensure!(
            TIMING_HORIZONS
                .iter()
                .filter(|h| **h != Horizon::D30)
                .all(|h| weight(&self.timing.weights, *h) < w30),
            "timing.weights: 30d must carry the largest weight"
        );

        let s = &self.sizing;
        ensure!(
            in_unit(s.neutral_bias_factor)
                && s.neutral_bias_factor > 0.0
                && s.neutral_bias_factor <= 0.5,
            "sizing.neutral_bias_factor must be in (0, 0.5]"
        );
        ensure!(
            in_unit(s.counter_trend_factor)
                && s.counter_trend_factor > 0.0
                && s.counter_trend_factor <= 0.3,
            "sizing.counter_trend_factor must be in (0, 0.3]"
        );
        for (name, k) in [
            ("sizing.entropy_penalty", s.entropy_penalty),
            ("sizing.tail_risk_penalty", s.tail_risk_penalty),
        ] {
            // 0 < k < 1: both risk factors stay positive and strictly decreasing.
            ensure!(
                k.is_finite() && k > 0.0 && k < 1.0,
                "{name} must be in (0, 1)"
            );
        }

        check_weights("consensus.weights", &self.consensus.weights, &Horizon::ALL)?;
        for blocker in Blocker::ALL {
            let p = self.consensus.blocker_penalties.get(&blocker).copied();
            ensure!(
                p.map(in_unit).unwrap_or(false),
                "consensus.blocker_penalties: {blocker} must be present and in [0, 1]"
            );
        }

        let c = &self.conflict;
        let t = &c.thresholds;
        ensure!(
            0.0 < t.minor && t.minor < t.moderate && t.moderate < t.major && t.major < t.severe
                && t.severe <= 1.0,
            "conflict.thresholds must be strictly ascending within (0, 1]"
        );
        let penalties: Vec<f64> = ConflictLevel::ALL
            .iter()
            .map(|l| c.sizing_penalties.get(*l))
            .collect();
        ensure!(
            penalties.iter().all(|p| in_unit(*p))
                && penalties.windows(2).all(|w| w[0] <= w[1])
                && penalties[0] == 0.0
                && penalties[penalties.len() - 1] == 1.0,
            "conflict.sizing_penalties must rise from 0 at NONE to 1 at SEVERE"
        );
        ensure!(
            in_unit(c.partial_disagreement),
            "conflict.partial_disagreement must be in [0, 1]"
        );
        ensure!(
            in_unit(c.divergence_floor)
                && in_unit(c.strength_slope)
                && c.divergence_floor + c.strength_slope <= 1.0,
            "conflict.divergence_floor + conflict.strength_slope must stay within [0, 1]"
        );
        ensure!(
            c.entropy_amplification.is_finite()
                && c.entropy_amplification >= 0.0
                && c.tail_risk_amplification.is_finite()
                && c.tail_risk_amplification >= 0.0,
            "conflict amplification coefficients must be non-negative"
        );

        let curve = &self.multipliers.consensus_curve;
        ensure!(
            curve.len() >= 2
                && curve.first().map(|p| p.score) == Some(0.0)
                && curve.last().map(|p| p.score) == Some(1.0),
            "multipliers.consensus_curve must span scores 0 to 1"
        );
        ensure!(
            curve.iter().all(|p| in_unit(p.multiplier))
                && curve
                    .windows(2)
                    .all(|w| w[0].score < w[1].score && w[0].multiplier <= w[1].multiplier),
            "multipliers.consensus_curve must ascend in score and never fall in multiplier"
        );

        let d = &self.derivation;
        ensure!(
            in_unit(d.min_confidence) && in_unit(d.max_entropy) && in_unit(d.max_tail_risk),
            "derivation thresholds must be in [0, 1]"
        );
        ensure!(
            d.full_sample > 0 && d.top_k > 0,
            "derivation.full_sample and derivation.top_k must be positive"
        );

        Ok(())
    }
}

fn in_unit(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

/// Weight of `horizon` in a table, 0.0 when absent.
pub fn weight(table: &BTreeMap<Horizon, f64>, horizon: Horizon) -> f64 {
    table.get(&horizon).copied().unwrap_or(0.0)
}

fn check_weights(name: &str, table: &BTreeMap<Horizon, f64>, expected: &[Horizon]) -> Result<()> {
    ensure!(
        table.len() == expected.len() && expected.iter().all(|h| table.contains_key(h)),
        "{name} must cover exactly {:?}",
        expected.iter().map(|h| h.as_str()).collect::<Vec<_>>()
    );
    ensure!(
        table.values().all(|w| w.is_finite() && *w >= 0.0),
        "{name} must be non-negative"
    );
    let sum: f64 = table.values().sum();
    ensure!(
        (sum - 1.0).abs() < WEIGHT_SUM_TOLERANCE,
        "{name} must sum to 1 (got {sum})"
    );
    Ok(())
}
