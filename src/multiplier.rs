// =============================================================================
// Multiplier Mapping — consensus score and conflict level to sizing factors
// =============================================================================
//
// Pure lookup helpers used by reports and downstream sizing. Both are
// monotone over a validated config: more agreement never sizes down, more
// conflict never sizes up.

use crate::config::{CurvePoint, LevelTable};
use crate::types::ConflictLevel;

/// Map a consensus score in [0, 1] to a size multiplier in [0, 1] along
/// `curve`, linear between breakpoints. Out-of-range and NaN scores are
/// clamped to the curve ends.
pub fn consensus_to_multiplier(score: f64, curve: &[CurvePoint]) -> f64 {
    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };

    let (first, last) = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 0.0,
    };
    if score <= first.score {
        return first.multiplier.clamp(0.0, 1.0);
    }

    for pair in curve.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        if score <= p1.score {
            let span = p1.score - p0.score;
            let t = if span > 0.0 { (score - p0.score) / span } else { 1.0 };
            return (p0.multiplier + t * (p1.multiplier - p0.multiplier)).clamp(0.0, 1.0);
        }
    }
    last.multiplier.clamp(0.0, 1.0)
}

/// `1 - sizing_penalties[level]`: the share of size the conflict policy keeps.
pub fn conflict_to_sizing_multiplier(level: ConflictLevel, sizing_penalties: &LevelTable) -> f64 {
    (1.0 - sizing_penalties.get(level)).clamp(0.0, 1.0)
}
