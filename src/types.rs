// =============================================================================
// Shared types used across the decision kernel
// =============================================================================
//
// Every call site speaks its own direction vocabulary for the same tri-state
// concept:
//
//   resolver input   LONG  / SHORT / HOLD
//   trade decision   BUY   / SELL  / HOLD
//   structural bias  BULL  / BEAR  / NEUTRAL
//   timing action    ENTER / EXIT  / WAIT
//
// Internally there is one `Direction`. The vocabularies only exist at the
// serde boundary (`#[serde(with = "crate::types::trade")]` etc.).
// =============================================================================

use serde::{Deserialize, Serialize};

// =============================================================================
// Direction
// =============================================================================

/// Canonical tri-state direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Flat
    }
}

impl Direction {
    /// +1.0, -1.0 or 0.0.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
            Self::Flat => 0.0,
        }
    }

    /// Classify a signed score with a symmetric dead band of `epsilon`.
    pub fn from_score(score: f64, epsilon: f64) -> Self {
        if score > epsilon {
            Self::Up
        } else if score < -epsilon {
            Self::Down
        } else {
            Self::Flat
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Flat => Self::Flat,
        }
    }

    pub fn is_directional(self) -> bool {
        self != Self::Flat
    }

    /// Label of this direction in the given vocabulary.
    pub fn label(self, vocab: &Vocabulary) -> &'static str {
        match self {
            Self::Up => vocab.up,
            Self::Down => vocab.down,
            Self::Flat => vocab.flat,
        }
    }

    /// Parse a label of the given vocabulary (case-sensitive).
    pub fn parse(label: &str, vocab: &Vocabulary) -> Option<Self> {
        if label == vocab.up {
            Some(Self::Up)
        } else if label == vocab.down {
            Some(Self::Down)
        } else if label == vocab.flat {
            Some(Self::Flat)
        } else {
            None
        }
    }

    pub fn position_label(self) -> &'static str {
        self.label(&POSITION)
    }

    pub fn trade_label(self) -> &'static str {
        self.label(&TRADE)
    }

    pub fn bias_label(self) -> &'static str {
        self.label(&BIAS)
    }

    pub fn timing_label(self) -> &'static str {
        self.label(&TIMING)
    }
}

/// Names used for `Up` / `Down` / `Flat` at one call site.
#[derive(Debug)]
pub struct Vocabulary {
    pub up: &'static str,
    pub down: &'static str,
    pub flat: &'static str,
}

pub const POSITION: Vocabulary = Vocabulary {
    up: "LONG",
    down: "SHORT",
    flat: "HOLD",
};

pub const TRADE: Vocabulary = Vocabulary {
    up: "BUY",
    down: "SELL",
    flat: "HOLD",
};

pub const BIAS: Vocabulary = Vocabulary {
    up: "BULL",
    down: "BEAR",
    flat: "NEUTRAL",
};

pub const TIMING: Vocabulary = Vocabulary {
    up: "ENTER",
    down: "EXIT",
    flat: "WAIT",
};

/// Generates a `serde(with = ...)` module that writes `Direction` in one
/// vocabulary and reads any of the listed vocabularies.
macro_rules! direction_serde {
    ($name:ident, $write:ident, [$($read:ident),+]) => {
        pub mod $name {
            use super::*;

            pub fn serialize<S>(dir: &Direction, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(dir.label(&$write))
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<Direction, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                let label = raw.trim().to_uppercase();
                $(
                    if let Some(dir) = Direction::parse(&label, &$read) {
                        return Ok(dir);
                    }
                )+
                Err(serde::de::Error::custom(format!(
                    "unknown direction label '{}' (expected {}/{}/{})",
                    raw, $write.up, $write.down, $write.flat
                )))
            }
        }
    };
}

// LONG<->BUY and SHORT<->SELL are the same signal, so signal inputs accept
// either vocabulary.
direction_serde!(position, POSITION, [POSITION, TRADE, BIAS]);
direction_serde!(trade, TRADE, [TRADE, POSITION, BIAS]);
direction_serde!(bias, BIAS, [BIAS]);
direction_serde!(timing, TIMING, [TIMING]);

// =============================================================================
// Blockers
// =============================================================================

/// A named condition that invalidates a horizon's signal for decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Blocker {
    LowConfidence,
    HighEntropy,
    HighTailRisk,
    LowSample,
    InsufficientData,
}

impl Blocker {
    pub const ALL: [Blocker; 5] = [
        Self::LowConfidence,
        Self::HighEntropy,
        Self::HighTailRisk,
        Self::LowSample,
        Self::InsufficientData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowConfidence => "LOW_CONFIDENCE",
            Self::HighEntropy => "HIGH_ENTROPY",
            Self::HighTailRisk => "HIGH_TAIL_RISK",
            Self::LowSample => "LOW_SAMPLE",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl std::fmt::Display for Blocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Modes & severity
// =============================================================================

/// Trade mode chosen by the hierarchical resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeMode {
    TrendFollow,
    CounterTrend,
    Hold,
}

impl std::fmt::Display for TradeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrendFollow => write!(f, "TREND_FOLLOW"),
            Self::CounterTrend => write!(f, "COUNTER_TREND"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Mode recommended by the conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictMode {
    TrendFollow,
    CounterTrend,
    Wait,
}

impl std::fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrendFollow => write!(f, "TREND_FOLLOW"),
            Self::CounterTrend => write!(f, "COUNTER_TREND"),
            Self::Wait => write!(f, "WAIT"),
        }
    }
}

/// Severity of the structure-vs-timing disagreement, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictLevel {
    None,
    Minor,
    Moderate,
    Major,
    Severe,
}

impl ConflictLevel {
    pub const ALL: [ConflictLevel; 5] = [
        Self::None,
        Self::Minor,
        Self::Moderate,
        Self::Major,
        Self::Severe,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ConflictLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Minor => write!(f, "MINOR"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Major => write!(f, "MAJOR"),
            Self::Severe => write!(f, "SEVERE"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapped {
        #[serde(with = "position")]
        dir: Direction,
    }

    #[test]
    fn labels_per_vocabulary() {
        assert_eq!(Direction::Up.position_label(), "LONG");
        assert_eq!(Direction::Up.trade_label(), "BUY");
        assert_eq!(Direction::Down.bias_label(), "BEAR");
        assert_eq!(Direction::Flat.timing_label(), "WAIT");
    }

    #[test]
    fn position_reads_trade_vocabulary() {
        let w: Wrapped = serde_json::from_str(r#"{"dir":"SELL"}"#).unwrap();
        assert_eq!(w.dir, Direction::Down);
        let w: Wrapped = serde_json::from_str(r#"{"dir":"long"}"#).unwrap();
        assert_eq!(w.dir, Direction::Up);
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"dir":"LONG"}"#);
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert!(serde_json::from_str::<Wrapped>(r#"{"dir":"MAYBE"}"#).is_err());
    }

    #[test]
    fn from_score_dead_band() {
        assert_eq!(Direction::from_score(0.03, 0.02), Direction::Up);
        assert_eq!(Direction::from_score(-0.03, 0.02), Direction::Down);
        assert_eq!(Direction::from_score(0.02, 0.02), Direction::Flat);
        assert_eq!(Direction::from_score(-0.0, 0.0), Direction::Flat);
    }

    #[test]
    fn blocker_and_level_serde_names() {
        assert_eq!(
            serde_json::to_string(&Blocker::HighTailRisk).unwrap(),
            r#""HIGH_TAIL_RISK""#
        );
        assert_eq!(
            serde_json::to_string(&ConflictLevel::Severe).unwrap(),
            r#""SEVERE""#
        );
        assert!(ConflictLevel::Minor < ConflictLevel::Major);
        assert_eq!(TradeMode::CounterTrend.to_string(), "COUNTER_TREND");
    }
}
