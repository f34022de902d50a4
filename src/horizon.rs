// =============================================================================
// Horizons & Tiers — static lookup tables
// =============================================================================
//
//   TIMING     7d, 14d     entry / exit
//   TACTICAL   30d, 90d    medium-term confirmation
//   STRUCTURE  180d, 365d  long-term regime
//
// Tier membership never changes at runtime. The weight tables below are the
// defaults for `KernelConfig`; the reducers read weights from the config.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Forward-looking window over which a directional forecast is made.
///
/// Declaration order is horizon length, so `Ord` sorts shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "14d")]
    D14,
    #[serde(rename = "30d")]
    D30,
    #[serde(rename = "90d")]
    D90,
    #[serde(rename = "180d")]
    D180,
    #[serde(rename = "365d")]
    D365,
}

impl Horizon {
    pub const ALL: [Horizon; 6] = [
        Self::D7,
        Self::D14,
        Self::D30,
        Self::D90,
        Self::D180,
        Self::D365,
    ];

    pub fn days(self) -> u32 {
        match self {
            Self::D7 => 7,
            Self::D14 => 14,
            Self::D30 => 30,
            Self::D90 => 90,
            Self::D180 => 180,
            Self::D365 => 365,
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            Self::D7 | Self::D14 => Tier::Timing,
            Self::D30 | Self::D90 => Tier::Tactical,
            Self::D180 | Self::D365 => Tier::Structure,
        }
    }

    /// Position in `Horizon::ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::D7 => "7d",
            Self::D14 => "14d",
            Self::D30 => "30d",
            Self::D90 => "90d",
            Self::D180 => "180d",
            Self::D365 => "365d",
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping of horizons by trading purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Timing,
    Tactical,
    Structure,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Timing, Self::Tactical, Self::Structure];

    pub fn horizons(self) -> &'static [Horizon] {
        match self {
            Self::Timing => &[Horizon::D7, Horizon::D14],
            Self::Tactical => &[Horizon::D30, Horizon::D90],
            Self::Structure => &[Horizon::D180, Horizon::D365],
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timing => write!(f, "TIMING"),
            Self::Tactical => write!(f, "TACTICAL"),
            Self::Structure => write!(f, "STRUCTURE"),
        }
    }
}

// =============================================================================
// Default weight tables
// =============================================================================

/// Bias reduction over STRUCTURE. The longer horizon dominates.
pub const BIAS_WEIGHTS: [(Horizon, f64); 2] = [(Horizon::D180, 0.4), (Horizon::D365, 0.6)];

/// Timing reduction over TIMING plus 30d, the primary actionable horizon.
pub const TIMING_WEIGHTS: [(Horizon, f64); 3] = [
    (Horizon::D7, 0.2),
    (Horizon::D14, 0.3),
    (Horizon::D30, 0.5),
];

/// Horizons the timing resolver reads, shortest first.
pub const TIMING_HORIZONS: [Horizon; 3] = [Horizon::D7, Horizon::D14, Horizon::D30];

/// Flat consensus vote weights over all six horizons.
pub const CONSENSUS_WEIGHTS: [(Horizon, f64); 6] = [
    (Horizon::D7, 0.10),
    (Horizon::D14, 0.15),
    (Horizon::D30, 0.25),
    (Horizon::D90, 0.20),
    (Horizon::D180, 0.15),
    (Horizon::D365, 0.15),
];
