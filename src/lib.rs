// =============================================================================
// Fractal Decision Kernel
// =============================================================================
//
// Converts six horizon-level signals (7d .. 365d) into trading decisions
// through three independent engines:
//   - resolver:  hierarchical bias / timing / final mode
//   - consensus: symmetric weighted vote
//   - conflict:  structure-vs-timing severity and sizing penalty
// =============================================================================

pub mod batch;
pub mod config;
pub mod conflict;
pub mod consensus;
pub mod decision_envelope;
pub mod derive;
pub mod error;
pub mod horizon;
pub mod kernel;
pub mod multiplier;
pub mod resolver;
pub mod signal;
pub mod types;

pub use config::KernelConfig;
pub use conflict::{compute_conflict_policy, ConflictInput, ConflictResult};
pub use consensus::{compute_consensus, ConsensusResult};
pub use decision_envelope::DecisionEnvelope;
pub use derive::{build_resolve_input, derive_signal, HorizonStats};
pub use error::KernelError;
pub use horizon::{Horizon, Tier};
pub use kernel::{DecisionKernel, KernelReport};
pub use multiplier::{conflict_to_sizing_multiplier, consensus_to_multiplier};
pub use resolver::{resolve, ResolveResult};
pub use signal::{HorizonMap, HorizonSignal, ResolveInput};
pub use types::{Blocker, ConflictLevel, ConflictMode, Direction, TradeMode};
