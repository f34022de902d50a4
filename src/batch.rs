// =============================================================================
// Batch Scoring — evaluate many instruments on the blocking pool
// =============================================================================
//
// Each instrument carries either a ready `ResolveInput` or per-horizon
// matcher statistics. Instruments are scored independently; one bad
// instrument yields an error outcome and never aborts the batch. Outcomes
// come back in request order.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decision_envelope::DecisionEnvelope;
use crate::derive::HorizonStats;
use crate::horizon::Horizon;
use crate::kernel::DecisionKernel;
use crate::signal::ResolveInput;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub instruments: Vec<InstrumentRequest>,
}

impl BatchRequest {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let request: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;
        info!(
            path = %path.display(),
            instruments = request.instruments.len(),
            "Batch loaded"
        );
        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRequest {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ResolveInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_stats: Option<BTreeMap<Horizon, HorizonStats>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Scored(Box<DecisionEnvelope>),
    Failed { symbol: String, error: String },
}

impl BatchOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Scored(env) => &env.symbol,
            Self::Failed { symbol, .. } => symbol,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

/// Score one instrument synchronously.
pub fn score_instrument(kernel: &DecisionKernel, request: InstrumentRequest) -> BatchOutcome {
    let InstrumentRequest {
        symbol,
        input,
        forward_stats,
    } = request;

    let evaluated = match (input, forward_stats) {
        (Some(input), None) => kernel.evaluate(&input),
        (None, Some(stats)) => kernel.evaluate_stats(&stats),
        (Some(_), Some(_)) => {
            return BatchOutcome::Failed {
                symbol,
                error: "both input and forwardStats given; expected exactly one".to_string(),
            }
        }
        (None, None) => {
            return BatchOutcome::Failed {
                symbol,
                error: "neither input nor forwardStats given".to_string(),
            }
        }
    };

    match evaluated {
        Ok(report) => BatchOutcome::Scored(Box::new(DecisionEnvelope::new(symbol, report))),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "instrument rejected");
            BatchOutcome::Failed {
                symbol,
                error: e.to_string(),
            }
        }
    }
}

/// Score every instrument in parallel on the blocking pool.
pub async fn score_batch(
    kernel: Arc<DecisionKernel>,
    requests: Vec<InstrumentRequest>,
) -> Vec<BatchOutcome> {
    let mut handles = Vec::with_capacity(requests.len());
    for request in requests {
        let kernel = kernel.clone();
        let symbol = request.symbol.clone();
        let handle = tokio::task::spawn_blocking(move || score_instrument(&kernel, request));
        handles.push((symbol, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (symbol, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "scoring task failed");
                BatchOutcome::Failed {
                    symbol,
                    error: format!("scoring task failed: {e}"),
                }
            }
        };
        outcomes.push(outcome);
    }

    let scored = outcomes.iter().filter(|o| o.is_scored()).count();
    info!(
        scored,
        failed = outcomes.len() - scored,
        "Batch scored"
    );
    outcomes
}
