// =============================================================================
// Decision Envelope — Auditable record of every kernel evaluation
// =============================================================================
//
// The kernel report is a pure function of its input. Identity and wall-clock
// time are attached here, outside the report, so that two evaluations of the
// same input still compare equal once the envelope is stripped.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::kernel::KernelReport;

/// Version of the report contract carried in every envelope.
pub const CONTRACT_VERSION: &str = "hierarchical-kernel/1";

/// Complete auditable record of one instrument's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEnvelope {
    /// Unique identifier for this decision (UUID v4).
    pub id: String,

    /// Instrument the decision pertains to.
    pub symbol: String,

    /// RFC 3339 timestamp of when this envelope was created.
    pub created_at: String,

    pub contract_version: String,

    pub report: KernelReport,
}

impl DecisionEnvelope {
    pub fn new(symbol: impl Into<String>, report: KernelReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            contract_version: CONTRACT_VERSION.to_string(),
            report,
        }
    }

    /// One-line summary for audit logs.
    pub fn summary(&self) -> String {
        let f = &self.report.resolver.final_decision;
        format!(
            "{} {} {} size {:.3} ({})",
            self.symbol,
            f.action.trade_label(),
            f.mode,
            f.size_multiplier,
            f.reason
        )
    }
}
