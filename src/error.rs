//! Input-contract errors of the decision kernel.
//!
//! The kernel is arithmetic over validated inputs, so these are the only
//! failures it reports. Everything else (all-HOLD, all-blocked, opposed
//! tiers) has a defined, non-error output.

use thiserror::Error;

use crate::horizon::Horizon;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A required horizon is absent. Never defaulted.
    #[error("missing horizon signal for {horizon}")]
    MissingHorizon { horizon: Horizon },

    /// A received scalar lies outside its declared domain (or is not finite).
    #[error("{field} = {value} is outside its valid range")]
    InvalidRange { field: String, value: f64 },
}

impl KernelError {
    pub(crate) fn invalid(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidRange {
            field: field.into(),
            value,
        }
    }
}

/// Check a received scalar lies in `[0, 1]`. Never clamps.
pub(crate) fn ensure_unit(field: impl Into<String>, value: f64) -> Result<f64, KernelError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(KernelError::invalid(field, value))
    }
}

/// Check a received signed scalar is finite.
pub(crate) fn ensure_finite(field: impl Into<String>, value: f64) -> Result<f64, KernelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KernelError::invalid(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_range_bounds_are_inclusive() {
        assert!(ensure_unit("x", 0.0).is_ok());
        assert!(ensure_unit("x", 1.0).is_ok());
        assert!(ensure_unit("x", 1.000_001).is_err());
        assert!(ensure_unit("x", -0.1).is_err());
        assert!(ensure_unit("x", f64::NAN).is_err());
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ensure_unit("globalEntropy", 1.5).unwrap_err();
        assert_eq!(err.to_string(), "globalEntropy = 1.5 is outside its valid range");
        let err = KernelError::MissingHorizon {
            horizon: Horizon::D90,
        };
        assert_eq!(err.to_string(), "missing horizon signal for 90d");
    }
}
