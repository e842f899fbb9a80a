//! Error taxonomy
//!
//! Every failure is a value: submissions report a typed [`RejectReason`]
//! in-band on the result, and the remaining operations report plain
//! booleans. The `Display` strings are part of the client contract and
//! must not change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a submission is rejected before reaching the book
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    #[error("Instrument not found")]
    InstrumentNotFound,

    #[error("Instrument is halted")]
    InstrumentHalted,

    #[error("Risk limit exceeded")]
    RiskLimitExceeded,

    #[error("Invalid quantity")]
    InvalidQuantity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_literal_messages() {
        assert_eq!(
            RejectReason::InstrumentNotFound.to_string(),
            "Instrument not found"
        );
        assert_eq!(
            RejectReason::InstrumentHalted.to_string(),
            "Instrument is halted"
        );
        assert_eq!(
            RejectReason::RiskLimitExceeded.to_string(),
            "Risk limit exceeded"
        );
        assert_eq!(RejectReason::InvalidQuantity.to_string(), "Invalid quantity");
    }

    #[test]
    fn test_reject_reason_serialization() {
        let json = serde_json::to_string(&RejectReason::RiskLimitExceeded).unwrap();
        assert_eq!(json, "\"RISK_LIMIT_EXCEEDED\"");
    }
}
