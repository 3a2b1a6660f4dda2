//! Classification of verdicts into the final Deliverable/Undeliverable split.
//!
//! [`classify`] is the only place a [`Classification`] is assigned. Rules are
//! evaluated in order and the first match wins:
//!
//! | verdict                                   | classification | reason             |
//! |-------------------------------------------|----------------|--------------------|
//! | malformed address                         | Undeliverable  | `invalid-syntax`   |
//! | `deliverable`                             | Deliverable    | service reason     |
//! | `undeliverable`                           | Undeliverable  | service reason     |
//! | `risky` (any flags)                       | Undeliverable  | `risky`            |
//! | `unknown`, retries exhausted, bad response| Undeliverable  | `validation-error` |

use crate::types::{Classification, ClassifiedRecord, ServiceCategory, Verdict};

pub const REASON_INVALID_SYNTAX: &str = "invalid-syntax";
pub const REASON_RISKY: &str = "risky";
pub const REASON_VALIDATION_ERROR: &str = "validation-error";
/// Used when the service marks an address undeliverable without a reason
pub const REASON_UNDELIVERABLE: &str = "undeliverable";

/// Resolve one address.
///
/// `attempts` is the number of verification calls made for the address.
#[must_use]
pub fn classify(address: impl Into<String>, verdict: &Verdict, attempts: u32) -> ClassifiedRecord {
    let (classification, reason) = match verdict {
        Verdict::InvalidSyntax => (Classification::Undeliverable, REASON_INVALID_SYNTAX.to_string()),
        Verdict::Verified(outcome) => match outcome.category {
            ServiceCategory::Deliverable => (
                Classification::Deliverable,
                outcome.reason.clone().unwrap_or_default(),
            ),
            ServiceCategory::Undeliverable => (
                Classification::Undeliverable,
                outcome
                    .reason
                    .clone()
                    .unwrap_or_else(|| REASON_UNDELIVERABLE.to_string()),
            ),
            ServiceCategory::Risky => (Classification::Undeliverable, REASON_RISKY.to_string()),
            ServiceCategory::Unknown => (
                Classification::Undeliverable,
                REASON_VALIDATION_ERROR.to_string(),
            ),
        },
        Verdict::RetriesExhausted(_) | Verdict::MalformedResponse(_) => (
            Classification::Undeliverable,
            REASON_VALIDATION_ERROR.to_string(),
        ),
    };

    ClassifiedRecord {
        address: address.into(),
        classification,
        reason,
        attempts,
    }
}
