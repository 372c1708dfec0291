//! Turns an extraction outcome into a verification verdict.
//!
//! Combines the tier thresholds with the identity check. A tier is only ever
//! assigned when a score was read and the handle did not contradict the
//! expected account.

pub mod identity;
pub mod tier;

pub use identity::check_identity;
pub use tier::{tier_for, Tier, TIER_ROLE_NAMES};

use serde::{Deserialize, Serialize};

use crate::extract::{ExtractionOutcome, Source};

/// Verdict for one verification attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub outcome: ExtractionOutcome,
    pub tier: Tier,
    pub identity_mismatch: Option<String>,
}

impl VerificationResult {
    pub fn new(outcome: ExtractionOutcome, expected_handle: &str) -> Self {
        let identity_mismatch = check_identity(outcome.handle.as_deref(), expected_handle);
        let tier = match (&outcome.score, &identity_mismatch) {
            (Some(score), None) => tier_for(outcome.source, score),
            _ => Tier::None,
        };
        Self {
            outcome,
            tier,
            identity_mismatch,
        }
    }

    /// Deterministic user-facing summary of the verdict.
    pub fn message(&self) -> String {
        if let Some(mismatch) = &self.identity_mismatch {
            return format!(
                "Identity Mismatch: {}. This screenshot does not belong to your linked account.",
                mismatch
            );
        }
        match &self.outcome.score {
            Some(score) => {
                let mut msg = format!(
                    "Verification Successful: found {} score {}",
                    self.outcome.source, score
                );
                if let Some(role) = self.tier.role_name() {
                    msg.push_str(&format!(" (role: {})", role));
                }
                msg
            }
            None => format!(
                "Verification Failed: could not detect a {} score. Please ensure the image is clear and uncropped.",
                self.outcome.source
            ),
        }
    }

    pub fn to_record(&self) -> VerificationRecord {
        VerificationRecord {
            source: self.outcome.source,
            score: self.outcome.score.clone(),
            role_assigned: self.tier.role_name().map(str::to_string),
            handle: self.outcome.handle.clone(),
            identity_mismatch: self.identity_mismatch.clone(),
            used_fast_path: self.outcome.used_fast_path,
        }
    }
}

/// Flat, storable form of a verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub source: Source,
    pub score: Option<String>,
    pub role_assigned: Option<String>,
    pub handle: Option<String>,
    pub identity_mismatch: Option<String>,
    pub used_fast_path: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(source: Source, score: Option<&str>, handle: Option<&str>) -> ExtractionOutcome {
        ExtractionOutcome {
            source,
            score: score.map(str::to_string),
            handle: handle.map(str::to_string),
            used_fast_path: false,
        }
    }

    #[test]
    fn test_matching_handle_gets_tier() {
        let result = VerificationResult::new(
            outcome(Source::Wallchain, Some("287"), Some("alice")),
            "alice",
        );
        assert_eq!(result.tier, Tier::Amplifier);
        assert_eq!(result.identity_mismatch, None);
    }

    #[test]
    fn test_mismatch_forces_no_tier() {
        let result = VerificationResult::new(
            outcome(Source::Kaito, Some("5000"), Some("alice")),
            "bob",
        );
        assert_eq!(result.tier, Tier::None);
        assert!(result.identity_mismatch.is_some());
        assert!(result.message().starts_with("Identity Mismatch"));
    }

    #[test]
    fn test_missing_handle_still_tiers() {
        let result = VerificationResult::new(outcome(Source::Kaito, Some("5000"), None), "bob");
        assert_eq!(result.tier, Tier::Top);
    }

    #[test]
    fn test_missing_score_message() {
        let result = VerificationResult::new(outcome(Source::Cookie, None, Some("alice")), "alice");
        assert_eq!(result.tier, Tier::None);
        assert_eq!(
            result.message(),
            "Verification Failed: could not detect a Cookie score. Please ensure the image is clear and uncropped."
        );
    }

    #[test]
    fn test_success_message_and_record() {
        let result = VerificationResult::new(
            outcome(Source::Wallchain, Some("287"), Some("alice")),
            "alice",
        );
        assert_eq!(
            result.message(),
            "Verification Successful: found Wallchain score 287 (role: Signal Amplifier)"
        );

        let record = result.to_record();
        assert_eq!(record.role_assigned.as_deref(), Some("Signal Amplifier"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "Wallchain");
        assert_eq!(json["score"], "287");
    }
}
