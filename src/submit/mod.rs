//! Remote submission contract
//!
//! A submitter classifies every delivery attempt as exactly one of
//! accepted, rejected (permanent) or deferred (transient). Outcomes are
//! values, never errors: the flusher decides what to do with the entry
//! purely from the variant.

pub mod pagerduty;

pub use pagerduty::PagerDutyClient;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Durably recorded by the remote side
    Accepted { incident_key: String },
    /// Understood and refused; retrying cannot succeed
    Rejected { reason: String },
    /// Could not complete for a presumably transient reason
    Deferred { reason: String },
}

impl SubmitOutcome {
    pub fn accepted(incident_key: impl Into<String>) -> Self {
        Self::Accepted {
            incident_key: incident_key.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected { reason: reason.into() }
    }

    pub fn deferred(reason: impl Into<String>) -> Self {
        Self::Deferred { reason: reason.into() }
    }

    /// Whether the entry must stay queued for a later pass
    #[cfg(test)]
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

/// Delivers one serialized event
pub trait Submitter: Send + Sync {
    fn submit(&self, payload: &str) -> SubmitOutcome;
}
