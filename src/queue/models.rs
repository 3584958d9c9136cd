//! Queued action data model.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random id suffix.
const ID_SUFFIX_LEN: usize = 9;

/// Domains a queued action can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionDomain {
    Report,
    Parking,
    Wallet,
}

impl std::fmt::Display for ActionDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Report => "report",
            Self::Parking => "parking",
            Self::Wallet => "wallet",
        };
        write!(f, "{s}")
    }
}

/// A user-initiated mutation captured for eventual replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Unique id assigned at enqueue time
    pub id: String,
    /// Domain the action belongs to
    #[serde(rename = "type")]
    pub domain: ActionDomain,
    /// Verb scoped within the domain ("create", "start", "topup", ...)
    pub action: String,
    /// Opaque request body, sent to the API verbatim
    pub payload: serde_json::Value,
    /// When the action was enqueued (diagnostics only)
    pub timestamp: DateTime<Utc>,
    /// Number of failed replay attempts so far
    pub retry_count: u32,
}

impl QueuedAction {
    /// Create a new pending action.
    pub fn new(domain: ActionDomain, action: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: generate_id(),
            domain,
            action: action.into(),
            payload,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }
}

/// Ids combine the enqueue instant with a random suffix so bursts of
/// enqueues within the same millisecond still get distinct ids.
fn generate_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
