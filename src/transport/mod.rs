//! Translation of queued actions into remote API calls.
//!
//! Each `(domain, action)` pair maps onto exactly one endpoint; the request
//! body is always the action payload verbatim. Pairs this build does not
//! know about fail translation, which the sync engine treats like any other
//! failed attempt.

mod http;

pub use http::HttpRemoteApi;

use async_trait::async_trait;
use thiserror::Error;

use crate::queue::{ActionDomain, QueuedAction};

/// HTTP method for a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        };
        write!(f, "{s}")
    }
}

/// A concrete remote call derived from a queued action.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: serde_json::Value,
}

/// Failure to map a `(domain, action)` pair onto the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("no endpoint for {domain} action \"{action}\"")]
    UnknownAction { domain: ActionDomain, action: String },

    #[error("report update payload is missing a string \"id\" field")]
    MissingReportId,
}

impl RemoteRequest {
    /// Map a queued action onto its endpoint.
    pub fn for_action(action: &QueuedAction) -> Result<Self, TranslateError> {
        let (method, path) = match (action.domain, action.action.as_str()) {
            (ActionDomain::Report, "create") => (HttpMethod::Post, "/api/reports".to_string()),
            (ActionDomain::Report, "update") => {
                let report_id = action
                    .payload
                    .get("id")
                    .and_then(|id| id.as_str())
                    .ok_or(TranslateError::MissingReportId)?;
                (HttpMethod::Put, format!("/api/reports/{report_id}"))
            }
            (ActionDomain::Parking, "start") => {
                (HttpMethod::Post, "/api/parking/start".to_string())
            }
            (ActionDomain::Parking, "extend") => {
                (HttpMethod::Post, "/api/parking/extend".to_string())
            }
            (ActionDomain::Wallet, "topup") => (HttpMethod::Post, "/api/wallet/topup".to_string()),
            (domain, other) => {
                return Err(TranslateError::UnknownAction {
                    domain,
                    action: other.to_string(),
                })
            }
        };

        Ok(Self {
            method,
            path,
            body: action.payload.clone(),
        })
    }
}

/// Errors from issuing a remote call.
#[derive(Debug, Error)]
pub enum SendError {
    /// The server answered with a non-2xx status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The call never produced a response (DNS, connect, timeout, ...)
    #[error("{0}")]
    Transport(String),
}

/// Remote API surface the sync engine replays against.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one client is shared by every
/// drain pass.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Issue one call. Any 2xx response is success.
    async fn execute(&self, request: RemoteRequest) -> Result<(), SendError>;
}
