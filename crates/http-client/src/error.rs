use serde_json::Value;

/// Classified failure of a call to the song-similarity service.
///
/// Transport exceptions never escape the client raw; every call fails with
/// one of these so callers can apply one recovery policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{}", service_message(.status, .detail))]
    Service { status: u16, detail: Option<String> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("query must not be empty")]
    EmptyQuery,
}

impl RequestError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to the user. Prefers the service's own
    /// detail message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Service {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

fn service_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("service error (HTTP {status}): {detail}"),
        None => format!("service error (HTTP {status})"),
    }
}

/// Pulls a human-readable reason out of an error body.
///
/// Understands `{"detail": ...}` and `{"message": ...}` bodies and falls
/// back to the raw text.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
                Some(Value::Null) | None => continue,
                Some(Value::String(_)) => continue,
                Some(other) => return Some(other.to_string()),
            }
        }
    }

    Some(body.to_string())
}

pub type Result<T> = std::result::Result<T, RequestError>;
