//! API request and error types.

use serde::{Deserialize, Serialize};

use crate::sim::types::WateringMode;

/// Body of `POST /mode`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeRequest {
    pub mode: WateringMode,
}

/// Body of `POST /billing/reset`; omit `consumer` to reset every account.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetRequest {
    #[serde(default)]
    pub consumer: Option<String>,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reset_body_means_all() {
        let req: ResetRequest = serde_json::from_str("{}").unwrap();
        assert!(req.consumer.is_none());
    }

    #[test]
    fn mode_request_is_lowercase() {
        let req: ModeRequest = serde_json::from_str(r#"{"mode":"off"}"#).unwrap();
        assert_eq!(req.mode, WateringMode::Off);
        assert!(serde_json::from_str::<ModeRequest>(r#"{"mode":"drip"}"#).is_err());
    }
}
