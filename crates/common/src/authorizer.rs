//! Payloads exchanged with the API gateway's simple-response authorizer contract.
//!
//! The gateway sends the request headers and expects a single boolean back.
//! Everything else in the gateway event is ignored, so only `headers` is
//! modelled; unknown fields are skipped during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authorizer invocation payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizerRequest {
    /// Request headers as forwarded by the gateway. The gateway lower-cases
    /// header names; the field may be missing or `null` when there are none.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

impl AuthorizerRequest {
    /// Build a request from header pairs.
    pub fn with_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: Some(
                headers
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_ref()?;

        if let Some(value) = headers.get(name) {
            return Some(value.as_str());
        }

        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Authorizer result returned to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerResponse {
    #[serde(rename = "isAuthorized")]
    pub is_authorized: bool,
}

impl AuthorizerResponse {
    /// Let the request through.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            is_authorized: true,
        }
    }

    /// Reject the request.
    #[must_use]
    pub const fn deny() -> Self {
        Self {
            is_authorized: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization_ignores_other_fields() {
        let json = r#"{
            "version": "2.0",
            "type": "REQUEST",
            "routeArn": "arn:aws:execute-api:eu-central-1:123:api/$default/GET/gates",
            "headers": {"authorization": "Bearer abc", "x-verify-origin": "value"},
            "requestContext": {"http": {"method": "GET"}}
        }"#;

        let request: AuthorizerRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("x-verify-origin"), Some("value"));
    }

    #[test]
    fn test_request_deserialization_without_headers() {
        let request: AuthorizerRequest = serde_json::from_str("{}").unwrap();
        assert!(request.headers.is_none());
        assert_eq!(request.header("authorization"), None);

        let request: AuthorizerRequest = serde_json::from_str(r#"{"headers": null}"#).unwrap();
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = AuthorizerRequest::with_headers([("Authorization", "Bearer abc")]);
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(request.header("x-other"), None);
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_value(AuthorizerResponse::allow()).unwrap();
        assert_eq!(json, serde_json::json!({"isAuthorized": true}));

        let json = serde_json::to_value(AuthorizerResponse::deny()).unwrap();
        assert_eq!(json, serde_json::json!({"isAuthorized": false}));
    }
}
