//! Normalized error for failed Hex API calls

use serde::Serialize;
use serde_json::Value;

/// A non-2xx response from the Hex API.
///
/// `details` holds the parsed JSON body when the API sent one, otherwise the
/// raw body text. The API gives no retry hints and none are tracked here.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("Hex API Error {status_code}: {message}{}", details_suffix(.details))]
pub struct HexApiError {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HexApiError {
    /// Build an error from a status line and the raw response body
    pub fn from_body(status_code: u16, message: impl Into<String>, body: &str) -> Self {
        let details = if body.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(body)
                    .unwrap_or_else(|_| Value::String(body.to_string())),
            )
        };
        Self {
            status_code,
            message: message.into(),
            details,
        }
    }
}

fn details_suffix(details: &Option<Value>) -> String {
    details
        .as_ref()
        .map(|d| format!(" - {}", d))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_details() {
        let err = HexApiError::from_body(404, "Not Found", r#"{"error":"not found"}"#);
        assert_eq!(err.details, Some(json!({"error": "not found"})));
        assert_eq!(err.status_code, 404);
        assert_eq!(
            err.to_string(),
            r#"Hex API Error 404: Not Found - {"error":"not found"}"#
        );
    }

    #[test]
    fn test_text_details() {
        let err = HexApiError::from_body(502, "Bad Gateway", "upstream timed out");
        assert_eq!(err.details, Some(json!("upstream timed out")));
        assert_eq!(
            err.to_string(),
            r#"Hex API Error 502: Bad Gateway - "upstream timed out""#
        );
    }

    #[test]
    fn test_empty_body_has_no_details() {
        let err = HexApiError::from_body(500, "Internal Server Error", "");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Hex API Error 500: Internal Server Error");
    }
}
