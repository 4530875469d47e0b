//! Uniform `{code, message, data}` response wrapper.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::gateway::RequestError;
use crate::transport::HttpResponse;

/// Application-level success code carried inside the envelope.
pub const SUCCESS_CODE: i64 = 200;

pub(crate) const HTTP_FALLBACK_MESSAGE: &str = "Request failed";
pub(crate) const APP_FALLBACK_MESSAGE: &str = "Error";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Human-readable message from a non-success body: `msg`, then `message`.
pub fn error_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    non_empty(parsed.msg).or_else(|| non_empty(parsed.message))
}

/// Classify a response and unwrap its payload.
///
/// HTTP success does not imply application success: the envelope `code` must
/// also equal [`SUCCESS_CODE`].
pub fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, RequestError> {
    if response.status == 401 {
        return Err(RequestError::Unauthorized);
    }

    if !response.is_success() {
        let message =
            error_message(&response.body).unwrap_or_else(|| HTTP_FALLBACK_MESSAGE.to_string());
        return Err(RequestError::Http {
            status: response.status,
            message,
        });
    }

    let envelope: Envelope = serde_json::from_slice(&response.body)
        .map_err(|e| RequestError::Decode(e.to_string()))?;

    if envelope.code != SUCCESS_CODE {
        return Err(RequestError::Application {
            code: envelope.code,
            message: non_empty(envelope.message)
                .unwrap_or_else(|| APP_FALLBACK_MESSAGE.to_string()),
        });
    }

    serde_json::from_value(envelope.data).map_err(|e| RequestError::Decode(e.to_string()))
}
