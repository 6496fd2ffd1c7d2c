//! The `{ok, result, error_code, description, parameters}` wrapper around every
//! response.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use pollbot_core::{errors::Error, utils::truncate_text, Result};

use crate::types::ResponseParameters;

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

/// Decode a response body.
///
/// The whole envelope is parsed before anything looks at `ok`. A body that is
/// not an envelope is a [`Error::Decode`] regardless of `status`; an envelope
/// with `ok: false` is an [`Error::Api`] and `result` is never read.
pub fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T> {
    let env: Envelope = serde_json::from_slice(body).map_err(|e| {
        Error::Decode(format!(
            "malformed response envelope (http {status}): {e}: {}",
            truncate_text(&String::from_utf8_lossy(body), 200)
        ))
    })?;

    if !env.ok {
        let params = env.parameters.unwrap_or_default();
        return Err(Error::Api {
            code: env.error_code.unwrap_or(i64::from(status)),
            description: env
                .description
                .unwrap_or_else(|| "no description".to_string()),
            retry_after: params.retry_after,
            migrate_to_chat_id: params.migrate_to_chat_id,
        });
    }

    let result = env.result.unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| Error::Decode(format!("unexpected result shape: {e}")))
}
