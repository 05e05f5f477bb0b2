//! Normalization of the two balance/transaction wire shapes.
//!
//! The wallet backend answers with a `{ success, ... }` envelope; the legacy
//! block explorer answers with `{ status, message, result }` where status is
//! the string "1" on success. Both are classified by an explicit discriminant
//! check and collapsed into the native envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is neither a native envelope nor a legacy explorer response")]
    Unrecognized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyExplorerPayload {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub result: Value,
}

impl LegacyExplorerPayload {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerPayload {
    Native(Value),
    Legacy(LegacyExplorerPayload),
}

impl ExplorerPayload {
    /// Classify a raw payload by its discriminant fields: a `success` key
    /// marks the native shape, `status` + `result` mark the legacy shape.
    pub fn classify(value: Value) -> Result<Self, PayloadError> {
        let Some(fields) = value.as_object() else {
            return Err(PayloadError::Unrecognized);
        };

        if fields.contains_key("success") {
            return Ok(ExplorerPayload::Native(value));
        }

        if fields.contains_key("status") && fields.contains_key("result") {
            let legacy = serde_json::from_value(value).map_err(|_| PayloadError::Unrecognized)?;
            return Ok(ExplorerPayload::Legacy(legacy));
        }

        Err(PayloadError::Unrecognized)
    }

    /// Collapse either shape into the native `{ success, ... }` envelope.
    pub fn normalize(self) -> Value {
        match self {
            ExplorerPayload::Native(value) => value,
            ExplorerPayload::Legacy(legacy) => {
                let success = legacy.is_ok();
                json!({
                    "success": success,
                    "message": legacy.message,
                    "result": legacy.result,
                })
            }
        }
    }
}
