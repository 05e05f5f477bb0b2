//! Payment gateway wire types.
//!
//! The gateway reports a free-form status string; everything outside the
//! known set maps to `Unknown` so new upstream statuses degrade to
//! non-terminal instead of breaking the poll loop.

use serde::{Deserialize, Serialize};

/// Gateway payment status. Terminal statuses end verification polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
    Cancelled,
    Unknown(String),
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success
                | PaymentStatus::Failed
                | PaymentStatus::Abandoned
                | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Abandoned => "abandoned",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => PaymentStatus::Pending,
            "success" => PaymentStatus::Success,
            "failed" => PaymentStatus::Failed,
            "abandoned" => PaymentStatus::Abandoned,
            "cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Unknown(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_owned()
    }
}

/// Result of initializing a gateway payment: the reference to verify against
/// and the external link the user is sent to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInit {
    pub reference: String,
    #[serde(alias = "authorization_url")]
    pub payment_link: String,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<PaymentInit>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One verification snapshot for a payment reference. Fields beyond `status`
/// are passed through for receipts; the gateway does not always send them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentVerification {
    pub status: PaymentStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<PaymentVerification>,
    #[serde(default)]
    pub error: Option<String>,
}
