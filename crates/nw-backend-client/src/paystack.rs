use async_trait::async_trait;
use nw_api_types::{PaymentInit, PaymentInitResponse, PaymentVerification, PaymentVerifyResponse};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::PaymentGateway;
use crate::error::{BackendError, Result};
use crate::http::read_json;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Paystack checkout over the app backend's gateway routes.
pub struct PaystackGateway {
    base_url: String,
    http: Client,
}

impl PaystackGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, amount: &str, email: &str) -> Result<PaymentInit> {
        let url = format!("{}/api/paystack/initialize", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "amount": amount, "email": email }))
            .send()
            .await?;

        let envelope: PaymentInitResponse = read_json(response).await?;
        if !envelope.success {
            return Err(BackendError::Api(
                envelope
                    .error
                    .unwrap_or_else(|| "payment initialization failed".to_owned()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| BackendError::Decode("payment init envelope missing data".to_owned()))
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification> {
        let url = format!("{}/api/paystack/verify/{reference}", self.base_url);
        let response = self.http.get(&url).send().await?;

        let envelope: PaymentVerifyResponse = read_json(response).await?;
        if !envelope.success {
            return Err(BackendError::Api(
                envelope
                    .error
                    .unwrap_or_else(|| "payment verification failed".to_owned()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| BackendError::Decode("verification envelope missing data".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nw_api_types::PaymentStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn initialize_returns_reference_and_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/paystack/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "reference": "ref_42",
                    "authorization_url": "https://checkout.paystack.com/ref_42",
                    "amount": "150"
                }
            })))
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(server.uri()).expect("gateway");
        let init = gateway
            .initialize("150", "user@example.com")
            .await
            .expect("initialize");
        assert_eq!(init.reference, "ref_42");
        assert_eq!(init.payment_link, "https://checkout.paystack.com/ref_42");
    }

    #[tokio::test]
    async fn verify_parses_terminal_status_with_gateway_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/paystack/verify/ref_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "status": "abandoned",
                    "reference": "ref_42",
                    "gateway_response": "The customer abandoned the payment"
                }
            })))
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(server.uri()).expect("gateway");
        let verification = gateway.verify("ref_42").await.expect("verify");
        assert_eq!(verification.status, PaymentStatus::Abandoned);
        assert!(verification.status.is_terminal());
    }

    #[tokio::test]
    async fn verify_failure_envelope_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/paystack/verify/ref_missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "reference not found"
            })))
            .mount(&server)
            .await;

        let gateway = PaystackGateway::new(server.uri()).expect("gateway");
        let err = gateway.verify("ref_missing").await.expect_err("should fail");
        assert!(matches!(err, BackendError::Api(message) if message == "reference not found"));
    }
}
