//! Facilitator client: payment verification and settlement

use async_trait::async_trait;

use crate::types::{
    FacilitatorRequest, PaymentPayload, PaymentRequirements, SettleOutcome, VerifyOutcome,
    X402_VERSION,
};
use crate::{PaymentError, PaymentResult};

/// Verifies and settles x402 payments. A trait so gate tests can run
/// against a fake instead of a live facilitator.
#[async_trait]
pub trait Facilitator: Send + Sync {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> PaymentResult<VerifyOutcome>;

    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> PaymentResult<SettleOutcome>;
}

/// HTTP facilitator speaking the standard `/verify` + `/settle` API
pub struct HttpFacilitator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFacilitator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> PaymentResult<T> {
        let body = FacilitatorRequest {
            x402_version: X402_VERSION,
            payment_payload: payload.clone(),
            payment_requirements: requirements.clone(),
        };
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Facilitator(format!("HTTP {status}: {text}")));
        }
        response
            .json()
            .await
            .map_err(|e| PaymentError::Facilitator(format!("bad response: {e}")))
    }
}

#[async_trait]
impl Facilitator for HttpFacilitator {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> PaymentResult<VerifyOutcome> {
        self.post("/verify", payload, requirements).await
    }

    async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> PaymentResult<SettleOutcome> {
        self.post("/settle", payload, requirements).await
    }
}
