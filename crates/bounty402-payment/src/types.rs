//! x402 wire types
//!
//! Camel-cased JSON matching the x402 protocol: the 402 quote body, the
//! base64 `x-payment` header payload, and the facilitator request/response
//! pairs. Monetary amounts are decimal strings throughout.

use alloy_primitives::Address;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::{PaymentError, PaymentResult};

pub const X402_VERSION: u32 = 1;

/// The `exact` scheme is the only one this marketplace uses
pub const SCHEME_EXACT: &str = "exact";

/// One acceptable way to pay for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Token base units, decimal string
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: Address,
    pub max_timeout_seconds: u64,
    /// Token contract address
    pub asset: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<AssetExtra>,
}

/// EIP-712 domain hints for the payment asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetExtra {
    pub name: String,
    pub version: String,
}

/// Body of a 402 response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    pub x402_version: u32,
    pub error: String,
    pub accepts: Vec<PaymentRequirements>,
}

/// EIP-3009 authorization fields, all stringly per the wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactAuthorization {
    pub from: Address,
    pub to: Address,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    /// 0x-prefixed 32-byte random nonce
    pub nonce: String,
}

/// Payload of the `exact` scheme: a signed transfer authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactPayload {
    /// 0x-prefixed 65-byte signature
    pub signature: String,
    pub authorization: ExactAuthorization,
}

/// The decoded `x-payment` header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPayload,
}

impl PaymentPayload {
    /// Encode for the `x-payment` header
    pub fn to_header(&self) -> PaymentResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| PaymentError::MalformedHeader(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    /// Decode an `x-payment` header value
    pub fn from_header(header: &str) -> PaymentResult<Self> {
        let raw = BASE64
            .decode(header.trim())
            .map_err(|e| PaymentError::MalformedHeader(format!("bad base64: {e}")))?;
        serde_json::from_slice(&raw)
            .map_err(|e| PaymentError::MalformedHeader(format!("bad payload JSON: {e}")))
    }
}

/// Facilitator `/verify` and `/settle` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    pub x402_version: u32,
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
}

/// Facilitator `/verify` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
}

/// Facilitator `/settle` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
}

impl SettleOutcome {
    /// Encode for the `x-payment-response` header
    pub fn to_header(&self) -> PaymentResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| PaymentError::MalformedHeader(e.to_string()))?;
        Ok(BASE64.encode(json))
    }
}
