//! Paying HTTP client: quote discovery plus a single paid retry

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use rand::RngCore;
use tracing::debug;

use bounty402_crypto::LocalSigner;

use crate::gate::X_PAYMENT;
use crate::types::{
    ExactAuthorization, ExactPayload, PaymentPayload, PaymentRequiredBody, PaymentRequirements,
    X402_VERSION,
};
use crate::{network_chain_id, PaymentError, PaymentResult, SCHEME_EXACT};

sol! {
    /// EIP-3009 typed struct; the asset contract checks this exact layout
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// Outcome of a paid fetch: the final response plus what was sent to pay
#[derive(Debug)]
pub struct PaidResponse {
    pub response: reqwest::Response,
    /// The `x-payment` header used, when payment was required
    pub payment_header: Option<String>,
    /// The quote that was satisfied, when payment was required
    pub quote: Option<PaymentRequirements>,
}

/// Client that answers 402 quotes with a signed payment and retries once
pub struct PayingClient {
    http: reqwest::Client,
    signer: LocalSigner,
}

impl PayingClient {
    pub fn new(signer: LocalSigner) -> Self {
        Self {
            http: reqwest::Client::new(),
            signer,
        }
    }

    pub fn payer(&self) -> Address {
        self.signer.address()
    }

    /// POST a JSON body; on 402, pay the quote and retry exactly once.
    pub async fn pay_and_post(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> PaymentResult<PaidResponse> {
        let first = self.http.post(url).json(body).send().await?;
        if first.status() != reqwest::StatusCode::PAYMENT_REQUIRED {
            return Ok(PaidResponse {
                response: first,
                payment_header: None,
                quote: None,
            });
        }

        let quote: PaymentRequiredBody = first
            .json()
            .await
            .map_err(|e| PaymentError::NoMatchingRequirement(format!("unparseable quote: {e}")))?;
        let requirements = select_requirement(&quote)?;
        debug!(
            resource = %requirements.resource,
            amount = %requirements.max_amount_required,
            "paying 402 quote"
        );

        let header = self.build_payment(&requirements)?.to_header()?;
        let response = self
            .http
            .post(url)
            .header(X_PAYMENT, &header)
            .json(body)
            .send()
            .await?;

        Ok(PaidResponse {
            response,
            payment_header: Some(header),
            quote: Some(requirements),
        })
    }

    /// Capture a resource's quote without paying it
    pub async fn discover_quote(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> PaymentResult<Option<PaymentRequiredBody>> {
        let response = self.http.post(url).json(body).send().await?;
        if response.status() != reqwest::StatusCode::PAYMENT_REQUIRED {
            return Ok(None);
        }
        let quote = response
            .json()
            .await
            .map_err(|e| PaymentError::NoMatchingRequirement(format!("unparseable quote: {e}")))?;
        Ok(Some(quote))
    }

    fn build_payment(&self, requirements: &PaymentRequirements) -> PaymentResult<PaymentPayload> {
        let chain_id = network_chain_id(&requirements.network).ok_or_else(|| {
            PaymentError::NoMatchingRequirement(format!(
                "unknown network {}",
                requirements.network
            ))
        })?;
        let value = U256::from_str_radix(&requirements.max_amount_required, 10).map_err(|e| {
            PaymentError::NoMatchingRequirement(format!("bad maxAmountRequired: {e}"))
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        // validAfter backdated to tolerate clock skew between signer and chain.
        let valid_after = now.saturating_sub(600);
        let valid_before = now + requirements.max_timeout_seconds.max(60);

        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);

        let authorization = TransferWithAuthorization {
            from: self.signer.address(),
            to: requirements.pay_to,
            value,
            validAfter: U256::from(valid_after),
            validBefore: U256::from(valid_before),
            nonce: B256::from(nonce),
        };

        let (name, version) = requirements
            .extra
            .as_ref()
            .map(|extra| (extra.name.clone(), extra.version.clone()))
            .unwrap_or_else(|| ("USDC".to_string(), "2".to_string()));
        let domain = Eip712Domain::new(
            Some(name.into()),
            Some(version.into()),
            Some(U256::from(chain_id)),
            Some(requirements.asset),
            None,
        );

        let signing_hash = authorization.eip712_signing_hash(&domain);
        let signature = self
            .signer
            .sign_prehash(&signing_hash)
            .map_err(|e| PaymentError::Signing(e.to_string()))?;

        Ok(PaymentPayload {
            x402_version: X402_VERSION,
            scheme: SCHEME_EXACT.to_string(),
            network: requirements.network.clone(),
            payload: ExactPayload {
                signature: format!("0x{}", hex::encode(signature)),
                authorization: ExactAuthorization {
                    from: self.signer.address(),
                    to: requirements.pay_to,
                    value: value.to_string(),
                    valid_after: valid_after.to_string(),
                    valid_before: valid_before.to_string(),
                    nonce: format!("0x{}", hex::encode(nonce)),
                },
            },
        })
    }
}

/// Pick the `exact` requirement on a known network out of a quote
fn select_requirement(quote: &PaymentRequiredBody) -> PaymentResult<PaymentRequirements> {
    quote
        .accepts
        .iter()
        .find(|req| req.scheme == SCHEME_EXACT && network_chain_id(&req.network).is_some())
        .cloned()
        .ok_or_else(|| {
            PaymentError::NoMatchingRequirement(format!(
                "no exact-scheme requirement among {} offers",
                quote.accepts.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetExtra;
    use alloy_primitives::address;

    fn requirements(network: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: SCHEME_EXACT.to_string(),
            network: network.to_string(),
            max_amount_required: "10000".to_string(),
            resource: "http://localhost/paid".to_string(),
            description: "test".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: address!("2222222222222222222222222222222222222222"),
            max_timeout_seconds: 60,
            asset: address!("3333333333333333333333333333333333333333"),
            extra: Some(AssetExtra {
                name: "USDC".to_string(),
                version: "2".to_string(),
            }),
        }
    }

    #[test]
    fn test_select_requirement_skips_unknown_networks() {
        let quote = PaymentRequiredBody {
            x402_version: X402_VERSION,
            error: String::new(),
            accepts: vec![requirements("solana-devnet"), requirements("base-sepolia")],
        };
        let selected = select_requirement(&quote).unwrap();
        assert_eq!(selected.network, "base-sepolia");

        let empty = PaymentRequiredBody {
            x402_version: X402_VERSION,
            error: String::new(),
            accepts: vec![],
        };
        assert!(select_requirement(&empty).is_err());
    }

    #[test]
    fn test_build_payment_signs_authorization() {
        let client = PayingClient::new(LocalSigner::random());
        let payload = client.build_payment(&requirements("base-sepolia")).unwrap();

        assert_eq!(payload.scheme, SCHEME_EXACT);
        assert_eq!(payload.payload.authorization.from, client.payer());
        assert_eq!(payload.payload.authorization.value, "10000");
        // 0x + 65 bytes hex
        assert_eq!(payload.payload.signature.len(), 2 + 130);

        let valid_after: u64 = payload.payload.authorization.valid_after.parse().unwrap();
        let valid_before: u64 = payload.payload.authorization.valid_before.parse().unwrap();
        assert!(valid_before > valid_after);
    }

    #[test]
    fn test_unknown_network_rejected() {
        let client = PayingClient::new(LocalSigner::random());
        let err = client.build_payment(&requirements("hyrule")).unwrap_err();
        assert!(matches!(err, PaymentError::NoMatchingRequirement(_)));
    }
}
