//! Payment gate middleware for axum resource servers

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::facilitator::Facilitator;
use crate::types::{PaymentPayload, PaymentRequiredBody, PaymentRequirements, X402_VERSION};

/// Header carrying the client's signed payment
pub const X_PAYMENT: &str = "x-payment";
/// Header carrying the settlement result back to the client
pub const X_PAYMENT_RESPONSE: &str = "x-payment-response";

/// Proof of payment, available to gated handlers via request extensions
#[derive(Debug, Clone)]
pub struct PaymentContext {
    /// The raw `x-payment` header value as received
    pub header: String,
    /// Payer recovered by the facilitator during verification
    pub payer: Option<Address>,
}

/// Route price table plus the facilitator that enforces it
pub struct PaymentGate {
    facilitator: Arc<dyn Facilitator>,
    routes: HashMap<String, PaymentRequirements>,
}

impl PaymentGate {
    pub fn new(facilitator: Arc<dyn Facilitator>) -> Self {
        Self {
            facilitator,
            routes: HashMap::new(),
        }
    }

    /// Price one route. Paths are matched exactly.
    pub fn price_route(mut self, path: impl Into<String>, requirements: PaymentRequirements) -> Self {
        self.routes.insert(path.into(), requirements);
        self
    }

    fn quote_for(&self, path: &str) -> Option<&PaymentRequirements> {
        self.routes.get(path)
    }
}

fn payment_required(error: impl Into<String>, accepts: Vec<PaymentRequirements>) -> Response {
    let body = PaymentRequiredBody {
        x402_version: X402_VERSION,
        error: error.into(),
        accepts,
    };
    json_response(StatusCode::PAYMENT_REQUIRED, &body)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(body).unwrap_or_default(),
        ))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Gate middleware: unpriced routes pass through; priced routes demand a
/// valid `x-payment`, settle after a successful handler run, and attach
/// the settlement to the response.
pub async fn payment_gate_middleware(
    State(gate): State<Arc<PaymentGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = req.uri().path().to_string();
    let Some(requirements) = gate.quote_for(&path).cloned() else {
        return Ok(next.run(req).await);
    };

    let Some(header) = req
        .headers()
        .get(X_PAYMENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        debug!(path = %path, "request without x-payment, quoting");
        return Err(payment_required(
            "X-PAYMENT header is required",
            vec![requirements],
        ));
    };

    let payload = match PaymentPayload::from_header(&header) {
        Ok(payload) => payload,
        Err(err) => {
            return Err(payment_required(err.to_string(), vec![requirements]));
        }
    };

    let verification = match gate.facilitator.verify(&payload, &requirements).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(path = %path, %err, "facilitator verify failed");
            return Err(payment_required(err.to_string(), vec![requirements]));
        }
    };
    if !verification.is_valid {
        let reason = verification
            .invalid_reason
            .unwrap_or_else(|| "payment verification failed".to_string());
        return Err(payment_required(reason, vec![requirements]));
    }

    req.extensions_mut().insert(PaymentContext {
        header,
        payer: verification.payer,
    });

    let mut response = next.run(req).await;
    if !response.status().is_success() {
        // Handler refused; nothing to settle, nothing charged.
        return Ok(response);
    }

    let settlement = match gate.facilitator.settle(&payload, &requirements).await {
        Ok(outcome) if outcome.success => outcome,
        Ok(outcome) => {
            let reason = outcome
                .error_reason
                .unwrap_or_else(|| "settlement failed".to_string());
            warn!(path = %path, reason = %reason, "payment settlement refused");
            return Err(payment_required(reason, vec![requirements]));
        }
        Err(err) => {
            warn!(path = %path, %err, "facilitator settle failed");
            return Err(payment_required(err.to_string(), vec![requirements]));
        }
    };

    if let Ok(encoded) = settlement.to_header() {
        if let Ok(value) = encoded.parse() {
            response.headers_mut().insert(X_PAYMENT_RESPONSE, value);
        }
    }
    Ok(response)
}
