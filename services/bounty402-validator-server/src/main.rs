//! Bounty402 Validator Server
//!
//! Sells attestations over x402: `POST /api/validator/verify` is priced at
//! 0.01 USDC, enforced by the payment gate. A paid request yields a signed
//! digest binding {chain, escrow, bounty, submission, claimant, artifact}
//! that the escrow contract accepts in `claimWithAttestation`, plus a
//! best-effort job record on the registry.

mod config;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bounty402_chain::{RegistryClient, RpcClient, TxSender};
use bounty402_crypto::LocalSigner;
use bounty402_payment::{
    payment_gate_middleware, AssetExtra, HttpFacilitator, PaymentContext, PaymentGate,
    PaymentRequirements, SCHEME_EXACT,
};
use bounty402_validator::{
    AttestationService, RegistryJobRecorder, ValidatorError, VerifyRequest, VerifyService,
    JOB_PAYMENT_AMOUNT,
};

use crate::config::ValidatorConfig;

const VERIFY_PATH: &str = "/api/validator/verify";

/// Bounty402 validator - paid attestations for bounty claims
#[derive(Parser, Debug)]
#[command(name = "bounty402-validator-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct AppState {
    verify: VerifyService,
    network: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let mut config = ValidatorConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let signer = LocalSigner::from_hex(&config.validator_key)?;
    let validator_address = signer.address();

    let rpc = Arc::new(RpcClient::new(&config.rpc_url));
    let attestation = AttestationService::new(signer.clone(), config.chain_id, config.escrow);
    let recorder: Option<Arc<dyn bounty402_validator::JobRecorder>> = match config.registry {
        Some(registry) => Some(Arc::new(RegistryJobRecorder::new(
            RegistryClient::new(rpc.clone(), registry),
            TxSender::new(rpc, signer, config.chain_id),
        ))),
        None => {
            tracing::warn!("AGENT_REGISTRY_ADDRESS unset, job recording disabled");
            None
        }
    };
    let verify = VerifyService::new(attestation, recorder, config.payment_token);

    let gate = Arc::new(
        PaymentGate::new(Arc::new(HttpFacilitator::new(&config.facilitator_url)))
            .price_route(VERIFY_PATH, verify_requirements(&config)),
    );
    let state = Arc::new(AppState {
        verify,
        network: config.network.clone(),
    });
    let app = router(state, gate);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        port = config.port,
        validator = %validator_address,
        escrow = %config.escrow,
        network = %config.network,
        "validator server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("validator server shut down");
    Ok(())
}

fn router(state: Arc<AppState>, gate: Arc<PaymentGate>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/", get(health))
        .route(VERIFY_PATH, post(verify_handler))
        .layer(middleware::from_fn_with_state(gate, payment_gate_middleware))
        .layer(cors)
        .with_state(state)
}

/// The price of one verification, advertised in 402 quotes
fn verify_requirements(config: &ValidatorConfig) -> PaymentRequirements {
    PaymentRequirements {
        scheme: SCHEME_EXACT.to_string(),
        network: config.network.clone(),
        max_amount_required: JOB_PAYMENT_AMOUNT.to_string(),
        resource: format!(
            "{}{VERIFY_PATH}",
            config.public_origin.trim_end_matches('/')
        ),
        description: "Bounty402 validator verification".to_string(),
        mime_type: "application/json".to_string(),
        pay_to: config.pay_to,
        max_timeout_seconds: 60,
        asset: config.payment_token,
        extra: Some(AssetExtra {
            name: "USDC".to_string(),
            version: "2".to_string(),
        }),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": "bounty402-validator",
        "validator": state.verify.validator_address(),
        "x402": { "network": state.network },
    }))
}

/// Paid verification. The gate has already verified the payment; the raw
/// header reaches this handler through request extensions and seeds the
/// job id.
async fn verify_handler(
    State(state): State<Arc<AppState>>,
    payment: Option<Extension<PaymentContext>>,
    Json(body): Json<Value>,
) -> Response {
    let request: VerifyRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let payment_header = payment.as_ref().map(|Extension(ctx)| ctx.header.as_str());
    match state.verify.verify(request, payment_header).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(ValidatorError::InvalidRequest { field, reason }) => {
            error_response(StatusCode::BAD_REQUEST, &format!("{field}: {reason}"))
        }
        Err(err @ ValidatorError::Signing(_)) => {
            tracing::error!(%err, "attestation signing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
