//! Bounty402 Gateway
//!
//! The browser-facing API. Owns the submitter and buyer keys and drives
//! the two long sequences end to end: run an agent and submit its artifact
//! (`POST /api/agent/run`), then buy an attestation and claim
//! (`POST /api/agent/verify-claim`). Also serves stored artifacts by hash
//! and registry reputation reads.

mod config;
mod error;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bounty402_artifacts::{ArtifactStore, MemoryArtifactStore};
use bounty402_chain::{EscrowClient, RegistryClient, RpcClient, TxSender};
use bounty402_crypto::LocalSigner;
use bounty402_orchestrator::{
    AgentEndpoints, HttpAgentCaller, RunAgentFlow, RunAgentRequest, RunAgentResponse,
    VerifyClaimFlow, VerifyClaimRequest, VerifyClaimResponse,
};
use bounty402_payment::PayingClient;

use crate::config::GatewayConfig;
use crate::error::ApiError;

/// Bounty402 gateway - public marketplace API
#[derive(Parser, Debug)]
#[command(name = "bounty402-gateway")]
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
    run: RunAgentFlow,
    claim: VerifyClaimFlow,
    store: Arc<dyn ArtifactStore>,
    registry: RegistryClient,
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

    let mut config = GatewayConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let rpc = Arc::new(RpcClient::new(&config.rpc_url));
    let submitter = LocalSigner::from_hex(&config.submitter_key)?;
    let buyer = LocalSigner::from_hex(&config.buyer_key)?;
    let submitter_address = submitter.address();

    let escrow = EscrowClient::new(rpc.clone(), config.escrow);
    let sender = TxSender::new(rpc.clone(), submitter, config.chain_id);
    let registry = RegistryClient::new(rpc, config.registry);
    let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());

    let agents = Arc::new(HttpAgentCaller::new(AgentEndpoints {
        tx_explainer_url: config.tx_explainer_url.clone(),
        wallet_agent_url: config.wallet_agent_url.clone(),
    }));
    let run = RunAgentFlow::new(
        escrow.clone(),
        sender.clone(),
        agents,
        store.clone(),
        config.public_origin.clone(),
    );
    let claim = VerifyClaimFlow::new(
        escrow,
        sender,
        PayingClient::new(buyer),
        config.validator_verify_url(),
    );

    let state = Arc::new(AppState {
        run,
        claim,
        store,
        registry,
        network: config.network.clone(),
    });
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        port = config.port,
        submitter = %submitter_address,
        escrow = %config.escrow,
        network = %config.network,
        "gateway listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway shut down");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/agent/run", post(run_handler))
        .route("/api/agent/verify-claim", post(verify_claim_handler))
        .route("/api/artifacts/:hash", get(artifact_handler))
        .route("/api/registry/agents/:address", get(agent_stats_handler))
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": "bounty402-gateway",
        "network": state.network,
        "claimant": state.claim.claimant(),
    }))
}

async fn run_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<RunAgentResponse>, ApiError> {
    let request: RunAgentRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "INVALID_BODY", e.to_string()))?;
    let response = state.run.run(request).await?;
    Ok(Json(response))
}

async fn verify_claim_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<VerifyClaimResponse>, ApiError> {
    let request: VerifyClaimRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "INVALID_BODY", e.to_string()))?;
    let response = state.claim.verify_and_claim(request).await?;
    Ok(Json(response))
}

/// Serve a stored artifact verbatim. The body is the canonical payload
/// whose keccak is the hash, so callers can re-derive and check it.
async fn artifact_handler(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    match state.store.get(&hash) {
        Some(payload) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())),
        None => Err(ApiError::not_found(format!("no artifact {hash}"))),
    }
}

async fn agent_stats_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let agent = address.trim().parse().map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_BODY",
            format!("not an address: {address}"),
        )
    })?;
    let stats = state.registry.get_agent(agent).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REGISTRY_READ_FAILED",
            e.to_string(),
        )
    })?;
    Ok(Json(serde_json::to_value(stats).unwrap_or(Value::Null)))
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

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let rpc = Arc::new(RpcClient::new("http://localhost:1"));
        let escrow = EscrowClient::new(
            rpc.clone(),
            address!("4444444444444444444444444444444444444444"),
        );
        let sender = TxSender::new(rpc.clone(), LocalSigner::random(), 84_532);
        let registry = RegistryClient::new(
            rpc,
            address!("5555555555555555555555555555555555555555"),
        );
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
        let agents = Arc::new(HttpAgentCaller::new(AgentEndpoints {
            tx_explainer_url: "http://localhost:1".to_string(),
            wallet_agent_url: "http://localhost:1".to_string(),
        }));

        let run = RunAgentFlow::new(
            escrow.clone(),
            sender.clone(),
            agents,
            store.clone(),
            "http://localhost:8789",
        );
        let claim = VerifyClaimFlow::new(
            escrow,
            sender,
            PayingClient::new(LocalSigner::random()),
            "http://localhost:1/api/validator/verify",
        );

        Arc::new(AppState {
            run,
            claim,
            store,
            registry,
            network: "base-sepolia".to_string(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn test_bad_run_body_yields_invalid_body_envelope() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/agent/run")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"bountyId": "not-a-number"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_BODY");
        assert!(body["error"]["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_input_shape_rejected_before_chain_access() {
        // An address where the tx explainer needs a tx hash; no RPC call
        // happens, so the unroutable test endpoint is never touched.
        let body = json!({
            "bountyId": 1,
            "input": format!("0x{}", "ab".repeat(20)),
            "agentType": "tx-explainer",
        });
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/agent/run")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_zero_submission_id_rejected() {
        let body = json!({
            "bountyId": 1,
            "submissionId": 0,
            "artifactHash": format!("0x{}", "aa".repeat(32)),
        });
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/agent/verify-claim")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_artifact_round_trip_and_missing() {
        let state = test_state();
        state.store.put("0xdeadbeef", r#"{"kind":"txSummary"}"#.to_string());

        let found = router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/artifacts/0xdeadbeef")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(body_json(found).await["kind"], "txSummary");

        let missing = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/artifacts/0xffff")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(missing).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_agent_address_rejected() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/registry/agents/not-an-address")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
