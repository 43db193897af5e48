//! Bounty402 Agent Server
//!
//! One worker binary, deployed once per agent kind. Exposes a chat route
//! that runs the tool-augmented completion loop (or the JSON-only
//! directive short-circuit), a structured tool route that skips the model
//! entirely, and a debug listing of the registered tools. All tools are
//! read-only chain queries; the worker holds no keys.

mod config;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bounty402_agent::{AgentError, AgentReply, AgentService, Message, OpenAiCompatProvider};
use bounty402_chain::RpcClient;
use bounty402_tools::{all_tools, tx_tools, wallet_tools, ToolContext, ToolRegistry};

use crate::config::{AgentConfig, WorkerKind};

/// Bounty402 agent worker - LLM sessions over read-only chain tools
#[derive(Parser, Debug)]
#[command(name = "bounty402-agent-server")]
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
    agent: AgentService,
    kind: WorkerKind,
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ToolBody {
    tool: String,
    #[serde(default)]
    args: Value,
}

fn system_prompt(kind: WorkerKind) -> &'static str {
    match kind {
        WorkerKind::TxExplainer => {
            "You are a transaction explainer. Use the tools to inspect the \
             transaction the user asks about, then explain what it did in \
             plain language. Report amounts in human units."
        }
        WorkerKind::WalletExplainer => {
            "You are a wallet activity explainer. Use the tools to inspect \
             the wallet the user asks about, then summarize its balances \
             and recent token transfers in plain language."
        }
        WorkerKind::All => {
            "You are an on-chain analyst. Use the tools to answer questions \
             about transactions and wallets, and explain results in plain \
             language."
        }
    }
}

fn registry_for(kind: WorkerKind, ctx: &ToolContext) -> ToolRegistry {
    let tools = match kind {
        WorkerKind::TxExplainer => tx_tools(ctx),
        WorkerKind::WalletExplainer => wallet_tools(ctx),
        WorkerKind::All => all_tools(ctx),
    };
    ToolRegistry::new(tools)
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

    let mut config = AgentConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let ctx = ToolContext {
        rpc: Arc::new(RpcClient::new(&config.rpc_url)),
        chain_id: config.chain_id,
        payment_token: config.payment_token,
    };
    let registry = Arc::new(registry_for(config.kind, &ctx));
    let agent = AgentService::new(
        Arc::new(OpenAiCompatProvider::from_env()),
        registry,
        system_prompt(config.kind),
    );

    let state = Arc::new(AppState {
        agent,
        kind: config.kind,
    });
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        port = config.port,
        kind = config.kind.label(),
        network = %config.network,
        "agent server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("agent server shut down");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/agent/chat/:session_id", post(chat_handler))
        .route("/agent/tool", post(tool_handler))
        .route("/debug/tools", get(list_tools))
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": "bounty402-agent",
        "kind": state.kind.label(),
        "tools": state.agent.tools().names(),
    }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "tools": state.agent.tools().specs() }))
}

/// One chat turn. A JSON-only directive reply is returned verbatim as the
/// whole body so callers can parse it without unwrapping an envelope.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<ChatBody>,
) -> Response {
    match state.agent.chat(&session_id, body.messages).await {
        Ok(AgentReply::RawJson(value)) => Json(value).into_response(),
        Ok(AgentReply::Text(text)) => Json(json!({ "reply": text })).into_response(),
        Err(err) => agent_error(err),
    }
}

async fn tool_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ToolBody>,
) -> Response {
    match state.agent.execute_tool(&body.tool, body.args).await {
        Ok(value) => Json(value).into_response(),
        Err(err) => agent_error(err),
    }
}

fn agent_error(err: AgentError) -> Response {
    // Every tool failure is the caller's problem: unknown name, bad args,
    // or an upstream query that blew up on their input.
    let status = match &err {
        AgentError::BadDirective(_) | AgentError::Tool(_) => StatusCode::BAD_REQUEST,
        AgentError::Provider(_) => StatusCode::BAD_GATEWAY,
        AgentError::BadResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(%err, "agent request failed");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
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
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use bounty402_agent::{CompletionRequest, CompletionResponse, LlmProvider};
    use bounty402_tools::{ChainTool, ToolError, ToolResult, ToolSpec};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct NoProvider;

    #[async_trait]
    impl LlmProvider for NoProvider {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn complete(&self, _request: CompletionRequest) -> bounty402_agent::AgentResult<CompletionResponse> {
            Err(AgentError::Provider("no provider in tests".to_string()))
        }
    }

    struct PingTool;

    #[async_trait]
    impl ChainTool for PingTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "ping".to_string(),
                description: "returns pong".to_string(),
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn run(&self, _args: Value) -> ToolResult<Value> {
            Ok(json!({ "pong": true }))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl ChainTool for BrokenTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "broken".to_string(),
                description: "always fails".to_string(),
                parameters: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn run(&self, _args: Value) -> ToolResult<Value> {
            Err(ToolError::Execution {
                tool: "broken".to_string(),
                message: "rpc: connection refused".to_string(),
            })
        }
    }

    fn test_app() -> Router {
        let registry = Arc::new(ToolRegistry::new(vec![Box::new(PingTool), Box::new(BrokenTool)]));
        let agent = AgentService::new(Arc::new(NoProvider), registry, "test");
        router(Arc::new(AppState {
            agent,
            kind: WorkerKind::All,
        }))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_lists_tools() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["tools"][0], "ping");
    }

    #[tokio::test]
    async fn test_directive_chat_returns_raw_tool_json() {
        let chat = json!({
            "messages": [{
                "role": "user",
                "content": "Respond with ONLY THE JSON. Call ping with {}"
            }]
        });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/chat/s-1")
                    .header("content-type", "application/json")
                    .body(Body::from(chat.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "pong": true }));
    }

    #[tokio::test]
    async fn test_tool_route_executes_directly() {
        let body = json!({ "tool": "ping", "args": {} });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/tool")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["pong"], true);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_client_error() {
        let body = json!({ "tool": "nope", "args": {} });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/tool")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tool_execution_failure_is_client_error() {
        let body = json!({ "tool": "broken", "args": {} });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/tool")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("rpc: connection refused"));
    }

    #[tokio::test]
    async fn test_plain_chat_surfaces_provider_failure() {
        let chat = json!({
            "messages": [{ "role": "user", "content": "what happened in tx 0xabc?" }]
        });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/chat/s-2")
                    .header("content-type", "application/json")
                    .body(Body::from(chat.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
