//! HTTP client for the agent workers

use async_trait::async_trait;
use serde_json::Value;

use bounty402_types::AgentKind;

use crate::{OrchestratorError, OrchestratorResult};

/// Calls an agent worker and returns its raw response body. A trait so
/// the run flow is testable without a live worker.
#[async_trait]
pub trait AgentCaller: Send + Sync {
    async fn run(
        &self,
        kind: AgentKind,
        session_id: &str,
        tool: &str,
        args: &Value,
    ) -> OrchestratorResult<String>;
}

/// Tool invoked for each agent kind, and its single argument field
pub fn tool_for(kind: AgentKind) -> (&'static str, &'static str) {
    match kind {
        AgentKind::TxExplainer => ("getTxSummary", "hash"),
        AgentKind::WalletExplainer => ("getRecentTokenTransfers", "address"),
    }
}

/// Per-kind base URLs of the agent workers
#[derive(Debug, Clone)]
pub struct AgentEndpoints {
    pub tx_explainer_url: String,
    pub wallet_agent_url: String,
}

impl AgentEndpoints {
    fn url_for(&self, kind: AgentKind) -> &str {
        match kind {
            AgentKind::TxExplainer => &self.tx_explainer_url,
            AgentKind::WalletExplainer => &self.wallet_agent_url,
        }
    }
}

/// Production caller: posts the JSON-only directive to the worker's chat
/// route, which short-circuits to direct tool execution.
pub struct HttpAgentCaller {
    http: reqwest::Client,
    endpoints: AgentEndpoints,
}

impl HttpAgentCaller {
    pub fn new(endpoints: AgentEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }
}

#[async_trait]
impl AgentCaller for HttpAgentCaller {
    async fn run(
        &self,
        kind: AgentKind,
        session_id: &str,
        tool: &str,
        args: &Value,
    ) -> OrchestratorResult<String> {
        let url = format!(
            "{}/agent/chat/{session_id}",
            self.endpoints.url_for(kind).trim_end_matches('/')
        );
        let directive = format!("Respond with ONLY THE JSON. Call {tool} with {args}");
        let body = serde_json::json!({
            "messages": [{ "role": "user", "content": directive }]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OrchestratorError::AgentFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| OrchestratorError::AgentFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(OrchestratorError::AgentFailed(format!(
                "HTTP {status}: {text}"
            )));
        }
        Ok(text)
    }
}

/// Strip a Markdown code fence wrapper, if present, then parse JSON.
/// Models wrap JSON in ```json fences often enough that this is required.
pub fn parse_agent_json(raw: &str) -> OrchestratorResult<Value> {
    let trimmed = raw.trim();
    let unfenced = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.trim_start_matches(['\r', '\n'])
            .strip_suffix("```")
            .unwrap_or(rest)
            .trim()
    } else {
        trimmed
    };
    serde_json::from_str(unfenced)
        .map_err(|e| OrchestratorError::AgentBadJson(format!("{e}: {}", truncate(unfenced, 120))))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_agent_json("{\"kind\": \"erc20-transfer\"}").unwrap();
        assert_eq!(value["kind"], "erc20-transfer");
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = "```json\n{\"kind\": \"native-transfer\"}\n```";
        let value = parse_agent_json(fenced).unwrap();
        assert_eq!(value["kind"], "native-transfer");

        let bare_fence = "```\n{\"ok\": true}\n```";
        assert_eq!(parse_agent_json(bare_fence).unwrap()["ok"], true);
    }

    #[test]
    fn test_parse_garbage_is_agent_bad_json() {
        let err = parse_agent_json("I'm sorry, I can't do that").unwrap_err();
        assert_eq!(err.code(), "AGENT_BAD_JSON");
    }

    #[test]
    fn test_tool_selection_per_kind() {
        assert_eq!(tool_for(AgentKind::TxExplainer), ("getTxSummary", "hash"));
        assert_eq!(
            tool_for(AgentKind::WalletExplainer),
            ("getRecentTokenTransfers", "address")
        );
    }
}
