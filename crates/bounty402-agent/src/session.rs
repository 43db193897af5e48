//! Agent sessions: directive short-circuit and the bounded tool loop

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use bounty402_tools::ToolRegistry;

use crate::llm::{CompletionRequest, LlmProvider, Message, MessageRole};
use crate::{AgentError, AgentResult};

/// Hard cap on tool-loop rounds per request
pub const MAX_TOOL_STEPS: usize = 6;

/// Phrase that switches a request into direct tool execution
const JSON_DIRECTIVE: &str = "only the json";

/// What a chat turn produced
#[derive(Debug, Clone)]
pub enum AgentReply {
    /// Raw tool output, returned verbatim as the whole response body
    RawJson(Value),
    /// Model-generated text
    Text(String),
}

/// Stateless session service. The caller supplies the session id and the
/// full history; nothing is retained between requests.
pub struct AgentService {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
}

impl AgentService {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Execute one named tool directly. This is the structured entry point;
    /// the chat directive path delegates here after parsing.
    pub async fn execute_tool(&self, name: &str, args: Value) -> AgentResult<Value> {
        Ok(self.tools.execute(name, args).await?)
    }

    /// Handle one chat turn for a session.
    ///
    /// When the last user message carries the "only the json" directive the
    /// embedded `Call <tool> with {args}` instruction is parsed and executed
    /// directly, and the raw tool result is the entire reply. Otherwise the
    /// request runs a tool-augmented completion loop, capped at
    /// [`MAX_TOOL_STEPS`] rounds.
    pub async fn chat(&self, session_id: &str, messages: Vec<Message>) -> AgentResult<AgentReply> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if last_user.to_lowercase().contains(JSON_DIRECTIVE) {
            let (tool, args) = parse_tool_instruction(last_user)?;
            debug!(session_id, tool = %tool, "directive short-circuit");
            let result = self.execute_tool(&tool, args).await?;
            return Ok(AgentReply::RawJson(result));
        }

        self.run_tool_loop(session_id, messages).await
    }

    async fn run_tool_loop(
        &self,
        session_id: &str,
        mut messages: Vec<Message>,
    ) -> AgentResult<AgentReply> {
        let specs = self.tools.specs();

        for step in 0..MAX_TOOL_STEPS {
            let request = CompletionRequest::new(messages.clone())
                .with_system(&self.system_prompt)
                .with_tools(specs.clone());

            let response = self.provider.complete(request).await?;

            if response.tool_calls.is_empty() {
                return Ok(AgentReply::Text(response.content));
            }

            // Record the model's request, then feed every tool result back.
            // Tool failures become tool-role messages too, so the model can
            // recover or report instead of the whole turn failing.
            messages.push(Message::assistant(render_tool_requests(&response)));
            for call in &response.tool_calls {
                debug!(session_id, step, tool = %call.name, "tool call");
                let content = match self.tools.execute(&call.name, call.arguments.clone()).await {
                    Ok(result) => result.to_string(),
                    Err(err) => {
                        warn!(session_id, tool = %call.name, %err, "tool call failed");
                        serde_json::json!({ "error": err.to_string() }).to_string()
                    }
                };
                messages.push(Message::tool(call.id.clone(), content));
            }
        }

        warn!(session_id, "tool loop exhausted after {MAX_TOOL_STEPS} steps");
        Err(AgentError::BadResponse(format!(
            "model did not produce a final answer within {MAX_TOOL_STEPS} tool rounds"
        )))
    }
}

fn render_tool_requests(response: &crate::llm::CompletionResponse) -> String {
    let calls: Vec<String> = response
        .tool_calls
        .iter()
        .map(|c| format!("{}({})", c.name, c.arguments))
        .collect();
    if response.content.is_empty() {
        format!("[requesting tools: {}]", calls.join(", "))
    } else {
        format!("{}\n[requesting tools: {}]", response.content, calls.join(", "))
    }
}

/// Parse a `Call <tool> with {json}` instruction out of a directive message.
///
/// Tool names are accepted in camelCase or snake_case; the args must be a
/// JSON object spanning the first `{` to the last `}` of the message.
pub fn parse_tool_instruction(text: &str) -> AgentResult<(String, Value)> {
    let lower = text.to_lowercase();
    let call_at = lower
        .find("call ")
        .ok_or_else(|| AgentError::BadDirective("no `call <tool>` instruction".to_string()))?;
    let after_call = &text[call_at + "call ".len()..];

    let name_end = after_call
        .find(|c: char| c.is_whitespace())
        .unwrap_or(after_call.len());
    let raw_name = &after_call[..name_end];
    if raw_name.is_empty() {
        return Err(AgentError::BadDirective("empty tool name".to_string()));
    }

    let open = text
        .find('{')
        .ok_or_else(|| AgentError::BadDirective("no JSON args object".to_string()))?;
    let close = text
        .rfind('}')
        .filter(|&close| close > open)
        .ok_or_else(|| AgentError::BadDirective("unterminated JSON args object".to_string()))?;
    let args: Value = serde_json::from_str(&text[open..=close])
        .map_err(|e| AgentError::BadDirective(format!("invalid JSON args: {e}")))?;
    if !args.is_object() {
        return Err(AgentError::BadDirective(
            "args must be a JSON object".to_string(),
        ));
    }

    Ok((snake_case(raw_name), args))
}

/// `getTxSummary` -> `get_tx_summary`; snake_case input passes through
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bounty402_tools::{ChainTool, ToolResult, ToolSpec};
    use serde_json::json;
    use std::sync::Mutex;

    use crate::llm::{CompletionResponse, ToolCall};

    struct StaticTool {
        name: &'static str,
        result: Value,
    }

    #[async_trait]
    impl ChainTool for StaticTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.name.to_string(),
                description: String::new(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn run(&self, _args: Value) -> ToolResult<Value> {
            Ok(self.result.clone())
        }
    }

    /// Replays a fixed sequence of completions
    struct ScriptedProvider {
        script: Mutex<Vec<CompletionResponse>>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<CompletionResponse>) -> Self {
            responses.reverse();
            Self {
                script: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, _request: CompletionRequest) -> AgentResult<CompletionResponse> {
            self.script
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AgentError::Provider("script exhausted".to_string()))
        }
    }

    fn service(responses: Vec<CompletionResponse>, tools: Vec<Box<dyn ChainTool>>) -> AgentService {
        AgentService::new(
            Arc::new(ScriptedProvider::new(responses)),
            Arc::new(ToolRegistry::new(tools)),
            "You answer questions about on-chain activity.",
        )
    }

    #[test]
    fn test_parse_tool_instruction() {
        let (tool, args) =
            parse_tool_instruction("ONLY THE JSON. Call getTxSummary with {\"hash\": \"0xab\"}")
                .unwrap();
        assert_eq!(tool, "get_tx_summary");
        assert_eq!(args["hash"], "0xab");

        let (tool, _) =
            parse_tool_instruction("only the json. call get_native_balance with {}").unwrap();
        assert_eq!(tool, "get_native_balance");
    }

    #[test]
    fn test_parse_tool_instruction_failures() {
        assert!(parse_tool_instruction("only the json please").is_err());
        assert!(parse_tool_instruction("Call tool with not-json").is_err());
        assert!(parse_tool_instruction("Call tool with [1,2]").is_err());
    }

    #[tokio::test]
    async fn test_directive_short_circuits_to_raw_tool_result() {
        let svc = service(
            vec![],
            vec![Box::new(StaticTool {
                name: "get_tx_summary",
                result: json!({"kind": "erc20-transfer"}),
            })],
        );
        let reply = svc
            .chat(
                "s1",
                vec![Message::user(
                    "ONLY THE JSON. Call getTxSummary with {\"hash\": \"0xab\"}",
                )],
            )
            .await
            .unwrap();
        match reply {
            AgentReply::RawJson(value) => assert_eq!(value["kind"], "erc20-transfer"),
            AgentReply::Text(_) => panic!("expected raw tool result"),
        }
    }

    #[tokio::test]
    async fn test_tool_loop_runs_until_final_text() {
        let svc = service(
            vec![
                CompletionResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall {
                        id: "c1".to_string(),
                        name: "get_receipt".to_string(),
                        arguments: json!({"hash": "0xab"}),
                    }],
                },
                CompletionResponse {
                    content: "The transaction succeeded.".to_string(),
                    tool_calls: vec![],
                },
            ],
            vec![Box::new(StaticTool {
                name: "get_receipt",
                result: json!({"status": "success"}),
            })],
        );
        let reply = svc
            .chat("s1", vec![Message::user("What happened in tx 0xab?")])
            .await
            .unwrap();
        match reply {
            AgentReply::Text(text) => assert_eq!(text, "The transaction succeeded."),
            AgentReply::RawJson(_) => panic!("expected text"),
        }
    }

    #[tokio::test]
    async fn test_tool_loop_is_bounded() {
        let looping = CompletionResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "c".to_string(),
                name: "get_receipt".to_string(),
                arguments: json!({}),
            }],
        };
        let svc = service(
            vec![looping; MAX_TOOL_STEPS + 2],
            vec![Box::new(StaticTool {
                name: "get_receipt",
                result: json!({}),
            })],
        );
        let err = svc
            .chat("s1", vec![Message::user("loop forever")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::BadResponse(_)));
    }
}
