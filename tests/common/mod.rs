#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use genai::chat::{ChatRequest, ToolCall};
use voyage::agent::llm::{ChatModel, ModelTurn};
use voyage::agent::web_search::SearchBackend;
use voyage::error::LlmError;
use voyage::travel::TripPlanner;

// ─── Fakes ───────────────────────────────────────────────────────────

/// Model that searches once per task, then answers with a markdown report
/// naming the agent role found in the system prompt.
pub struct TravelModel {
    pub calls: AtomicUsize,
}

impl TravelModel {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChatModel for TravelModel {
    fn name(&self) -> &str {
        "fake-travel-model"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = request.system.clone().unwrap_or_default();
        let role = system
            .strip_prefix("You are ")
            .and_then(|s| s.split('.').next())
            .unwrap_or("Unknown")
            .to_string();

        // First call of a task has only the user prompt; search once.
        if request.messages.len() == 1 && request.tools.is_some() {
            return Ok(ModelTurn::tool_calls(vec![ToolCall {
                call_id: format!("call-{role}"),
                fn_name: "search_web_tool".to_string(),
                fn_arguments: serde_json::json!({"query": format!("{role} Rome")}),
                thought_signatures: None,
            }]));
        }

        Ok(ModelTurn::text(format!("# {role}\n\n- Rome 🏛️ notes")))
    }
}

/// Model that always fails as an unauthenticated provider would.
pub struct NoKeyModel;

#[async_trait]
impl ChatModel for NoKeyModel {
    fn name(&self) -> &str {
        "no-key"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ModelTurn, LlmError> {
        Err(LlmError::MissingCredentials {
            var: "OPENAI_API_KEY".to_string(),
        })
    }
}

pub struct CannedSearch {
    pub queries: AtomicUsize,
}

#[async_trait]
impl SearchBackend for CannedSearch {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn search(&self, _query: &str) -> String {
        self.queries.fetch_add(1, Ordering::SeqCst);
        r#"[{"title":"Colosseum","url":"https://www.colosseo.it","snippet":"Tickets"}]"#.to_string()
    }
}

pub fn canned_search() -> Arc<CannedSearch> {
    Arc::new(CannedSearch {
        queries: AtomicUsize::new(0),
    })
}

pub fn planner_in(
    dir: &std::path::Path,
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchBackend>,
) -> TripPlanner {
    TripPlanner::new(model, search, 5, dir)
}
