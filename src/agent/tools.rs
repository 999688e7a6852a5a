//! Tool schema definitions and dispatch for the agent loop.
//!
//! Agents get a single tool, `search_web_tool`, which forwards the query to
//! the configured [`SearchBackend`] and hands its output back unmodified.
//!
//! Tool errors are always returned as structured JSON strings (never panics or
//! `Err` variants) so the model can observe the error and react.

use genai::chat::{Tool, ToolCall};
use serde_json::json;

use crate::agent::web_search::SearchBackend;

pub const SEARCH_WEB_TOOL: &str = "search_web_tool";

/// Every tool an agent may be configured with.
pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool::new(SEARCH_WEB_TOOL)
            .with_description(
                "Searches the web for current information and returns results. \
                 Returns a JSON array of objects with fields: title, url, snippet.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            })),
    ]
}

/// The subset of [`define_tools`] whose names appear in `names`.
pub fn tools_named(names: &[String]) -> Vec<Tool> {
    define_tools()
        .into_iter()
        .filter(|t| names.iter().any(|n| n == t.name.as_str()))
        .collect()
}

/// Human-readable listing of the given tools, embedded in agent prompts.
pub fn tool_descriptions(names: &[String]) -> String {
    let mut out = String::new();
    for name in names {
        if name == SEARCH_WEB_TOOL {
            out.push_str(
                "### search_web_tool\n\
                 Searches the web and returns results.\n\
                 - **query** (string, required): The search query\n\
                 - Returns: JSON array of {title, url, snippet}\n",
            );
        }
    }
    out
}

/// Dispatch a tool call to its implementation.
///
/// Always returns a `String`: the tool output or a JSON error object
/// `{"error": "..."}`.
pub async fn dispatch_tool_call(call: &ToolCall, search: &dyn SearchBackend) -> String {
    match call.fn_name.as_str() {
        SEARCH_WEB_TOOL => dispatch_search(call, search).await,
        unknown => json!({"error": format!("Unknown tool: {}", unknown)}).to_string(),
    }
}

async fn dispatch_search(call: &ToolCall, search: &dyn SearchBackend) -> String {
    let query = match call.fn_arguments.get("query").and_then(|v| v.as_str()) {
        Some(q) if !q.trim().is_empty() => q,
        _ => {
            return json!({"error": "search_web_tool: missing or invalid 'query' argument"})
                .to_string();
        }
    };

    search.search(query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchBackend for RecordingSearch {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search(&self, query: &str) -> String {
            self.queries.lock().unwrap().push(query.to_string());
            r#"[{"title":"t","url":"u","snippet":"s"}]"#.to_string()
        }
    }

    fn recording() -> RecordingSearch {
        RecordingSearch {
            queries: Mutex::new(Vec::new()),
        }
    }

    fn make_tool_call(fn_name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall {
            call_id: "test-call-1".to_string(),
            fn_name: fn_name.to_string(),
            fn_arguments: args,
            thought_signatures: None,
        }
    }

    #[test]
    fn define_tools_has_search_tool_with_schema() {
        let tools = define_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name.as_str(), SEARCH_WEB_TOOL);
        assert!(tools[0].description.is_some());
        assert!(tools[0].schema.is_some());
    }

    #[test]
    fn search_description_does_not_name_a_provider() {
        let tools = define_tools();
        let description = tools[0].description.as_deref().unwrap().to_lowercase();
        assert!(!description.contains("duckduckgo"));
        assert!(!description.contains("brave"));
    }

    #[test]
    fn tools_named_filters_unknown_names() {
        assert_eq!(tools_named(&[SEARCH_WEB_TOOL.to_string()]).len(), 1);
        assert!(tools_named(&["file_write".to_string()]).is_empty());
        assert!(tools_named(&[]).is_empty());
    }

    #[test]
    fn tool_descriptions_lists_configured_tools() {
        assert!(tool_descriptions(&[SEARCH_WEB_TOOL.to_string()]).contains("### search_web_tool"));
        assert!(tool_descriptions(&[]).is_empty());
    }

    #[tokio::test]
    async fn dispatch_search_returns_backend_output_unmodified() {
        let search = recording();
        let call = make_tool_call(SEARCH_WEB_TOOL, json!({"query": "rome food markets"}));

        let result = dispatch_tool_call(&call, &search).await;

        assert_eq!(result, r#"[{"title":"t","url":"u","snippet":"s"}]"#);
        assert_eq!(*search.queries.lock().unwrap(), vec!["rome food markets"]);
    }

    #[tokio::test]
    async fn dispatch_search_missing_query() {
        let search = recording();
        let call = make_tool_call(SEARCH_WEB_TOOL, json!({"query": "  "}));

        let result = dispatch_tool_call(&call, &search).await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("missing"));
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_unknown_tool() {
        let search = recording();
        let call = make_tool_call("shell_exec", json!({}));

        let result = dispatch_tool_call(&call, &search).await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "Unknown tool: shell_exec");
    }
}
