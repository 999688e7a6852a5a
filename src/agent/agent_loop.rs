//! Per-task agent loop with tool dispatch and an iteration cap.
//!
//! One call to [`run_agent_task`] drives a single agent through a single
//! task:
//!
//! 1. Builds the system prompt from the agent's role, backstory and goal
//! 2. Builds the user prompt from the task description, expected output and
//!    the context assembled by the crew
//! 3. Calls the model with tools enabled, up to `max_iter` times
//! 4. Dispatches requested tool calls and feeds results back
//! 5. Treats the first text-only reply as the final answer
//! 6. When the cap is hit, makes one last call with tools disabled
//!
//! Every step is traced; when a [`RunLogger`] is supplied, steps are also
//! appended to the JSONL run log.

use genai::chat::{ChatMessage, ChatRequest, ToolResponse};

use crate::agent::llm::{ChatModel, ModelTurn};
use crate::agent::logging::{LogEntry, RunLogger, now_iso};
use crate::agent::tools::{dispatch_tool_call, tool_descriptions, tools_named};
use crate::agent::web_search::SearchBackend;
use crate::error::CrewError;
use crate::orchestration::types::{Agent, Task};

/// Appended when the agent used up its tool-enabled iterations.
pub const MAX_ITER_NOTICE: &str = "You have used all available tool calls for this task. \
     Do not call any more tools. Give your best complete final answer now, \
     based on everything gathered so far.";

/// Outcome of one agent working one task.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub answer: String,
    /// Number of model calls made.
    pub iterations: usize,
    pub tool_calls: usize,
}

/// System prompt for an agent.
pub fn build_system_prompt(agent: &Agent) -> String {
    let mut prompt = format!(
        "You are {role}. {backstory}\nYour personal goal is: {goal}\n",
        role = agent.role,
        backstory = agent.backstory,
        goal = agent.goal,
    );

    if !agent.tools.is_empty() {
        prompt.push_str("\n## Available Tools\n\n");
        prompt.push_str(&tool_descriptions(&agent.tools));
        prompt.push_str(
            "\nUse the tools when you need current information. \
             When you have enough information, answer without calling a tool.\n",
        );
    }

    prompt
}

/// User prompt for a task, with the crew-assembled context (possibly empty).
pub fn build_task_prompt(task: &Task, context: &str) -> String {
    let mut prompt = format!(
        "Current Task: {description}\n\n\
         This is the expected criteria for your final answer: {expected}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        description = task.description.trim(),
        expected = task.expected_output.trim(),
    );

    if !context.trim().is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }

    prompt
}

/// Run `agent` on `task` until it produces a final answer.
///
/// Model errors abort the task. Tool failures do not: they are returned to
/// the model as JSON error strings.
pub async fn run_agent_task(
    agent: &Agent,
    task: &Task,
    context: &str,
    model: &dyn ChatModel,
    search: &dyn SearchBackend,
    logger: &mut Option<RunLogger>,
) -> Result<TaskRun, CrewError> {
    let tools = tools_named(&agent.tools);
    let mut chat_req = ChatRequest::from_system(build_system_prompt(agent))
        .append_message(ChatMessage::user(build_task_prompt(task, context)));
    if !tools.is_empty() {
        chat_req = chat_req.with_tools(tools);
    }

    let mut tool_call_count = 0;

    for iteration in 1..=agent.max_iter {
        let turn = call_model(model, chat_req.clone(), task, iteration, logger).await?;

        if turn.tool_calls.is_empty() {
            let answer = final_answer(turn, task, iteration, logger)?;
            return Ok(TaskRun {
                answer,
                iterations: iteration,
                tool_calls: tool_call_count,
            });
        }

        chat_req = chat_req.append_message(ChatMessage::from(turn.tool_calls.clone()));

        for call in &turn.tool_calls {
            tracing::info!(
                task = %task.name,
                agent = %agent.role,
                iteration,
                tool = %call.fn_name,
                args = %call.fn_arguments,
                "Tool call"
            );
            log(
                logger,
                &LogEntry::ToolCall {
                    timestamp: now_iso(),
                    task: task.name.clone(),
                    iteration,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    fn_arguments: call.fn_arguments.clone(),
                },
            )?;

            tool_call_count += 1;
            let result = dispatch_tool_call(call, search).await;

            tracing::debug!(task = %task.name, bytes = result.len(), "Tool result");
            log(
                logger,
                &LogEntry::ToolResult {
                    timestamp: now_iso(),
                    task: task.name.clone(),
                    iteration,
                    call_id: call.call_id.clone(),
                    fn_name: call.fn_name.clone(),
                    result: result.clone(),
                },
            )?;

            chat_req = chat_req.append_message(ToolResponse::new(call.call_id.clone(), result));
        }
    }

    // Iteration cap reached: force a final answer without tools.
    tracing::warn!(task = %task.name, max_iter = agent.max_iter, "Iteration cap reached, forcing final answer");
    log(
        logger,
        &LogEntry::SystemMessage {
            timestamp: now_iso(),
            task: task.name.clone(),
            content: MAX_ITER_NOTICE.to_string(),
        },
    )?;
    chat_req.tools = None;
    chat_req = chat_req.append_message(ChatMessage::user(MAX_ITER_NOTICE));

    let iteration = agent.max_iter + 1;
    let turn = call_model(model, chat_req, task, iteration, logger).await?;
    let answer = final_answer(turn, task, iteration, logger)?;

    Ok(TaskRun {
        answer,
        iterations: iteration,
        tool_calls: tool_call_count,
    })
}

async fn call_model(
    model: &dyn ChatModel,
    request: ChatRequest,
    task: &Task,
    iteration: usize,
    logger: &mut Option<RunLogger>,
) -> Result<ModelTurn, CrewError> {
    tracing::debug!(task = %task.name, iteration, model = model.name(), "Calling model");

    let turn = match model.complete(request).await {
        Ok(turn) => turn,
        Err(e) => {
            tracing::error!(task = %task.name, iteration, "Model call failed: {e}");
            log(
                logger,
                &LogEntry::Error {
                    timestamp: now_iso(),
                    task: task.name.clone(),
                    message: e.to_string(),
                },
            )?;
            return Err(e.into());
        }
    };

    if let (Some(prompt_tokens), Some(completion_tokens)) =
        (turn.prompt_tokens, turn.completion_tokens)
    {
        log(
            logger,
            &LogEntry::TokenUsage {
                timestamp: now_iso(),
                task: task.name.clone(),
                iteration,
                prompt_tokens,
                completion_tokens,
            },
        )?;
    }

    Ok(turn)
}

fn final_answer(
    turn: ModelTurn,
    task: &Task,
    iteration: usize,
    logger: &mut Option<RunLogger>,
) -> Result<String, CrewError> {
    let answer = turn.text.unwrap_or_default().trim().to_string();
    if answer.is_empty() {
        return Err(CrewError::EmptyOutput {
            task: task.name.clone(),
        });
    }

    log(
        logger,
        &LogEntry::AssistantText {
            timestamp: now_iso(),
            task: task.name.clone(),
            iteration,
            content: answer.clone(),
        },
    )?;

    Ok(answer)
}

/// Append to the run log when one is active.
pub(crate) fn log(logger: &mut Option<RunLogger>, entry: &LogEntry) -> Result<(), CrewError> {
    match logger {
        Some(l) => l.log_event(entry),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use genai::chat::ToolCall;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned turns and records whether each request offered tools.
    struct ScriptedModel {
        turns: Mutex<VecDeque<Result<ModelTurn, LlmError>>>,
        tools_offered: Mutex<Vec<bool>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<Result<ModelTurn, LlmError>>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                tools_offered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
            self.tools_offered.lock().unwrap().push(request.tools.is_some());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelTurn::text("fallback answer")))
        }
    }

    struct StaticSearch;

    #[async_trait]
    impl SearchBackend for StaticSearch {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn search(&self, _query: &str) -> String {
            "[]".to_string()
        }
    }

    fn search_call(id: &str) -> ToolCall {
        ToolCall {
            call_id: id.to_string(),
            fn_name: "search_web_tool".to_string(),
            fn_arguments: serde_json::json!({"query": "Rome weather March"}),
            thought_signatures: None,
        }
    }

    fn agent() -> Agent {
        Agent::new("Travel Trip Expert", "Gather info", "Seasoned traveler")
            .with_tool("search_web_tool")
            .with_max_iter(2)
    }

    fn task() -> Task {
        Task::new("location", "Collect data on Rome", "Markdown report", "Travel Trip Expert")
    }

    #[test]
    fn system_prompt_contains_role_goal_and_tools() {
        let prompt = build_system_prompt(&agent());
        assert!(prompt.starts_with("You are Travel Trip Expert. Seasoned traveler"));
        assert!(prompt.contains("Your personal goal is: Gather info"));
        assert!(prompt.contains("### search_web_tool"));
    }

    #[test]
    fn task_prompt_includes_context_only_when_present() {
        let without = build_task_prompt(&task(), "  ");
        assert!(without.contains("Current Task: Collect data on Rome"));
        assert!(without.contains("expected criteria for your final answer: Markdown report"));
        assert!(!without.contains("context you're working with"));

        let with = build_task_prompt(&task(), "Hotels near Termini");
        assert!(with.ends_with("This is the context you're working with:\nHotels near Termini"));
    }

    #[tokio::test]
    async fn text_reply_is_final_answer() {
        let model = ScriptedModel::new(vec![Ok(ModelTurn::text("  # Rome report  \n"))]);
        let run = run_agent_task(&agent(), &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap();

        assert_eq!(run.answer, "# Rome report");
        assert_eq!(run.iterations, 1);
        assert_eq!(run.tool_calls, 0);
    }

    #[tokio::test]
    async fn tool_calls_are_dispatched_before_answer() {
        let model = ScriptedModel::new(vec![
            Ok(ModelTurn::tool_calls(vec![search_call("c1"), search_call("c2")])),
            Ok(ModelTurn::text("Report with search results")),
        ]);
        let run = run_agent_task(&agent(), &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap();

        assert_eq!(run.answer, "Report with search results");
        assert_eq!(run.iterations, 2);
        assert_eq!(run.tool_calls, 2);
    }

    #[tokio::test]
    async fn iteration_cap_forces_answer_without_tools() {
        let model = ScriptedModel::new(vec![
            Ok(ModelTurn::tool_calls(vec![search_call("c1")])),
            Ok(ModelTurn::tool_calls(vec![search_call("c2")])),
            Ok(ModelTurn::text("Forced final answer")),
        ]);
        let run = run_agent_task(&agent(), &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap();

        assert_eq!(run.answer, "Forced final answer");
        assert_eq!(run.iterations, 3);
        assert_eq!(*model.tools_offered.lock().unwrap(), vec![true, true, false]);
    }

    #[tokio::test]
    async fn empty_answer_fails_task() {
        let model = ScriptedModel::new(vec![Ok(ModelTurn::text("   "))]);
        let err = run_agent_task(&agent(), &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap_err();

        assert!(matches!(err, CrewError::EmptyOutput { task } if task == "location"));
    }

    #[tokio::test]
    async fn model_error_propagates() {
        let model = ScriptedModel::new(vec![Err(LlmError::MissingCredentials {
            var: "OPENAI_API_KEY".to_string(),
        })]);
        let err = run_agent_task(&agent(), &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CrewError::Llm(LlmError::MissingCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn agent_without_tools_sends_no_tool_schema() {
        let model = ScriptedModel::new(vec![Ok(ModelTurn::text("answer"))]);
        let plain = Agent::new("Writer", "Write", "Writes");
        run_agent_task(&plain, &task(), "", &model, &StaticSearch, &mut None)
            .await
            .unwrap();

        assert_eq!(*model.tools_offered.lock().unwrap(), vec![false]);
    }
}
