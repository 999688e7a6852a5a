//! Type definitions for the crew: agent roles, tasks, and their outputs.
//!
//! Outputs derive [`serde::Serialize`] so they can be stored in session
//! history and logged.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A named role configuration handed to the model as its system prompt.
#[derive(Clone, Debug)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Tool names this agent may call.
    pub tools: Vec<String>,
    /// Maximum tool-enabled model calls before a final answer is forced.
    pub max_iter: usize,
    /// Agents in this crew never delegate; kept so role literals read like
    /// their configuration.
    pub allow_delegation: bool,
}

impl Agent {
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            max_iter: 5,
            allow_delegation: false,
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }
}

/// Which earlier task outputs a task sees as context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskContext {
    /// Every task that ran before this one (sequential default).
    Previous,
    /// Only the named tasks, in the order given.
    Tasks(Vec<String>),
    /// No context.
    Empty,
}

/// A natural-language instruction assigned to one agent.
#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that runs this task.
    pub agent: String,
    pub context: TaskContext,
    /// File name (relative to the crew's output directory) the final answer
    /// is written to.
    pub output_file: Option<PathBuf>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
            context: TaskContext::Previous,
            output_file: None,
        }
    }

    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }
}

/// Result of one task.
#[derive(Clone, Debug, Serialize)]
pub struct TaskOutput {
    pub name: String,
    pub agent: String,
    pub raw: String,
    /// Where the output was written, if the task has an output file.
    pub output_file: Option<PathBuf>,
    pub iterations: usize,
    pub tool_calls: usize,
}

/// Result of a full crew run. `Display` prints the final task's output.
#[derive(Clone, Debug, Serialize)]
pub struct CrewOutput {
    pub raw: String,
    pub tasks: Vec<TaskOutput>,
    pub elapsed_secs: f64,
}

impl CrewOutput {
    pub fn task(&self, name: &str) -> Option<&TaskOutput> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
