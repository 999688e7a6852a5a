//! Sequential crew runner.
//!
//! A [`Crew`] owns the agents, the ordered tasks, and the model/search
//! handles. [`Crew::kickoff`] runs tasks strictly in order; each task sees the
//! outputs of earlier tasks according to its [`TaskContext`], and its final
//! answer is written to its output file before the next task starts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::agent::agent_loop::{log, run_agent_task};
use crate::agent::llm::ChatModel;
use crate::agent::logging::{LogEntry, RunLogger, now_iso};
use crate::agent::web_search::SearchBackend;
use crate::error::CrewError;

use super::types::{Agent, CrewOutput, Task, TaskContext, TaskOutput};

/// A task failure outranks a failure to record the end of the run.
fn first_failure(outcome: Result<(), CrewError>, logged: Result<(), CrewError>) -> Result<(), CrewError> {
    if let Err(e) = &logged {
        tracing::warn!("Failed to log run end: {e}");
    }
    outcome.and(logged)
}

/// Placed between task outputs when several form one context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchBackend>,
    output_dir: PathBuf,
    log_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("agents", &self.agents)
            .field("tasks", &self.tasks)
            .field("model", &self.model.name())
            .field("search", &self.search.name())
            .field("output_dir", &self.output_dir)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl Crew {
    /// Assemble a crew, checking that every task names a known agent and that
    /// explicit context dependencies point at earlier tasks.
    pub fn new(
        agents: Vec<Agent>,
        tasks: Vec<Task>,
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchBackend>,
    ) -> Result<Self, CrewError> {
        validate(&agents, &tasks)?;
        Ok(Self {
            agents,
            tasks,
            model,
            search,
            output_dir: PathBuf::from("."),
            log_dir: None,
        })
    }

    /// Directory task output files are written into.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enable the JSONL run log in `dir`.
    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    /// Run every task in order and collect their outputs.
    pub async fn kickoff(&self) -> Result<CrewOutput, CrewError> {
        let start = Instant::now();

        let mut logger = match &self.log_dir {
            Some(dir) => match RunLogger::new_in_dir(dir) {
                Ok(l) => {
                    tracing::info!(log = %l.log_path().display(), "Run log opened");
                    Some(l)
                }
                Err(e) => {
                    tracing::warn!("Run log disabled: {e}");
                    None
                }
            },
            None => None,
        };

        log(
            &mut logger,
            &LogEntry::RunStart {
                timestamp: now_iso(),
                model: self.model.name().to_string(),
                tasks: self.tasks.iter().map(|t| t.name.clone()).collect(),
            },
        )?;

        let mut completed: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let outcome = self.run_tasks(&mut completed, &mut logger).await;

        let elapsed_secs = start.elapsed().as_secs_f64();
        let logged = log(
            &mut logger,
            &LogEntry::RunEnd {
                timestamp: now_iso(),
                tasks_completed: completed.len(),
                elapsed_secs,
                reason: if outcome.is_ok() { "completed" } else { "error" }.to_string(),
            },
        );
        first_failure(outcome, logged)?;

        let raw = completed.last().map(|t| t.raw.clone()).unwrap_or_default();
        tracing::info!(tasks = completed.len(), elapsed_secs, "Crew run complete");

        Ok(CrewOutput {
            raw,
            tasks: completed,
            elapsed_secs,
        })
    }

    async fn run_tasks(
        &self,
        completed: &mut Vec<TaskOutput>,
        logger: &mut Option<RunLogger>,
    ) -> Result<(), CrewError> {
        for task in &self.tasks {
            let agent = self
                .agents
                .iter()
                .find(|a| a.role == task.agent)
                .ok_or_else(|| CrewError::InvalidCrew(format!("no agent for task '{}'", task.name)))?;

            tracing::info!(task = %task.name, agent = %agent.role, "Task started");
            log(
                logger,
                &LogEntry::TaskStart {
                    timestamp: now_iso(),
                    task: task.name.clone(),
                    agent: agent.role.clone(),
                },
            )?;

            let context = assemble_context(task, completed);
            let run = run_agent_task(
                agent,
                task,
                &context,
                self.model.as_ref(),
                self.search.as_ref(),
                logger,
            )
            .await?;

            let output_file = match &task.output_file {
                Some(file) => Some(write_output(&self.output_dir, file, task, &run.answer).await?),
                None => None,
            };

            tracing::info!(
                task = %task.name,
                iterations = run.iterations,
                tool_calls = run.tool_calls,
                output = ?output_file,
                "Task finished"
            );
            log(
                logger,
                &LogEntry::TaskEnd {
                    timestamp: now_iso(),
                    task: task.name.clone(),
                    iterations: run.iterations,
                    tool_calls: run.tool_calls,
                    output_file: output_file.as_ref().map(|p| p.display().to_string()),
                },
            )?;

            completed.push(TaskOutput {
                name: task.name.clone(),
                agent: agent.role.clone(),
                raw: run.answer,
                output_file,
                iterations: run.iterations,
                tool_calls: run.tool_calls,
            });
        }
        Ok(())
    }
}

fn validate(agents: &[Agent], tasks: &[Task]) -> Result<(), CrewError> {
    if tasks.is_empty() {
        return Err(CrewError::InvalidCrew("crew has no tasks".to_string()));
    }

    for (i, task) in tasks.iter().enumerate() {
        if tasks[..i].iter().any(|t| t.name == task.name) {
            return Err(CrewError::InvalidCrew(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
        if !agents.iter().any(|a| a.role == task.agent) {
            return Err(CrewError::InvalidCrew(format!(
                "task '{}' is assigned to unknown agent '{}'",
                task.name, task.agent
            )));
        }
        if let TaskContext::Tasks(deps) = &task.context {
            for dep in deps {
                if !tasks[..i].iter().any(|t| &t.name == dep) {
                    return Err(CrewError::InvalidCrew(format!(
                        "task '{}' depends on '{}', which does not run before it",
                        task.name, dep
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Context text for `task` given the outputs completed so far.
pub fn assemble_context(task: &Task, completed: &[TaskOutput]) -> String {
    let selected: Vec<&str> = match &task.context {
        TaskContext::Empty => Vec::new(),
        TaskContext::Previous => completed.iter().map(|t| t.raw.as_str()).collect(),
        TaskContext::Tasks(names) => names
            .iter()
            .filter_map(|n| completed.iter().find(|t| &t.name == n))
            .map(|t| t.raw.as_str())
            .collect(),
    };
    selected.join(CONTEXT_SEPARATOR)
}

/// Write (overwrite) a task's answer and return the full path.
async fn write_output(
    output_dir: &Path,
    file: &Path,
    task: &Task,
    content: &str,
) -> Result<PathBuf, CrewError> {
    let path = output_dir.join(file);
    let to_err = |source| CrewError::OutputWrite {
        task: task.name.clone(),
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(to_err)?;
    }
    tokio::fs::write(&path, content).await.map_err(to_err)?;
    Ok(path)
}
