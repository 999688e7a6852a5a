//! Crew orchestration: agent/task definitions and the sequential runner
//! that executes tasks in order and aggregates their outputs.

pub mod crew;
pub mod types;

pub use crew::Crew;
pub use types::{Agent, CrewOutput, Task, TaskContext, TaskOutput};
