use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::llm::{ChatModel, GenaiModel};
use crate::agent::web_search::{SearchBackend, backend_from_config};
use crate::config::AppConfig;
use crate::error::PlanError;
use crate::orchestration::{Crew, CrewOutput};

use super::crew_def;
use super::request::TripRequest;

/// Builds and runs the travel crew for one request at a time.
pub struct TripPlanner {
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchBackend>,
    max_iter: usize,
    output_dir: PathBuf,
    log_dir: Option<PathBuf>,
    // Output files are shared between runs; only one run writes at a time.
    run_lock: Mutex<()>,
}

impl TripPlanner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchBackend>,
        max_iter: usize,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            search,
            max_iter,
            output_dir: output_dir.into(),
            log_dir: None,
            run_lock: Mutex::new(()),
        }
    }

    /// Production planner: genai model and the configured search backend.
    pub fn from_config(config: &AppConfig) -> Self {
        let model = Arc::new(GenaiModel::new(&config.model, &config.api_key_env));
        Self::new(model, backend_from_config(config), config.max_iter, &config.output_dir)
            .with_log_dir(config.log_dir())
    }

    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Validate the request, run the three-task crew, and return its output.
    pub async fn plan(&self, request: TripRequest) -> Result<CrewOutput, PlanError> {
        let request = request.validated()?;
        let _guard = self.run_lock.lock().await;

        tracing::info!(
            origin = %request.origin,
            destination = %request.destination,
            model = self.model.name(),
            "Planning trip"
        );

        let crew = Crew::new(
            crew_def::agents(self.max_iter),
            crew_def::tasks(&request),
            self.model.clone(),
            self.search.clone(),
        )?
        .with_output_dir(&self.output_dir)
        .with_log_dir(self.log_dir.clone());

        Ok(crew.kickoff().await?)
    }
}
