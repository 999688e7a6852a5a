use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for voyage.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub crew: Option<CrewConfig>,
    pub search: Option<SearchConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    /// Name of the environment variable holding the model provider key.
    /// An empty string disables the credential check.
    pub api_key_env: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrewConfig {
    pub max_iter: Option<usize>,
    pub run_log: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    pub provider: Option<String>,
    pub results: Option<usize>,
    pub rate_limit_secs: Option<f64>,
    pub brave_api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl_secs: Option<u64>,
    /// Completed plans kept per session; older ones are discarded.
    pub max_history: Option<usize>,
}

/// Which web search backend the agents' search tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    DuckDuckGo,
    Brave,
}

impl std::str::FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            "brave" => Ok(SearchProvider::Brave),
            other => Err(format!("unknown search provider '{other}' (expected duckduckgo or brave)")),
        }
    }
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub api_key_env: String,
    pub output_dir: PathBuf,
    pub max_iter: usize,
    pub run_log: bool,
    pub search_provider: SearchProvider,
    pub search_results: usize,
    pub search_rate_limit_secs: f64,
    pub brave_api_key_env: String,
    pub bind: String,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub max_history: usize,
}

impl AppConfig {
    /// Directory for JSONL run logs, if enabled.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.run_log.then(|| self.output_dir.join(".voyage-logs"))
    }
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_iter: Option<usize>,
    pub run_log: Option<bool>,
    pub search_provider: Option<SearchProvider>,
    pub search_results: Option<usize>,
    pub search_rate_limit_secs: Option<f64>,
    pub brave_api_key_env: Option<String>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub session_ttl_secs: Option<u64>,
    pub max_history: Option<usize>,
}
