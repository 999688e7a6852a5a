pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::{Cli, Commands};
use crate::error::ConfigError;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the global config dir.
pub const CONFIG_FILE_NAME: &str = "voyage.toml";

/// Load configuration by merging global, local, and CLI sources.
/// Precedence: CLI > explicit `--config` file (or ./voyage.toml) > global config > defaults.
///
/// Missing implicit config files are handled gracefully (defaults apply). An
/// explicit `--config` path must exist and parse.
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config (~/.config/voyage/voyage.toml or platform equivalent)
    let global = load_global_config();

    // Layer 2: Explicit --config file, or voyage.toml in the working directory
    let local = match &cli.command.common().config {
        Some(path) => load_toml_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => load_optional_file(Path::new(CONFIG_FILE_NAME)),
    };

    // Layer 3: CLI args (converted to PartialConfig)
    let cli_partial = cli_to_partial(cli);

    let config = cli_partial
        .with_fallback(local)
        .with_fallback(global)
        .finalize();

    Ok(config)
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_optional_file(&p),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load a config file that may legitimately be absent. Parse errors are
/// logged and the layer is skipped.
fn load_optional_file(path: &Path) -> PartialConfig {
    match load_toml_file(path) {
        Ok(partial) => partial,
        Err(ConfigError::IoError { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            PartialConfig::default()
        }
        Err(e) => {
            tracing::warn!("Config error: {e}");
            PartialConfig::default()
        }
    }
}

/// Read and parse a TOML config file into a PartialConfig.
pub fn load_toml_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let partial = parse_config(&contents).map_err(|e| match e {
        ConfigError::ParseError { message, .. } => ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(partial)
}

/// Parse TOML text into a PartialConfig.
pub fn parse_config(contents: &str) -> Result<PartialConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
        path: PathBuf::new(),
        message: e.to_string(),
    })?;
    file.to_partial()
}

impl ConfigFile {
    /// Flatten the sectioned file layout into a PartialConfig.
    pub fn to_partial(self) -> Result<PartialConfig, ConfigError> {
        let mut partial = PartialConfig::default();

        if let Some(general) = self.general {
            partial.model = general.model;
            partial.api_key_env = general.api_key_env;
            partial.output_dir = general.output_dir.map(PathBuf::from);
        }
        if let Some(crew) = self.crew {
            partial.max_iter = crew.max_iter;
            partial.run_log = crew.run_log;
        }
        if let Some(search) = self.search {
            partial.search_provider = search
                .provider
                .map(|p| p.parse())
                .transpose()
                .map_err(|message| ConfigError::Invalid {
                    key: "search.provider",
                    message,
                })?;
            partial.search_results = search.results;
            partial.search_rate_limit_secs = search
                .rate_limit_secs
                .map(check_rate_limit)
                .transpose()?;
            partial.brave_api_key_env = search.brave_api_key_env;
        }
        if let Some(server) = self.server {
            partial.bind = server.bind;
            partial.port = server.port;
            partial.session_ttl_secs = server.session_ttl_secs;
            partial.max_history = server.max_history;
        }

        Ok(partial)
    }
}

/// Upper bound for `search.rate_limit_secs`.
pub const MAX_RATE_LIMIT_SECS: f64 = 3600.0;

fn check_rate_limit(secs: f64) -> Result<f64, ConfigError> {
    if secs.is_finite() && (0.0..=MAX_RATE_LIMIT_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Invalid {
            key: "search.rate_limit_secs",
            message: format!("{secs} is not between 0 and {MAX_RATE_LIMIT_SECS} seconds"),
        })
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/voyage/voyage.toml
/// macOS: ~/Library/Application Support/voyage/voyage.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "voyage")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    let common = cli.command.common();
    let mut partial = PartialConfig {
        model: common.model.clone(),
        output_dir: common.output_dir.clone(),
        ..Default::default()
    };
    if let Commands::Serve { bind, port, .. } = &cli.command {
        partial.bind = bind.clone();
        partial.port = *port;
    }
    partial
}
