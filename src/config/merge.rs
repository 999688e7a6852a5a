use super::schema::{AppConfig, PartialConfig, SearchProvider};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MAX_ITER: usize = 5;
pub const DEFAULT_SEARCH_RESULTS: usize = 10;
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_HISTORY: usize = 20;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            model: self.model.or(fallback.model),
            api_key_env: self.api_key_env.or(fallback.api_key_env),
            output_dir: self.output_dir.or(fallback.output_dir),
            max_iter: self.max_iter.or(fallback.max_iter),
            run_log: self.run_log.or(fallback.run_log),
            search_provider: self.search_provider.or(fallback.search_provider),
            search_results: self.search_results.or(fallback.search_results),
            search_rate_limit_secs: self
                .search_rate_limit_secs
                .or(fallback.search_rate_limit_secs),
            brave_api_key_env: self.brave_api_key_env.or(fallback.brave_api_key_env),
            bind: self.bind.or(fallback.bind),
            port: self.port.or(fallback.port),
            session_ttl_secs: self.session_ttl_secs.or(fallback.session_ttl_secs),
            max_history: self.max_history.or(fallback.max_history),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    pub fn finalize(self) -> AppConfig {
        AppConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key_env: self
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            // A zero cap would never reach the model; clamp to one iteration.
            max_iter: self.max_iter.unwrap_or(DEFAULT_MAX_ITER).max(1),
            run_log: self.run_log.unwrap_or(true),
            search_provider: self.search_provider.unwrap_or(SearchProvider::DuckDuckGo),
            search_results: self.search_results.unwrap_or(DEFAULT_SEARCH_RESULTS),
            search_rate_limit_secs: self.search_rate_limit_secs.unwrap_or(1.0).max(0.0),
            brave_api_key_env: self
                .brave_api_key_env
                .unwrap_or_else(|| "BRAVE_API_KEY".to_string()),
            bind: self.bind.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            session_ttl_secs: self.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
            max_history: self.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_empty_uses_defaults() {
        let config = PartialConfig::default().finalize();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.max_iter, 5);
        assert_eq!(config.search_provider, SearchProvider::DuckDuckGo);
        assert_eq!(config.search_results, 10);
        assert_eq!(config.port, 8501);
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.max_history, 20);
        assert!(config.run_log);
    }

    #[test]
    fn higher_priority_wins() {
        let cli = PartialConfig {
            model: Some("ollama::llama3.2".to_string()),
            ..Default::default()
        };
        let file = PartialConfig {
            model: Some("gpt-4o-mini".to_string()),
            port: Some(9000),
            ..Default::default()
        };

        let config = cli.with_fallback(file).finalize();
        assert_eq!(config.model, "ollama::llama3.2");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn zero_max_iter_is_clamped() {
        let config = PartialConfig {
            max_iter: Some(0),
            ..Default::default()
        }
        .finalize();
        assert_eq!(config.max_iter, 1);
    }

    #[test]
    fn log_dir_follows_output_dir() {
        let mut config = PartialConfig {
            output_dir: Some(PathBuf::from("/tmp/trips")),
            ..Default::default()
        }
        .finalize();
        assert_eq!(config.log_dir(), Some(PathBuf::from("/tmp/trips/.voyage-logs")));

        config.run_log = false;
        assert_eq!(config.log_dir(), None);
    }
}
