//! Web search backends behind the agents' `search_web_tool`.
//!
//! Provides DuckDuckGo (zero-config, HTML scraping) and Brave Search (API key
//! required). Both return structured `SearchResult` objects serialized as a
//! JSON array string, or a JSON `{"error": ...}` object on failure, so the
//! model can observe and react to search problems.
//!
//! Each backend enforces a minimum delay between its own requests to avoid
//! being blocked upstream.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;

use crate::config::{AppConfig, SearchProvider};

/// A single search result with title, URL, and snippet.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run `query` and return the JSON-encoded results (or JSON error).
    async fn search(&self, query: &str) -> String;
}

/// Build the backend selected in config.
pub fn backend_from_config(config: &AppConfig) -> Arc<dyn SearchBackend> {
    match config.search_provider {
        SearchProvider::DuckDuckGo => Arc::new(DuckDuckGo::new(
            config.search_results,
            config.search_rate_limit_secs,
        )),
        SearchProvider::Brave => Arc::new(Brave::new(
            config.search_results,
            config.brave_api_key_env.clone(),
            config.search_rate_limit_secs,
        )),
    }
}

// ---------------------------------------------------------------------------
// DuckDuckGo
// ---------------------------------------------------------------------------

pub struct DuckDuckGo {
    count: usize,
    limiter: RateLimiter,
}

impl DuckDuckGo {
    pub fn new(count: usize, rate_limit_secs: f64) -> Self {
        Self {
            count,
            limiter: RateLimiter::new(rate_limit_secs),
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> String {
        self.limiter.wait().await;
        search_duckduckgo(query, self.count).await
    }
}

/// Search DuckDuckGo via the lite HTML endpoint.
///
/// Sends a GET request to `https://lite.duckduckgo.com/lite/` and parses
/// result links, titles, and snippets from the table-based HTML layout
/// using CSS selectors.
pub async fn search_duckduckgo(query: &str, count: usize) -> String {
    let client = match reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0")
        .timeout(Duration::from_secs(15))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return json!({"error": format!("search_web_tool: failed to build client: {e}")})
                .to_string();
        }
    };

    let resp = match client
        .get("https://lite.duckduckgo.com/lite/")
        .query(&[("q", query)])
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return json!({"error": format!("search_web_tool: DuckDuckGo request failed: {e}")})
                .to_string();
        }
    };

    let html = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            return json!({"error": format!("search_web_tool: failed to read DDG response: {e}")})
                .to_string();
        }
    };

    let results = parse_ddg_lite_html(&html, count);
    tracing::debug!(query, results = results.len(), "DuckDuckGo search complete");

    serde_json::to_string(&results).unwrap_or_else(|e| {
        json!({"error": format!("search_web_tool: failed to serialize results: {e}")}).to_string()
    })
}

/// Parse DuckDuckGo Lite HTML to extract search results.
///
/// Result links are `<a class="result-link">`; the snippet for the i-th link
/// is the i-th `<td class="result-snippet">`.
fn parse_ddg_lite_html(html: &str, count: usize) -> Vec<SearchResult> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);

    let (Ok(link_selector), Ok(snippet_selector)) = (
        Selector::parse("a.result-link"),
        Selector::parse("td.result-snippet"),
    ) else {
        return Vec::new();
    };

    let links: Vec<_> = document.select(&link_selector).collect();
    let snippets: Vec<_> = document.select(&snippet_selector).collect();

    let mut results = Vec::new();

    for (i, link) in links.iter().enumerate() {
        if results.len() >= count {
            break;
        }

        let title = link.text().collect::<String>().trim().to_string();
        let url = unwrap_ddg_redirect(link.value().attr("href").unwrap_or("").trim());

        if title.is_empty() || url.is_empty() {
            continue;
        }

        let snippet = snippets
            .get(i)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            snippet,
        });
    }

    results
}

/// DDG sometimes wraps results as `//duckduckgo.com/l/?uddg=<encoded target>`.
/// Return the target URL in that case, the href unchanged otherwise.
fn unwrap_ddg_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.host_str() == Some("duckduckgo.com") && url.path() == "/l/" => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        _ => href.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Brave
// ---------------------------------------------------------------------------

pub struct Brave {
    count: usize,
    api_key_env: String,
    limiter: RateLimiter,
}

impl Brave {
    /// `api_key_env` names the variable holding the subscription token; it is
    /// read per request so a `.env` edit is picked up without restart.
    pub fn new(count: usize, api_key_env: String, rate_limit_secs: f64) -> Self {
        Self {
            count,
            api_key_env,
            limiter: RateLimiter::new(rate_limit_secs),
        }
    }
}

#[async_trait]
impl SearchBackend for Brave {
    fn name(&self) -> &'static str {
        "brave"
    }

    async fn search(&self, query: &str) -> String {
        let api_key = match std::env::var(&self.api_key_env) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => {
                return json!({
                    "error": format!("search_web_tool: {} is not set", self.api_key_env)
                })
                .to_string();
            }
        };
        self.limiter.wait().await;
        search_brave(query, self.count, &api_key).await
    }
}

/// Search using the Brave Search REST API.
///
/// Requires a valid API key (`X-Subscription-Token` header). Parses the
/// JSON response and extracts results from the `web.results` array.
pub async fn search_brave(query: &str, count: usize, api_key: &str) -> String {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return json!({"error": format!("search_web_tool: failed to build client: {e}")})
                .to_string();
        }
    };

    let resp = match client
        .get("https://api.search.brave.com/res/v1/web/search")
        .header("X-Subscription-Token", api_key)
        .header("Accept", "application/json")
        .query(&[("q", query), ("count", &count.to_string())])
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return json!({"error": format!("search_web_tool: Brave request failed: {e}")})
                .to_string();
        }
    };

    let status = resp.status();

    if status.as_u16() == 401 {
        return json!({"error": "search_web_tool: Brave API key is invalid or expired"})
            .to_string();
    }

    if status.as_u16() == 429 {
        return json!({"error": "search_web_tool: Brave Search rate limit exceeded, try again later"})
            .to_string();
    }

    if !status.is_success() {
        return json!({"error": format!("search_web_tool: Brave HTTP {status}")}).to_string();
    }

    let body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => {
            return json!({"error": format!("search_web_tool: failed to parse Brave response: {e}")})
                .to_string();
        }
    };

    let results = parse_brave_results(&body, count);

    serde_json::to_string(&results).unwrap_or_else(|e| {
        json!({"error": format!("search_web_tool: failed to serialize results: {e}")}).to_string()
    })
}

fn parse_brave_results(body: &serde_json::Value, count: usize) -> Vec<SearchResult> {
    body["web"]["results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(count)
                .filter_map(|r| {
                    Some(SearchResult {
                        title: r["title"].as_str()?.to_string(),
                        url: r["url"].as_str()?.to_string(),
                        snippet: r["description"].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Minimum-interval gate shared by all requests of one backend.
struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new(min_secs: f64) -> Self {
        let min_interval = Duration::try_from_secs_f64(min_secs.max(0.0)).unwrap_or_else(|e| {
            tracing::warn!("Ignoring search rate limit {min_secs}: {e}");
            Duration::ZERO
        });
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait if necessary so the interval since the last request is at least
    /// `min_interval`, then record the new request time.
    async fn wait(&self) {
        // Read the last request time (lock released immediately).
        let remaining = {
            let guard = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
            guard.and_then(|last| self.min_interval.checked_sub(last.elapsed()))
        };

        // Sleep outside the lock if needed.
        if let Some(wait) = remaining {
            tokio::time::sleep(wait).await;
        }

        let mut guard = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ddg_without_result_table() {
        assert!(parse_ddg_lite_html("<p>No results for this query.</p>", 10).is_empty());
    }

    #[test]
    fn parse_ddg_with_results() {
        let html = r#"
        <html><body>
        <table>
            <tr>
                <td><a class="result-link" href="https://www.rome.info/">Rome travel guide</a></td>
            </tr>
            <tr>
                <td class="result-snippet">Everything about visiting Rome</td>
            </tr>
            <tr>
                <td><a class="result-link" href="https://example.com/trattorie">Best trattorie</a></td>
            </tr>
            <tr>
                <td class="result-snippet">Where locals eat</td>
            </tr>
        </table>
        </body></html>
        "#;

        let results = parse_ddg_lite_html(html, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rome travel guide");
        assert_eq!(results[0].url, "https://www.rome.info/");
        assert_eq!(results[0].snippet, "Everything about visiting Rome");
        assert_eq!(results[1].title, "Best trattorie");
        assert_eq!(results[1].snippet, "Where locals eat");
    }

    #[test]
    fn parse_ddg_stops_at_requested_count() {
        let rows: String = ["Trevi", "Borghese", "Trastevere"]
            .iter()
            .map(|name| {
                format!(
                    "<tr><td><a class=\"result-link\" href=\"https://rome.example/{name}\">{name}</a></td></tr>\
                     <tr><td class=\"result-snippet\">About {name}</td></tr>"
                )
            })
            .collect();
        let html = format!("<table>{rows}</table>");

        let results = parse_ddg_lite_html(&html, 2);
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Trevi", "Borghese"]);
    }

    #[test]
    fn parse_ddg_skips_links_without_href() {
        let html = r#"
        <table>
            <tr><td><a class="result-link">No target</a></td></tr>
            <tr><td><a class="result-link" href="https://ok.com">Ok</a></td></tr>
        </table>
        "#;

        let results = parse_ddg_lite_html(html, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://ok.com");
    }

    #[test]
    fn redirect_links_are_unwrapped() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.colosseo.it%2Fen%2F&rut=abc";
        assert_eq!(unwrap_ddg_redirect(href), "https://www.colosseo.it/en/");
    }

    #[test]
    fn plain_links_are_unchanged() {
        assert_eq!(
            unwrap_ddg_redirect("https://example.com/a?b=c"),
            "https://example.com/a?b=c"
        );
        assert_eq!(unwrap_ddg_redirect("not a url"), "not a url");
    }

    #[test]
    fn parse_brave_results_extracts_web_results() {
        let body = json!({
            "web": {"results": [
                {"title": "Vatican Museums", "url": "https://m.va", "description": "Tickets"},
                {"title": "No url"},
                {"title": "Pantheon", "url": "https://pantheon.it"}
            ]}
        });

        let results = parse_brave_results(&body, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "Tickets");
        assert_eq!(results[1].title, "Pantheon");
        assert_eq!(results[1].snippet, "");
    }

    #[tokio::test]
    async fn brave_without_key_reports_error_json() {
        let backend = Brave::new(5, "VOYAGE_TEST_BRAVE_KEY_NEVER_SET".to_string(), 0.0);
        let out = backend.search("rome").await;
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("VOYAGE_TEST_BRAVE_KEY_NEVER_SET"));
    }

    #[test]
    fn rate_limiter_tolerates_unrepresentable_interval() {
        assert_eq!(RateLimiter::new(f64::INFINITY).min_interval, Duration::ZERO);
        assert_eq!(RateLimiter::new(f64::NAN).min_interval, Duration::ZERO);
        assert_eq!(RateLimiter::new(-3.0).min_interval, Duration::ZERO);
    }

    #[tokio::test]
    async fn rate_limiter_enforces_interval() {
        let limiter = RateLimiter::new(0.05);
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
