//! Application configuration for contentlift.
//!
//! User config lives at `~/.contentlift/contentlift.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never written to the file; it names the env vars that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentLiftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentlift.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentlift";

/// Desktop Chrome user-agent used for page fetches and browser renders.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching contentlift.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub content_store: ContentStoreConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// `[content_store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStoreConfig {
    /// Base URL of the article API (no trailing slash).
    #[serde(default = "default_store_url")]
    pub base_url: String,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:8000/api".into()
}

/// `[search]` section: the primary search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Custom Search JSON endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the search engine id.
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,

    /// Raw results requested from the provider.
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Candidates kept after filtering.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Case-insensitive substrings that exclude a result URL.
    #[serde(default = "default_search_denylist")]
    pub denylist: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            engine_id_env: default_engine_id_env(),
            num_results: default_num_results(),
            candidate_limit: default_candidate_limit(),
            denylist: default_search_denylist(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}
fn default_search_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_engine_id_env() -> String {
    "GOOGLE_SEARCH_ENGINE_ID".into()
}
fn default_num_results() -> u32 {
    10
}
fn default_candidate_limit() -> usize {
    2
}
fn default_search_denylist() -> Vec<String> {
    let mut list = default_browser_denylist();
    list.insert(6, "pinterest.com".into());
    list
}

/// `[browser]` section: the headless-browser search fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome/Chromium executable name or path.
    #[serde(default = "default_browser_executable")]
    pub executable: String,

    /// Search results page rendered for the query.
    #[serde(default = "default_browser_search_url")]
    pub search_url: String,

    /// Result blocks parsed from the rendered page.
    #[serde(default = "default_browser_max_results")]
    pub max_results: usize,

    /// Upper bound on a single render.
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,

    /// Case-insensitive substrings that exclude a result URL.
    #[serde(default = "default_browser_denylist")]
    pub denylist: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: default_browser_executable(),
            search_url: default_browser_search_url(),
            max_results: default_browser_max_results(),
            timeout_secs: default_browser_timeout(),
            denylist: default_browser_denylist(),
        }
    }
}

fn default_browser_executable() -> String {
    "google-chrome".into()
}
fn default_browser_search_url() -> String {
    "https://www.google.com/search".into()
}
fn default_browser_max_results() -> usize {
    10
}
fn default_browser_timeout() -> u64 {
    60
}
fn default_browser_denylist() -> Vec<String> {
    [
        "youtube.com",
        "facebook.com",
        "twitter.com",
        "instagram.com",
        "linkedin.com",
        "reddit.com",
        ".pdf",
        "/video/",
        "/watch",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[extract]` section: reference page fetching and text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_extract_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// A content region is accepted once its text exceeds this many characters.
    #[serde(default = "default_min_region_chars")]
    pub min_region_chars: usize,

    /// Text nodes shorter than this are treated as boilerplate.
    #[serde(default = "default_min_node_chars")]
    pub min_node_chars: usize,

    /// Hard cap on extracted text, before the ellipsis marker.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_extract_timeout(),
            user_agent: default_user_agent(),
            min_region_chars: default_min_region_chars(),
            min_node_chars: default_min_node_chars(),
            max_chars: default_max_chars(),
        }
    }
}

fn default_extract_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}
fn default_min_region_chars() -> usize {
    500
}
fn default_min_node_chars() -> usize {
    10
}
fn default_max_chars() -> usize {
    8_000
}

/// `[llm]` section: the generative model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the model provider key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Model identifiers, tried in this order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key_env: default_llm_key_env(),
            models: default_models(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_llm_key_env() -> String {
    "GOOGLE_GEMINI_API_KEY".into()
}
fn default_models() -> Vec<String> {
    [
        "gemini-2.5-flash",
        "gemini-2.5-pro",
        "gemini-flash-latest",
        "gemini-pro-latest",
        "gemini-2.0-flash",
        "gemini-exp-1206",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    8_000
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Maximum excerpt length in characters.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_excerpt_chars() -> usize {
    250
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentlift/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentLiftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentlift/contentlift.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentLiftError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentLiftError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentLiftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentLiftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentLiftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the env var named in the config.
///
/// `what` names the secret in the error message ("search API key").
pub fn resolve_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ContentLiftError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}
