//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the path passed with `-f`), then applies
//! `AURORA_WORK_DIR`, `AURORA_LOG_LEVEL` and `AURORA_MODEL` overrides.
//! The Gemini key comes from `GOOGLE_API_KEY` only, never TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Gemini provider configuration, from `[llm.gemini]`.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Models collection URL; `/{model}:streamGenerateContent` is appended.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Attach the `googleSearch` grounding tool to every request.
    pub google_search: bool,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider (`"gemini"` or `"dummy"`). `default` in `[llm]`.
    pub provider: String,
    pub gemini: GeminiConfig,
}

/// Data-analysis section configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Rows of the dataset sent as model context; `0` sends everything.
    pub max_context_rows: usize,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    /// Base directory for logs, reports and relative paths (no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Log file; relative paths resolve against `work_dir`. `None` logs to stderr only.
    pub log_file: Option<PathBuf>,
    /// Directory holding prompt template overrides.
    pub prompts_dir: PathBuf,
    pub llm: LlmConfig,
    pub data: DataConfig,
    /// From `GOOGLE_API_KEY`.
    pub google_api_key: Option<String>,
}

/// Env-sourced values that take precedence over the TOML file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub model: Option<String>,
    pub google_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("AURORA_WORK_DIR").ok(),
            log_level: env::var("AURORA_LOG_LEVEL").ok(),
            model: env::var("AURORA_MODEL").ok(),
            google_api_key: env::var("GOOGLE_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

/// Raw TOML shape; `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    data: RawData,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_app_name")]
    name: String,
    #[serde(default = "default_work_dir")]
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    /// Empty string disables file logging.
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            log_file: default_log_file(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    gemini: RawGeminiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), gemini: RawGeminiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawGeminiConfig {
    #[serde(default = "default_gemini_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_gemini_model")]
    model: String,
    #[serde(default = "default_gemini_temperature")]
    temperature: f32,
    #[serde(default = "default_gemini_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_true")]
    google_search: bool,
}

impl Default for RawGeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            temperature: default_gemini_temperature(),
            timeout_seconds: default_gemini_timeout_seconds(),
            google_search: true,
        }
    }
}

#[derive(Deserialize)]
struct RawData {
    #[serde(default = "default_max_context_rows")]
    max_context_rows: usize,
}

impl Default for RawData {
    fn default() -> Self {
        Self { max_context_rows: default_max_context_rows() }
    }
}

fn default_app_name() -> String { "Aurora".to_string() }
fn default_work_dir() -> String { ".".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_file() -> String { "logs/app.log".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_llm_provider() -> String { "gemini".to_string() }
fn default_gemini_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_gemini_model() -> String { "gemini-2.0-flash".to_string() }
fn default_gemini_temperature() -> f32 { 0.7 }
fn default_gemini_timeout_seconds() -> u64 { 120 }
fn default_max_context_rows() -> usize { 1000 }

fn default_true() -> bool {
    true
}

/// Load config from `path` (default `config/default.toml`), then apply env overrides.
///
/// A missing default file is not an error: every field has a default. A
/// missing explicitly-requested file is.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();
    match path {
        Some(p) => load_from(Path::new(p), &overrides),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_from(default, &overrides)
            } else {
                resolve(parse_str("")?, &overrides)
            }
        }
    }
}

/// Internal loader; accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed = parse_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    resolve(parsed, overrides)
}

fn parse_str(raw: &str) -> Result<RawConfig, AppError> {
    toml::from_str(raw).map_err(|e| AppError::Config(e.to_string()))
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let a = parsed.app;

    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&a.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(a.log_level);
    let log_file = if a.log_file.trim().is_empty() {
        None
    } else {
        Some(under(&work_dir, &a.log_file))
    };
    let prompts_dir = under(&work_dir, &a.prompts_dir);

    let provider = parsed.llm.provider;
    if provider.trim().is_empty() {
        return Err(AppError::Config("[llm] default must name a provider".into()));
    }
    let g = parsed.llm.gemini;

    Ok(Config {
        app_name: a.name,
        work_dir,
        log_level,
        log_file,
        prompts_dir,
        llm: LlmConfig {
            provider,
            gemini: GeminiConfig {
                api_base_url: g.api_base_url.trim_end_matches('/').to_string(),
                model: overrides.model.clone().unwrap_or(g.model),
                temperature: g.temperature,
                timeout_seconds: g.timeout_seconds,
                google_search: g.google_search,
            },
        },
        data: DataConfig { max_context_rows: parsed.data.max_context_rows },
        google_api_key: overrides.google_api_key.clone(),
    })
}

/// Resolve `path` against `base` unless it is absolute or starts with `~`.
fn under(base: &Path, path: &str) -> PathBuf {
    let p = expand_home(path);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Offline `Config`: dummy LLM, no API key, no log file.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            app_name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            log_file: None,
            prompts_dir: work_dir.join("prompts"),
            llm: LlmConfig {
                provider: "dummy".into(),
                gemini: GeminiConfig {
                    api_base_url: "http://localhost:0/v1beta/models".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                    google_search: false,
                },
            },
            data: DataConfig { max_context_rows: 1000 },
            google_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[app]
name = "test-aurora"
work_dir = "/srv/aurora"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert_eq!(cfg.app_name, "test-aurora");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.provider, "gemini");
        assert_eq!(cfg.llm.gemini.model, "gemini-2.0-flash");
        assert!(cfg.llm.gemini.google_search);
        assert_eq!(cfg.data.max_context_rows, 1000);
    }

    #[test]
    fn relative_paths_resolve_under_work_dir() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert_eq!(cfg.log_file, Some(PathBuf::from("/srv/aurora/logs/app.log")));
        assert_eq!(cfg.prompts_dir, PathBuf::from("/srv/aurora/config/prompts"));
    }

    #[test]
    fn empty_log_file_disables_file_logging() {
        let f = write_toml("[app]\nlog_file = \"\"\n");
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn gemini_section_parsed() {
        let f = write_toml(
            r#"
[llm]
default = "dummy"

[llm.gemini]
api_base_url = "http://localhost:9999/models/"
model = "gemini-1.5-pro"
temperature = 0.1
timeout_seconds = 5
google_search = false
"#,
        );
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.llm.gemini.api_base_url, "http://localhost:9999/models");
        assert_eq!(cfg.llm.gemini.model, "gemini-1.5-pro");
        assert_eq!(cfg.llm.gemini.timeout_seconds, 5);
        assert!(!cfg.llm.gemini.google_search);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.aurora");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".aurora"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &Overrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn malformed_toml_errors() {
        let f = write_toml("[app\nname = ");
        let msg = load_from(f.path(), &Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn env_overrides_apply() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides {
            work_dir: Some("/tmp/aurora-override".into()),
            log_level: Some("debug".into()),
            model: Some("gemini-2.5-flash".into()),
            google_api_key: Some("secret".into()),
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/aurora-override"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.llm.gemini.model, "gemini-2.5-flash");
        assert_eq!(cfg.google_api_key.as_deref(), Some("secret"));
    }
}
