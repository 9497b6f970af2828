use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

use crate::processing::normalize::TextFilter;

const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_COMBINED_FILE_NAME: &str = "combined_text.txt";
const DEFAULT_LLM_MODEL: &str = "llama3";
const DEFAULT_OCR_DPI: u32 = 300;
const DEFAULT_LOG_FILE: &str = "logs/analyst-ai.log";
const LOCAL_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const CONTAINER_OLLAMA_URL: &str = "http://ollama:11434";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Analyst AI server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Number of characters per corpus chunk.
    pub chunk_size: usize,
    /// Directory receiving the combined-text artifact.
    pub data_dir: PathBuf,
    /// File name of the combined-text artifact inside `data_dir`.
    pub combined_file_name: String,
    /// Backend used for question answering and summarization.
    pub inference_provider: InferenceProvider,
    /// Model identifier passed to the inference backend.
    pub llm_model: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Character filter applied by the text normalizer.
    pub text_filter: TextFilter,
    /// Whether PDF pages are rasterized and passed through OCR.
    pub ocr_enabled: bool,
    /// Rasterization resolution used for OCR.
    pub ocr_dpi: u32,
    /// Path or name of the `tesseract` executable.
    pub tesseract_cmd: String,
    /// Path or name of the `pdftoppm` executable.
    pub pdftoppm_cmd: String,
    /// File receiving the server's log output.
    pub log_file: PathBuf,
}

/// Supported inference backends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    /// Local or containerized Ollama runtime.
    Ollama,
    /// Inference disabled; queries report the model as unavailable.
    None,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chunk_size = match load_env_optional("CHUNK_SIZE") {
            Some(value) => parse_chunk_size(&value)?,
            None => DEFAULT_CHUNK_SIZE,
        };

        Ok(Self {
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            chunk_size,
            data_dir: load_env_optional("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            combined_file_name: load_env_optional("COMBINED_FILE_NAME")
                .unwrap_or_else(|| DEFAULT_COMBINED_FILE_NAME.to_string()),
            inference_provider: load_env_optional("INFERENCE_PROVIDER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("INFERENCE_PROVIDER".into()))
                })
                .transpose()?
                .unwrap_or(InferenceProvider::Ollama),
            llm_model: load_env_optional("LLM_MODEL")
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            ollama_url: resolve_ollama_url(),
            text_filter: load_env_optional("TEXT_FILTER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("TEXT_FILTER".into()))
                })
                .transpose()?
                .unwrap_or_default(),
            ocr_enabled: load_env_optional("OCR_ENABLED")
                .map(|value| parse_flag(&value, "OCR_ENABLED"))
                .transpose()?
                .unwrap_or(true),
            ocr_dpi: load_env_optional("OCR_DPI")
                .map(|value| {
                    value
                        .parse()
                        .ok()
                        .filter(|dpi: &u32| *dpi > 0)
                        .ok_or_else(|| ConfigError::InvalidValue("OCR_DPI".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_OCR_DPI),
            tesseract_cmd: load_env_optional("TESSERACT_CMD")
                .unwrap_or_else(|| "tesseract".to_string()),
            pdftoppm_cmd: load_env_optional("PDFTOPPM_CMD")
                .unwrap_or_else(|| "pdftoppm".to_string()),
            log_file: load_env_optional("ANALYST_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        })
    }

    /// Full path of the combined-text artifact.
    pub fn combined_file_path(&self) -> PathBuf {
        self.data_dir.join(&self.combined_file_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            combined_file_name: DEFAULT_COMBINED_FILE_NAME.to_string(),
            inference_provider: InferenceProvider::Ollama,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            ollama_url: LOCAL_OLLAMA_URL.to_string(),
            text_filter: TextFilter::default(),
            ocr_enabled: true,
            ocr_dpi: DEFAULT_OCR_DPI,
            tesseract_cmd: "tesseract".to_string(),
            pdftoppm_cmd: "pdftoppm".to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_chunk_size(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| ConfigError::InvalidValue("CHUNK_SIZE".into()))
}

fn parse_flag(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Pick the Ollama endpoint: explicit variables win, then the container default.
fn resolve_ollama_url() -> String {
    if let Some(url) = load_env_optional("OLLAMA_HOST").or_else(|| load_env_optional("OLLAMA_URL"))
    {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url;
        }
        return format!("http://{url}");
    }
    if running_in_container() {
        CONTAINER_OLLAMA_URL.to_string()
    } else {
        LOCAL_OLLAMA_URL.to_string()
    }
}

/// Detect whether the process runs inside a Docker or Kubernetes container.
pub fn running_in_container() -> bool {
    if std::path::Path::new("/.dockerenv").exists() {
        return true;
    }
    std::fs::read_to_string("/proc/1/cgroup")
        .map(|cgroup| cgroup.contains("docker") || cgroup.contains("kubepods"))
        .unwrap_or(false)
}

impl std::str::FromStr for InferenceProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "none" | "disabled" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        chunk_size = config.chunk_size,
        data_dir = %config.data_dir.display(),
        provider = ?config.inference_provider,
        model = %config.llm_model,
        ollama_url = %config.ollama_url,
        ocr_enabled = config.ocr_enabled,
        log_file = %config.log_file.display(),
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_must_be_positive() {
        assert_eq!(parse_chunk_size("250").expect("valid"), 250);
        assert!(matches!(
            parse_chunk_size("0"),
            Err(ConfigError::InvalidValue(key)) if key == "CHUNK_SIZE"
        ));
        assert!(parse_chunk_size("-5").is_err());
        assert!(parse_chunk_size("lots").is_err());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("TRUE", "X").expect("flag"));
        assert!(parse_flag("1", "X").expect("flag"));
        assert!(!parse_flag("off", "X").expect("flag"));
        assert!(parse_flag("maybe", "X").is_err());
    }

    #[test]
    fn inference_provider_parses_case_insensitively() {
        assert_eq!("Ollama".parse(), Ok(InferenceProvider::Ollama));
        assert_eq!("none".parse(), Ok(InferenceProvider::None));
        assert_eq!("openai".parse::<InferenceProvider>(), Err(()));
    }

    #[test]
    fn combined_file_path_joins_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/analyst"),
            ..Config::default()
        };
        assert_eq!(
            config.combined_file_path(),
            PathBuf::from("/tmp/analyst/combined_text.txt")
        );
    }

    #[test]
    fn log_file_defaults_under_logs_directory() {
        assert_eq!(
            Config::default().log_file,
            PathBuf::from("logs/analyst-ai.log")
        );
    }
}
