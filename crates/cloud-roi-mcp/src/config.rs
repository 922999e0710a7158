//! Daemon settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use cloud_roi_advisor::{
    AdvisoryProviderConfig, AzureOpenAiConfig, DEFAULT_AZURE_API_VERSION,
    DEFAULT_AZURE_DEPLOYMENT, DEFAULT_OPENAI_MODEL, OpenAiCompatibleConfig,
};
use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_DB_PATH: &str = "./data/roi-records.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Json,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be one of {expected} (got {value:?})")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{name} is required for the {provider} advisory provider")]
    Missing {
        name: &'static str,
        provider: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    pub http_addr: String,
    pub db_path: PathBuf,
    pub backend: BackendKind,
    /// Reject inputs whose validation report has errors.
    pub strict_inputs: bool,
    pub advisor: Option<AdvisoryProviderConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            backend: BackendKind::Json,
            strict_inputs: false,
            advisor: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let transport = match get("CLOUD_ROI_TRANSPORT").as_deref() {
            None | Some("stdio") => Transport::Stdio,
            Some("http") => Transport::Http,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "CLOUD_ROI_TRANSPORT",
                    value: other.to_string(),
                    expected: "stdio, http",
                });
            }
        };

        let backend = match get("CLOUD_ROI_BACKEND").as_deref() {
            None | Some("json") => BackendKind::Json,
            Some("memory") => BackendKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "CLOUD_ROI_BACKEND",
                    value: other.to_string(),
                    expected: "json, memory",
                });
            }
        };

        let strict_inputs = match get("CLOUD_ROI_STRICT_INPUTS").as_deref() {
            None => false,
            Some(v) => parse_bool(v).ok_or_else(|| ConfigError::InvalidValue {
                name: "CLOUD_ROI_STRICT_INPUTS",
                value: v.to_string(),
                expected: "true, false, 1, 0",
            })?,
        };

        let timeout = Duration::from_secs(
            get("CLOUD_ROI_ADVISOR_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .clamp(1, 300),
        );

        let advisor = match get("CLOUD_ROI_ADVISOR_PROVIDER").as_deref() {
            None | Some("none") => None,
            Some("azure-openai") => {
                let api_key = get("CLOUD_ROI_ADVISOR_API_KEY")
                    .or_else(|| get("AZURE_OPENAI_API_KEY"))
                    .ok_or(ConfigError::Missing {
                        name: "CLOUD_ROI_ADVISOR_API_KEY",
                        provider: "azure-openai",
                    })?;
                let endpoint = get("CLOUD_ROI_ADVISOR_ENDPOINT").ok_or(ConfigError::Missing {
                    name: "CLOUD_ROI_ADVISOR_ENDPOINT",
                    provider: "azure-openai",
                })?;
                let mut cfg = AzureOpenAiConfig::new(api_key, endpoint);
                cfg.deployment = get("CLOUD_ROI_ADVISOR_DEPLOYMENT")
                    .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string());
                cfg.api_version = get("CLOUD_ROI_ADVISOR_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
                cfg.timeout = timeout;
                Some(AdvisoryProviderConfig::AzureOpenAi(cfg))
            }
            Some("openai-compatible") => {
                let api_key = get("CLOUD_ROI_ADVISOR_API_KEY")
                    .or_else(|| get("OPENAI_API_KEY"))
                    .ok_or(ConfigError::Missing {
                        name: "CLOUD_ROI_ADVISOR_API_KEY",
                        provider: "openai-compatible",
                    })?;
                let model = get("CLOUD_ROI_ADVISOR_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
                let mut cfg = OpenAiCompatibleConfig::new(api_key, model);
                if let Some(base_url) = get("CLOUD_ROI_ADVISOR_ENDPOINT") {
                    cfg.base_url = base_url;
                }
                cfg.timeout = timeout;
                Some(AdvisoryProviderConfig::OpenAiCompatible(cfg))
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "CLOUD_ROI_ADVISOR_PROVIDER",
                    value: other.to_string(),
                    expected: "azure-openai, openai-compatible, none",
                });
            }
        };

        Ok(Self {
            transport,
            http_addr: get("CLOUD_ROI_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            db_path: get("CLOUD_ROI_DB").map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            backend,
            strict_inputs,
            advisor,
        })
    }

    /// Secrets that must never appear in error text sent to clients.
    pub fn secrets(&self) -> Vec<String> {
        match &self.advisor {
            Some(AdvisoryProviderConfig::AzureOpenAi(c)) => vec![c.api_key.clone()],
            Some(AdvisoryProviderConfig::OpenAiCompatible(c)) => vec![c.api_key.clone()],
            None => Vec::new(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = config_from(&[]).expect("defaults");
        assert_eq!(cfg.transport, Transport::Stdio);
        assert_eq!(cfg.backend, BackendKind::Json);
        assert_eq!(cfg.http_addr, DEFAULT_HTTP_ADDR);
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(!cfg.strict_inputs);
        assert!(cfg.advisor.is_none());
    }

    #[test]
    fn azure_provider_reads_key_fallback_and_clamps_timeout() {
        let cfg = config_from(&[
            ("CLOUD_ROI_ADVISOR_PROVIDER", "azure-openai"),
            ("AZURE_OPENAI_API_KEY", "az-key"),
            ("CLOUD_ROI_ADVISOR_ENDPOINT", "https://roi.openai.azure.com"),
            ("CLOUD_ROI_ADVISOR_TIMEOUT_SECS", "9000"),
        ])
        .expect("azure config");

        let Some(AdvisoryProviderConfig::AzureOpenAi(azure)) = &cfg.advisor else {
            panic!("expected azure provider, got {:?}", cfg.advisor);
        };
        assert_eq!(azure.api_key, "az-key");
        assert_eq!(azure.deployment, "gpt-4o");
        assert_eq!(azure.api_version, "2025-01-01-preview");
        assert_eq!(azure.timeout, Duration::from_secs(300));
        assert_eq!(cfg.secrets(), vec!["az-key".to_string()]);
    }

    #[test]
    fn azure_provider_requires_endpoint() {
        let err = config_from(&[
            ("CLOUD_ROI_ADVISOR_PROVIDER", "azure-openai"),
            ("CLOUD_ROI_ADVISOR_API_KEY", "az-key"),
        ])
        .expect_err("missing endpoint");
        assert!(err.to_string().contains("CLOUD_ROI_ADVISOR_ENDPOINT"));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(config_from(&[("CLOUD_ROI_TRANSPORT", "grpc")]).is_err());
        assert!(config_from(&[("CLOUD_ROI_BACKEND", "cosmos")]).is_err());
        assert!(config_from(&[("CLOUD_ROI_STRICT_INPUTS", "maybe")]).is_err());
        assert!(config_from(&[("CLOUD_ROI_ADVISOR_PROVIDER", "bard")]).is_err());
    }

    #[test]
    fn strict_flag_and_memory_backend_parse() {
        let cfg = config_from(&[
            ("CLOUD_ROI_STRICT_INPUTS", "TRUE"),
            ("CLOUD_ROI_BACKEND", "memory"),
            ("CLOUD_ROI_TRANSPORT", "http"),
        ])
        .expect("config");
        assert!(cfg.strict_inputs);
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.transport, Transport::Http);
    }
}
