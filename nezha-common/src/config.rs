use ::config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{ExporterError, Result};

/// Namespace prefixed to every published metric unless overridden
pub const DEFAULT_NAMESPACE: &str = "nezha_server";

/// Address the exposition endpoint listens on by default
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9100";

/// Upstream request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Prefix of the environment variables read by the exporter
pub const ENV_PREFIX: &str = "NP";

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Base URL of the Nezha dashboard
    #[serde(default)]
    pub nezha_url: String,

    /// API token sent verbatim in the `Authorization` header
    #[serde(default)]
    pub nezha_token: String,

    /// Namespace prefixed to every metric name
    pub namespace: String,

    /// Address of the exposition endpoint
    pub listen_address: String,

    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ExporterConfig {
    /// Load configuration from an optional file and the process environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// Load configuration from an optional file and the given environment.
    ///
    /// Precedence, lowest first: built-in defaults, bare `NEZHA_URL` and
    /// `NEZHA_TOKEN`, the file, `NP_`-prefixed variables.
    pub fn load_from(path: Option<&str>, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("namespace", DEFAULT_NAMESPACE)?
            .set_default("listen_address", DEFAULT_LISTEN_ADDRESS)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        for (key, var) in [("nezha_url", "NEZHA_URL"), ("nezha_token", "NEZHA_TOKEN")] {
            if let Some(value) = env.get(var) {
                builder = builder.set_default(key, value.as_str())?;
            }
        }

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let prefixed: Map<String, String> = env
            .into_iter()
            .filter(|(key, _)| key.starts_with(&format!("{}_", ENV_PREFIX)))
            .collect();

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(Some(prefixed)),
            )
            .build()?;

        let config: ExporterConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.nezha_url.trim().is_empty() {
            return Err(ExporterError::Config(
                "nezha_url is required (set NEZHA_URL or NP_NEZHA_URL)".to_string(),
            ));
        }
        if self.nezha_token.is_empty() {
            return Err(ExporterError::Config(
                "nezha_token is required (set NEZHA_TOKEN or NP_NEZHA_TOKEN)".to_string(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Parsed listen address of the exposition endpoint
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_address.parse().map_err(|e| {
            ExporterError::Config(format!(
                "invalid listen_address {:?}: {}",
                self.listen_address, e
            ))
        })
    }

    /// Upstream request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_with_bare_variables() {
        let config = ExporterConfig::load_from(
            None,
            env(&[("NEZHA_URL", "https://nezha.example.com"), ("NEZHA_TOKEN", "secret")]),
        )
        .unwrap();

        assert_eq!(config.nezha_url, "https://nezha.example.com");
        assert_eq!(config.nezha_token, "secret");
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_prefixed_variables_win() {
        let config = ExporterConfig::load_from(
            None,
            env(&[
                ("NEZHA_URL", "https://bare.example.com"),
                ("NEZHA_TOKEN", "bare"),
                ("NP_NEZHA_URL", "https://prefixed.example.com"),
                ("NP_NEZHA_TOKEN", "prefixed"),
                ("NP_NAMESPACE", "nezha"),
                ("NP_REQUEST_TIMEOUT_SECS", "3"),
            ]),
        )
        .unwrap();

        assert_eq!(config.nezha_url, "https://prefixed.example.com");
        assert_eq!(config.nezha_token, "prefixed");
        assert_eq!(config.namespace, "nezha");
        assert_eq!(config.request_timeout_secs, 3);
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let result = ExporterConfig::load_from(None, env(&[("NEZHA_TOKEN", "secret")]));
        assert!(matches!(result, Err(ExporterError::Config(_))));
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let result = ExporterConfig::load_from(None, env(&[("NEZHA_URL", "http://localhost")]));
        assert!(matches!(result, Err(ExporterError::Config(_))));
    }

    #[test]
    fn test_invalid_listen_address_is_rejected() {
        let result = ExporterConfig::load_from(
            None,
            env(&[
                ("NEZHA_URL", "http://localhost"),
                ("NEZHA_TOKEN", "secret"),
                ("NP_LISTEN_ADDRESS", "not-an-address"),
            ]),
        );
        assert!(matches!(result, Err(ExporterError::Config(_))));
    }

    #[test]
    fn test_load_config_file() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, r#"
nezha_url = "https://file.example.com"
nezha_token = "from-file"
namespace = "dashboard"
listen_address = "127.0.0.1:9200"
"#)?;

        let path = file.path().to_str().unwrap().to_string();
        let config = ExporterConfig::load_from(
            Some(&path),
            env(&[("NEZHA_TOKEN", "bare"), ("NP_NAMESPACE", "override")]),
        )?;

        assert_eq!(config.nezha_url, "https://file.example.com");
        assert_eq!(config.nezha_token, "from-file");
        assert_eq!(config.namespace, "override");
        assert_eq!(config.listen_addr()?, "127.0.0.1:9200".parse::<SocketAddr>()?);
        Ok(())
    }
}
