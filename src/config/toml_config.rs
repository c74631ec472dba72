use crate::domain::model::Scheme;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ProbeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub address: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    pub domains_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub scheme: Option<Scheme>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub concurrency: Option<usize>,
}

impl TomlConfig {
    /// Loads a config file. A relative `domains_file` is taken relative to
    /// the config file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ProbeError::IoError)?;
        let mut config = Self::from_toml_str(&content)?;

        if let (Some(file), Some(base)) = (config.target.domains_file.as_ref(), path.parent()) {
            if Path::new(file).is_relative() {
                config.target.domains_file = Some(base.join(file).to_string_lossy().into_owned());
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| ProbeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProbeError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }
}

impl ConfigProvider for TomlConfig {
    fn address(&self) -> Option<&str> {
        self.target.address.as_deref()
    }

    fn domains(&self) -> &[String] {
        &self.target.domains
    }

    fn domains_file(&self) -> Option<&str> {
        self.target.domains_file.as_deref()
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.client.timeout_ms
    }

    fn user_agent(&self) -> Option<&str> {
        self.client.user_agent.as_deref()
    }

    fn scheme(&self) -> Option<Scheme> {
        self.client.scheme
    }

    fn port(&self) -> Option<u16> {
        self.client.port
    }

    fn concurrency(&self) -> Option<usize> {
        self.run.concurrency
    }
}
