#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::domain::model::{ClientSettings, ProbeTargets, Scheme};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, Validate,
};

pub const MAX_TIMEOUT_MS: u64 = 600_000;
pub const MAX_CONCURRENCY: usize = 64;

/// Two providers where `primary` wins wherever it has a value.
pub struct LayeredConfig<'a> {
    primary: &'a dyn ConfigProvider,
    fallback: Option<&'a dyn ConfigProvider>,
}

impl<'a> LayeredConfig<'a> {
    pub fn new(primary: &'a dyn ConfigProvider, fallback: Option<&'a dyn ConfigProvider>) -> Self {
        Self { primary, fallback }
    }
}

impl ConfigProvider for LayeredConfig<'_> {
    fn address(&self) -> Option<&str> {
        self.primary
            .address()
            .or_else(|| self.fallback.and_then(|f| f.address()))
    }

    /// Domain lists are not merged: the primary list replaces the fallback's.
    fn domains(&self) -> &[String] {
        match self.fallback {
            Some(fallback)
                if self.primary.domains().is_empty() && self.primary.domains_file().is_none() =>
            {
                fallback.domains()
            }
            _ => self.primary.domains(),
        }
    }

    fn domains_file(&self) -> Option<&str> {
        match self.fallback {
            Some(fallback)
                if self.primary.domains().is_empty() && self.primary.domains_file().is_none() =>
            {
                fallback.domains_file()
            }
            _ => self.primary.domains_file(),
        }
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.primary
            .timeout_ms()
            .or_else(|| self.fallback.and_then(|f| f.timeout_ms()))
    }

    fn user_agent(&self) -> Option<&str> {
        self.primary
            .user_agent()
            .or_else(|| self.fallback.and_then(|f| f.user_agent()))
    }

    fn scheme(&self) -> Option<Scheme> {
        self.primary
            .scheme()
            .or_else(|| self.fallback.and_then(|f| f.scheme()))
    }

    fn port(&self) -> Option<u16> {
        self.primary.port().or_else(|| self.fallback.and_then(|f| f.port()))
    }

    fn concurrency(&self) -> Option<usize> {
        self.primary
            .concurrency()
            .or_else(|| self.fallback.and_then(|f| f.concurrency()))
    }
}

/// Everything a run needs, after merging and reading domain files.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub address: String,
    pub targets: ProbeTargets,
    pub client: ClientSettings,
    pub concurrency: usize,
}

impl ProbeSettings {
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self> {
        let address = validate_required_field("address", &provider.address().map(str::to_string))?
            .trim()
            .to_string();

        let mut entries: Vec<String> = provider.domains().to_vec();
        if let Some(path) = provider.domains_file() {
            let text = std::fs::read_to_string(path).map_err(ProbeError::IoError)?;
            entries.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.starts_with('#'))
                    .map(str::to_string),
            );
        }

        let settings = Self {
            address,
            targets: ProbeTargets::new(&entries)?,
            client: provider.client_settings(),
            concurrency: provider.concurrency().unwrap_or(1),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for ProbeSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("address", &self.address)?;
        validate_non_empty_string("user_agent", &self.client.user_agent)?;
        validate_range(
            "timeout_ms",
            u64::try_from(self.client.timeout.as_millis()).unwrap_or(u64::MAX),
            1,
            MAX_TIMEOUT_MS,
        )?;
        validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        if self.client.port == Some(0) {
            return Err(ProbeError::InvalidConfigValueError {
                field: "port".to_string(),
                value: "0".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }
}
