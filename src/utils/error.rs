use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid address '{input}': {message}")]
    InvalidAddress { input: String, message: String },

    #[error("HTTP client construction failed: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("No domains to probe")]
    NoTargets,
}

impl ProbeError {
    pub fn invalid_address(input: &str, message: impl Into<String>) -> Self {
        ProbeError::InvalidAddress {
            input: input.to_string(),
            message: message.into(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProbeError::InvalidAddress { .. } => {
                "Pass an IPv4/IPv6 literal or a host name the local resolver knows"
            }
            ProbeError::ClientBuild(_) => "Check the TLS backend and the client settings",
            ProbeError::IoError(_) => "Check that the referenced files exist and are readable",
            ProbeError::ConfigError { .. } | ProbeError::InvalidConfigValueError { .. } => {
                "Fix the value in the TOML file or on the command line"
            }
            ProbeError::MissingConfigError { .. } => {
                "Provide the value with a command line flag or in the TOML file"
            }
            ProbeError::NoTargets => "Give at least one domain with --domain or --domains-file",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::InvalidAddress { .. } => 3,
            ProbeError::ClientBuild(_) | ProbeError::IoError(_) => 4,
            ProbeError::ConfigError { .. }
            | ProbeError::InvalidConfigValueError { .. }
            | ProbeError::MissingConfigError { .. }
            | ProbeError::NoTargets => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
