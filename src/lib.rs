pub mod config;
pub mod core;
pub mod domain;
pub mod output;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{toml_config::TomlConfig, LayeredConfig, ProbeSettings};
pub use self::core::{
    probe::ProbeExecutor,
    resolver::SystemAddressResolver,
    runner::BatchRunner,
    transport::{FixedHostClient, FixedHostClientFactory},
};
pub use domain::model::{
    ClientSettings, FailureKind, ProbeOutcome, ProbeState, ProbeTargets, ProgressSnapshot,
    RunEvent, Scheme,
};
pub use utils::error::{ProbeError, Result};
