pub mod probe;
pub mod resolver;
pub mod runner;
pub mod transport;

pub use crate::domain::model::{
    ClientSettings, FailureKind, ProbeOutcome, ProbeState, ProbeTargets, ProgressSnapshot,
    RunContext, RunEvent, Scheme,
};
pub use crate::domain::ports::{AddressResolver, ClientFactory, ConfigProvider, Prober};
pub use crate::utils::error::Result;
