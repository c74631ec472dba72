use crate::domain::model::{ClientSettings, ProbeOutcome, Scheme};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::net::IpAddr;

/// Turns operator text into the single address every probe connects to.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, text: &str) -> Result<IpAddr>;
}

/// One probe per call, never retried.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, domain: &str) -> ProbeOutcome;
}

/// Builds the client for a run once the address is known.
pub trait ClientFactory: Send + Sync {
    type Client: Prober;

    fn build(&self, address: IpAddr) -> Result<Self::Client>;
}

pub trait ConfigProvider: Send + Sync {
    fn address(&self) -> Option<&str>;
    fn domains(&self) -> &[String];
    fn domains_file(&self) -> Option<&str>;
    fn timeout_ms(&self) -> Option<u64>;
    fn user_agent(&self) -> Option<&str>;
    fn scheme(&self) -> Option<Scheme>;
    fn port(&self) -> Option<u16>;
    fn concurrency(&self) -> Option<usize>;

    fn client_settings(&self) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            timeout: self
                .timeout_ms()
                .map(std::time::Duration::from_millis)
                .unwrap_or(defaults.timeout),
            user_agent: self
                .user_agent()
                .map(str::to_string)
                .unwrap_or(defaults.user_agent),
            scheme: self.scheme().unwrap_or(defaults.scheme),
            port: self.port().or(defaults.port),
        }
    }
}
