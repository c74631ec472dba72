//! HTTP client plumbing for probing: the fixed-address DNS override and the
//! insecure TLS policy. Nothing outside this module builds a client with
//! certificate checks turned off.

use crate::core::probe::ProbeExecutor;
use crate::domain::model::{ClientSettings, ProbeOutcome};
use crate::domain::ports::{ClientFactory, Prober};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{redirect, Client, ClientBuilder};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::debug;

/// Answers every lookup with the same address.
///
/// The port is left at 0 so the connector fills in the port from the
/// request URL.
#[derive(Debug, Clone, Copy)]
pub struct FixedAddressDns {
    address: IpAddr,
}

impl FixedAddressDns {
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }
}

impl Resolve for FixedAddressDns {
    fn resolve(&self, name: Name) -> Resolving {
        let addr = SocketAddr::new(self.address, 0);
        debug!(host = name.as_str(), address = %self.address, "Fixed DNS override");
        Box::pin(async move {
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

/// Trust policy that accepts any certificate chain and any name in it.
///
/// Only [`FixedHostClient::build`] can create one.
#[derive(Debug)]
pub struct InsecureTransport {
    _private: (),
}

impl InsecureTransport {
    fn new() -> Self {
        Self { _private: () }
    }

    fn apply(self, builder: ClientBuilder) -> ClientBuilder {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
    }
}

/// Immutable client shared by all probes of one run.
#[derive(Debug, Clone)]
pub struct FixedHostClient {
    client: Client,
    address: IpAddr,
    executor: ProbeExecutor,
}

impl FixedHostClient {
    pub fn build(address: IpAddr, settings: &ClientSettings) -> Result<Self> {
        let timeout = settings.timeout;

        let builder = Client::builder()
            .dns_resolver(Arc::new(FixedAddressDns::new(address)))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .timeout(timeout)
            .no_proxy()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .user_agent(settings.user_agent.clone());

        let client = InsecureTransport::new().apply(builder).build()?;

        debug!(
            address = %address,
            timeout_ms = timeout.as_millis() as u64,
            scheme = %settings.scheme,
            "Built fixed-host client"
        );

        Ok(Self {
            client,
            address,
            executor: ProbeExecutor::new(settings),
        })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }
}

#[async_trait]
impl Prober for FixedHostClient {
    async fn probe(&self, domain: &str) -> ProbeOutcome {
        self.executor.probe(&self.client, domain).await
    }
}

/// [`ClientFactory`] producing [`FixedHostClient`]s from one set of settings.
#[derive(Debug, Clone, Default)]
pub struct FixedHostClientFactory {
    settings: ClientSettings,
}

impl FixedHostClientFactory {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

impl ClientFactory for FixedHostClientFactory {
    type Client = FixedHostClient;

    fn build(&self, address: IpAddr) -> Result<FixedHostClient> {
        FixedHostClient::build(address, &self.settings)
    }
}
