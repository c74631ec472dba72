use crate::domain::ports::AddressResolver;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::validate_host_text;
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{debug, instrument};

/// Resolves operator input with the platform resolver. IP literals never
/// touch the network.
#[derive(Debug, Clone, Default)]
pub struct SystemAddressResolver;

impl SystemAddressResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AddressResolver for SystemAddressResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, text: &str) -> Result<IpAddr> {
        let input = text.trim();
        validate_host_text(input).map_err(|reason| ProbeError::invalid_address(text, reason))?;

        let bare = input
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(input);

        if let Ok(ip) = bare.parse::<IpAddr>() {
            debug!(address = %ip, "Address is an IP literal");
            return Ok(ip);
        }

        let addrs: Vec<IpAddr> = tokio::net::lookup_host((bare, 0))
            .await
            .map_err(|e| ProbeError::invalid_address(text, e.to_string()))?
            .map(|addr| addr.ip())
            .collect();

        let chosen = addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ProbeError::invalid_address(text, "no addresses returned"))?;

        debug!(address = %chosen, candidates = addrs.len(), "Resolved host name");
        Ok(chosen)
    }
}
