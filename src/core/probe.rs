use crate::domain::model::{ClientSettings, FailureKind, ProbeOutcome, Scheme};
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

/// Issues one GET per domain and folds the result into a [`ProbeOutcome`].
#[derive(Debug, Clone)]
pub struct ProbeExecutor {
    scheme: Scheme,
    port: Option<u16>,
}

impl ProbeExecutor {
    pub fn new(settings: &ClientSettings) -> Self {
        Self {
            scheme: settings.scheme,
            port: settings.port,
        }
    }

    pub fn probe_url(&self, domain: &str) -> std::result::Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme, domain))?;
        if let Some(port) = self.port {
            url.set_port(Some(port))
                .map_err(|_| url::ParseError::InvalidPort)?;
        }
        Ok(url)
    }

    #[instrument(skip(self, client))]
    pub async fn probe(&self, client: &Client, domain: &str) -> ProbeOutcome {
        let url = match self.probe_url(domain) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Domain does not form a valid URL");
                return ProbeOutcome::Failed {
                    error: FailureKind::Other(format!("invalid domain: {}", e)),
                    elapsed_ms: 0,
                };
            }
        };

        let start = Instant::now();
        let result = client.get(url).send().await;

        let outcome = match result {
            Ok(response) => {
                let status = response.status().as_u16();
                // body is never read; dropping releases the connection
                drop(response);
                ProbeOutcome::Succeeded {
                    status,
                    elapsed_ms: elapsed_ms(start),
                }
            }
            Err(e) => ProbeOutcome::Failed {
                error: classify(&e),
                elapsed_ms: elapsed_ms(start),
            },
        };

        debug!(
            success = outcome.is_success(),
            elapsed_ms = outcome.elapsed_ms(),
            outcome = ?outcome,
            "Probe finished"
        );
        outcome
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Maps a request error onto the failure taxonomy.
pub fn classify(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        return FailureKind::Timeout;
    }

    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        if let Some(tls) = tls_error(err) {
            return FailureKind::TlsHandshake(tls.to_string());
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ) {
                return FailureKind::Timeout;
            }
        }
        source = err.source();
    }

    FailureKind::Other(root_cause(error))
}

fn tls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    if let Some(tls) = err.downcast_ref::<rustls::Error>() {
        return Some(tls);
    }
    // io::Error::source skips the wrapped error, and the connector nests
    // io::Errors, so unwrap each layer explicitly
    let mut inner = err.downcast_ref::<std::io::Error>()?.get_ref();
    while let Some(wrapped) = inner {
        if let Some(tls) = wrapped.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        inner = wrapped
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref());
    }
    None
}

fn root_cause(error: &reqwest::Error) -> String {
    let mut current: &(dyn StdError + 'static) = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_url_defaults_to_https_root() {
        let executor = ProbeExecutor::new(&ClientSettings::default());
        let url = executor.probe_url("shop.example.com").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/");
    }

    #[test]
    fn test_probe_url_with_scheme_and_port() {
        let settings = ClientSettings {
            scheme: Scheme::Http,
            port: Some(8080),
            ..ClientSettings::default()
        };
        let url = ProbeExecutor::new(&settings).probe_url("api.example.com").unwrap();
        assert_eq!(url.as_str(), "http://api.example.com:8080/");
        assert_eq!(url.host_str(), Some("api.example.com"));
    }

    #[test]
    fn test_probe_url_rejects_garbage() {
        let executor = ProbeExecutor::new(&ClientSettings::default());
        assert!(executor.probe_url("bad host name").is_err());
    }

    #[test]
    fn test_tls_error_found_through_nested_io_errors() {
        let tls = rustls::Error::General("corrupt record".to_string());
        let outer = std::io::Error::new(
            std::io::ErrorKind::Other,
            std::io::Error::new(std::io::ErrorKind::InvalidData, tls),
        );

        assert!(matches!(
            tls_error(&outer),
            Some(rustls::Error::General(msg)) if msg == "corrupt record"
        ));
    }

    #[test]
    fn test_tls_error_ignores_plain_io_chains() {
        let outer = std::io::Error::new(
            std::io::ErrorKind::Other,
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(tls_error(&outer).is_none());
        assert!(tls_error(&std::io::Error::from(std::io::ErrorKind::TimedOut)).is_none());
    }

    #[tokio::test]
    async fn test_invalid_domain_fails_without_network() {
        let executor = ProbeExecutor::new(&ClientSettings::default());
        let outcome = executor.probe(&Client::new(), "bad host name").await;
        match outcome {
            ProbeOutcome::Failed {
                error: FailureKind::Other(detail),
                elapsed_ms,
            } => {
                assert!(detail.starts_with("invalid domain"));
                assert_eq!(elapsed_ms, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
