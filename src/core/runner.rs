use crate::domain::model::{ProbeState, ProbeTargets, ProgressSnapshot, RunContext, RunEvent};
use crate::domain::ports::{AddressResolver, ClientFactory, Prober};
use async_stream::stream;
use futures::stream::{self as fstream, Stream, StreamExt};
use std::pin::pin;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Drives one run: resolve once, build the client once, then probe every
/// target in input order.
///
/// The returned stream is lazy; nothing happens until it is polled, and
/// dropping it ends the run.
pub struct BatchRunner<R, F> {
    resolver: R,
    factory: F,
    concurrency: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl<R, F> BatchRunner<R, F>
where
    R: AddressResolver,
    F: ClientFactory,
{
    pub fn new(resolver: R, factory: F) -> Self {
        Self {
            resolver,
            factory,
            concurrency: 1,
            cancel: None,
        }
    }

    /// Number of probes allowed in flight. Events stay in input order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Stops the run before the next probe once the flag turns `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn run(
        &self,
        address_text: String,
        targets: ProbeTargets,
    ) -> impl Stream<Item = RunEvent> + Send + '_ {
        stream! {
            debug_assert!(!targets.is_empty(), "BatchRunner::run called without targets");
            if targets.is_empty() {
                yield RunEvent::Aborted { reason: "no domains to probe".to_string() };
                return;
            }

            let address = match self.resolver.resolve(&address_text).await {
                Ok(address) => address,
                Err(e) => {
                    warn!(error = %e, "Address resolution failed, aborting run");
                    yield RunEvent::Aborted { reason: e.to_string() };
                    return;
                }
            };

            let client = match self.factory.build(address) {
                Ok(client) => client,
                Err(e) => {
                    warn!(error = %e, "Client construction failed, aborting run");
                    yield RunEvent::Aborted { reason: e.to_string() };
                    return;
                }
            };

            let context = RunContext { address, client, targets };
            let mut progress = ProgressSnapshot::new(context.targets.len());

            info!(
                address = %context.address,
                targets = progress.total,
                concurrency = self.concurrency,
                "Starting run"
            );

            for domain in context.targets.iter() {
                yield RunEvent::Transition {
                    domain: domain.to_string(),
                    state: ProbeState::Pending,
                    progress,
                };
            }

            if self.concurrency <= 1 {
                for domain in context.targets.iter() {
                    if self.is_cancelled() {
                        info!(progress = %progress, "Run cancelled");
                        yield RunEvent::Cancelled { progress };
                        return;
                    }

                    yield RunEvent::Transition {
                        domain: domain.to_string(),
                        state: ProbeState::Running,
                        progress,
                    };

                    let outcome = context.client.probe(domain).await;
                    progress.advance();

                    yield RunEvent::Transition {
                        domain: domain.to_string(),
                        state: outcome.into(),
                        progress,
                    };
                }
            } else {
                let client = &context.client;
                let domains: Vec<String> = context.targets.iter().map(str::to_string).collect();
                let mut results = pin!(fstream::iter(domains)
                    .map(|domain| async move {
                        if self.is_cancelled() {
                            return (domain, None);
                        }
                        let outcome = client.probe(&domain).await;
                        (domain, Some(outcome))
                    })
                    .buffered(self.concurrency));

                // Running is reported when a result reaches the head of the
                // queue, so every domain still sees Running then terminal.
                // Probes already finished are reported even after cancellation.
                let mut cancelled = false;
                while let Some((domain, outcome)) = results.next().await {
                    let outcome = match outcome {
                        Some(outcome) => outcome,
                        None => {
                            cancelled = true;
                            continue;
                        }
                    };

                    yield RunEvent::Transition {
                        domain: domain.clone(),
                        state: ProbeState::Running,
                        progress,
                    };
                    progress.advance();
                    yield RunEvent::Transition {
                        domain,
                        state: outcome.into(),
                        progress,
                    };
                }

                if cancelled {
                    info!(progress = %progress, "Run cancelled");
                    yield RunEvent::Cancelled { progress };
                    return;
                }
            }

            debug!(progress = %progress, "Run completed");
        }
    }
}
