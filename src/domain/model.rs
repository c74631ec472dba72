use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::utils::error::{ProbeError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_USER_AGENT: &str = "AndroidCurlProbe/1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every probe of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub scheme: Scheme,
    /// `None` uses the scheme's default port.
    pub port: Option<u16>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scheme: Scheme::Https,
            port: None,
        }
    }
}

/// Ordered, case-insensitively unique list of domains for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProbeTargets {
    domains: Vec<String>,
}

impl ProbeTargets {
    /// Trims every entry, drops blanks, keeps the first spelling of each
    /// domain. Fails when nothing is left.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut domains = Vec::new();

        for entry in entries {
            let domain = entry.as_ref().trim();
            if domain.is_empty() {
                continue;
            }
            if seen.insert(domain.to_ascii_lowercase()) {
                domains.push(domain.to_string());
            }
        }

        if domains.is_empty() {
            return Err(ProbeError::NoTargets);
        }
        Ok(Self { domains })
    }

    /// Parses newline-separated text. Lines starting with `#` are comments.
    pub fn from_lines(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.domains
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    TlsHandshake(String),
    Other(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => f.write_str("timeout"),
            FailureKind::TlsHandshake(detail) => write!(f, "TLS handshake failed: {}", detail),
            FailureKind::Other(detail) => f.write_str(detail),
        }
    }
}

/// Terminal result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Succeeded { status: u16, elapsed_ms: u64 },
    Failed { error: FailureKind, elapsed_ms: u64 },
}

impl ProbeOutcome {
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            ProbeOutcome::Succeeded { elapsed_ms, .. } | ProbeOutcome::Failed { elapsed_ms, .. } => {
                *elapsed_ms
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeState {
    Pending,
    Running,
    Succeeded { status: u16, elapsed_ms: u64 },
    Failed { error: FailureKind, elapsed_ms: u64 },
}

impl ProbeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeState::Succeeded { .. } | ProbeState::Failed { .. })
    }
}

impl From<ProbeOutcome> for ProbeState {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Succeeded { status, elapsed_ms } => {
                ProbeState::Succeeded { status, elapsed_ms }
            }
            ProbeOutcome::Failed { error, elapsed_ms } => ProbeState::Failed { error, elapsed_ms },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    pub(crate) fn advance(&mut self) {
        debug_assert!(self.completed < self.total, "progress past total");
        self.completed = (self.completed + 1).min(self.total);
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Everything one run works with. Built after the address resolves and
/// dropped with the run's stream.
#[derive(Debug)]
pub struct RunContext<C> {
    pub address: IpAddr,
    pub client: C,
    pub targets: ProbeTargets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Aborted {
        reason: String,
    },
    Transition {
        domain: String,
        state: ProbeState,
        progress: ProgressSnapshot,
    },
    Cancelled {
        progress: ProgressSnapshot,
    },
}
