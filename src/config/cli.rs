use crate::domain::model::Scheme;
use crate::domain::ports::ConfigProvider;
use crate::output::OutputFormat;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "resolve-probe")]
#[command(about = "Probe a batch of domains over HTTPS against one fixed IP address")]
pub struct CliConfig {
    /// IP address (or host name) every domain is resolved to
    #[arg(short, long)]
    pub address: Option<String>,

    /// Domain to probe; repeat or separate with commas
    #[arg(short, long = "domain", value_delimiter = ',')]
    pub domains: Vec<String>,

    /// File with one domain per line
    #[arg(long)]
    pub domains_file: Option<String>,

    /// TOML configuration file; command line values take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Connect/read/write/overall timeout per probe
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(long, value_enum)]
    pub scheme: Option<Scheme>,

    /// Destination port, defaults to the scheme's port
    #[arg(long)]
    pub port: Option<u16>,

    /// Probes in flight at once (results are still reported in order)
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON on stderr")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    fn domains(&self) -> &[String] {
        &self.domains
    }

    fn domains_file(&self) -> Option<&str> {
        self.domains_file.as_deref()
    }

    fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn concurrency(&self) -> Option<usize> {
        self.concurrency
    }
}
