use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use resolve_probe::config::{CliConfig, LayeredConfig, ProbeSettings};
use resolve_probe::domain::ports::ConfigProvider;
use resolve_probe::output::{format_event, RunSummary};
use resolve_probe::utils::logger;
use resolve_probe::{
    BatchRunner, FixedHostClientFactory, ProbeError, RunEvent, SystemAddressResolver, TomlConfig,
};
use std::pin::pin;
use tokio::sync::watch;

const EXIT_ABORTED: i32 = 3;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting resolve-probe");
    tracing::debug!("CLI config: {:?}", cli);

    let file_config = match cli.config.as_deref() {
        Some(path) => Some(
            TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?,
        ),
        None => None,
    };

    let layered = LayeredConfig::new(
        &cli,
        file_config.as_ref().map(|c| c as &dyn ConfigProvider),
    );

    let settings = match ProbeSettings::from_provider(&layered) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    tracing::info!(
        address = %settings.address,
        domains = settings.targets.len(),
        timeout_ms = settings.client.timeout.as_millis() as u64,
        "🔍 Probing domains against fixed address"
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing the current probe");
            let _ = cancel_tx.send(true);
        }
    });

    let runner = BatchRunner::new(
        SystemAddressResolver::new(),
        FixedHostClientFactory::new(settings.client.clone()),
    )
    .with_concurrency(settings.concurrency)
    .with_cancellation(cancel_rx);

    let mut summary = RunSummary::start();
    let mut events = pin!(runner.run(settings.address.clone(), settings.targets.clone()));

    while let Some(event) = events.next().await {
        if let RunEvent::Aborted { reason } = &event {
            tracing::error!("❌ Run aborted: {}", reason);
        }
        if let Some(line) = format_event(cli.format, &event) {
            println!("{}", line);
        }
        summary.record(&event);
    }
    summary.finish();
    tracing::info!(
        "✅ Run finished: {} responded, {} failed",
        summary.succeeded,
        summary.failed
    );

    println!("{}", summary.render(cli.format));

    if summary.aborted.is_some() {
        std::process::exit(EXIT_ABORTED);
    }
    if summary.cancelled {
        std::process::exit(EXIT_CANCELLED);
    }

    Ok(())
}

fn exit_with(error: &ProbeError) -> ! {
    tracing::error!("Configuration failed: {}", error);
    eprintln!("❌ {}", error);
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(error.exit_code());
}
