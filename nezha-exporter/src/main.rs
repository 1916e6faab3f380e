use anyhow::{Context, Result};
use clap::Parser;
use nezha_common::{ExporterConfig, MetricsRegistry, MetricsServer, ShutdownCoordinator};
use nezha_exporter::{FieldMapping, MetricUpdater, NezhaClient, PollCycle, Scheduler};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nezha-exporter")]
#[command(about = "Prometheus exporter for the Nezha server monitoring dashboard")]
struct Args {
    /// Optional configuration file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the exposition listen address
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let args = Args::parse();

    let mut config =
        ExporterConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(listen) = args.listen {
        config.listen_address = listen;
    }
    let listen_addr = config.listen_addr().context("Invalid listen address")?;
    info!(
        nezha_url = %config.nezha_url,
        listen = %listen_addr,
        "Starting Nezha exporter"
    );

    let registry = Arc::new(MetricsRegistry::new(&config.namespace));
    let mapping = FieldMapping::nezha(&registry).context("Failed to register metrics")?;
    info!(
        namespace = %registry.namespace(),
        fields = mapping.len(),
        info_metric = %registry.qualified_name("info"),
        "Registered metrics"
    );

    let client = NezhaClient::from_config(&config).context("Failed to create Nezha client")?;
    let cycle = PollCycle::new(client, MetricUpdater::new(Arc::new(mapping)));
    let scheduler = Scheduler::new(cycle);

    let shutdown = ShutdownCoordinator::new();
    let (_, server_handle) = MetricsServer::new(Arc::clone(&registry), listen_addr)
        .spawn(shutdown.shutdown_signal())?;
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.shutdown_signal()));

    shutdown.trigger_on_ctrl_c().await;

    if let Err(e) = scheduler_handle.await {
        error!("Poll scheduler task failed: {}", e);
    }
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Metrics server error: {}", e),
        Err(e) => error!("Metrics server task failed: {}", e),
    }

    info!("Nezha exporter shutdown complete");
    Ok(())
}
