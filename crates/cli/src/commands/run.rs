//! `run` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::RunConfig;
use pipeline::{Pipeline, PipelineOutput};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::dataset::{load_dataset, write_bundle};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if apply_overrides(&mut config, args) {
        ConfigLoader::validate(&config).context("Invalid command-line override")?;
    }

    info!(
        event = %config.event_name,
        transform = %config.transform.kind,
        order = config.transform.order,
        channel_settings = config.channels.len(),
        "Configuration loaded"
    );

    let dataset = load_dataset(&args.dataset)
        .with_context(|| format!("Failed to load dataset from {}", args.dataset.display()))?;

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration and dataset are valid, exiting");
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let pipeline = Pipeline::new(config).context("Failed to build pipeline")?;
    let dataset = Arc::new(dataset);

    info!(concurrent = args.concurrent, "Starting pipeline...");

    let work = async {
        if args.concurrent {
            Ok(pipeline.process_concurrent(Arc::clone(&dataset)).await)
        } else {
            let pipeline = pipeline.clone();
            let dataset = Arc::clone(&dataset);
            tokio::task::spawn_blocking(move || pipeline.process(&dataset))
                .await
                .context("Pipeline task panicked")
        }
    };

    tokio::select! {
        output = work => {
            report(output?, args)?;
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Skyfall finished");
    Ok(())
}

/// Transform overrides from the command line; true when anything changed
fn apply_overrides(config: &mut RunConfig, args: &RunArgs) -> bool {
    let mut changed = false;
    if let Some(kind) = args.transform {
        info!(transform = ?kind, "Overriding transform from CLI");
        config.transform.kind = kind.into();
        changed = true;
    }
    if let Some(order) = args.order {
        info!(order, "Overriding order from CLI");
        config.transform.order = order;
        changed = true;
    }
    changed
}

fn report(output: PipelineOutput, args: &RunArgs) -> Result<()> {
    let PipelineOutput { bundle, stats } = output;

    info!(
        products = bundle.products.len(),
        meshes = bundle.mesh_count(),
        failures = bundle.failures.len(),
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );

    for failure in &bundle.failures {
        warn!(
            channel = %failure.channel,
            stage = %failure.stage,
            error = %failure.message,
            "Channel did not produce output"
        );
    }

    if let Some(path) = &args.output {
        write_bundle(&bundle, path)
            .with_context(|| format!("Failed to write bundle to {}", path.display()))?;
        info!(path = %path.display(), "Run bundle written");
    }

    stats.print_summary();
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
