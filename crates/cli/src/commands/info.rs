//! `info` command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::{ChannelSummary, Dataset, RunConfig, TimeReference};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::dataset::load_dataset;

/// Configuration info for JSON output
#[derive(Serialize)]
struct RunInfo {
    version: String,
    event_name: String,
    transform: TransformInfo,
    time_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_fix: Option<FixInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<DatasetInfo>,
}

#[derive(Serialize)]
struct TransformInfo {
    kind: String,
    order: u32,
    floor_bits: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_time_points: Option<usize>,
}

#[derive(Serialize)]
struct FixInfo {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
    epoch_utc: String,
}

#[derive(Serialize)]
struct DatasetInfo {
    station_id: String,
    channels: Vec<ChannelInfo>,
    location_points: usize,
    sync_exchanges: usize,
}

#[derive(Serialize)]
struct ChannelInfo {
    name: String,
    sample_rate_hz: f64,
    effective_rate_hz: f64,
    samples: usize,
    axes: usize,
    duration_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_epoch_utc: Option<String>,
    has_highpass: bool,
    skipped: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let dataset = match &args.dataset {
        Some(path) => Some(
            load_dataset(path)
                .with_context(|| format!("Failed to load dataset from {}", path.display()))?,
        ),
        None => None,
    };

    let info = build_run_info(&config, dataset.as_ref());
    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize run info")?;
        println!("{}", json);
    } else {
        print_run_info(&info);
    }

    Ok(())
}

/// Unix seconds as an ISO-like UTC timestamp
fn format_epoch(epoch_s: f64) -> String {
    if !epoch_s.is_finite() {
        return format!("{epoch_s}");
    }
    let secs = epoch_s.floor();
    let nanos = ((epoch_s - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| format!("{epoch_s}"))
}

fn describe_time_reference(reference: &TimeReference) -> String {
    match reference {
        TimeReference::ChannelStart => "each channel's own start".to_string(),
        TimeReference::Channel { channel } => format!("start of {channel}"),
        TimeReference::Epoch { epoch_s } => format_epoch(*epoch_s),
    }
}

fn channel_info(summary: &ChannelSummary, config: &RunConfig) -> ChannelInfo {
    ChannelInfo {
        name: summary.name.to_string(),
        sample_rate_hz: summary.sample_rate_hz,
        effective_rate_hz: summary.effective_rate_hz,
        samples: summary.samples,
        axes: summary.axes,
        duration_s: summary.duration_s,
        first_epoch_utc: summary.first_epoch_s.map(format_epoch),
        has_highpass: summary.has_highpass,
        skipped: config.channel_settings(summary.name).skip,
    }
}

fn build_run_info(config: &RunConfig, dataset: Option<&Dataset>) -> RunInfo {
    RunInfo {
        version: format!("{:?}", config.version),
        event_name: config.event_name.clone(),
        transform: TransformInfo {
            kind: config.transform.kind.to_string(),
            order: config.transform.order,
            floor_bits: config.transform.floor_bits,
            max_time_points: config.transform.max_time_points,
        },
        time_reference: describe_time_reference(&config.time_reference),
        reference_fix: config.reference_fix.map(|fix| FixInfo {
            latitude_deg: fix.latitude_deg,
            longitude_deg: fix.longitude_deg,
            altitude_m: fix.altitude_m,
            epoch_utc: format_epoch(fix.epoch_s),
        }),
        dataset: dataset.map(|d| DatasetInfo {
            station_id: d.station_id.clone(),
            channels: d
                .summaries()
                .iter()
                .map(|s| channel_info(s, config))
                .collect(),
            location_points: d.location.as_ref().map_or(0, |l| l.len()),
            sync_exchanges: d.synchronization.len(),
        }),
    }
}

fn print_run_info(info: &RunInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Skyfall Run Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Run");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Event: {}", info.event_name);
    println!("   └─ Time reference: {}", info.time_reference);

    println!("\n🎛️  Transform");
    println!("   ├─ Kind: {}", info.transform.kind);
    println!("   ├─ Order: 1/{} octave", info.transform.order);
    match info.transform.max_time_points {
        Some(max) => {
            println!("   ├─ Floor: {} bits", info.transform.floor_bits);
            println!("   └─ Max time points: {}", max);
        }
        None => println!("   └─ Floor: {} bits", info.transform.floor_bits),
    }

    match &info.reference_fix {
        Some(fix) => {
            println!("\n🧭 Reference Fix");
            println!("   ├─ Latitude: {:.6}°", fix.latitude_deg);
            println!("   ├─ Longitude: {:.6}°", fix.longitude_deg);
            println!("   ├─ Altitude: {:.1} m", fix.altitude_m);
            println!("   └─ Epoch: {}", fix.epoch_utc);
        }
        None => println!("\n🧭 Reference Fix: (none)"),
    }

    if let Some(dataset) = &info.dataset {
        println!("\n📱 Dataset (station {})", dataset.station_id);
        for channel in &dataset.channels {
            let flags = match (channel.has_highpass, channel.skipped) {
                (_, true) => " [skipped]",
                (true, false) => " [highpass]",
                (false, false) => "",
            };
            println!(
                "   ├─ {}: {} axes × {} samples, {:.3} Hz nominal / {:.3} Hz effective, {:.1} s{}",
                channel.name,
                channel.axes,
                channel.samples,
                channel.sample_rate_hz,
                channel.effective_rate_hz,
                channel.duration_s,
                flags
            );
            if let Some(first) = &channel.first_epoch_utc {
                println!("   │    first sample {}", first);
            }
        }
        println!("   ├─ Location points: {}", dataset.location_points);
        println!("   └─ Sync exchanges: {}", dataset.sync_exchanges);
    }

    println!();
}
