//! Pipeline orchestrator - coordinates all components.
//!
//! Each waveform channel is an independent job. A failing channel adds a
//! `ChannelFailure` to the bundle and never aborts the rest of the run.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    Channel, ChannelFailure, ChannelName, ChannelProduct, ChannelSettings, ContractError,
    Dataset, ProcessingStage, RunBundle, RunConfig, TimeReference, WaveformVariant,
};
use observability::{
    record_channel_failure, record_channel_processed, record_mesh_computed, record_run_duration,
    record_sync_gaps,
};
use spectral::{highpass_fallback, resolve_color_limits, SpectralEngine};
use sync_merger::SyncStatistics;
use tracing::{debug, info, instrument, warn};

use super::PipelineStats;

/// Bundle plus run statistics
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub bundle: RunBundle,
    pub stats: PipelineStats,
}

/// Main pipeline orchestrator
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<RunConfig>,
    engine: SpectralEngine,
}

/// One waveform channel, with everything needed to process it off-thread
#[derive(Debug, Clone)]
struct ChannelJob {
    channel: Arc<Channel>,
    settings: ChannelSettings,
    engine: SpectralEngine,
    reference_epoch_s: Option<f64>,
}

#[derive(Debug)]
struct ChannelOutput {
    product: ChannelProduct,
    mesh_times_ms: Vec<f64>,
}

type ChannelOutcome = Result<ChannelOutput, ChannelFailure>;

/// In-progress run
struct RunState {
    bundle: RunBundle,
    stats: PipelineStats,
    started: Instant,
}

impl Pipeline {
    /// Create a pipeline for `config`
    ///
    /// # Errors
    /// - `InvalidSignal` when the transform settings are unusable (order,
    ///   floor or time-point limit)
    pub fn new(config: RunConfig) -> Result<Self, ContractError> {
        let engine = SpectralEngine::new(
            config.transform.kind,
            config.transform.order,
            config.transform.options(),
        )?;
        Ok(Self {
            config: Arc::new(config),
            engine,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process every channel on the calling thread
    #[instrument(name = "pipeline_process", skip_all, fields(event = %self.config.event_name, channels = dataset.channels.len()))]
    pub fn process(&self, dataset: &Dataset) -> PipelineOutput {
        let (mut state, jobs) = self.begin(dataset);

        for job in jobs {
            let outcome = run_channel_job(job);
            self.absorb(&mut state, outcome);
        }

        self.derive(dataset, &mut state);
        self.finish(state)
    }

    /// Process waveform channels in parallel on the blocking pool
    ///
    /// Results are collected in channel order, so the bundle matches
    /// `process` for the same input.
    #[instrument(name = "pipeline_process_concurrent", skip_all, fields(event = %self.config.event_name, channels = dataset.channels.len()))]
    pub async fn process_concurrent(&self, dataset: Arc<Dataset>) -> PipelineOutput {
        let (mut state, jobs) = self.begin(&dataset);

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let name = job.channel.name;
                (name, tokio::task::spawn_blocking(move || run_channel_job(job)))
            })
            .collect();

        info!(tasks = handles.len(), "Channel tasks spawned");

        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ChannelFailure::new(
                    name.as_str(),
                    ProcessingStage::Transform,
                    &ContractError::Other(format!("channel task failed: {e}")),
                )),
            };
            self.absorb(&mut state, outcome);
        }

        self.derive(&dataset, &mut state);
        self.finish(state)
    }

    // ===== Run stages =====

    /// Resolve the time reference and build one job per waveform channel
    fn begin(&self, dataset: &Dataset) -> (RunState, Vec<ChannelJob>) {
        let station_id = self
            .config
            .station_id
            .clone()
            .unwrap_or_else(|| dataset.station_id.clone());

        info!(
            event = %self.config.event_name,
            station = %station_id,
            channels = dataset.channels.len(),
            transform = %self.engine.transform(),
            order = self.engine.order(),
            "Starting run"
        );

        let mut state = RunState {
            bundle: RunBundle::new(self.config.event_name.clone(), station_id),
            stats: PipelineStats::default(),
            started: Instant::now(),
        };

        let reference_epoch_s = match resolve_time_reference(&self.config.time_reference, dataset)
        {
            Ok(epoch) => epoch,
            Err(failure) => {
                warn!("Time reference unavailable, meshes keep their own channel start");
                self.record_failure(&mut state, failure);
                None
            }
        };
        state.bundle.time_reference_epoch_s = reference_epoch_s;

        let mut jobs = Vec::with_capacity(dataset.channels.len());
        for (name, channel) in &dataset.channels {
            if !name.is_waveform() {
                warn!(channel = %name, "Not a waveform channel, ignored");
                continue;
            }
            let settings = self.config.channel_settings(*name);
            if settings.skip {
                info!(channel = %name, "Channel skipped by configuration");
                state.stats.channels_skipped += 1;
                continue;
            }
            if channel.name != *name {
                let err =
                    ContractError::channel_name_mismatch(name.as_str(), channel.name.as_str());
                self.record_failure(
                    &mut state,
                    ChannelFailure::new(name.as_str(), ProcessingStage::Validate, &err),
                );
                continue;
            }
            jobs.push(ChannelJob {
                channel: Arc::clone(channel),
                settings,
                engine: self.engine,
                reference_epoch_s,
            });
        }

        state.stats.channels_attempted = jobs.len();
        (state, jobs)
    }

    fn absorb(&self, state: &mut RunState, outcome: ChannelOutcome) {
        match outcome {
            Ok(output) => {
                let product = output.product;
                let meshes = product.meshes.len();
                record_channel_processed(product.channel.as_str(), meshes);
                state.stats.metrics.update_channel(meshes, &output.mesh_times_ms);

                info!(
                    channel = %product.channel,
                    meshes,
                    variant = ?product.variant,
                    fallback = product.highpass_fallback,
                    "Channel processed"
                );
                state.bundle.products.insert(product.channel, product);
            }
            Err(failure) => self.record_failure(state, failure),
        }
    }

    /// Barometric height, trajectory and synchronization
    fn derive(&self, dataset: &Dataset, state: &mut RunState) {
        self.derive_height(dataset, state);
        self.derive_trajectory(dataset, state);
        self.derive_synchronization(dataset, state);
    }

    fn derive_height(&self, dataset: &Dataset, state: &mut RunState) {
        let Some(barometer) = dataset.channel(ChannelName::Barometer) else {
            return;
        };
        if self.config.channel_settings(ChannelName::Barometer).skip {
            return;
        }

        let result = barometer.validate().and_then(|()| {
            let pressure = barometer.raw.first().ok_or_else(|| {
                ContractError::shape_mismatch("barometer.raw axes", 1, 0)
            })?;
            geodesy::compute_height_from_pressure(pressure, &self.config.geodesy.pressure_model)
        });

        match result {
            Ok(heights) => {
                debug!(samples = heights.len(), "Barometric height computed");
                state.bundle.barometric_height_m = Some(heights);
            }
            Err(e) => self.record_failure(
                state,
                ChannelFailure::new(ChannelName::Barometer.as_str(), ProcessingStage::Height, &e),
            ),
        }
    }

    fn derive_trajectory(&self, dataset: &Dataset, state: &mut RunState) {
        let Some(location) = &dataset.location else {
            return;
        };
        if self.config.channel_settings(ChannelName::Location).skip {
            info!(channel = "location", "Channel skipped by configuration");
            return;
        }

        let result = match &self.config.reference_fix {
            Some(fix) => {
                geodesy::compute_trajectory(location, fix, self.config.geodesy.speed_source)
            }
            None => Err(ContractError::missing_reference(ChannelName::Location.as_str())),
        };

        match result {
            Ok(trajectory) => {
                info!(
                    points = trajectory.len(),
                    max_range_m = ?trajectory.max_range_m(),
                    "Trajectory derived"
                );
                state.stats.trajectory_points = trajectory.len();
                state.bundle.trajectory = Some(trajectory);
            }
            Err(e) => self.record_failure(
                state,
                ChannelFailure::new(ChannelName::Location.as_str(), ProcessingStage::Trajectory, &e),
            ),
        }
    }

    fn derive_synchronization(&self, dataset: &Dataset, state: &mut RunState) {
        if dataset.synchronization.is_empty() {
            return;
        }

        let anchor = sync_anchor(dataset, state.bundle.time_reference_epoch_s);
        let timeline: Vec<f64> = anchor.into_iter().collect();
        if timeline.is_empty() {
            warn!("No timeline start available, synchronization series left unanchored");
        }

        let sync = &self.config.synchronization;
        match sync_merger::merge_sync_series(
            &dataset.synchronization,
            &timeline,
            &sync.gap_policy,
            sync.gap_duration_s,
        ) {
            Ok(merged) => {
                record_sync_gaps(merged.gap_count());
                let statistics = SyncStatistics::from_samples(&dataset.synchronization, Some(&merged));
                info!(
                    exchanges = statistics.exchanges,
                    gaps = statistics.gaps,
                    merged = merged.len(),
                    "Synchronization merged"
                );
                state.stats.sync = Some(statistics);
                state.bundle.synchronization = Some(merged);
            }
            Err(e) => self.record_failure(
                state,
                ChannelFailure::new("synchronization", ProcessingStage::Synchronization, &e),
            ),
        }
    }

    fn finish(&self, mut state: RunState) -> PipelineOutput {
        state.stats.duration = state.started.elapsed();
        record_run_duration(state.stats.duration.as_secs_f64());

        info!(
            duration_secs = state.stats.duration.as_secs_f64(),
            products = state.bundle.products.len(),
            meshes = state.bundle.mesh_count(),
            failures = state.bundle.failures.len(),
            "Run complete"
        );

        PipelineOutput {
            bundle: state.bundle,
            stats: state.stats,
        }
    }

    fn record_failure(&self, state: &mut RunState, failure: ChannelFailure) {
        warn!(
            channel = %failure.channel,
            stage = %failure.stage,
            kind = ?failure.kind,
            error = %failure.message,
            "Channel failed"
        );
        record_channel_failure(&failure);
        state.stats.metrics.update_failure(&failure);
        state.bundle.failures.push(failure);
    }
}

// ===== Channel job =====

fn run_channel_job(job: ChannelJob) -> ChannelOutcome {
    let channel = &job.channel;
    let name = channel.name;
    let fail = |stage: ProcessingStage, e: ContractError| ChannelFailure::new(name.as_str(), stage, &e);

    channel.validate().map_err(|e| fail(ProcessingStage::Validate, e))?;

    let (variant, fallback, axes) =
        select_axes(channel, &job.settings).map_err(|e| fail(ProcessingStage::Highpass, e))?;

    if axes.is_empty() {
        return Err(fail(
            ProcessingStage::Transform,
            ContractError::invalid_signal("channel has no axes"),
        ));
    }

    let channel_origin = channel.first_epoch().unwrap_or(0.0);
    let mut meshes = Vec::with_capacity(axes.len());
    let mut color_limits = Vec::with_capacity(axes.len());
    let mut mesh_times_ms = Vec::with_capacity(axes.len());

    for axis in axes.iter() {
        let started = Instant::now();
        let mesh = job
            .engine
            .mesh(axis, channel.sample_rate_hz)
            .map_err(|e| fail(ProcessingStage::Transform, e))?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_mesh_computed(name.as_str(), elapsed_ms);
        mesh_times_ms.push(elapsed_ms);

        let mesh = mesh.with_epoch_origin(channel_origin);
        let mesh = match job.reference_epoch_s {
            Some(reference) => mesh.reframed(reference),
            None => mesh,
        };

        color_limits.push(resolve_color_limits(
            &mesh,
            job.settings.color_scale,
            job.settings.color_range_bits,
        ));
        meshes.push(mesh);
    }

    Ok(ChannelOutput {
        product: ChannelProduct {
            channel: name,
            variant,
            highpass_fallback: fallback,
            summary: channel.summary(),
            meshes,
            color_limits,
            source: Some(Arc::clone(channel)),
        },
        mesh_times_ms,
    })
}

/// Waveform variant to transform; filters the raw axes when the highpass
/// variant is requested but absent
fn select_axes<'a>(
    channel: &'a Channel,
    settings: &ChannelSettings,
) -> Result<(WaveformVariant, bool, Cow<'a, [Vec<f64>]>), ContractError> {
    if !settings.highpass {
        return Ok((WaveformVariant::Raw, false, Cow::Borrowed(channel.raw.as_slice())));
    }
    if let Some(axes) = channel.axes(WaveformVariant::Highpass) {
        return Ok((WaveformVariant::Highpass, false, Cow::Borrowed(axes)));
    }

    warn!(channel = %channel.name, "Highpass variant missing, applying fallback filter");
    let filtered = channel
        .raw
        .iter()
        .map(|axis| highpass_fallback(axis, channel.sample_rate_hz, settings.highpass_cutoff_hz))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((WaveformVariant::Highpass, true, Cow::Owned(filtered)))
}

// ===== Time base =====

fn resolve_time_reference(
    reference: &TimeReference,
    dataset: &Dataset,
) -> Result<Option<f64>, ChannelFailure> {
    match reference {
        TimeReference::ChannelStart => Ok(None),
        TimeReference::Epoch { epoch_s } => Ok(Some(*epoch_s)),
        TimeReference::Channel { channel } => {
            let epoch = if *channel == ChannelName::Location {
                dataset.location.as_ref().and_then(|l| l.first_epoch())
            } else {
                dataset.channel(*channel).and_then(|c| c.first_epoch())
            };
            epoch.map(Some).ok_or_else(|| {
                ChannelFailure::new(
                    channel.as_str(),
                    ProcessingStage::Validate,
                    &ContractError::missing_reference(channel.as_str()),
                )
            })
        }
    }
}

/// Start of the common timeline: location start, then the time reference,
/// then the earliest waveform start
fn sync_anchor(dataset: &Dataset, reference_epoch_s: Option<f64>) -> Option<f64> {
    dataset
        .location
        .as_ref()
        .and_then(|l| l.first_epoch())
        .or(reference_epoch_s)
        .or_else(|| {
            dataset
                .channels
                .values()
                .filter_map(|c| c.first_epoch())
                .reduce(f64::min)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, ErrorKind, GeodesyConfig, LocationSeries, ReferenceFix, SyncSample,
        SynchronizationConfig, TransformConfig, TransformType,
    };
    use std::collections::BTreeMap;
    use std::f64::consts::PI;

    const FS: f64 = 32.0;
    const START: f64 = 1_637_610_000.0;

    fn tone(freq_hz: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq_hz * i as f64 / FS).sin()).collect()
    }

    fn channel(name: ChannelName, start: f64, axes: Vec<Vec<f64>>) -> Arc<Channel> {
        let n = axes.first().map_or(0, Vec::len);
        Arc::new(Channel {
            name,
            sample_rate_hz: FS,
            epochs_s: (0..n).map(|i| start + i as f64 / FS).collect(),
            raw: axes,
            highpass: None,
        })
    }

    fn location() -> LocationSeries {
        LocationSeries {
            epochs_s: vec![START, START + 1.0, START + 2.0],
            latitude_deg: vec![19.0, 19.0, 19.0001],
            longitude_deg: vec![-155.0, -155.0, -155.0],
            altitude_m: vec![10.0, 12.0, 14.0],
            speed_m_s: None,
        }
    }

    fn dataset() -> Dataset {
        let mut channels = BTreeMap::new();
        channels.insert(ChannelName::Audio, channel(ChannelName::Audio, START, vec![tone(4.0, 512)]));
        channels.insert(
            ChannelName::Accelerometer,
            channel(
                ChannelName::Accelerometer,
                START + 2.0,
                vec![tone(2.0, 512), tone(4.0, 512), tone(8.0, 512)],
            ),
        );
        channels.insert(
            ChannelName::Barometer,
            channel(ChannelName::Barometer, START, vec![vec![101.325; 64]]),
        );

        Dataset {
            station_id: "1637610021".to_string(),
            channels,
            location: Some(Arc::new(location())),
            synchronization: vec![
                SyncSample::new(START + 5.0, 2.0, 10.0),
                SyncSample::new(START + 10.0, 3.0, 11.0),
                SyncSample::new(START + 200.0, 2.5, 12.0),
            ],
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            version: ConfigVersion::V1,
            event_name: "Skyfall".to_string(),
            station_id: None,
            reference_fix: Some(ReferenceFix {
                latitude_deg: 19.0,
                longitude_deg: -155.0,
                altitude_m: 10.0,
                epoch_s: START,
            }),
            transform: TransformConfig {
                kind: TransformType::Stft,
                order: 3,
                ..TransformConfig::default()
            },
            time_reference: TimeReference::ChannelStart,
            geodesy: GeodesyConfig::default(),
            synchronization: SynchronizationConfig::default(),
            channels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_clean_run() {
        let pipeline = Pipeline::new(config()).unwrap();
        let output = pipeline.process(&dataset());
        let bundle = &output.bundle;

        assert!(bundle.is_clean(), "{:?}", bundle.failures);
        assert_eq!(bundle.station_id, "1637610021");
        assert_eq!(bundle.products.len(), 3);
        assert_eq!(bundle.product(ChannelName::Accelerometer).unwrap().meshes.len(), 3);
        assert_eq!(bundle.product(ChannelName::Audio).unwrap().meshes.len(), 1);

        let trajectory = bundle.trajectory.as_ref().unwrap();
        assert!(trajectory.range_m[0].abs() < 1e-6);
        assert!(trajectory.height_m[0].abs() < 1e-6);

        let heights = bundle.barometric_height_m.as_ref().unwrap();
        assert!(heights.iter().all(|h| h.abs() < 1e-6));

        // anchor + 3 exchanges + 1 gap (190 s > 60 s)
        let sync = bundle.synchronization.as_ref().unwrap();
        assert_eq!(sync.len(), 5);
        assert_eq!(sync.epochs_s[0], START);

        assert_eq!(output.stats.channels_attempted, 3);
        assert_eq!(output.stats.metrics.meshes, 5);
        assert_eq!(output.stats.sync.as_ref().unwrap().gaps, 1);
    }

    #[test]
    fn test_channel_start_keeps_own_origin() {
        let pipeline = Pipeline::new(config()).unwrap();
        let bundle = pipeline.process(&dataset()).bundle;

        let accel = bundle.product(ChannelName::Accelerometer).unwrap();
        assert!(accel.meshes.iter().all(|m| m.epoch_origin_s == START + 2.0));
        assert_eq!(bundle.time_reference_epoch_s, None);
    }

    #[test]
    fn test_shared_time_reference_shifts_meshes() {
        let mut cfg = config();
        cfg.time_reference = TimeReference::Channel {
            channel: ChannelName::Audio,
        };
        let bundle = Pipeline::new(cfg).unwrap().process(&dataset()).bundle;
        assert_eq!(bundle.time_reference_epoch_s, Some(START));

        let audio = &bundle.product(ChannelName::Audio).unwrap().meshes[0];
        let accel = &bundle.product(ChannelName::Accelerometer).unwrap().meshes[0];
        assert_eq!(audio.epoch_origin_s, START);
        assert_eq!(accel.epoch_origin_s, START);
        assert!((accel.time_s[0] - audio.time_s[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_epoch_time_reference_shifts_meshes() {
        let base = Pipeline::new(config()).unwrap().process(&dataset()).bundle;

        let mut cfg = config();
        cfg.time_reference = TimeReference::Epoch {
            epoch_s: START - 10.0,
        };
        let bundle = Pipeline::new(cfg).unwrap().process(&dataset()).bundle;
        assert!(bundle.is_clean(), "{:?}", bundle.failures);
        assert_eq!(bundle.time_reference_epoch_s, Some(START - 10.0));

        let own = &base.product(ChannelName::Accelerometer).unwrap().meshes[0];
        let shifted = &bundle.product(ChannelName::Accelerometer).unwrap().meshes[0];
        assert_eq!(shifted.epoch_origin_s, START - 10.0);
        assert_eq!(shifted.bits, own.bits);
        for (t_shifted, t_own) in shifted.time_s.iter().zip(&own.time_s) {
            assert!((t_shifted - t_own - 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_reference_channel_falls_back() {
        let mut cfg = config();
        cfg.time_reference = TimeReference::Channel {
            channel: ChannelName::Gyroscope,
        };
        let bundle = Pipeline::new(cfg).unwrap().process(&dataset()).bundle;

        assert_eq!(bundle.time_reference_epoch_s, None);
        assert_eq!(bundle.failures.len(), 1);
        assert_eq!(bundle.failures[0].kind, ErrorKind::MissingReference);
        assert_eq!(bundle.products.len(), 3);
    }

    #[test]
    fn test_empty_channel_fails_alone() {
        let mut data = dataset();
        data.channels.insert(
            ChannelName::Gyroscope,
            channel(ChannelName::Gyroscope, START, vec![vec![], vec![], vec![]]),
        );

        let output = Pipeline::new(config()).unwrap().process(&data);
        let bundle = &output.bundle;

        assert_eq!(bundle.products.len(), 3);
        assert!(bundle.product(ChannelName::Gyroscope).is_none());

        let failures: Vec<_> = bundle.failures_for("gyroscope").collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, ProcessingStage::Transform);
        assert_eq!(failures[0].kind, ErrorKind::InvalidSignal);
        assert_eq!(output.stats.metrics.failures, 1);
    }

    #[test]
    fn test_missing_fix_isolated_to_location() {
        let mut cfg = config();
        cfg.reference_fix = None;
        let bundle = Pipeline::new(cfg).unwrap().process(&dataset()).bundle;

        assert!(bundle.trajectory.is_none());
        let failure = bundle.failures_for("location").next().unwrap();
        assert_eq!(failure.stage, ProcessingStage::Trajectory);
        assert_eq!(failure.kind, ErrorKind::MissingReference);
        assert_eq!(bundle.products.len(), 3);
        assert!(bundle.synchronization.is_some());
    }

    #[test]
    fn test_skip_and_highpass_fallback() {
        let mut cfg = config();
        cfg.channels.insert(
            ChannelName::Audio,
            ChannelSettings {
                skip: true,
                ..ChannelSettings::default()
            },
        );
        cfg.channels.insert(
            ChannelName::Accelerometer,
            ChannelSettings {
                highpass: true,
                ..ChannelSettings::default()
            },
        );
        let output = Pipeline::new(cfg).unwrap().process(&dataset());

        assert!(output.bundle.product(ChannelName::Audio).is_none());
        assert_eq!(output.stats.channels_skipped, 1);

        let accel = output.bundle.product(ChannelName::Accelerometer).unwrap();
        assert_eq!(accel.variant, WaveformVariant::Highpass);
        assert!(accel.highpass_fallback);
    }

    #[test]
    fn test_recorded_highpass_variant_used() {
        let recorded = vec![tone(12.0, 512), tone(6.0, 512), tone(3.0, 512)];
        let mut accel = (*channel(
            ChannelName::Accelerometer,
            START + 2.0,
            vec![tone(2.0, 512), tone(4.0, 512), tone(8.0, 512)],
        ))
        .clone();
        accel.highpass = Some(recorded.clone());

        let mut data = dataset();
        data.channels.insert(ChannelName::Accelerometer, Arc::new(accel.clone()));

        let mut cfg = config();
        cfg.channels.insert(
            ChannelName::Accelerometer,
            ChannelSettings {
                highpass: true,
                ..ChannelSettings::default()
            },
        );
        let pipeline = Pipeline::new(cfg).unwrap();
        let bundle = pipeline.process(&data).bundle;
        assert!(bundle.is_clean(), "{:?}", bundle.failures);

        let product = bundle.product(ChannelName::Accelerometer).unwrap();
        assert_eq!(product.variant, WaveformVariant::Highpass);
        assert!(!product.highpass_fallback);
        assert_eq!(product.meshes.len(), 3);

        for (mesh, (hp_axis, raw_axis)) in product.meshes.iter().zip(recorded.iter().zip(&accel.raw)) {
            let from_recorded = pipeline.engine.mesh(hp_axis, FS).unwrap();
            let from_raw = pipeline.engine.mesh(raw_axis, FS).unwrap();
            assert_eq!(mesh.bits, from_recorded.bits);
            assert_ne!(mesh.bits, from_raw.bits);
        }
    }

    #[test]
    fn test_channel_stored_under_wrong_key_is_rejected() {
        let mut data = dataset();
        data.channels.insert(
            ChannelName::Audio,
            channel(ChannelName::Barometer, START, vec![vec![100.0; 64]]),
        );

        let output = Pipeline::new(config()).unwrap().process(&data);
        let bundle = &output.bundle;

        assert!(bundle.product(ChannelName::Audio).is_none());
        let barometer = bundle.product(ChannelName::Barometer).unwrap();
        assert_eq!(
            barometer.source.as_ref().unwrap().raw[0][0],
            101.325,
            "real barometer product must not be overwritten"
        );

        let failures: Vec<_> = bundle.failures_for("audio").collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, ProcessingStage::Validate);
        assert_eq!(failures[0].kind, ErrorKind::ShapeMismatch);
        assert_eq!(output.stats.channels_attempted, 2);
    }

    #[test]
    fn test_bad_pressure_is_height_failure() {
        let mut data = dataset();
        data.channels.insert(
            ChannelName::Barometer,
            channel(ChannelName::Barometer, START, vec![vec![0.0; 64]]),
        );
        let bundle = Pipeline::new(config()).unwrap().process(&data).bundle;

        assert!(bundle.barometric_height_m.is_none());
        let failure = bundle.failures_for("barometer").next().unwrap();
        assert_eq!(failure.stage, ProcessingStage::Height);
        assert_eq!(failure.kind, ErrorKind::InvalidMeasurement);
    }

    #[test]
    fn test_invalid_transform_config() {
        let mut cfg = config();
        cfg.transform.order = 0;
        assert!(Pipeline::new(cfg).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_matches_sequential() {
        let pipeline = Pipeline::new(config()).unwrap();
        let data = Arc::new(dataset());

        let sequential = pipeline.process(&data).bundle;
        let concurrent = pipeline.process_concurrent(Arc::clone(&data)).await.bundle;

        assert_eq!(
            sequential.products.keys().collect::<Vec<_>>(),
            concurrent.products.keys().collect::<Vec<_>>()
        );
        for (name, product) in &sequential.products {
            assert_eq!(product.meshes, concurrent.products[name].meshes);
        }
        assert_eq!(sequential.failures.len(), concurrent.failures.len());
    }
}
