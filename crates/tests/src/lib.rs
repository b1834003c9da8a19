//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 跨 crate 的处理属性 (气压高度、轨迹、同步合并、时频网格)
//! - 配置文件 + 数据集的端到端运行

#[cfg(test)]
mod fixtures {
    use std::collections::BTreeMap;
    use std::f64::consts::PI;
    use std::sync::Arc;

    use contracts::{Channel, ChannelName, Dataset, LocationSeries, SyncSample};

    pub const FS: f64 = 32.0;
    pub const START: f64 = 1_637_610_000.0;

    pub fn tone(freq_hz: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / FS).sin())
            .collect()
    }

    pub fn channel(name: ChannelName, axes: Vec<Vec<f64>>) -> Arc<Channel> {
        let n = axes.first().map_or(0, Vec::len);
        Arc::new(Channel {
            name,
            sample_rate_hz: FS,
            epochs_s: (0..n).map(|i| START + i as f64 / FS).collect(),
            raw: axes,
            highpass: None,
        })
    }

    /// A short phone recording: audio, triaxial accelerometer, barometer,
    /// location and synchronization exchanges
    pub fn recording() -> Dataset {
        let mut channels = BTreeMap::new();
        channels.insert(ChannelName::Audio, channel(ChannelName::Audio, vec![tone(4.0, 512)]));
        channels.insert(
            ChannelName::Accelerometer,
            channel(
                ChannelName::Accelerometer,
                vec![tone(2.0, 512), tone(4.0, 512), tone(8.0, 512)],
            ),
        );
        channels.insert(
            ChannelName::Barometer,
            channel(
                ChannelName::Barometer,
                vec![(0..64).map(|i| 101.325 - 0.01 * i as f64).collect()],
            ),
        );

        let location = LocationSeries {
            epochs_s: (0..10).map(|i| START + i as f64).collect(),
            latitude_deg: (0..10).map(|i| 35.83 + 1e-5 * i as f64).collect(),
            longitude_deg: vec![-115.57; 10],
            altitude_m: (0..10).map(|i| 1028.2 + 100.0 * i as f64).collect(),
            speed_m_s: None,
        };

        Dataset {
            station_id: "1637610021".to_string(),
            channels,
            location: Some(Arc::new(location)),
            synchronization: (0..20)
                .map(|i| SyncSample::new(START + 3.0 + 10.0 * i as f64, 2.0, 100.0 + i as f64))
                .collect(),
        }
    }

    pub const RUN_TOML: &str = r#"
version = "V1"
event_name = "Skyfall"

[reference_fix]
latitude_deg = 35.83
longitude_deg = -115.57
altitude_m = 1028.2
epoch_s = 1637610000.0

[transform]
kind = "stft"
order = 3

[time_reference]
kind = "channel"
channel = "audio"

[synchronization]
gap_duration_s = 5.0
[synchronization.gap_policy]
kind = "at_indices"
indices = [11]
"#;
}

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::DEFAULT_FLOOR_BITS, -32.0);
    }

    #[test]
    fn test_bundle_snapshot_keys() {
        let bundle = contracts::RunBundle::new("Skyfall", "1637610021");
        let value = serde_json::to_value(&bundle).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "event_name",
                "failures",
                "products",
                "station_id",
                "time_reference_epoch_s"
            ]
        );
    }
}

#[cfg(test)]
mod geodesy_tests {
    use contracts::{LocationSeries, PressureModel, ReferenceFix, SpeedSource};

    #[test]
    fn test_height_decreases_with_pressure() {
        let pressures: Vec<f64> = (20..=110).map(|p| p as f64).collect();
        for model in [
            PressureModel::StandardAtmosphere,
            PressureModel::LogPolynomial {
                reference_kpa: 101.325,
                coefficients: vec![0.0, 8434.5],
            },
        ] {
            let heights = geodesy::compute_height_from_pressure(&pressures, &model).unwrap();
            assert!(
                heights.windows(2).all(|w| w[1] < w[0]),
                "not monotonic for {model:?}"
            );
        }
    }

    #[test]
    fn test_sea_level_is_zero() {
        let h = geodesy::height_from_pressure(101.325, &PressureModel::StandardAtmosphere).unwrap();
        assert!(h.abs() < 1e-6);
    }

    #[test]
    fn test_invalid_pressure_reports_index() {
        let err = geodesy::compute_height_from_pressure(
            &[101.0, 100.0, -1.0],
            &PressureModel::StandardAtmosphere,
        )
        .unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_fix_at_sample_is_origin() {
        let fix = ReferenceFix {
            latitude_deg: 35.83,
            longitude_deg: -115.57,
            altitude_m: 1028.2,
            epoch_s: 100.0,
        };
        let location = LocationSeries {
            epochs_s: vec![100.0, 101.0],
            latitude_deg: vec![35.83, 35.84],
            longitude_deg: vec![-115.57, -115.57],
            altitude_m: vec![1028.2, 1028.2],
            speed_m_s: None,
        };
        let trajectory =
            geodesy::compute_trajectory(&location, &fix, SpeedSource::FiniteDifference).unwrap();

        assert!(trajectory.range_m[0].abs() < 1e-6);
        assert!(trajectory.height_m[0].abs() < 1e-6);
        assert_eq!(trajectory.speed_m_s[0], 0.0);
        assert_eq!(trajectory.elapsed_s, vec![0.0, 1.0]);

        // ~0.01° of latitude is ~1.1 km due north
        assert!((trajectory.north_m[1] - 1110.0).abs() < 10.0);
        assert!(trajectory.east_m[1].abs() < 1.0);
        assert!(trajectory.bearing_deg[1] < 1.0 || trajectory.bearing_deg[1] > 359.0);
    }
}

#[cfg(test)]
mod sync_tests {
    use contracts::{GapPolicy, SyncSample};

    fn exchanges(n: usize) -> Vec<SyncSample> {
        (0..n)
            .map(|i| SyncSample::new(1000.0 + 10.0 * i as f64, 2.0, 100.0))
            .collect()
    }

    #[test]
    fn test_one_gap_adds_two() {
        let samples = exchanges(20);
        let merged = sync_merger::merge_sync_series(
            &samples,
            &[990.0],
            &GapPolicy::AtIndices { indices: vec![11] },
            5.0,
        )
        .unwrap();

        assert_eq!(merged.len(), samples.len() + 2);
        assert_eq!(merged.gap_positions, vec![12]);
        assert_eq!(merged.epochs_s[12], 1105.0);
        assert!(merged.is_missing(0));
        assert!(merged.is_missing(12));
        assert!(!merged.is_missing(13));
    }

    #[test]
    fn test_no_gap_only_anchor() {
        let samples = exchanges(5);
        let merged =
            sync_merger::merge_sync_series(&samples, &[990.0], &GapPolicy::None, 5.0).unwrap();
        assert_eq!(merged.len(), 6);
        assert_eq!(merged.gap_count(), 0);
    }

    #[test]
    fn test_resample_holds_values() {
        let samples = exchanges(3);
        let merged =
            sync_merger::merge_sync_series(&samples, &[990.0], &GapPolicy::None, 5.0).unwrap();
        let resampled = sync_merger::resample_onto(&merged, &[985.0, 995.0, 1005.0, 1025.0]);

        assert!(resampled.latency_ms[0].is_nan());
        assert!(resampled.latency_ms[1].is_nan());
        assert_eq!(resampled.latency_ms[2], 2.0);
        assert_eq!(resampled.offset_ms[3], 100.0);
    }
}

#[cfg(test)]
mod spectral_tests {
    use contracts::{ContractError, TransformOptions, TransformType};

    use super::fixtures::{tone, FS};

    #[test]
    fn test_three_axes_three_meshes_in_order() {
        let axes = vec![tone(2.0, 512), tone(4.0, 512), tone(8.0, 512)];
        for transform in [TransformType::Wavelet, TransformType::Stft] {
            let meshes = spectral::compute_channel_meshes(
                &axes,
                FS,
                3,
                transform,
                &TransformOptions::default(),
            )
            .unwrap();
            assert_eq!(meshes.len(), 3);

            for (mesh, expected_hz) in meshes.iter().zip([2.0, 4.0, 8.0]) {
                let row = mesh.bits.row(mesh.time_s.len() / 2);
                let (peak, _) = row.iter().enumerate().fold((0, f64::MIN), |acc, (i, &v)| {
                    if v > acc.1 {
                        (i, v)
                    } else {
                        acc
                    }
                });
                let ratio = mesh.frequency_hz[peak] / expected_hz;
                assert!(
                    (0.75..1.34).contains(&ratio),
                    "{transform}: peak {} Hz for a {expected_hz} Hz tone",
                    mesh.frequency_hz[peak]
                );
            }
        }
    }

    #[test]
    fn test_two_samples_is_invalid_signal() {
        for transform in [TransformType::Wavelet, TransformType::Stft] {
            let err = spectral::compute_spectral_mesh(
                &[0.5, -0.5],
                1.0,
                1,
                transform,
                &TransformOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, ContractError::InvalidSignal { .. }));
        }
    }

    #[test]
    fn test_bits_bounded_by_floor_and_zero() {
        let options = TransformOptions {
            floor_bits: -16.0,
            max_time_points: Some(64),
        };
        let mesh =
            spectral::compute_spectral_mesh(&tone(4.0, 512), FS, 6, TransformType::Wavelet, &options)
                .unwrap();
        assert!(mesh.time_s.len() <= 64);
        assert!(mesh.bits.iter().all(|&b| (-16.0..=0.0).contains(&b)));
        assert_eq!(mesh.max_bits(), 0.0);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::Arc;

    use config_loader::ConfigLoader;
    use contracts::{ChannelName, Dataset, ErrorKind, ProcessingStage};
    use pipeline::Pipeline;

    use super::fixtures::{channel, recording, RUN_TOML, START};

    /// Config file + dataset file -> bundle
    #[test]
    fn test_e2e_from_files() {
        let dir = tempfile::tempdir().unwrap();

        let config_path = dir.path().join("run.toml");
        std::fs::File::create(&config_path)
            .unwrap()
            .write_all(RUN_TOML.as_bytes())
            .unwrap();

        let dataset_path = dir.path().join("dataset.json");
        serde_json::to_writer(std::fs::File::create(&dataset_path).unwrap(), &recording()).unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let dataset: Dataset =
            serde_json::from_reader(std::fs::File::open(&dataset_path).unwrap()).unwrap();

        let output = Pipeline::new(config).unwrap().process(&dataset);
        let bundle = &output.bundle;

        assert!(bundle.is_clean(), "{:?}", bundle.failures);
        assert_eq!(bundle.time_reference_epoch_s, Some(START));
        assert_eq!(bundle.mesh_count(), 5);
        assert!(bundle
            .products
            .values()
            .flat_map(|p| p.meshes.iter())
            .all(|m| m.epoch_origin_s == START));

        let heights = bundle.barometric_height_m.as_ref().unwrap();
        assert_eq!(heights.len(), 64);
        assert!(heights.windows(2).all(|w| w[1] > w[0]));

        let trajectory = bundle.trajectory.as_ref().unwrap();
        assert_eq!(trajectory.len(), 10);
        assert!(trajectory.range_m[0].abs() < 1e-6);
        assert!((trajectory.height_m[9] - 900.0).abs() < 1.0);

        // 20 exchanges + anchor + the configured gap
        let sync = bundle.synchronization.as_ref().unwrap();
        assert_eq!(sync.len(), 22);
        assert_eq!(sync.epochs_s[0], START);
        assert_eq!(output.stats.sync.as_ref().unwrap().gaps, 1);

        // The bundle is written as JSON for the rendering side
        let json = serde_json::to_string(bundle).unwrap();
        assert!(json.contains("\"event_name\":\"Skyfall\""));
    }

    #[test]
    fn test_failing_channel_is_isolated() {
        let config = ConfigLoader::load_from_str(RUN_TOML, config_loader::ConfigFormat::Toml).unwrap();
        let mut dataset = recording();
        dataset.channels.insert(
            ChannelName::Gyroscope,
            channel(ChannelName::Gyroscope, vec![vec![], vec![], vec![]]),
        );
        dataset.channels.insert(
            ChannelName::Magnetometer,
            channel(ChannelName::Magnetometer, vec![vec![1.0; 16], vec![1.0; 15]]),
        );

        let bundle = Pipeline::new(config).unwrap().process(&dataset).bundle;

        assert_eq!(bundle.products.len(), 3);
        assert_eq!(bundle.failures.len(), 2);

        let gyro = bundle.failures_for("gyroscope").next().unwrap();
        assert_eq!(gyro.kind, ErrorKind::InvalidSignal);
        assert_eq!(gyro.stage, ProcessingStage::Transform);

        let mag = bundle.failures_for("magnetometer").next().unwrap();
        assert_eq!(mag.kind, ErrorKind::ShapeMismatch);
        assert_eq!(mag.stage, ProcessingStage::Validate);

        assert!(bundle.trajectory.is_some());
        assert!(bundle.synchronization.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_run() {
        let config = ConfigLoader::load_from_str(RUN_TOML, config_loader::ConfigFormat::Toml).unwrap();
        let pipeline = Pipeline::new(config).unwrap();
        let dataset = Arc::new(recording());

        let concurrent = pipeline.process_concurrent(Arc::clone(&dataset)).await;
        let sequential = pipeline.process(&dataset);

        assert_eq!(concurrent.bundle.mesh_count(), sequential.bundle.mesh_count());
        for (name, product) in &sequential.bundle.products {
            let other = concurrent.bundle.product(*name).unwrap();
            assert_eq!(product.meshes, other.meshes);
            assert_eq!(product.color_limits, other.color_limits);
        }
        assert_eq!(
            concurrent.stats.metrics.channels_processed,
            sequential.stats.metrics.channels_processed
        );
    }
}
