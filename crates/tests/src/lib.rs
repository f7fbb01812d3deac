//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（Mock 录制 -> CSV -> 解析 -> 估计）
//! - 配置驱动的估计

#[cfg(test)]
mod contract_tests {
    use contracts::{DelayEstimate, SyncError};

    #[test]
    fn test_delay_estimate_field_names() {
        let estimate = DelayEstimate {
            delay_s: 0.25,
            sample_interval_s: 1e-3,
            coarse_lag: 250,
            peak_index: 1249,
            boundary_corrected: false,
            fractional_offset: 0.5,
            calibration: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        };
        let json = serde_json::to_value(estimate).unwrap();
        for key in [
            "delay_s",
            "sample_interval_s",
            "coarse_lag",
            "peak_index",
            "boundary_corrected",
            "fractional_offset",
            "calibration",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
        assert!((estimate.delay_samples() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            SyncError::invalid_input("x", "y"),
            SyncError::SingularSystem { determinant: 0.0 },
            SyncError::InsufficientOverlap { rows: 1 },
            SyncError::ComplexRoots { re: 0.0, im: 1.0 },
            SyncError::DegenerateQuadratic,
            SyncError::PeakAtBoundary { index: 0, len: 1 },
            SyncError::config_parse("x"),
            SyncError::config_validation("x", "y"),
            SyncError::recording_parse(1, "x"),
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;

    use approx::assert_relative_eq;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{EstimatorConfig, GyroStream, TimestampUnit};
    use ingestion::{read_recording, read_recording_async, GyroRecording, MockGyroConfig, MockGyroSource};
    use nalgebra::{Rotation3, Vector3};
    use observability::EstimationStatsAggregator;
    use sync_engine::{clock_offset, TimeSync};

    fn recording(config: MockGyroConfig) -> GyroRecording {
        MockGyroSource::new(config).recording().unwrap()
    }

    fn write_csv(rec: &GyroRecording) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(rec.to_csv(TimestampUnit::Nanoseconds).as_bytes())
            .unwrap();
        file
    }

    /// End-to-end test: MockGyroSource -> CSV file -> parser -> TimeSync
    ///
    /// 验证完整的数据流：
    /// 1. 两台设备的录制带有时钟偏移、延迟、坐标系旋转和噪声
    /// 2. 以纳秒时间戳写入 CSV 并重新解析
    /// 3. 估计延迟、校准矩阵与时钟偏移
    #[test]
    fn test_e2e_csv_pipeline() {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.35)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), 0.8);
        let r = *rotation.matrix();

        let client = recording(MockGyroConfig {
            start_time_s: 5_000.0,
            noise_amplitude: 0.002,
            seed: 1,
            ..MockGyroConfig::default()
        });
        let leader = recording(MockGyroConfig {
            start_time_s: 5_042.5,
            delay_s: 0.0873,
            rotation: r.transpose().into(),
            noise_amplitude: 0.002,
            seed: 2,
            ..MockGyroConfig::default()
        });

        let client_file = write_csv(&client);
        let leader_file = write_csv(&leader);

        let first = read_recording(client_file.path(), TimestampUnit::Nanoseconds)
            .unwrap()
            .into_stream()
            .unwrap();
        let second = read_recording(leader_file.path(), TimestampUnit::Nanoseconds)
            .unwrap()
            .into_stream()
            .unwrap();
        let first_ts = first.timestamps().to_vec();
        let second_ts = second.timestamps().to_vec();

        let mut sync = TimeSync::new(first, second, true);
        sync.resample(1e-3).unwrap();
        let estimate = sync.estimate_delay().unwrap();

        assert!(
            (estimate.delay_s - 0.0873).abs() < 1e-3,
            "delay {}",
            estimate.delay_s
        );
        assert_relative_eq!(*sync.calibration().unwrap(), r, epsilon = 1e-2);

        let offset = clock_offset(&first_ts, &second_ts, estimate.delay_s).unwrap();
        assert!((offset - 42.5873).abs() < 1e-3, "offset {offset}");
    }

    /// Recordings of different length still align
    #[test]
    fn test_e2e_unequal_lengths() {
        let first = recording(MockGyroConfig::default());
        let mut second = recording(MockGyroConfig {
            delay_s: -0.031,
            ..MockGyroConfig::default()
        });
        second.samples.truncate(900);
        second.timestamps_s.truncate(900);

        let mut sync = TimeSync::new(first.into_stream().unwrap(), second.into_stream().unwrap(), true);
        let estimate = sync.estimate_delay().unwrap();
        assert!(
            (estimate.delay_s + 0.031).abs() < estimate.sample_interval_s,
            "delay {}",
            estimate.delay_s
        );
    }

    /// Configuration drives the estimator
    #[test]
    fn test_config_driven_estimate() {
        let config = ConfigLoader::load_from_str(
            "[estimator]\naccuracy = 0.002\n\n[input]\ntimestamp_unit = \"seconds\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let unit = config.input.timestamp_unit;
        let first_csv = recording(MockGyroConfig::default()).to_csv(unit);
        let second_csv = recording(MockGyroConfig {
            delay_s: 0.064,
            ..MockGyroConfig::default()
        })
        .to_csv(unit);

        let first = ingestion::parse_recording(&first_csv, unit).unwrap();
        let second = ingestion::parse_recording(&second_csv, unit).unwrap();

        let mut sync = TimeSync::with_config(
            first.into_stream().unwrap(),
            second.into_stream().unwrap(),
            config.estimator,
        );
        let estimate = sync.estimate_delay().unwrap();

        assert_eq!(estimate.sample_interval_s, 0.002);
        assert!(
            (estimate.delay_s - 0.064).abs() < 0.0002,
            "delay {}",
            estimate.delay_s
        );
    }

    /// Aggregated statistics over several runs
    #[test]
    fn test_stats_over_runs() {
        let mut stats = EstimationStatsAggregator::new();
        for delay in [0.01, 0.02, 0.03] {
            let first = MockGyroSource::new(MockGyroConfig::default()).generate().unwrap();
            let second = MockGyroSource::new(MockGyroConfig {
                delay_s: delay,
                ..MockGyroConfig::default()
            })
            .generate()
            .unwrap();
            let mut sync = TimeSync::with_config(first, second, EstimatorConfig::default());
            match sync.estimate_delay() {
                Ok(estimate) => stats.record_success(&estimate, None),
                Err(e) => stats.record_failure(e.kind()),
            }
        }

        let summary = stats.summary();
        assert_eq!(summary.successes, 3);
        assert!((summary.delay_ms.mean - 20.0).abs() < 0.1, "{summary}");
    }

    /// Degenerate streams are rejected before estimation
    #[test]
    fn test_degenerate_inputs() {
        assert!(GyroStream::new(vec![], vec![]).is_err());
        assert!(GyroStream::new(vec![[0.0; 3]], vec![0.0]).is_err());
        assert!(GyroStream::new(vec![[0.0; 3]; 3], vec![0.0, 1.0]).is_err());
    }

    /// Async reader feeds the estimator like the sync server does
    #[tokio::test]
    async fn test_async_upload_to_estimate() {
        let unit = TimestampUnit::Nanoseconds;
        let first_csv = recording(MockGyroConfig::default()).to_csv(unit);
        let second_csv = recording(MockGyroConfig {
            delay_s: 0.015,
            ..MockGyroConfig::default()
        })
        .to_csv(unit);

        let mut first_reader = first_csv.as_bytes();
        let mut second_reader = second_csv.as_bytes();
        let (first, _) = read_recording_async(&mut first_reader, unit, 512).await.unwrap();
        let (second, raw) = read_recording_async(&mut second_reader, unit, 512).await.unwrap();
        assert_eq!(raw.len(), second_csv.len());

        let estimate = tokio::task::spawn_blocking(move || {
            let mut sync = TimeSync::new(first.into_stream()?, second.into_stream()?, true);
            sync.estimate_delay()
        })
        .await
        .unwrap()
        .unwrap();

        assert!((estimate.delay_s - 0.015).abs() < estimate.sample_interval_s / 10.0);
    }
}
