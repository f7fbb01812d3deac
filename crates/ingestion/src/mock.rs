//! Mock 陀螺仪数据源
//!
//! 生成带高斯包络的三轴角速度信号，用于无真实设备的测试。
//! 支持已知延迟、已知旋转、时钟偏移和均匀噪声。

use contracts::{GyroStream, SyncError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::recording::GyroRecording;

/// Mock 陀螺仪配置
#[derive(Debug, Clone)]
pub struct MockGyroConfig {
    /// 采样频率 (Hz)
    pub rate_hz: f64,

    /// 录制时长 (s)
    pub duration_s: f64,

    /// 设备时钟上的首个时间戳 (s)
    pub start_time_s: f64,

    /// 运动相对名义时间轴的延迟 (s)，正值表示本流滞后
    pub delay_s: f64,

    /// 传感器坐标系旋转（行优先）
    pub rotation: [[f64; 3]; 3],

    /// 均匀噪声幅值 (rad/s)
    pub noise_amplitude: f64,

    /// 随机种子
    pub seed: u64,
}

impl Default for MockGyroConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100.0,
            duration_s: 10.0,
            start_time_s: 0.0,
            delay_s: 0.0,
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            noise_amplitude: 0.0,
            seed: 42,
        }
    }
}

/// Mock 陀螺仪数据源
pub struct MockGyroSource {
    config: MockGyroConfig,
}

impl MockGyroSource {
    pub fn new(config: MockGyroConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MockGyroConfig {
        &self.config
    }

    /// 生成原始录制
    pub fn recording(&self) -> Result<GyroRecording, SyncError> {
        let cfg = &self.config;
        if !(cfg.rate_hz.is_finite() && cfg.rate_hz > 0.0) {
            return Err(SyncError::invalid_input("rate_hz", "must be positive"));
        }
        if !(cfg.duration_s.is_finite() && cfg.duration_s > 0.0) {
            return Err(SyncError::invalid_input("duration_s", "must be positive"));
        }

        let n = (cfg.duration_s * cfg.rate_hz).round() as usize;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut recording = GyroRecording {
            samples: Vec::with_capacity(n),
            timestamps_s: Vec::with_capacity(n),
        };

        for i in 0..n {
            let nominal = i as f64 / cfg.rate_hz;
            let omega = burst_signal(nominal - cfg.delay_s, cfg.duration_s);

            let mut sample = [0.0; 3];
            for (row, out) in sample.iter_mut().enumerate() {
                *out = (0..3).map(|c| cfg.rotation[row][c] * omega[c]).sum();
                if cfg.noise_amplitude > 0.0 {
                    *out += rng.random_range(-cfg.noise_amplitude..cfg.noise_amplitude);
                }
            }

            recording.samples.push(sample);
            recording.timestamps_s.push(cfg.start_time_s + nominal);
        }

        debug!(
            samples = n,
            rate_hz = cfg.rate_hz,
            delay_s = cfg.delay_s,
            "mock gyro recording generated"
        );
        Ok(recording)
    }

    /// 生成已校验的 `GyroStream`
    pub fn generate(&self) -> Result<GyroStream, SyncError> {
        self.recording()?.into_stream()
    }
}

/// 高斯包络下的三轴正弦运动
///
/// 包络中心位于录制中点，宽度为时长的 1/8，两端几乎为零。
pub fn burst_signal(t: f64, duration_s: f64) -> [f64; 3] {
    use std::f64::consts::TAU;

    let center = duration_s / 2.0;
    let width = duration_s / 8.0;
    let envelope = (-((t - center) / width).powi(2)).exp();

    [
        envelope * 1.2 * (TAU * 1.3 * t).sin(),
        envelope * 0.9 * (TAU * 2.1 * t + 0.4).sin(),
        envelope * 0.6 * (TAU * 0.7 * t + 1.1).sin(),
    ]
}
