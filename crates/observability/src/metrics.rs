//! 估计指标收集模块
//!
//! 记录同步会话指标，并在内存中聚合延迟/时钟偏移统计。

use std::collections::HashMap;

use contracts::DelayEstimate;
use metrics::{counter, gauge, histogram};

/// 记录一次同步会话结果
///
/// `status` 为 `"ok"` 或 `SyncError::kind()`。
pub fn record_session(status: &str, duration_ms: f64) {
    counter!("gyro_sync_sessions_total", "status" => status.to_string()).increment(1);
    histogram!("gyro_sync_session_duration_ms").record(duration_ms);
}

/// 记录最近一次计算出的时钟偏移
pub fn record_clock_offset(offset_s: f64) {
    gauge!("gyro_sync_last_clock_offset_ms").set(offset_s * 1000.0);
}

/// 记录上传的录制大小
pub fn record_upload(role: &str, bytes: usize, samples: usize) {
    histogram!("gyro_sync_upload_bytes", "role" => role.to_string()).record(bytes as f64);
    histogram!("gyro_sync_upload_samples", "role" => role.to_string()).record(samples as f64);
}

/// 估计结果聚合器
///
/// 在内存中聚合服务器生命周期内的估计结果，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct EstimationStatsAggregator {
    /// 成功次数
    pub successes: u64,

    /// 失败次数
    pub failures: u64,

    /// 触发边界修正的次数
    pub boundary_corrections: u64,

    /// 延迟统计 (毫秒)
    pub delay_stats: RunningStats,

    /// 时钟偏移统计 (毫秒)
    pub offset_stats: RunningStats,

    /// 各类错误次数
    pub failure_counts: HashMap<String, u64>,
}

impl EstimationStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功的估计
    pub fn record_success(&mut self, estimate: &DelayEstimate, clock_offset_s: Option<f64>) {
        self.successes += 1;
        if estimate.boundary_corrected {
            self.boundary_corrections += 1;
        }
        self.delay_stats.push(estimate.delay_s * 1000.0);
        if let Some(offset) = clock_offset_s {
            self.offset_stats.push(offset * 1000.0);
        }
    }

    /// 记录失败的估计
    pub fn record_failure(&mut self, kind: &str) {
        self.failures += 1;
        *self.failure_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    /// 生成摘要报告
    pub fn summary(&self) -> EstimationSummary {
        EstimationSummary {
            total: self.total(),
            successes: self.successes,
            failures: self.failures,
            success_rate: if self.total() > 0 {
                self.successes as f64 / self.total() as f64 * 100.0
            } else {
                0.0
            },
            boundary_corrections: self.boundary_corrections,
            delay_ms: StatsSummary::from(&self.delay_stats),
            clock_offset_ms: StatsSummary::from(&self.offset_stats),
            failure_counts: self.failure_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 估计摘要
#[derive(Debug, Clone, Default)]
pub struct EstimationSummary {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub boundary_corrections: u64,
    pub delay_ms: StatsSummary,
    pub clock_offset_ms: StatsSummary,
    pub failure_counts: HashMap<String, u64>,
}

impl std::fmt::Display for EstimationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Gyro Sync Summary ===")?;
        writeln!(
            f,
            "Estimations: {} ({} ok, {:.2}%)",
            self.total, self.successes, self.success_rate
        )?;
        writeln!(f, "Boundary corrections: {}", self.boundary_corrections)?;
        writeln!(f, "Delay (ms): {}", self.delay_ms)?;
        writeln!(f, "Clock offset (ms): {}", self.clock_offset_ms)?;

        if !self.failure_counts.is_empty() {
            let mut kinds: Vec<_> = self.failure_counts.iter().collect();
            kinds.sort();
            writeln!(f, "Failures:")?;
            for (kind, count) in kinds {
                writeln!(f, "  {kind}: {count}")?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差 (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
