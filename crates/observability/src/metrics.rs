//! Drive-loop and evaluation metrics
//!
//! Sensor bridges publish their own queue counters; this module covers the
//! control loop and leaderboard results.

use std::collections::BTreeMap;
use std::fmt;

use contracts::VehicleControl;
use metrics::{counter, gauge, histogram};

/// 记录一次控制循环
///
/// # Example
///
/// ```ignore
/// let started = Instant::now();
/// let control = agent.run_step(&sim.get_sensor_data());
/// sim.apply_control(control).await?;
/// observability::record_tick(&control, started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_tick(control: &VehicleControl, latency_ms: f64) {
    counter!("transfuser_ticks_total").increment(1);
    histogram!("transfuser_tick_latency_ms").record(latency_ms);

    gauge!("transfuser_control_steer").set(control.steer);
    gauge!("transfuser_control_throttle").set(control.throttle);
    gauge!("transfuser_control_brake").set(control.brake);
}

/// 记录缺失的传感器数据（该 tick 没有帧）
pub fn record_sensor_missing(sensor: &str) {
    counter!("transfuser_sensor_missing_total", "sensor" => sensor.to_string()).increment(1);
}

/// 记录单条路线的评估结果
pub fn record_route_result(route_id: &str, status: &str, completion: f64, infractions: usize) {
    counter!(
        "transfuser_routes_total",
        "status" => status.to_string()
    )
    .increment(1);
    gauge!("transfuser_route_completion", "route" => route_id.to_string()).set(completion);
    histogram!("transfuser_route_infractions").record(infractions as f64);
}

/// In-memory drive statistics, printed when the loop ends.
#[derive(Debug, Clone, Default)]
pub struct DriveMetricsAggregator {
    pub ticks: u64,
    pub latency_ms: RunningStats,
    pub steer: RunningStats,
    pub throttle: RunningStats,
    pub missing: BTreeMap<String, u64>,
}

impl DriveMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, control: &VehicleControl, latency_ms: f64, missing: &[&str]) {
        self.ticks += 1;
        self.latency_ms.push(latency_ms);
        self.steer.push(control.steer);
        self.throttle.push(control.throttle);
        for sensor in missing {
            *self.missing.entry((*sensor).to_string()).or_insert(0) += 1;
        }
    }

    pub fn summary(&self) -> DriveSummary {
        DriveSummary {
            ticks: self.ticks,
            latency_ms: StatsSummary::from(&self.latency_ms),
            steer: StatsSummary::from(&self.steer),
            throttle: StatsSummary::from(&self.throttle),
            missing: self.missing.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriveSummary {
    pub ticks: u64,
    pub latency_ms: StatsSummary,
    pub steer: StatsSummary,
    pub throttle: StatsSummary,
    pub missing: BTreeMap<String, u64>,
}

impl fmt::Display for DriveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Drive Summary ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(f, "Tick latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Steer: {}", self.steer)?;
        writeln!(f, "Throttle: {}", self.throttle)?;
        if !self.missing.is_empty() {
            writeln!(f, "Ticks without data:")?;
            for (sensor, count) in &self.missing {
                writeln!(f, "  {sensor}: {count}")?;
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
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Copy, Default)]
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
            (self.min, self.max, self.mean, self.m2) = (value, value, value, 0.0);
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
        self.mean
    }

    /// Sample variance
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }
        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert_eq!((stats.min(), stats.max()), (1.0, 5.0));
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = DriveMetricsAggregator::new();
        aggregator.update(&VehicleControl::new(0.5, -0.2, 0.0), 12.0, &["lidar"]);
        aggregator.update(&VehicleControl::new(0.7, 0.2, 0.0), 8.0, &[]);

        let summary = aggregator.summary();
        assert_eq!(summary.ticks, 2);
        assert!((summary.latency_ms.mean - 10.0).abs() < 1e-10);
        assert!((summary.steer.mean).abs() < 1e-10);
        assert_eq!(summary.missing.get("lidar"), Some(&1));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DriveMetricsAggregator::new();
        aggregator.update(&VehicleControl::stop(), 5.0, &["rgb"]);
        let output = aggregator.summary().to_string();
        assert!(output.contains("Ticks: 1"));
        assert!(output.contains("rgb: 1"));
        assert!(StatsSummary::default().to_string().contains("N/A"));
    }
}
