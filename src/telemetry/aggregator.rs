//! Windowed aggregation over the retention buffer.

use crate::core::{unix_now, AggregateStats, PowerTrend, TelemetrySample};
use crate::telemetry::buffer::RetentionBuffer;

/// Mean power change, in watts, needed to call a trend up or down.
pub const TREND_THRESHOLD_WATTS: f64 = 5.0;

/// Read-only aggregator borrowing a retention buffer.
pub struct Aggregator<'a> {
    buffer: &'a RetentionBuffer,
}

impl<'a> Aggregator<'a> {
    pub fn new(buffer: &'a RetentionBuffer) -> Self {
        Self { buffer }
    }

    /// Stats over the last `seconds`.
    pub fn stats(&self, seconds: f64) -> AggregateStats {
        self.stats_at(seconds, unix_now())
    }

    /// Stats over `[now - seconds, ..)`, with the power trend measured
    /// against the equal-length window `[now - 2*seconds, now - seconds)`.
    pub fn stats_at(&self, seconds: f64, now: f64) -> AggregateStats {
        let cutoff = now - seconds;
        let recent = self.buffer.since_at(cutoff);

        let Some(newest) = recent.first() else {
            return AggregateStats::default();
        };

        let recent_power = mean(&recent, |s| s.power_draw);
        let preceding = self.buffer.between(cutoff - seconds, cutoff);
        let preceding_power = if preceding.is_empty() {
            recent_power
        } else {
            mean(&preceding, |s| s.power_draw)
        };

        AggregateStats {
            avg_gpu_temp: mean(&recent, |s| s.gpu_temp),
            avg_cpu_temp: mean(&recent, |s| s.cpu_temp),
            latest_fan_rpm: newest.fan_rpm,
            power_trend: classify_trend(recent_power, preceding_power),
        }
    }
}

/// Classify the change from `preceding` to `recent` mean power.
pub fn classify_trend(recent: f64, preceding: f64) -> PowerTrend {
    let diff = recent - preceding;
    if diff > TREND_THRESHOLD_WATTS {
        PowerTrend::Up
    } else if diff < -TREND_THRESHOLD_WATTS {
        PowerTrend::Down
    } else {
        PowerTrend::Stable
    }
}

/// Arithmetic mean of one field; 0 for an empty slice.
pub fn mean<F>(samples: &[TelemetrySample], field: F) -> f64
where
    F: Fn(&TelemetrySample) -> f64,
{
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(field).sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOW: f64 = 1_700_000_000.0;

    fn sample(ts: f64, gpu: f64, cpu: f64, fan: f64, power: f64) -> TelemetrySample {
        TelemetrySample::new(ts, gpu, cpu, fan, power)
    }

    fn buffer_with(samples: &[TelemetrySample]) -> RetentionBuffer {
        let mut buffer = RetentionBuffer::new(1000);
        for s in samples {
            buffer.insert(*s);
        }
        buffer
    }

    /// Preceding window at `preceding` watts, recent window at `recent` watts.
    fn trend_buffer(preceding: f64, recent: f64) -> RetentionBuffer {
        buffer_with(&[
            sample(NOW - 90.0, 50.0, 60.0, 1300.0, preceding),
            sample(NOW - 70.0, 50.0, 60.0, 1300.0, preceding),
            sample(NOW - 30.0, 50.0, 60.0, 1300.0, recent),
            sample(NOW - 10.0, 50.0, 60.0, 1300.0, recent),
        ])
    }

    #[test]
    fn test_empty_window() {
        let buffer = RetentionBuffer::new(10);
        let stats = Aggregator::new(&buffer).stats(3600.0);

        assert_eq!(
            stats,
            AggregateStats {
                avg_gpu_temp: 0.0,
                avg_cpu_temp: 0.0,
                latest_fan_rpm: 0.0,
                power_trend: PowerTrend::Stable,
            }
        );
    }

    #[test]
    fn test_averages_and_latest_fan() {
        let buffer = buffer_with(&[
            sample(NOW - 30.0, 50.0, 60.0, 1200.0, 120.0),
            sample(NOW - 20.0, 60.0, 70.0, 1300.0, 120.0),
            sample(NOW - 10.0, 70.0, 65.0, 1500.0, 120.0),
        ]);

        let stats = Aggregator::new(&buffer).stats_at(60.0, NOW);
        assert_eq!(stats.avg_gpu_temp, 60.0);
        assert_eq!(stats.avg_cpu_temp, 65.0);
        assert_eq!(stats.latest_fan_rpm, 1500.0);
        assert_eq!(stats.power_trend, PowerTrend::Stable);
    }

    #[test]
    fn test_window_excludes_old_samples() {
        let buffer = buffer_with(&[
            sample(NOW - 500.0, 90.0, 90.0, 2000.0, 200.0),
            sample(NOW - 10.0, 50.0, 60.0, 1250.0, 120.0),
        ]);

        let stats = Aggregator::new(&buffer).stats_at(60.0, NOW);
        assert_eq!(stats.avg_gpu_temp, 50.0);
        assert_eq!(stats.latest_fan_rpm, 1250.0);
    }

    #[test]
    fn test_trend_up() {
        let buffer = trend_buffer(100.0, 120.0);
        assert_eq!(Aggregator::new(&buffer).stats_at(60.0, NOW).power_trend, PowerTrend::Up);
    }

    #[test]
    fn test_trend_stable() {
        let buffer = trend_buffer(100.0, 100.0);
        assert_eq!(
            Aggregator::new(&buffer).stats_at(60.0, NOW).power_trend,
            PowerTrend::Stable
        );
    }

    #[test]
    fn test_trend_down() {
        let buffer = trend_buffer(100.0, 90.0);
        assert_eq!(Aggregator::new(&buffer).stats_at(60.0, NOW).power_trend, PowerTrend::Down);
    }

    #[test]
    fn test_trend_ignores_samples_before_preceding_window() {
        // Only a very old sample precedes the window, so the trend is stable
        let buffer = buffer_with(&[
            sample(NOW - 1000.0, 50.0, 60.0, 1300.0, 10.0),
            sample(NOW - 10.0, 50.0, 60.0, 1300.0, 140.0),
        ]);

        assert_eq!(
            Aggregator::new(&buffer).stats_at(60.0, NOW).power_trend,
            PowerTrend::Stable
        );
    }

    #[test]
    fn test_classify_trend_threshold_is_strict() {
        assert_eq!(classify_trend(105.0, 100.0), PowerTrend::Stable);
        assert_eq!(classify_trend(95.0, 100.0), PowerTrend::Stable);
        assert_eq!(classify_trend(105.5, 100.0), PowerTrend::Up);
        assert_eq!(classify_trend(94.5, 100.0), PowerTrend::Down);
    }
}
