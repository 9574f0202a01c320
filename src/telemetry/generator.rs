//! Synthetic hardware telemetry generator.
//!
//! Produces readings in realistic ranges with a small amount of noise and
//! occasional correlated spikes, for demos and for exercising the anomaly
//! detector.

use crate::core::{unix_now, TelemetrySample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Chance that a reading is a correlated thermal/power spike.
pub const SPIKE_PROBABILITY: f64 = 0.08;

const GPU_TEMP_RANGE: Range<f64> = 45.0..70.0;
const CPU_TEMP_RANGE: Range<f64> = 55.0..75.0;
const FAN_RPM_RANGE: Range<f64> = 1200.0..1600.0;
const POWER_RANGE: Range<f64> = 110.0..150.0;
const SPIKE_MULTIPLIER_RANGE: Range<f64> = 1.3..1.7;

/// Full width of the multiplicative noise band (±2.5%).
const NOISE_FACTOR: f64 = 0.05;

/// Upper bound of the timestamp jitter, in seconds.
const TIMESTAMP_JITTER: f64 = 0.001;

/// Fake sample generator driven by a pseudo-random source.
pub struct SampleGenerator<R = StdRng> {
    rng: R,
}

impl SampleGenerator<StdRng> {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator that yields the same metric sequence for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is given, entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }
}

impl Default for SampleGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SampleGenerator<R> {
    /// Wrap an arbitrary random source.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate one reading stamped with the current time.
    pub fn generate(&mut self) -> TelemetrySample {
        self.generate_at(unix_now())
    }

    /// Generate one reading stamped `now` plus sub-millisecond jitter.
    pub fn generate_at(&mut self, now: f64) -> TelemetrySample {
        let timestamp = now + self.rng.gen_range(0.0..TIMESTAMP_JITTER);

        let mut gpu_temp = self.rng.gen_range(GPU_TEMP_RANGE);
        let mut cpu_temp = self.rng.gen_range(CPU_TEMP_RANGE);
        let mut fan_rpm = self.rng.gen_range(FAN_RPM_RANGE);
        let mut power_draw = self.rng.gen_range(POWER_RANGE);

        if self.rng.gen_bool(SPIKE_PROBABILITY) {
            let multiplier = self.rng.gen_range(SPIKE_MULTIPLIER_RANGE);
            gpu_temp *= multiplier;
            cpu_temp *= multiplier;
            fan_rpm *= multiplier;
            power_draw *= multiplier;
        }

        TelemetrySample {
            timestamp,
            gpu_temp: round_to_tenth(self.noisy(gpu_temp)),
            cpu_temp: round_to_tenth(self.noisy(cpu_temp)),
            fan_rpm: self.noisy(fan_rpm).round(),
            power_draw: round_to_tenth(self.noisy(power_draw)),
        }
    }

    /// Generate `count` readings in production order (oldest first).
    pub fn generate_batch(&mut self, count: usize) -> Vec<TelemetrySample> {
        (0..count).map(|_| self.generate()).collect()
    }

    fn noisy(&mut self, base: f64) -> f64 {
        base + (self.rng.gen::<f64>() - 0.5) * base * NOISE_FACTOR
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_tenth(value: f64) -> bool {
        (round_to_tenth(value) - value).abs() < 1e-9
    }

    #[test]
    fn test_values_within_bounds() {
        let mut generator = SampleGenerator::seeded(1);
        let max_spike = SPIKE_MULTIPLIER_RANGE.end * (1.0 + NOISE_FACTOR / 2.0);
        let min_noise = 1.0 - NOISE_FACTOR / 2.0;

        for _ in 0..2000 {
            let s = generator.generate_at(1_700_000_000.0);
            assert!(s.gpu_temp >= GPU_TEMP_RANGE.start * min_noise - 0.1);
            assert!(s.gpu_temp <= GPU_TEMP_RANGE.end * max_spike + 0.1);
            assert!(s.cpu_temp >= CPU_TEMP_RANGE.start * min_noise - 0.1);
            assert!(s.cpu_temp <= CPU_TEMP_RANGE.end * max_spike + 0.1);
            assert!(s.fan_rpm >= FAN_RPM_RANGE.start * min_noise - 1.0);
            assert!(s.fan_rpm <= FAN_RPM_RANGE.end * max_spike + 1.0);
            assert!(s.power_draw >= POWER_RANGE.start * min_noise - 0.1);
            assert!(s.power_draw <= POWER_RANGE.end * max_spike + 0.1);
        }
    }

    #[test]
    fn test_rounding() {
        let mut generator = SampleGenerator::seeded(2);
        for _ in 0..500 {
            let s = generator.generate();
            assert!(is_tenth(s.gpu_temp), "gpu_temp {} not rounded", s.gpu_temp);
            assert!(is_tenth(s.cpu_temp), "cpu_temp {} not rounded", s.cpu_temp);
            assert!(is_tenth(s.power_draw), "power_draw {} not rounded", s.power_draw);
            assert_eq!(s.fan_rpm, s.fan_rpm.round());
        }
    }

    #[test]
    fn test_timestamp_jitter() {
        let mut generator = SampleGenerator::seeded(3);
        let now = 1_700_000_000.0;
        for _ in 0..100 {
            let s = generator.generate_at(now);
            assert!(s.timestamp >= now);
            assert!(s.timestamp < now + TIMESTAMP_JITTER + 1e-6);
        }
    }

    #[test]
    fn test_spikes_occur() {
        let mut generator = SampleGenerator::seeded(4);
        // Without a spike power never exceeds the noisy top of its range
        let ceiling = POWER_RANGE.end * (1.0 + NOISE_FACTOR / 2.0) + 0.1;

        let spikes = (0..5000)
            .map(|_| generator.generate())
            .filter(|s| s.power_draw > ceiling)
            .count();

        assert!(spikes > 0);
        assert!(spikes < 1000);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SampleGenerator::seeded(99);
        let mut b = SampleGenerator::seeded(99);
        for _ in 0..20 {
            let x = a.generate_at(10.0);
            let y = b.generate_at(10.0);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_batch_size() {
        let mut generator = SampleGenerator::seeded(5);
        assert_eq!(generator.generate_batch(50).len(), 50);
        assert!(generator.generate_batch(0).is_empty());
    }
}
