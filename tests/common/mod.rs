//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use thermo_telemetry::core::{unix_now, ConfigBuilder, TelemetrySample};
use thermo_telemetry::TelemetryService;

/// Test fixture builder for samples with unremarkable default readings.
pub struct TestSampleBuilder {
    timestamp: f64,
    gpu_temp: f64,
    cpu_temp: f64,
    fan_rpm: f64,
    power_draw: f64,
}

impl TestSampleBuilder {
    /// A sample taken `secs_ago` seconds before now.
    pub fn new(secs_ago: f64) -> Self {
        Self::at(unix_now() - secs_ago)
    }

    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            gpu_temp: 55.0,
            cpu_temp: 62.0,
            fan_rpm: 1400.0,
            power_draw: 130.0,
        }
    }

    pub fn gpu(mut self, temp: f64) -> Self {
        self.gpu_temp = temp;
        self
    }

    pub fn cpu(mut self, temp: f64) -> Self {
        self.cpu_temp = temp;
        self
    }

    pub fn fan(mut self, rpm: f64) -> Self {
        self.fan_rpm = rpm;
        self
    }

    pub fn power(mut self, watts: f64) -> Self {
        self.power_draw = watts;
        self
    }

    pub fn build(self) -> TelemetrySample {
        TelemetrySample::new(
            self.timestamp,
            self.gpu_temp,
            self.cpu_temp,
            self.fan_rpm,
            self.power_draw,
        )
    }
}

/// A seeded service with the generator disabled.
pub fn quiet_service(capacity: usize) -> Arc<TelemetryService> {
    let config = ConfigBuilder::new()
        .capacity(capacity)
        .initial_burst(capacity.min(50))
        .generator_enabled(false)
        .seed(42)
        .build()
        .unwrap();
    Arc::new(TelemetryService::new(config).unwrap())
}

/// Insert `count` default samples, one per second, oldest first, ending one
/// second ago.
pub fn fill_service(service: &TelemetryService, count: usize) {
    for i in 0..count {
        let secs_ago = (count - i) as f64;
        service.insert_telemetry(TestSampleBuilder::new(secs_ago).build());
    }
}

/// Verify samples are ordered newest-first.
pub fn assert_newest_first(samples: &[TelemetrySample]) {
    for pair in samples.windows(2) {
        assert!(
            pair[0].timestamp >= pair[1].timestamp,
            "Samples not sorted newest-first: {} before {}",
            pair[0].timestamp,
            pair[1].timestamp
        );
    }
}
