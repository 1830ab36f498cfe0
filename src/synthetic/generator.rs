//! Snapshot generator with persistent device identities

use crate::telemetry::{CudaVersion, GpuReading, HostReading, ProcessEntry, TelemetrySnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fleet size used when nothing else is configured.
pub const DEFAULT_DEVICE_COUNT: usize = 4;

const GPU_MEMORY_TOTAL_MIB: f64 = 16384.0;
const GPU_MEMORY_USED_MAX_MIB: u32 = 10000;
const GPU_POWER_LIMIT_W: f64 = 250.0;
const HOST_MEMORY_TOTAL_MIB: f64 = 16384.0;
const HOST_MEMORY_USED_MAX_MIB: u32 = 8000;
const MAX_PROCESSES_PER_GPU: usize = 5;
const SYNTHETIC_HOSTNAME: &str = "synthetic-host";

/// Produces telemetry snapshots for a simulated fleet.
///
/// Device ids, names, uuids and process identities are fixed the first time
/// a device is materialized. Subsequent calls redraw only the volatile
/// fields. Host uptime is drawn once and stays constant.
pub struct SyntheticGenerator {
    rng: StdRng,
    fleet: Vec<GpuReading>,
    host: Option<HostReading>,
}

impl SyntheticGenerator {
    /// Generator seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            fleet: Vec::new(),
            host: None,
        }
    }

    /// Number of devices materialized so far.
    pub fn fleet_size(&self) -> usize {
        self.fleet.len()
    }

    /// Produce the next snapshot for a fleet of `device_count` GPUs.
    ///
    /// Growing the fleet materializes new devices after the existing ones;
    /// shrinking it drops the highest ids.
    pub fn next_snapshot(&mut self, device_count: usize) -> TelemetrySnapshot {
        self.resize_fleet(device_count);

        if self.host.is_none() {
            self.host = Some(self.materialize_host());
        }

        let mut fleet = std::mem::take(&mut self.fleet);
        for gpu in &mut fleet {
            self.redraw_gpu(gpu);
        }
        self.fleet = fleet;

        let mut host = self.host.take();
        if let Some(host) = host.as_mut() {
            self.redraw_host(host);
        }
        self.host = host;

        TelemetrySnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            gpus: self.fleet.clone(),
            system: self.host.clone(),
        }
    }

    fn resize_fleet(&mut self, device_count: usize) {
        if device_count < self.fleet.len() {
            self.fleet.truncate(device_count);
            return;
        }
        for id in self.fleet.len()..device_count {
            let gpu = self.materialize_gpu(id as u32);
            self.fleet.push(gpu);
        }
    }

    fn materialize_gpu(&mut self, id: u32) -> GpuReading {
        let uuid = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        let process_count = self.rng.random_range(0..MAX_PROCESSES_PER_GPU);
        let processes = (0..process_count)
            .map(|j| ProcessEntry {
                pid: Some(1000 + id * 100 + j as u32),
                name: Some(format!("process-{}", j)),
                used_memory_mib: None,
                user: Some(format!("user{}", j)),
            })
            .collect();

        GpuReading {
            id,
            uuid: Some(format!("GPU-{}", uuid)),
            name: Some(format!("Synthetic GPU {}", id)),
            driver_version: Some("550.54.14".to_string()),
            cuda_version: Some(CudaVersion::Text("12.4".to_string())),
            memory_total: Some(GPU_MEMORY_TOTAL_MIB),
            power_limit: Some(GPU_POWER_LIMIT_W),
            processes,
            ..Default::default()
        }
    }

    fn materialize_host(&mut self) -> HostReading {
        HostReading {
            memory_total: Some(HOST_MEMORY_TOTAL_MIB),
            uptime_seconds: Some(self.rng.random_range(0..100_000)),
            hostname: Some(SYNTHETIC_HOSTNAME.to_string()),
            ..Default::default()
        }
    }

    fn redraw_gpu(&mut self, gpu: &mut GpuReading) {
        let memory_used = self.whole(0, GPU_MEMORY_USED_MAX_MIB);

        gpu.utilization = Some(self.whole(0, 100));
        gpu.memory_used = Some(memory_used);
        gpu.memory_free = Some(GPU_MEMORY_TOTAL_MIB - memory_used);
        gpu.temperature = Some(self.whole(30, 80));
        gpu.power_usage = Some(self.whole(50, 150));
        gpu.fan_speed = Some(self.whole(0, 100));
        gpu.encoder_utilization = Some(self.whole(0, 100));
        gpu.decoder_utilization = Some(self.whole(0, 100));

        for process in &mut gpu.processes {
            process.used_memory_mib = Some(self.whole(0, 2000));
        }
    }

    fn redraw_host(&mut self, host: &mut HostReading) {
        host.cpu_usage = Some(self.whole(0, 100));
        host.memory_usage = Some(self.whole(0, 100));
        host.memory_used = Some(self.whole(0, HOST_MEMORY_USED_MAX_MIB));
        host.load_average = Some(
            (0..3)
                .map(|_| self.rng.random_range(0.0..2.0))
                .collect(),
        );
    }

    /// Whole number drawn from `[low, high)`.
    fn whole(&mut self, low: u32, high: u32) -> f64 {
        f64::from(self.rng.random_range(low..high))
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}
