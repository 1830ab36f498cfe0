//! Snapshot, GPU, process and host reading types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One point-in-time reading spanning all devices and the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    /// Production time, opaque to the engine (ISO-8601 from known producers)
    pub timestamp: String,
    /// One reading per physical device, keyed by `id`
    #[serde(default)]
    pub gpus: Vec<GpuReading>,
    /// Host-level metrics, absent when the producer has them disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<HostReading>,
}

impl TelemetrySnapshot {
    /// Parse a raw text frame.
    pub fn from_frame(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize to the text frame representation.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Look up a device reading by id.
    pub fn gpu(&self, id: u32) -> Option<&GpuReading> {
        self.gpus.iter().find(|gpu| gpu.id == id)
    }
}

/// CUDA version as reported by the producer.
///
/// `nvidia-smi` reports a string while NVML-based producers send a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CudaVersion {
    Text(String),
    Number(f64),
}

impl fmt::Display for CudaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CudaVersion::Text(text) => f.write_str(text),
            CudaVersion::Number(number) => write!(f, "{}", number),
        }
    }
}

/// Reading for a single GPU.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuReading {
    /// Stable device index, unique within a snapshot
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuda_version: Option<CudaVersion>,
    /// Core utilization percent (0-100)
    #[serde(default)]
    pub utilization: Option<f64>,
    #[serde(default)]
    pub memory_used: Option<f64>,
    #[serde(default)]
    pub memory_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_free: Option<f64>,
    /// Degrees Celsius
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Watts
    #[serde(default)]
    pub power_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_limit: Option<f64>,
    #[serde(default)]
    pub fan_speed: Option<f64>,
    #[serde(default)]
    pub encoder_utilization: Option<f64>,
    #[serde(default)]
    pub decoder_utilization: Option<f64>,
    #[serde(default)]
    pub processes: Vec<ProcessEntry>,
}

impl GpuReading {
    /// Display name, falling back to the device index.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("GPU {}", self.id))
    }
}

/// A process holding memory on a GPU.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntry {
    /// Absent when the driver hides the pid (containers, permissions)
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "usedMemoryMiB", skip_serializing_if = "Option::is_none")]
    pub used_memory_mib: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Host-level metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReading {
    /// CPU percent (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    /// Memory percent (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_total: Option<f64>,
    /// 1, 5 and 15 minute load averages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_average: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}
