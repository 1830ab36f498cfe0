//! Output formatting helpers for CLI commands

use crate::engine::EngineView;
use crate::history::memory_sample;
use crate::stream::{ConnectionState, ConnectionStatus};
use crate::telemetry::{GpuReading, HostReading, TelemetrySnapshot};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;
use std::collections::BTreeMap;

/// Placeholder for readings the producer did not send.
pub const MISSING: &str = "--";

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", v.round()),
        None => MISSING.to_string(),
    }
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}°C", v.round()),
        None => MISSING.to_string(),
    }
}

pub fn format_power(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} W", v),
        None => MISSING.to_string(),
    }
}

pub fn format_memory(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} MiB", v),
        None => MISSING.to_string(),
    }
}

/// Uptime as `Nd Nh Nm`, omitting zero days and hours.
pub fn format_uptime(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return MISSING.to_string();
    };
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    parts.push(format!("{}m", minutes));
    parts.join(" ")
}

/// Colored status badge. Synthetic mode overrides the connection label.
pub fn status_label(status: &ConnectionStatus, synthetic: bool) -> String {
    if synthetic {
        return "Synthetic".magenta().to_string();
    }
    match status.state {
        ConnectionState::Connecting => "Connecting".yellow().to_string(),
        ConnectionState::Online => "Live".green().to_string(),
        ConnectionState::Offline => "Offline".dimmed().to_string(),
        ConnectionState::Error => "Error".red().to_string(),
    }
}

/// Status badge plus the last error, if any.
pub fn format_status_line(status: &ConnectionStatus, synthetic: bool, endpoint: &str) -> String {
    let label = status_label(status, synthetic);
    match &status.error {
        Some(error) => format!("[{}] {} ({})", label, endpoint, error),
        None => format!("[{}] {}", label, endpoint),
    }
}

/// One-line fleet summary for the latest view.
pub fn format_summary(view: &EngineView) -> String {
    let Some(snapshot) = view.latest.as_deref() else {
        return "waiting for telemetry".to_string();
    };
    let aggregate = view.aggregate;
    let (used, total) = aggregate.total_memory();

    let mut line = format!(
        "{} | {} GPU(s) | util {} | mem {} / {}",
        snapshot.timestamp,
        aggregate.gpu_count,
        format_percent(Some(aggregate.average_utilization)),
        format_memory(Some(used)),
        format_memory(Some(total)),
    );
    if let Some(host) = &snapshot.system {
        line.push_str(" | ");
        line.push_str(&format_host(host));
    }
    line
}

pub fn format_host(host: &HostReading) -> String {
    let load = host
        .load_average
        .as_ref()
        .map(|l| {
            l.iter()
                .map(|v| format!("{:.2}", v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| MISSING.to_string());

    format!(
        "{} cpu {} mem {} load {} up {}",
        host.hostname.as_deref().unwrap_or("host"),
        format_percent(host.cpu_usage),
        format_percent(host.memory_usage),
        load,
        format_uptime(host.uptime_seconds),
    )
}

/// Per-GPU table for the latest snapshot.
pub fn format_fleet_table(snapshot: &TelemetrySnapshot) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "GPU", "Name", "Util", "Memory", "Mem %", "Temp", "Power", "Fan", "Enc/Dec", "Procs",
    ]);

    for gpu in &snapshot.gpus {
        table.add_row(gpu_row(gpu));
    }

    table.to_string()
}

fn gpu_row(gpu: &GpuReading) -> Vec<Cell> {
    vec![
        Cell::new(gpu.id),
        Cell::new(gpu.display_name()),
        Cell::new(format_percent(gpu.utilization)),
        Cell::new(format!(
            "{} / {}",
            format_memory(gpu.memory_used),
            format_memory(gpu.memory_total)
        )),
        Cell::new(format_percent(Some(memory_sample(gpu)))),
        Cell::new(format_temperature(gpu.temperature)),
        Cell::new(format_power(gpu.power_usage)),
        Cell::new(format_percent(gpu.fan_speed)),
        Cell::new(format!(
            "{} / {}",
            format_percent(gpu.encoder_utilization),
            format_percent(gpu.decoder_utilization)
        )),
        Cell::new(gpu.processes.len()),
    ]
}

/// Processes holding GPU memory, one row per process. `None` when no GPU
/// reports any.
pub fn format_process_table(snapshot: &TelemetrySnapshot) -> Option<String> {
    if snapshot.gpus.iter().all(|gpu| gpu.processes.is_empty()) {
        return None;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["GPU", "PID", "Process", "Memory", "User"]);

    for gpu in &snapshot.gpus {
        for process in &gpu.processes {
            table.add_row(vec![
                Cell::new(gpu.id),
                Cell::new(
                    process
                        .pid
                        .map(|pid| pid.to_string())
                        .unwrap_or_else(|| MISSING.to_string()),
                ),
                Cell::new(process.name.as_deref().unwrap_or(MISSING)),
                Cell::new(format_memory(process.used_memory_mib)),
                Cell::new(process.user.as_deref().unwrap_or(MISSING)),
            ]);
        }
    }

    Some(table.to_string())
}

/// Single-line JSON record of the latest view.
pub fn format_view_json(view: &EngineView, status: &ConnectionStatus) -> String {
    let latest: BTreeMap<String, f64> = view
        .history
        .iter()
        .filter_map(|(key, samples)| samples.last().map(|v| (key.to_string(), *v)))
        .collect();

    json!({
        "status": status,
        "timestamp": view.latest.as_ref().map(|s| s.timestamp.clone()),
        "aggregate": view.aggregate,
        "samples": latest,
        "stats": view.stats,
    })
    .to_string()
}
