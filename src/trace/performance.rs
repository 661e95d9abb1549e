use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::driver::driver::PerfSample;

pub const CSV_HEADER: &str = "Time,CPU%,Memory(KB),Screen";

/// Averages and peaks over every sample of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub samples: usize,
    pub cpu_average: f32,
    pub cpu_peak: f32,
    pub memory_average_kb: u64,
    pub memory_peak_kb: u64,
}

/// CPU/memory history of the target process plus a tabular log.
#[derive(Debug)]
pub struct PerformanceMonitor {
    csv_path: PathBuf,
    cpu: Vec<f32>,
    memory: Vec<u64>,
}

impl PerformanceMonitor {
    /// Monitor writing rows to `csv_path` (header written immediately).
    pub fn new(csv_path: &Path) -> Self {
        let monitor = Self {
            csv_path: csv_path.to_path_buf(),
            cpu: Vec::new(),
            memory: Vec::new(),
        };
        monitor.write_row(CSV_HEADER);
        monitor
    }

    /// Record one sample taken while `label` was on screen.
    pub fn record(&mut self, sample: PerfSample, label: &str) {
        self.cpu.push(sample.cpu_percent);
        self.memory.push(sample.memory_kb);

        let time = chrono::Local::now().format("%m-%d %H:%M:%S");
        self.write_row(&format!(
            "{},{:.1}%,{},{}",
            time,
            sample.cpu_percent,
            sample.memory_kb,
            label.replace(',', " ")
        ));
    }

    pub fn summary(&self) -> PerformanceSummary {
        let samples = self.cpu.len();
        if samples == 0 {
            return PerformanceSummary::default();
        }
        PerformanceSummary {
            samples,
            cpu_average: self.cpu.iter().sum::<f32>() / samples as f32,
            cpu_peak: self.cpu.iter().copied().fold(0.0, f32::max),
            memory_average_kb: self.memory.iter().sum::<u64>() / samples as u64,
            memory_peak_kb: self.memory.iter().copied().max().unwrap_or(0),
        }
    }

    fn write_row(&self, row: &str) {
        let path = &self.csv_path;
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| write!(f, "{}\r\n", row));
        if let Err(e) = result {
            tracing::warn!("failed to write performance log '{}': {}", path.display(), e);
        }
    }
}
