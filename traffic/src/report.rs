use crate::aggregate::{RankingMode, SensorTotal};
use crate::filter::Window;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Final output of a coordinator run. Only ever built once every worker has
/// completed its round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub top: usize,
    pub ranking_mode: RankingMode,
    pub ranking: Vec<SensorTotal>,
    pub window: Window,
    pub filtered: usize,
    pub workers: usize,
    pub elapsed_ms: u64,
}

impl Report {
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Top {} most congested traffic lights:", self.top)?;
        for entry in &self.ranking {
            writeln!(f, "Traffic Light {}: Number of Cars: {}", entry.sensor, entry.vehicles)?;
        }
        writeln!(f)?;
        writeln!(f, "Execution Time Taken: {} milliseconds", self.elapsed_ms)
    }
}
