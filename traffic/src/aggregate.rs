use crate::models::{Reading, SensorId, VehicleTotal};
use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// How the report picks its sensors from the aggregate table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingMode {
    /// Highest vehicle totals first, ties by ascending sensor id.
    #[default]
    Total,
    /// Highest sensor ids first regardless of totals, matching the legacy
    /// batch report.
    SensorId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SensorTotal {
    pub sensor: SensorId,
    pub vehicles: VehicleTotal,
}

/// Sensor id to total vehicle count across every reading for that sensor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateTable {
    totals: HashMap<SensorId, VehicleTotal>,
}

impl AggregateTable {
    pub fn build(readings: &[Reading]) -> Self {
        let mut totals: HashMap<SensorId, VehicleTotal> = HashMap::new();
        for reading in readings {
            *totals.entry(reading.sensor).or_insert(0) += VehicleTotal::from(reading.vehicles);
        }
        Self { totals }
    }

    pub fn get(&self, sensor: SensorId) -> Option<VehicleTotal> {
        self.totals.get(&sensor).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn rank(&self, mode: RankingMode, limit: usize) -> Vec<SensorTotal> {
        let mut entries: Vec<SensorTotal> = self
            .totals
            .iter()
            .map(|(&sensor, &vehicles)| SensorTotal { sensor, vehicles })
            .collect();
        match mode {
            RankingMode::Total => entries.sort_by_key(|entry| (Reverse(entry.vehicles), entry.sensor)),
            RankingMode::SensorId => entries.sort_by_key(|entry| Reverse(entry.sensor)),
        }
        entries.truncate(limit);
        entries
    }
}
