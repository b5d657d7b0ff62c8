//! Reads readings from delimited text: `index,timestamp,sensor,vehicles`,
//! one per row, after a header row. The index column is ignored.

use crate::error::Error;
use crate::models::{Reading, Timestamp};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

const TIMESTAMP_COLUMN: usize = 1;
const SENSOR_COLUMN: usize = 2;
const VEHICLES_COLUMN: usize = 3;

pub fn load_readings(path: impl AsRef<Path>) -> Result<Vec<Reading>, Error> {
    let file = File::open(path.as_ref()).map_err(Error::Io)?;
    let readings = read_readings(file)?;
    info!("Loaded {} readings from {}.", readings.len(), path.as_ref().display());
    Ok(readings)
}

pub fn read_readings<R: Read>(input: R) -> Result<Vec<Reading>, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);
    let mut readings: Vec<Reading> = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        readings.push(parse_record(&record, line)?);
    }
    Ok(readings)
}

fn parse_record(record: &StringRecord, line: u64) -> Result<Reading, Error> {
    let timestamp = record.get(TIMESTAMP_COLUMN).unwrap_or_default();
    Ok(Reading {
        timestamp: Timestamp::new(timestamp),
        sensor: parse_field(record, SENSOR_COLUMN, "sensor id", line)?,
        vehicles: parse_field(record, VEHICLES_COLUMN, "vehicle count", line)?,
    })
}

fn parse_field(record: &StringRecord, column: usize, field: &'static str, line: u64) -> Result<i32, Error> {
    record
        .get(column)
        .and_then(|value| value.parse::<i32>().ok())
        .ok_or(Error::InvalidRow { line, field })
}
