//! Fixed-layout wire representation of a [`Reading`].
//!
//! ```text
//! +----------------------+-------------+---------------+
//! | timestamp (20 bytes) | sensor (i32)| vehicles (i32)|
//! +----------------------+-------------+---------------+
//! ```
//!
//! Integers are big-endian. The timestamp block is NUL padded and always
//! NUL terminated, so text longer than 19 bytes does not survive encoding.

use crate::models::{Reading, Timestamp};
use crate::{RECORD_SIZE, TIMESTAMP_CAPACITY};

pub type WireRecord = [u8; RECORD_SIZE];

const SENSOR_OFFSET: usize = TIMESTAMP_CAPACITY;
const VEHICLES_OFFSET: usize = SENSOR_OFFSET + 4;

pub fn encode(reading: &Reading) -> WireRecord {
    let mut record = [0u8; RECORD_SIZE];
    record[..TIMESTAMP_CAPACITY].copy_from_slice(&reading.timestamp.to_wire());
    record[SENSOR_OFFSET..VEHICLES_OFFSET].copy_from_slice(&reading.sensor.to_be_bytes());
    record[VEHICLES_OFFSET..].copy_from_slice(&reading.vehicles.to_be_bytes());
    record
}

pub fn decode(record: &WireRecord) -> Reading {
    let mut timestamp = [0u8; TIMESTAMP_CAPACITY];
    timestamp.copy_from_slice(&record[..TIMESTAMP_CAPACITY]);
    let mut sensor = [0u8; 4];
    sensor.copy_from_slice(&record[SENSOR_OFFSET..VEHICLES_OFFSET]);
    let mut vehicles = [0u8; 4];
    vehicles.copy_from_slice(&record[VEHICLES_OFFSET..]);
    Reading {
        timestamp: Timestamp::from_bytes(timestamp),
        sensor: i32::from_be_bytes(sensor),
        vehicles: i32::from_be_bytes(vehicles),
    }
}

/// Encodes a whole share back to back, in order.
pub fn encode_all(readings: &[Reading]) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::with_capacity(readings.len() * RECORD_SIZE);
    for reading in readings {
        output.extend_from_slice(&encode(reading));
    }
    output
}
