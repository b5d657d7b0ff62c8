use crate::TIMESTAMP_CAPACITY;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

pub type SensorId = i32;
pub type VehicleCount = i32;
pub type VehicleTotal = i64;

/// Fixed-capacity, NUL-terminated timestamp text.
///
/// Anything longer than `TIMESTAMP_CAPACITY - 1` bytes is silently cut, so a
/// timestamp always round-trips through the wire unchanged once constructed.
/// Ordering is byte-wise over the text before the terminator, which only
/// matches chronological order for fixed-width formats such as `HH:MM:SS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp([u8; TIMESTAMP_CAPACITY]);

impl Timestamp {
    pub fn new(text: &str) -> Self {
        let mut buffer = [0u8; TIMESTAMP_CAPACITY];
        let length = text.len().min(TIMESTAMP_CAPACITY - 1);
        buffer[..length].copy_from_slice(&text.as_bytes()[..length]);
        Self::from_bytes(buffer)
    }

    /// Adopts a raw wire buffer. A buffer without a terminator is cut at the
    /// last byte, and everything after the first NUL is zeroed so equal text
    /// always means equal buffers.
    pub fn from_bytes(mut buffer: [u8; TIMESTAMP_CAPACITY]) -> Self {
        buffer[TIMESTAMP_CAPACITY - 1] = 0;
        if let Some(end) = buffer.iter().position(|&byte| byte == 0) {
            buffer[end..].fill(0);
        }
        Self(buffer)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&byte| byte == 0).unwrap_or(TIMESTAMP_CAPACITY);
        &self.0[..end]
    }

    pub fn to_wire(&self) -> [u8; TIMESTAMP_CAPACITY] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Debug for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// One sensor observation. Readings are never modified after construction,
/// only moved between containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reading {
    pub timestamp: Timestamp,
    pub sensor: SensorId,
    pub vehicles: VehicleCount,
}

impl Reading {
    pub fn new(timestamp: impl Into<Timestamp>, sensor: SensorId, vehicles: VehicleCount) -> Self {
        Self {
            timestamp: timestamp.into(),
            sensor,
            vehicles,
        }
    }

    /// Timestamp ascending, then vehicle count ascending. The sensor id takes
    /// no part, so `Reading` does not implement `Ord`.
    pub fn chronological(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.vehicles.cmp(&other.vehicles))
    }
}

/// Stable sort by [`Reading::chronological`].
pub fn sort_readings(readings: &mut [Reading]) {
    readings.sort_by(Reading::chronological);
}
