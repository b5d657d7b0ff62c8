use crate::error::Error;
use crate::models::Reading;
use serde::Serialize;
use std::io::{BufRead, Write};

/// Inclusive `[start, end]` bounds, kept as the raw text the caller typed.
/// Bounds are compared byte-wise against each reading's timestamp and are
/// never truncated, so a bound in a different format than the readings
/// filters deterministically but meaninglessly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, reading: &Reading) -> bool {
        let timestamp = reading.timestamp.as_bytes();
        timestamp >= self.start.as_bytes() && timestamp <= self.end.as_bytes()
    }

    /// Keeps the readings inside the window, in input order.
    pub fn filter(&self, readings: Vec<Reading>) -> Vec<Reading> {
        readings.into_iter().filter(|reading| self.contains(reading)).collect()
    }

    /// Asks for whichever bound is missing, one whitespace-delimited token
    /// per prompt.
    pub fn prompt<R: BufRead, W: Write>(
        start: Option<String>,
        end: Option<String>,
        input: &mut R,
        output: &mut W,
    ) -> Result<Self, Error> {
        let start = match start {
            Some(start) => start,
            None => ask(input, output, "Enter the starting time (HH:MM:SS): ")?,
        };
        let end = match end {
            Some(end) => end,
            None => ask(input, output, "Enter the ending time (HH:MM:SS): ")?,
        };
        Ok(Self { start, end })
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String, Error> {
    output.write_all(question.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    'read: loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input closed before a time was entered",
            )));
        }
        if let Some(token) = line.split_whitespace().next() {
            break 'read Ok(token.to_owned());
        }
    }
}
