use crate::Rank;
use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, field: &'static str },
    // InvalidData also known as ParseError.
    InvalidData,
    ChannelClosed,
    UnexpectedMessage,
    ShareSizeMismatch { expected: usize, actual: usize },
    ShareTooLarge(usize),
    NoWorkers,
    InvalidTopology(String),
    UnknownWorker(Rank),
    DuplicateWorker(Rank),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Csv(err) => write!(f, "could not read input: {err}"),
            Self::InvalidRow { line, field } => write!(f, "line {line}: {field} is not an integer"),
            Self::InvalidData => f.write_str("received a malformed message"),
            Self::ChannelClosed => f.write_str("peer closed the channel mid round-trip"),
            Self::UnexpectedMessage => f.write_str("received a message out of protocol order"),
            Self::ShareSizeMismatch { expected, actual } => {
                write!(f, "share announced {expected} records but carried {actual}")
            }
            Self::ShareTooLarge(len) => write!(f, "share of {len} records does not fit the size field"),
            Self::NoWorkers => f.write_str("no workers available to partition across"),
            Self::InvalidTopology(reason) => write!(f, "invalid process topology: {reason}"),
            Self::UnknownWorker(rank) => write!(f, "worker announced unknown rank {rank}"),
            Self::DuplicateWorker(rank) => write!(f, "rank {rank} was announced twice"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::ChannelClosed,
            _ => Self::Io(err),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
