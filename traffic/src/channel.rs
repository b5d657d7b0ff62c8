//! Point-to-point message passing between the coordinator and one worker.
//!
//! A share always travels as two ordered messages: its size, then exactly
//! that many wire records. Either side failing mid round-trip surfaces as
//! an [`Error`]; nothing is retried.

use crate::codec::{decode, encode, encode_all, WireRecord};
use crate::error::Error;
use crate::models::Reading;
use crate::parser::{self, Parsed};
use crate::utils::preview_hex;
use crate::{Rank, MESSAGE_TYPE_HELLO, MESSAGE_TYPE_SHARE_RECORDS, MESSAGE_TYPE_SHARE_SIZE};
use common::BUFFER_SIZE;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, trace};
use uuid::Uuid;

const HEX_PREVIEW_BYTES: usize = 64;

pub trait Channel {
    fn send_size(&mut self, size: u32) -> Result<(), Error>;
    fn send_records(&mut self, readings: &[Reading]) -> Result<(), Error>;
    fn recv_size(&mut self) -> Result<u32, Error>;
    /// Receives the payload promised by the preceding size message.
    fn recv_records(&mut self, count: usize) -> Result<Vec<Reading>, Error>;
}

/// The readings exchanged in one round-trip with one worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Share {
    readings: Vec<Reading>,
}

impl Share {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }

    /// Hands the share over to the peer: size first, then the records.
    pub fn send<C: Channel + ?Sized>(self, channel: &mut C) -> Result<(), Error> {
        let size = u32::try_from(self.readings.len()).map_err(|_| Error::ShareTooLarge(self.readings.len()))?;
        channel.send_size(size)?;
        channel.send_records(&self.readings)
    }

    pub fn receive<C: Channel + ?Sized>(channel: &mut C) -> Result<Self, Error> {
        let expected = channel.recv_size()? as usize;
        let readings = channel.recv_records(expected)?;
        if readings.len() != expected {
            return Err(Error::ShareSizeMismatch {
                expected,
                actual: readings.len(),
            });
        }
        Ok(Self { readings })
    }
}

impl From<Vec<Reading>> for Share {
    fn from(readings: Vec<Reading>) -> Self {
        Self::new(readings)
    }
}

/// Channel over a blocking TCP stream, one per worker process.
pub struct TcpChannel {
    id: Uuid,
    stream: TcpStream,
    queue: Vec<u8>,
    buffer: Vec<u8>,
}

impl TcpChannel {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream,
            queue: Vec::new(),
            buffer: vec![0u8; BUFFER_SIZE],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send_hello(&mut self, rank: Rank) -> Result<(), Error> {
        let mut message = vec![MESSAGE_TYPE_HELLO];
        message.extend_from_slice(&rank.to_be_bytes());
        self.write(&message)
    }

    pub fn recv_hello(&mut self) -> Result<Rank, Error> {
        self.receive(parser::hello)
    }

    pub fn shutdown(&self) {
        _ = self.stream.shutdown(Shutdown::Both);
    }

    fn write(&mut self, message: &[u8]) -> Result<(), Error> {
        trace!(">>> {}: {}", self.id, preview_hex(message, HEX_PREVIEW_BYTES));
        self.stream.write_all(message)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive<T>(&mut self, parse: impl Fn(&[u8]) -> Parsed<T>) -> Result<T, Error> {
        'receive: loop {
            if let Some((message, drain)) = parse(&self.queue)? {
                self.queue.drain(..drain);
                return Ok(message);
            }
            match self.stream.read(&mut self.buffer) {
                // See https://doc.rust-lang.org/std/io/trait.Read.html#tymethod.read
                Ok(0) => return Err(Error::ChannelClosed),
                Ok(n) => {
                    trace!("<<< {}: {}", self.id, preview_hex(&self.buffer[..n], HEX_PREVIEW_BYTES));
                    self.queue.extend_from_slice(&self.buffer[..n]);
                }
                Err(ref err) if err.kind() == ErrorKind::Interrupted => continue 'receive,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Channel for TcpChannel {
    fn send_size(&mut self, size: u32) -> Result<(), Error> {
        let mut message = vec![MESSAGE_TYPE_SHARE_SIZE];
        message.extend_from_slice(&size.to_be_bytes());
        self.write(&message)
    }

    fn send_records(&mut self, readings: &[Reading]) -> Result<(), Error> {
        let mut message = vec![MESSAGE_TYPE_SHARE_RECORDS];
        message.extend_from_slice(&encode_all(readings));
        debug!("{}: sending {} records", self.id, readings.len());
        self.write(&message)
    }

    fn recv_size(&mut self) -> Result<u32, Error> {
        self.receive(parser::share_size)
    }

    fn recv_records(&mut self, count: usize) -> Result<Vec<Reading>, Error> {
        let readings = self.receive(|queue| parser::share_records(queue, count))?;
        debug!("{}: received {} records", self.id, readings.len());
        Ok(readings)
    }
}

#[derive(Debug)]
enum Frame {
    Size(u32),
    Records(Vec<WireRecord>),
}

/// In-process channel endpoint. Records still cross it in wire form so the
/// codec's truncation applies exactly as it does over TCP.
pub struct LocalChannel {
    sender: Sender<Frame>,
    receiver: Receiver<Frame>,
}

impl LocalChannel {
    /// Two connected endpoints: one for the coordinator, one for a worker.
    pub fn pair() -> (Self, Self) {
        let (left_tx, right_rx) = mpsc::channel::<Frame>();
        let (right_tx, left_rx) = mpsc::channel::<Frame>();
        (
            Self {
                sender: left_tx,
                receiver: left_rx,
            },
            Self {
                sender: right_tx,
                receiver: right_rx,
            },
        )
    }

    fn send(&self, frame: Frame) -> Result<(), Error> {
        self.sender.send(frame).map_err(|_| Error::ChannelClosed)
    }

    fn recv(&self) -> Result<Frame, Error> {
        self.receiver.recv().map_err(|_| Error::ChannelClosed)
    }
}

impl Channel for LocalChannel {
    fn send_size(&mut self, size: u32) -> Result<(), Error> {
        self.send(Frame::Size(size))
    }

    fn send_records(&mut self, readings: &[Reading]) -> Result<(), Error> {
        self.send(Frame::Records(readings.iter().map(encode).collect()))
    }

    fn recv_size(&mut self) -> Result<u32, Error> {
        match self.recv()? {
            Frame::Size(size) => Ok(size),
            Frame::Records(_) => Err(Error::UnexpectedMessage),
        }
    }

    fn recv_records(&mut self, count: usize) -> Result<Vec<Reading>, Error> {
        match self.recv()? {
            Frame::Records(records) if records.len() == count => Ok(records.iter().map(decode).collect()),
            Frame::Records(records) => Err(Error::ShareSizeMismatch {
                expected: count,
                actual: records.len(),
            }),
            Frame::Size(_) => Err(Error::UnexpectedMessage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn readings() -> Vec<Reading> {
        vec![Reading::new("08:00:00", 1, 5), Reading::new("07:59:59", 2, 7)]
    }

    #[test]
    fn test_local_share_round_trip() {
        let (mut coordinator, mut worker) = LocalChannel::pair();
        Share::new(readings()).send(&mut coordinator).expect("send");
        let share = Share::receive(&mut worker).expect("receive");
        assert_eq!(readings(), share.into_readings());
    }

    #[test]
    fn test_local_empty_share() {
        let (mut coordinator, mut worker) = LocalChannel::pair();
        Share::default().send(&mut coordinator).expect("send");
        assert!(Share::receive(&mut worker).expect("receive").is_empty());
    }

    #[test]
    fn test_local_truncates_like_the_wire() {
        let (mut coordinator, mut worker) = LocalChannel::pair();
        Share::new(vec![Reading::new("0123456789012345678901", 1, 1)])
            .send(&mut coordinator)
            .expect("send");
        let share = Share::receive(&mut worker).expect("receive");
        assert_eq!("0123456789012345678", share.readings()[0].timestamp.to_string());
    }

    #[test]
    fn test_local_size_mismatch() {
        let (mut coordinator, mut worker) = LocalChannel::pair();
        coordinator.send_size(3).expect("send size");
        coordinator.send_records(&readings()).expect("send records");
        assert!(matches!(
            Share::receive(&mut worker),
            Err(Error::ShareSizeMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_local_out_of_order() {
        let (mut coordinator, mut worker) = LocalChannel::pair();
        coordinator.send_records(&readings()).expect("send records");
        assert!(matches!(worker.recv_size(), Err(Error::UnexpectedMessage)));
    }

    #[test]
    fn test_local_closed() {
        let (mut coordinator, worker) = LocalChannel::pair();
        drop(worker);
        assert!(matches!(coordinator.send_size(1), Err(Error::ChannelClosed)));
        assert!(matches!(coordinator.recv_size(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_tcp_share_round_trip() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let address = listener.local_addr().expect("address");
        let handle = thread::spawn(move || {
            let mut channel = TcpChannel::new(TcpStream::connect(address).expect("connect"));
            channel.send_hello(2).expect("hello");
            Share::new(readings()).send(&mut channel).expect("send");
        });

        let (stream, _) = listener.accept().expect("accept");
        let mut channel = TcpChannel::new(stream);
        assert_eq!(2, channel.recv_hello().expect("hello"));
        assert_eq!(readings(), Share::receive(&mut channel).expect("receive").into_readings());
        handle.join().expect("sender thread");
    }

    #[test]
    fn test_tcp_closed_mid_share() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let address = listener.local_addr().expect("address");
        let handle = thread::spawn(move || {
            let mut channel = TcpChannel::new(TcpStream::connect(address).expect("connect"));
            channel.send_size(2).expect("size");
        });

        let (stream, _) = listener.accept().expect("accept");
        let mut channel = TcpChannel::new(stream);
        handle.join().expect("sender thread");
        assert!(matches!(Share::receive(&mut channel), Err(Error::ChannelClosed)));
    }
}
