use crate::channel::{Channel, Share, TcpChannel};
use crate::error::Error;
use crate::models::sort_readings;
use crate::Rank;
use common::connect_with_retry;
use std::net::ToSocketAddrs;
use tracing::{debug, info};

/// Attempts made to reach a coordinator that is not listening yet.
pub const CONNECT_ATTEMPTS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Sort the share before returning it. The coordinator re-sorts the
    /// merged result anyway, so turning this off only changes the bytes a
    /// worker puts on the wire, never the final report.
    pub local_sort: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { local_sort: true }
    }
}

pub struct Worker {
    rank: Rank,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(rank: Rank, config: WorkerConfig) -> Self {
        Self { rank, config }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// One round-trip: receive a share, sort it, send it back.
    pub fn run<C: Channel + ?Sized>(&self, channel: &mut C) -> Result<usize, Error> {
        let share = Share::receive(channel)?;
        debug!("Worker {} received {} readings.", self.rank, share.len());

        let mut readings = share.into_readings();
        if self.config.local_sort {
            sort_readings(&mut readings);
        }
        let returned = readings.len();
        Share::new(readings).send(channel)?;
        debug!("Worker {} returned {returned} readings.", self.rank);
        Ok(returned)
    }

    /// Connects to the coordinator, announces this worker's rank and serves
    /// its single round-trip.
    pub fn run_tcp<A: ToSocketAddrs>(&self, coordinator: A) -> Result<usize, Error> {
        let stream = connect_with_retry(coordinator, CONNECT_ATTEMPTS)?;
        let mut channel = TcpChannel::new(stream);
        info!("Worker {} connected to coordinator as {}.", self.rank, channel.id());
        channel.send_hello(self.rank)?;
        let result = self.run(&mut channel);
        channel.shutdown();
        result
    }
}
