use crate::aggregate::{AggregateTable, RankingMode};
use crate::channel::{Channel, Share, TcpChannel};
use crate::error::Error;
use crate::filter::Window;
use crate::models::{sort_readings, Reading};
use crate::partition::partition;
use crate::report::Report;
use crate::worker::{Worker, WorkerConfig};
use crate::Rank;
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub ranking: RankingMode,
    pub top: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ranking: RankingMode::default(),
            top: 3,
        }
    }
}

/// State carried from one stage of a run to the next. Each stage consumes
/// what the previous one left behind.
#[derive(Debug, Default)]
pub struct PipelineRun {
    filtered: Vec<Reading>,
    merged: Vec<Reading>,
    filtered_len: usize,
}

impl PipelineRun {
    pub fn filter(&mut self, readings: Vec<Reading>, window: &Window) {
        let total = readings.len();
        self.filtered = window.filter(readings);
        self.filtered_len = self.filtered.len();
        info!("Kept {} of {total} readings inside [{}, {}].", self.filtered_len, window.start, window.end);
    }

    /// Sends every worker its share, worker 1 first.
    pub fn distribute<C: Channel>(&mut self, channels: &mut [C]) -> Result<(), Error> {
        let shares = partition(std::mem::take(&mut self.filtered), channels.len())?;
        for (index, (share, channel)) in shares.into_iter().zip(channels.iter_mut()).enumerate() {
            debug!("Sending {} readings to worker {}.", share.len(), index + 1);
            share.send(channel)?;
        }
        Ok(())
    }

    /// Collects the returned shares strictly in worker order. A slow worker
    /// holds up every worker after it.
    pub fn collect<C: Channel>(&mut self, channels: &mut [C]) -> Result<(), Error> {
        self.merged.reserve(self.filtered_len);
        for (index, channel) in channels.iter_mut().enumerate() {
            let share = Share::receive(channel)?;
            debug!("Collected {} readings from worker {}.", share.len(), index + 1);
            self.merged.extend(share.into_readings());
        }
        Ok(())
    }

    /// Shares were cut without regard to time, so the concatenation needs a
    /// full sort to be chronological.
    pub fn merge(&mut self) {
        sort_readings(&mut self.merged);
    }

    pub fn merged(&self) -> &[Reading] {
        &self.merged
    }

    pub fn aggregate(&self) -> AggregateTable {
        AggregateTable::build(&self.merged)
    }
}

pub struct Coordinator {
    config: CoordinatorConfig,
    started: Instant,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
        }
    }

    /// Measures elapsed time from `started` rather than from construction.
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Runs the whole pipeline over one channel per worker. Any channel
    /// failure aborts the run before a report exists.
    pub fn run<C: Channel>(&self, readings: Vec<Reading>, window: &Window, channels: &mut [C]) -> Result<Report, Error> {
        if channels.is_empty() {
            return Err(Error::NoWorkers);
        }
        let mut run = PipelineRun::default();
        run.filter(readings, window);
        run.distribute(channels)?;
        run.collect(channels)?;
        run.merge();

        let table = run.aggregate();
        info!("Aggregated {} sensors from {} readings.", table.len(), run.merged().len());
        Ok(Report {
            top: self.config.top,
            ranking_mode: self.config.ranking,
            ranking: table.rank(self.config.ranking, self.config.top),
            window: window.clone(),
            filtered: run.merged().len(),
            workers: channels.len(),
            elapsed_ms: 0,
        }
        .with_elapsed(self.started.elapsed()))
    }
}

/// Waits for `workers` workers to connect and announce themselves, and
/// returns their channels ordered by rank. Ranks must be exactly
/// `1..=workers`.
pub fn accept_workers(listener: &TcpListener, workers: usize) -> Result<Vec<TcpChannel>, Error> {
    let mut slots: Vec<Option<TcpChannel>> = (0..workers).map(|_| None).collect();
    for _ in 0..workers {
        let (stream, address) = listener.accept()?;
        stream.set_nodelay(true)?;
        let mut channel = TcpChannel::new(stream);
        let rank = channel.recv_hello()?;
        let slot = (rank as usize)
            .checked_sub(1)
            .and_then(|index| slots.get_mut(index))
            .ok_or(Error::UnknownWorker(rank))?;
        if slot.is_some() {
            return Err(Error::DuplicateWorker(rank));
        }
        info!("Accepted worker {rank} from {address} as {}.", channel.id());
        *slot = Some(channel);
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Runs coordinator and workers inside one process. Each worker is a thread
/// talking to the coordinator over loopback TCP, exactly as a separate
/// process would.
pub fn run_local(
    readings: Vec<Reading>,
    window: &Window,
    workers: usize,
    coordinator: &Coordinator,
    worker_config: WorkerConfig,
) -> Result<Report, Error> {
    if workers == 0 {
        return Err(Error::NoWorkers);
    }
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))?;
    let address = listener.local_addr()?;
    let handles: Vec<_> = (1..=workers as Rank)
        .map(|rank| thread::spawn(move || Worker::new(rank, worker_config).run_tcp(address)))
        .collect();

    let result = accept_workers(&listener, workers).and_then(|mut channels| {
        let report = coordinator.run(readings, window, &mut channels);
        if report.is_err() {
            channels.iter().for_each(TcpChannel::shutdown);
        }
        report
    });

    for (index, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(_)) => (),
            Ok(Err(err)) => warn!("Worker {} failed: {err}", index + 1),
            Err(_) => warn!("Worker {} panicked.", index + 1),
        }
    }
    result
}
