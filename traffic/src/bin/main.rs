use anyhow::{Context, Result};
use clap::Parser;
use common::get_tcp_listener;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traffic::constants::{DEFAULT_ADDRESS, DEFAULT_INPUT, DEFAULT_LOG_FILTER, DEFAULT_TOP, ENV_ADDRESS, ENV_INPUT, ENV_LOG};
use traffic::coordinator::{accept_workers, run_local};
use traffic::loader::load_readings;
use traffic::report::ReportFormat;
use traffic::{Coordinator, CoordinatorConfig, Rank, RankingMode, Report, Role, Topology, Window, Worker, WorkerConfig};

/// Ranks traffic sensors by vehicle count over a time window, sorting the
/// readings across a pool of worker processes.
#[derive(Parser, Debug)]
#[command(name = "traffic", version)]
struct Args {
    /// Delimited readings file: index,timestamp,sensor,vehicles with a header row
    #[arg(long, env = ENV_INPUT, default_value = DEFAULT_INPUT)]
    input: PathBuf,
    /// First timestamp to keep, inclusive (prompted for when missing)
    #[arg(long)]
    start: Option<String>,
    /// Last timestamp to keep, inclusive (prompted for when missing)
    #[arg(long)]
    end: Option<String>,
    /// Coordinator address: bound by rank 0, dialled by every worker
    #[arg(long, env = ENV_ADDRESS, default_value = DEFAULT_ADDRESS)]
    address: String,
    /// Rank of this process in the pool; 0 coordinates
    #[arg(long, requires = "size")]
    rank: Option<Rank>,
    /// Number of processes in the pool, coordinator included
    #[arg(long, requires = "rank")]
    size: Option<usize>,
    /// Run the coordinator and this many worker threads in one process
    #[arg(long, conflicts_with_all = ["rank", "size"])]
    local: Option<usize>,
    /// How to pick the reported sensors
    #[arg(long, value_enum, default_value_t = RankingMode::Total)]
    ranking: RankingMode,
    /// Number of sensors to report
    #[arg(long, default_value_t = DEFAULT_TOP)]
    top: usize,
    /// Return shares unsorted from workers; the merged result is sorted regardless
    #[arg(long)]
    no_local_sort: bool,
    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

fn main() -> Result<()> {
    let started = Instant::now();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let worker_config = WorkerConfig {
        local_sort: !args.no_local_sort,
    };
    let coordinator = Coordinator::new(CoordinatorConfig {
        ranking: args.ranking,
        top: args.top,
    })
    .started_at(started);

    if let Some(workers) = args.local {
        let readings = load(&args)?;
        let window = acquire_window(&args)?;
        let report = run_local(readings, &window, workers, &coordinator, worker_config)?;
        return print_report(&report, args.format);
    }

    let topology = match (args.size, args.rank) {
        (Some(size), Some(rank)) => Topology::new(size, rank)?,
        _ => Topology::detect()?.context(
            "no process topology: pass --size and --rank, set TRAFFIC_SIZE and TRAFFIC_RANK, \
             launch under mpirun or srun, or use --local",
        )?,
    };

    match topology.role() {
        Role::Coordinator { workers } => {
            let address: SocketAddr = args
                .address
                .parse()
                .with_context(|| format!("invalid coordinator address {}", args.address))?;
            let listener = get_tcp_listener(Some(address)).with_context(|| format!("could not listen on {address}"))?;
            let readings = load(&args)?;
            let window = acquire_window(&args)?;
            info!("Waiting for {workers} workers...");
            let mut channels = accept_workers(&listener, workers).context("worker rendezvous failed")?;
            let report = coordinator
                .run(readings, &window, &mut channels)
                .context("pipeline aborted")?;
            print_report(&report, args.format)
        }
        Role::Worker(rank) => {
            let returned = Worker::new(rank, worker_config)
                .run_tcp(args.address.as_str())
                .with_context(|| format!("worker {rank} failed"))?;
            info!("Worker {rank} finished after returning {returned} readings.");
            Ok(())
        }
    }
}

fn load(args: &Args) -> Result<Vec<traffic::Reading>> {
    load_readings(&args.input).with_context(|| format!("could not load readings from {}", args.input.display()))
}

fn acquire_window(args: &Args) -> Result<Window> {
    let mut stdout = io::stdout().lock();
    if args.start.is_none() || args.end.is_none() {
        writeln!(stdout, "\n<---------- Welcome To Traffic Controller Simulator ---------->\n")?;
    }
    let window = Window::prompt(args.start.clone(), args.end.clone(), &mut io::stdin().lock(), &mut stdout)
        .context("could not read the time window")?;
    info!("Filtering readings to [{}, {}].", window.start, window.end);
    Ok(window)
}

fn print_report(report: &Report, format: ReportFormat) -> Result<()> {
    let rendered = report.render(format)?;
    let mut stdout = io::stdout().lock();
    write!(stdout, "{rendered}")?;
    if format == ReportFormat::Json {
        writeln!(stdout)?;
    }
    Ok(())
}
