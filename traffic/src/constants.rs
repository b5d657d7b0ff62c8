//! Centralized environment variable names and default values for the traffic pipeline.

// Environment variable names
pub const ENV_INPUT: &str = "TRAFFIC_INPUT";
pub const ENV_ADDRESS: &str = "TRAFFIC_ADDRESS";
pub const ENV_RANK: &str = "TRAFFIC_RANK";
pub const ENV_SIZE: &str = "TRAFFIC_SIZE";
pub const ENV_LOG: &str = "TRAFFIC_LOG";

/// Open MPI launcher variables, so `mpirun -n 4 traffic` needs no flags.
pub const ENV_OMPI_RANK: &str = "OMPI_COMM_WORLD_RANK";
pub const ENV_OMPI_SIZE: &str = "OMPI_COMM_WORLD_SIZE";
pub const ENV_SLURM_RANK: &str = "SLURM_PROCID";
pub const ENV_SLURM_SIZE: &str = "SLURM_NTASKS";

// Defaults
pub const DEFAULT_INPUT: &str = "traffic_data.txt";
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8096";
pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_TOP: usize = 3;
