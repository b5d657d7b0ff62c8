use crate::constants::{ENV_OMPI_RANK, ENV_OMPI_SIZE, ENV_RANK, ENV_SIZE, ENV_SLURM_RANK, ENV_SLURM_SIZE};
use crate::error::Error;
use crate::Rank;

/// Position of this process in the pool. Rank 0 coordinates, every other
/// rank is a worker, so a pool of `size` processes has `size - 1` workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Topology {
    pub size: usize,
    pub rank: Rank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Coordinator { workers: usize },
    Worker(Rank),
}

impl Topology {
    pub fn new(size: usize, rank: Rank) -> Result<Self, Error> {
        if size < 2 {
            return Err(Error::InvalidTopology(format!(
                "a pool of {size} process(es) has no workers, at least 2 are required"
            )));
        }
        if rank as usize >= size {
            return Err(Error::InvalidTopology(format!("rank {rank} is outside a pool of {size}")));
        }
        Ok(Self { size, rank })
    }

    /// Reads the pool from the first launcher whose variables are present:
    /// our own, then Open MPI, then Slurm.
    pub fn detect() -> Result<Option<Self>, Error> {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, Error> {
        for (size_var, rank_var) in [(ENV_SIZE, ENV_RANK), (ENV_OMPI_SIZE, ENV_OMPI_RANK), (ENV_SLURM_SIZE, ENV_SLURM_RANK)] {
            if let (Some(size), Some(rank)) = (lookup(size_var), lookup(rank_var)) {
                let size = size
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidTopology(format!("{size_var}={size} is not a number")))?;
                let rank = rank
                    .trim()
                    .parse::<Rank>()
                    .map_err(|_| Error::InvalidTopology(format!("{rank_var}={rank} is not a number")))?;
                return Self::new(size, rank).map(Some);
            }
        }
        Ok(None)
    }

    pub fn workers(&self) -> usize {
        self.size - 1
    }

    pub fn role(&self) -> Role {
        match self.rank {
            0 => Role::Coordinator { workers: self.workers() },
            rank => Role::Worker(rank),
        }
    }
}
