//! Rank communication.
//!
//! The [`Communicator`] trait abstracts over the process group the partition
//! phase runs in, so the broadcast and partition protocol is written once and
//! driven by a single process ([`SingleProcess`]), by MPI processes
//! (`MpiComm`, behind the `mpi` feature) or by in-process test ranks
//! ([`crate::local::LocalGroup`]).

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Rank that loads and distributes the simulation parameters.
pub const ROOT: usize = 0;

/// Errors originating from rank communication.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("Rank {root} could not load the simulation parameters")]
    RootUnavailable { root: usize },

    #[error("Rank {rank} lost its connection to the group")]
    Disconnected { rank: usize },

    #[error("Rank {rank} received a payload of an unexpected type")]
    PayloadType { rank: usize },

    #[error("Root rank {root} is outside a group of {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("Rank {rank} could not encode or decode a broadcast payload: {source}")]
    Encoding {
        rank: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("MPI is already initialised in this process")]
    MpiUnavailable,
}

/// Environment variables through which common MPI launchers (Open MPI,
/// MPICH/Hydra, Intel MPI, MVAPICH, Slurm PMI) announce the world size.
const LAUNCHER_SIZE_VARS: [&str; 3] = ["OMPI_COMM_WORLD_SIZE", "PMI_SIZE", "MV2_COMM_WORLD_SIZE"];

/// World size announced by an MPI launcher, if this process was started by one.
pub fn launcher_world_size() -> Option<usize> {
    launcher_world_size_from(|name| std::env::var(name).ok())
}

fn launcher_world_size_from<F>(lookup: F) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    LAUNCHER_SIZE_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find_map(|value| value.trim().parse().ok())
}

/// Payloads that can cross a rank boundary.
///
/// Process-backed groups move values as serialised bytes, so every broadcast
/// payload must round-trip through serde.
pub trait Payload: Clone + Send + Serialize + DeserializeOwned + 'static {}

impl<T> Payload for T where T: Clone + Send + Serialize + DeserializeOwned + 'static {}

/// A member of a process group.
pub trait Communicator {
    /// Rank of this member, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Collective broadcast from `root`.
    ///
    /// Every rank must call this once per collective. The value passed on
    /// `root` is returned on every rank; the value passed elsewhere is
    /// ignored. `None` is a valid payload and is delivered as such.
    fn broadcast<T: Payload>(
        &self,
        root: usize,
        value: Option<T>,
    ) -> Result<Option<T>, CommError>;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }
}

/// The trivial group of one rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast<T: Payload>(
        &self,
        root: usize,
        value: Option<T>,
    ) -> Result<Option<T>, CommError> {
        if root != 0 {
            return Err(CommError::InvalidRoot { root, size: 1 });
        }
        Ok(value)
    }
}

/// Load the simulation parameters on [`ROOT`] and share them with the group.
///
/// The root calls `load`. On success every rank returns the same value. When
/// `load` fails the root broadcasts the empty sentinel before returning its
/// own error, and every other rank fails with [`CommError::RootUnavailable`],
/// so no rank proceeds without parameters.
pub fn broadcast_parameters<C, T, E, F>(comm: &C, load: F) -> Result<T, E>
where
    C: Communicator,
    T: Payload,
    E: From<CommError>,
    F: FnOnce() -> Result<T, E>,
{
    if comm.is_root() {
        match load() {
            Ok(params) => {
                comm.broadcast(ROOT, Some(params.clone()))?;
                log::debug!("rank {}: parameters broadcast to {} rank(s)", ROOT, comm.size());
                Ok(params)
            }
            Err(e) => {
                comm.broadcast::<T>(ROOT, None)?;
                Err(e)
            }
        }
    } else {
        match comm.broadcast::<T>(ROOT, None)? {
            Some(params) => Ok(params),
            None => Err(CommError::RootUnavailable { root: ROOT }.into()),
        }
    }
}
