//! MPI-backed communicator: one process per rank.
//!
//! Broadcast payloads are serialised to JSON on the root. The byte length
//! goes out first so every rank can size its receive buffer, then the bytes.

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, Root as _};

use crate::comm::{CommError, Communicator, Payload};

/// The MPI world of this process.
///
/// MPI is finalised when the value is dropped, so keep it alive for the
/// whole run.
pub struct MpiComm {
    world: SimpleCommunicator,
    _universe: Universe,
}

impl MpiComm {
    /// Initialise MPI and join the world communicator.
    pub fn initialize() -> Result<Self, CommError> {
        let universe = mpi::initialize().ok_or(CommError::MpiUnavailable)?;
        let world = universe.world();
        log::debug!("MPI rank {} of {} initialised", world.rank(), world.size());
        Ok(Self {
            world,
            _universe: universe,
        })
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn broadcast<T: Payload>(&self, root: usize, value: Option<T>) -> Result<Option<T>, CommError> {
        let size = self.size();
        if root >= size {
            return Err(CommError::InvalidRoot { root, size });
        }
        let rank = self.rank();
        let root_process = self.world.process_at_rank(root as i32);

        let mut bytes = if rank == root {
            serde_json::to_vec(&value).map_err(|source| CommError::Encoding { rank, source })?
        } else {
            Vec::new()
        };
        let mut len = bytes.len() as u64;
        root_process.broadcast_into(&mut len);
        bytes.resize(len as usize, 0);
        root_process.broadcast_into(&mut bytes[..]);

        if rank == root {
            return Ok(value);
        }
        serde_json::from_slice(&bytes).map_err(|source| CommError::Encoding { rank, source })
    }
}
