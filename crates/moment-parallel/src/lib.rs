//! # Moment Parallel
//!
//! Rank-level plumbing for the parallel solver phases. This crate provides
//! a [`Communicator`](comm::Communicator) trait that isolates the partition
//! protocol from how ranks are launched, and the bookkeeping that turns a
//! chunk assignment into per-rank preconditioner inputs.
//!
//! ## Available communicators
//!
//! | Communicator | Ranks | Use |
//! |--------------|-------|-----|
//! | [`SingleProcess`] | 1 | run without a launcher |
//! | `MpiComm` | N processes | `mpirun`/`srun` launches (feature `mpi`) |
//! | [`LocalGroup`] | N threads | multi-rank tests in one process |

pub mod comm;
pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod partition;

pub use comm::{
    broadcast_parameters, launcher_world_size, CommError, Communicator, Payload, SingleProcess, ROOT,
};
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use local::{LocalComm, LocalGroup};
pub use partition::{
    prepare_from_checkpoint, prepare_partition, PartitionError, PartitionState, WorkArea,
    CHECKPOINT_VERSION,
};
