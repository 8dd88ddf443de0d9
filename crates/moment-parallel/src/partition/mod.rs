//! Preconditioner partition bookkeeping.
//!
//! Cubes of the octree are grouped into chunks and chunks are assigned to
//! ranks. Before the SAI preconditioner is built, every rank turns the
//! shared assignment into its own input files under its [`WorkArea`] and
//! resets the phase timers of its checkpoint.

pub mod artifacts;
pub mod coordinator;
pub mod state;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use coordinator::{prepare_from_checkpoint, prepare_partition};
pub use state::{PartitionState, CHECKPOINT_VERSION};

/// Errors raised while preparing a partition. All of them abort the run.
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Process {process} has no chunk assignment")]
    MissingProcessAssignment { process: usize },

    #[error("Chunk {chunk} has no cube list")]
    MissingChunk { chunk: usize },

    #[error("Failed to write {path:?}: {source}")]
    ArtifactWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid integer '{token}' in {path:?}")]
    ArtifactFormat { path: PathBuf, token: String },

    #[error("Failed to read checkpoint {path:?}: {source}")]
    CheckpointRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed checkpoint {path:?}: {source}")]
    CheckpointFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checkpoint {path:?} has version {found}, expected {expected}")]
    CheckpointVersion {
        path: PathBuf,
        found: u64,
        expected: u32,
    },

    #[error("Inconsistent partition assignment: {0}")]
    InconsistentAssignment(String),
}

/// Process-scoped storage area of one rank, `<simudir>/tmp<rank>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkArea {
    root: PathBuf,
    rank: usize,
}

impl WorkArea {
    pub fn new(simu_dir: impl AsRef<Path>, rank: usize) -> Self {
        Self {
            root: simu_dir.as_ref().join(format!("tmp{rank}")),
            rank,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join("checkpoint").join("partition_state.json")
    }

    /// Directory holding the preconditioner input files.
    pub fn precond_dir(&self) -> PathBuf {
        self.root.join("sai_precond")
    }

    /// Chunks owned by this rank.
    pub fn chunk_list_path(&self) -> PathBuf {
        self.precond_dir().join("chunk_numbers.txt")
    }

    /// Cubes of one chunk.
    pub fn chunk_cubes_path(&self, chunk: usize) -> PathBuf {
        self.precond_dir().join(format!("chunk{chunk}_cube_numbers.txt"))
    }

    /// Global cube to chunk map.
    ///
    /// One `cube chunk` pair per line in ascending cube order. Cube numbers
    /// may be sparse, so the file is a pair list and not an array indexed by
    /// cube number.
    pub fn cube_to_chunk_path(&self) -> PathBuf {
        self.precond_dir().join("cube_to_chunk.txt")
    }
}
