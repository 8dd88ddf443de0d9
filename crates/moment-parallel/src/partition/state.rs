//! Persisted partition checkpoint.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::artifacts::write_atomic;
use super::PartitionError;

/// Layout version written into every checkpoint.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Partition assignment and preconditioner phase timers of one rank.
///
/// Maps are ordered so that a stored checkpoint is byte-for-byte
/// reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    pub version: u32,
    pub process_to_chunks: BTreeMap<usize, Vec<usize>>,
    pub chunk_to_cubes: BTreeMap<usize, Vec<usize>>,
    pub cube_to_chunk: BTreeMap<usize, usize>,
    /// Wall-clock seconds spent in the preconditioner phase.
    pub wall_time_phase: f64,
    /// CPU seconds spent in the preconditioner phase.
    pub cpu_time_phase: f64,
}

impl PartitionState {
    /// Derive the three maps from a cube assignment and a chunk assignment.
    ///
    /// Every chunk that holds a cube must be assigned to a process. Chunks
    /// assigned to a process without any cube get an empty cube list.
    pub fn from_assignment(
        cube_to_chunk: BTreeMap<usize, usize>,
        chunk_to_process: &BTreeMap<usize, usize>,
    ) -> Result<Self, PartitionError> {
        let mut chunk_to_cubes: BTreeMap<usize, Vec<usize>> =
            chunk_to_process.keys().map(|&chunk| (chunk, Vec::new())).collect();
        for (&cube, &chunk) in &cube_to_chunk {
            chunk_to_cubes
                .get_mut(&chunk)
                .ok_or_else(|| {
                    PartitionError::InconsistentAssignment(format!(
                        "cube {cube} belongs to chunk {chunk}, which no process owns"
                    ))
                })?
                .push(cube);
        }

        let mut process_to_chunks: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (&chunk, &process) in chunk_to_process {
            process_to_chunks.entry(process).or_default().push(chunk);
        }

        Ok(Self {
            version: CHECKPOINT_VERSION,
            process_to_chunks,
            chunk_to_cubes,
            cube_to_chunk,
            wall_time_phase: 0.0,
            cpu_time_phase: 0.0,
        })
    }

    /// Check that the three maps describe the same assignment.
    pub fn validate(&self) -> Result<(), PartitionError> {
        let inconsistent = |message: String| Err(PartitionError::InconsistentAssignment(message));

        let mut owned = BTreeSet::new();
        for (process, chunks) in &self.process_to_chunks {
            for chunk in chunks {
                if !owned.insert(*chunk) {
                    return inconsistent(format!("chunk {chunk} is owned twice (again by process {process})"));
                }
                if !self.chunk_to_cubes.contains_key(chunk) {
                    return inconsistent(format!("process {process} owns chunk {chunk}, which has no cube list"));
                }
            }
        }

        let mut listed = 0;
        for (chunk, cubes) in &self.chunk_to_cubes {
            for cube in cubes {
                match self.cube_to_chunk.get(cube) {
                    Some(c) if c == chunk => listed += 1,
                    Some(c) => {
                        return inconsistent(format!("cube {cube} is listed in chunk {chunk} but mapped to chunk {c}"))
                    }
                    None => return inconsistent(format!("cube {cube} of chunk {chunk} has no chunk mapping")),
                }
            }
        }
        if listed != self.cube_to_chunk.len() {
            return inconsistent(format!(
                "{} cube(s) mapped to a chunk but {listed} listed under their chunk",
                self.cube_to_chunk.len()
            ));
        }
        Ok(())
    }

    /// Zero the preconditioner phase timers.
    pub fn reset_phase_timers(&mut self) {
        self.wall_time_phase = 0.0;
        self.cpu_time_phase = 0.0;
    }

    /// Read a checkpoint, rejecting other layout versions.
    pub fn load(path: &Path) -> Result<Self, PartitionError> {
        let text = fs::read_to_string(path).map_err(|source| PartitionError::CheckpointRead {
            path: path.to_path_buf(),
            source,
        })?;
        let malformed = |source| PartitionError::CheckpointFormat {
            path: path.to_path_buf(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(&text).map_err(malformed)?;

        let found = value.get("version").and_then(serde_json::Value::as_u64).unwrap_or(0);
        if found != u64::from(CHECKPOINT_VERSION) {
            return Err(PartitionError::CheckpointVersion {
                path: path.to_path_buf(),
                found,
                expected: CHECKPOINT_VERSION,
            });
        }
        serde_json::from_value(value).map_err(malformed)
    }

    /// Rewrite the checkpoint in full.
    pub fn store(&self, path: &Path) -> Result<(), PartitionError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| PartitionError::ArtifactWriteFailure {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> PartitionState {
        let cube_to_chunk = BTreeMap::from([(10, 0), (11, 1), (12, 1), (20, 2)]);
        let chunk_to_process = BTreeMap::from([(0, 0), (1, 0), (2, 1), (3, 1)]);
        PartitionState::from_assignment(cube_to_chunk, &chunk_to_process).unwrap()
    }

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("moment-state-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_from_assignment() {
        let state = scenario();
        assert_eq!(state.process_to_chunks[&0], vec![0, 1]);
        assert_eq!(state.process_to_chunks[&1], vec![2, 3]);
        assert_eq!(state.chunk_to_cubes[&1], vec![11, 12]);
        assert!(state.chunk_to_cubes[&3].is_empty());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_unowned_chunk_rejected() {
        let cube_to_chunk = BTreeMap::from([(10, 0), (11, 5)]);
        let chunk_to_process = BTreeMap::from([(0, 0)]);
        assert!(matches!(
            PartitionState::from_assignment(cube_to_chunk, &chunk_to_process),
            Err(PartitionError::InconsistentAssignment(_))
        ));
    }

    #[test]
    fn test_validate_detects_mismatch() {
        let mut state = scenario();
        state.cube_to_chunk.insert(12, 0);
        assert!(matches!(state.validate(), Err(PartitionError::InconsistentAssignment(_))));

        let mut state = scenario();
        state.process_to_chunks.get_mut(&1).unwrap().push(0);
        assert!(matches!(state.validate(), Err(PartitionError::InconsistentAssignment(_))));

        let mut state = scenario();
        state.cube_to_chunk.insert(99, 3);
        assert!(matches!(state.validate(), Err(PartitionError::InconsistentAssignment(_))));
    }

    #[test]
    fn test_store_then_load() {
        let dir = scratch("reload");
        let path = dir.join("checkpoint.json");
        let mut state = scenario();
        state.wall_time_phase = 12.5;
        state.store(&path).unwrap();
        assert_eq!(PartitionState::load(&path).unwrap(), state);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_other_version_rejected() {
        let dir = scratch("version");
        let path = dir.join("checkpoint.json");
        let mut state = scenario();
        state.version = CHECKPOINT_VERSION + 1;
        state.store(&path).unwrap();
        assert!(matches!(
            PartitionState::load(&path),
            Err(PartitionError::CheckpointVersion { found, .. }) if found == u64::from(CHECKPOINT_VERSION + 1)
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_and_malformed_checkpoints() {
        let dir = scratch("malformed");
        let path = dir.join("checkpoint.json");
        assert!(matches!(PartitionState::load(&path), Err(PartitionError::CheckpointRead { .. })));
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PartitionState::load(&path), Err(PartitionError::CheckpointFormat { .. })));
        fs::write(&path, format!("{{\"version\": {CHECKPOINT_VERSION}}}")).unwrap();
        assert!(matches!(PartitionState::load(&path), Err(PartitionError::CheckpointFormat { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }
}
