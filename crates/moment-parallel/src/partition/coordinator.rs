//! Per-rank partition preparation.

use super::artifacts::{write_integer_list, write_integer_pairs};
use super::{PartitionError, PartitionState, WorkArea};

/// Write the preconditioner inputs of `process` and reset its phase timers.
///
/// Writes, under `area`:
/// - the chunks owned by `process`,
/// - the cube list of each owned chunk (an empty chunk gives an empty file),
/// - the full cube to chunk map, identical on every rank,
///
/// then zeroes the phase timers of `state` and rewrites the checkpoint.
/// All lookups are resolved before the first write, so a missing assignment
/// leaves the area untouched. Repeated calls produce identical files.
pub fn prepare_partition(
    process: usize,
    state: &mut PartitionState,
    area: &WorkArea,
) -> Result<(), PartitionError> {
    let chunks = state
        .process_to_chunks
        .get(&process)
        .ok_or(PartitionError::MissingProcessAssignment { process })?;
    let owned = chunks
        .iter()
        .map(|&chunk| {
            state
                .chunk_to_cubes
                .get(&chunk)
                .map(|cubes| (chunk, cubes.as_slice()))
                .ok_or(PartitionError::MissingChunk { chunk })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "rank {}: preparing {} chunk(s) in {}",
        process,
        owned.len(),
        area.precond_dir().display()
    );

    write_integer_list(&area.chunk_list_path(), chunks)?;
    for (chunk, cubes) in &owned {
        write_integer_list(&area.chunk_cubes_path(*chunk), cubes)?;
        log::debug!("rank {}: chunk {} holds {} cube(s)", process, chunk, cubes.len());
    }
    write_integer_pairs(
        &area.cube_to_chunk_path(),
        state.cube_to_chunk.iter().map(|(&cube, &chunk)| (cube, chunk)),
    )?;

    state.reset_phase_timers();
    state.store(&area.checkpoint_path())?;
    log::debug!("rank {}: checkpoint rewritten", process);
    Ok(())
}

/// Load the checkpoint of `area`, check it and prepare the partition of the
/// area's rank.
pub fn prepare_from_checkpoint(area: &WorkArea) -> Result<PartitionState, PartitionError> {
    let mut state = PartitionState::load(&area.checkpoint_path())?;
    state.validate()?;
    prepare_partition(area.rank(), &mut state, area)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("moment-coordinator-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_process_leaves_area_untouched() {
        let dir = scratch("missing-process");
        let area = WorkArea::new(&dir, 4);
        let mut state =
            PartitionState::from_assignment(BTreeMap::from([(1, 0)]), &BTreeMap::from([(0, 0)])).unwrap();
        assert!(matches!(
            prepare_partition(4, &mut state, &area),
            Err(PartitionError::MissingProcessAssignment { process: 4 })
        ));
        assert!(!area.root().exists());
    }

    #[test]
    fn test_missing_chunk_leaves_area_untouched() {
        let dir = scratch("missing-chunk");
        let area = WorkArea::new(&dir, 0);
        let mut state =
            PartitionState::from_assignment(BTreeMap::from([(1, 0)]), &BTreeMap::from([(0, 0)])).unwrap();
        state.process_to_chunks.insert(0, vec![0, 7]);
        assert!(matches!(
            prepare_partition(0, &mut state, &area),
            Err(PartitionError::MissingChunk { chunk: 7 })
        ));
        assert!(!area.root().exists());
    }
}
