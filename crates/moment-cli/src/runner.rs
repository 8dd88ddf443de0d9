//! Run drivers: tie together parameters, mesh, excitation and partition.

use std::path::Path;

use anyhow::{Context, Result};

use moment_core::constants::angular_frequency;
use moment_core::{Component, ExcitationBuilder, ExcitationSource, StoredExcitation};
use moment_geometry::parsers::load_mesh;
use moment_geometry::transform::Transform;
#[cfg(feature = "mpi")]
use moment_parallel::MpiComm;
use moment_parallel::{
    broadcast_parameters, launcher_world_size, prepare_from_checkpoint, Communicator, SingleProcess,
    WorkArea,
};

use crate::config::{load_parameters, SimulationParams};

/// Assemble the excitation vector described by the parameters in
/// `input_dir` and write it under `simu_dir`.
pub fn run_excitation(input_dir: &Path, simu_dir: &Path) -> Result<()> {
    let params = load_parameters(input_dir)?;
    params.check_selection()?;

    let mesh_path = input_dir.join(&params.mesh.file);
    let mut mesh = load_mesh(&mesh_path).with_context(|| format!("Failed to load mesh {}", mesh_path.display()))?;
    Transform::placement(params.mesh.scale, params.mesh.z_offset).apply_to_mesh(&mut mesh);
    println!(
        "  Mesh '{}': {} RWG edges, {} boundary edges",
        params.mesh.file,
        mesh.num_edges(),
        mesh.num_boundary_edges()
    );

    let edges = params.mesh.edges.clone().unwrap_or_else(|| mesh.all_edges());
    let source = ExcitationSource::from_kind_name(
        &params.source.excitation,
        params.source.current(),
        params.source.location,
        angular_frequency(params.source.frequency_hz),
        params.medium,
    )?;

    log::info!("assembling {} excitation over {} edge(s)", source.kind, edges.len());
    let excitation = ExcitationBuilder::default().build(&mesh, &edges, &source)?;
    for warning in &excitation.warnings {
        println!("  Warning: {}", warning);
    }

    let stored = excitation.vector.narrow(params.output.precision);
    let out_path = simu_dir.join(&params.output.excitation_file);
    write_excitation_csv(&edges, &stored, &out_path, &params)?;
    Ok(())
}

/// Prepare the preconditioner partition of this process's rank.
///
/// Under an MPI launcher every process is one rank of the MPI world;
/// otherwise the run is a single rank.
pub fn run_prepare_partition(input_dir: &Path, simu_dir: &Path) -> Result<()> {
    prepare_in_world(launcher_world_size(), input_dir, simu_dir)
}

fn prepare_in_world(world_size: Option<usize>, input_dir: &Path, simu_dir: &Path) -> Result<()> {
    match world_size {
        None => prepare_rank(&SingleProcess, input_dir, simu_dir),
        Some(size) => prepare_under_launcher(size, input_dir, simu_dir),
    }
}

#[cfg(feature = "mpi")]
fn prepare_under_launcher(size: usize, input_dir: &Path, simu_dir: &Path) -> Result<()> {
    let comm = MpiComm::initialize()?;
    if comm.size() != size {
        log::warn!("launcher announced {} rank(s), MPI world has {}", size, comm.size());
    }
    prepare_rank(&comm, input_dir, simu_dir)
}

#[cfg(not(feature = "mpi"))]
fn prepare_under_launcher(size: usize, input_dir: &Path, simu_dir: &Path) -> Result<()> {
    // every process would claim rank 0 and rewrite the same work area
    if size > 1 {
        anyhow::bail!(
            "Started as one of {} MPI processes, but this build has no MPI support; rebuild with `--features mpi`",
            size
        );
    }
    prepare_rank(&SingleProcess, input_dir, simu_dir)
}

/// One rank of the partition phase: receive the parameters, check the
/// computation selection, then prepare this rank's work area.
fn prepare_rank<C: Communicator>(comm: &C, input_dir: &Path, simu_dir: &Path) -> Result<()> {
    let params: SimulationParams = broadcast_parameters(comm, || load_parameters(input_dir))?;
    log::debug!("rank {}: parameters received", comm.rank());
    params.check_selection()?;

    let area = WorkArea::new(simu_dir, comm.rank());
    let state = prepare_from_checkpoint(&area)
        .with_context(|| format!("rank {}: partition preparation failed", comm.rank()))?;
    let chunks = state
        .process_to_chunks
        .get(&comm.rank())
        .map_or(0, Vec::len);
    println!(
        "  Rank {}: {} chunk(s) written to {}",
        comm.rank(),
        chunks,
        area.precond_dir().display()
    );
    Ok(())
}

/// Write an excitation vector to a CSV file with a metadata header.
pub fn write_excitation_csv(
    edges: &[usize],
    stored: &StoredExcitation,
    path: &Path,
    params: &SimulationParams,
) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writeln!(file, "# Moment excitation vector")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# excitation: {}", params.source.excitation)?;
    writeln!(file, "# frequency_hz: {}", params.source.frequency_hz)?;
    writeln!(file, "# location_m: {:?}", params.source.location)?;
    writeln!(file, "# eps_r: {}, mu_r: {}", params.medium.eps_r, params.medium.mu_r)?;
    writeln!(file, "# precision: {:?}", stored.precision())?;
    writeln!(file, "#")?;

    let mut header = String::from("edge");
    for component in Component::ALL {
        header.push_str(&format!(",{0}_re,{0}_im", component.label()));
    }
    writeln!(file, "{}", header)?;

    for (row, edge) in edges.iter().enumerate() {
        let mut line = edge.to_string();
        for component in Component::ALL {
            let value = stored.get(row, component);
            line.push_str(&format!(",{:.9e},{:.9e}", value.re, value.im));
        }
        writeln!(file, "{}", line)?;
    }

    println!("Excitation written to: {}", path.display());
    Ok(())
}
