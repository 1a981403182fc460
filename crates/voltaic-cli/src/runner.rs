//! Simulation runner: drives a session through its frames and writes the
//! geometry out.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use voltaic_core::{RenderGeometry, SimulationSession};

use crate::config::JobConfig;

/// One computed frame.
pub struct Frame {
    pub index: usize,
    pub time: f64,
    pub geometry: RenderGeometry,
}

/// What `validate` found out about a job.
pub struct ValidationReport {
    pub dims: (usize, usize, usize),
    pub charged_cells: usize,
    pub current_cells: usize,
    pub method: String,
}

/// Build the session described by a job.
pub fn build_session(job: &JobConfig) -> Result<SimulationSession> {
    let session = SimulationSession::new(
        job.mesh.bounds,
        job.mesh.step,
        job.sources.clone(),
        job.simulation.clone(),
    )?;
    Ok(session)
}

/// Run `frames` frames. The first is evaluated at the configured start
/// time; time advances by one step before each later frame.
pub fn run_simulation(job: &JobConfig, frames: usize) -> Result<Vec<Frame>> {
    let mut session = build_session(job)?;
    let (nx, ny, nz) = session.grid().dims();
    println!("  Grid: {nx} x {ny} x {nz} ({} cells)", session.grid().len());
    println!("  Solver: {}", session.method_name());

    let mut out = Vec::with_capacity(frames);
    for index in 0..frames {
        if index > 0 {
            session.advance_time();
        }
        let time = session.time();
        let geometry = session
            .compute_frame()
            .with_context(|| format!("frame {index} at t = {time}"))?;

        if (index + 1) % 10 == 0 || index == 0 || index + 1 == frames {
            println!(
                "  [{}/{}] t={:.3}: {} segments",
                index + 1,
                frames,
                time,
                geometry.segment_count()
            );
        }
        out.push(Frame { index, time, geometry });
    }
    Ok(out)
}

/// Build the mesh and rasterize both sources once, surfacing any expression
/// error without solving.
pub fn validate(job: &JobConfig) -> Result<ValidationReport> {
    let session = build_session(job)?;
    let (charge, current) = session.densities()?;
    Ok(ValidationReport {
        dims: session.grid().dims(),
        charged_cells: charge.iter().filter(|&&rho| rho != 0.0).count(),
        current_cells: current.magnitude().iter().filter(|&&j| j != 0.0).count(),
        method: session.method_name(),
    })
}

/// File name for frame `index` with the given extension.
pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("frame_{index:04}.{extension}")
}

/// Write one frame's segments to a CSV file with a metadata header.
pub fn write_frame_csv(frame: &Frame, path: &Path, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writeln!(file, "# Voltaic field frame {}", frame.index)?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# time: {}", frame.time)?;
    writeln!(file, "# step: {}", job.mesh.step)?;
    writeln!(file, "# charge: {} | {}", job.sources.charge_position, job.sources.charge_strength)?;
    writeln!(file, "# current: {} | {}", job.sources.current_position, job.sources.current_strength)?;
    writeln!(file, "#")?;
    writeln!(file, "sx,sy,sz,ex,ey,ez,r,g,b,magnitude")?;

    let geometry = &frame.geometry;
    for ((arrow, color), magnitude) in geometry
        .arrows
        .iter()
        .zip(&geometry.colors)
        .zip(&geometry.magnitudes)
    {
        writeln!(
            file,
            "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.4},{:.4},{:.4},{:.6}",
            arrow[0], arrow[1], arrow[2], arrow[3], arrow[4], arrow[5],
            color[0], color[1], color[2], magnitude
        )?;
    }
    log::debug!("frame {} written to {}", frame.index, path.display());
    Ok(())
}

/// Write one frame's geometry to a JSON file.
pub fn write_frame_json(frame: &Frame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&frame.geometry)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;
    log::debug!("frame {} (JSON) written to {}", frame.index, path.display());
    Ok(())
}
