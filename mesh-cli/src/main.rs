//! Reference command-line driver: `mesh-cli <input> <repaired-output> [<report-path>]`.
//!
//! Loads a mesh, evaluates it, and unconditionally runs the repair
//! driver before writing the repaired mesh and the JSON report. Input
//! and output paths must differ, exit code `1` otherwise. Report path
//! is optional, falling back to stdout.

use clap::Parser;
use mesh_core::io;
use mesh_core::report::{DiagnosticRecord, Report};
use mesh_core::topology::rebuild_topology_from_scratch;
use std::path::PathBuf;
use std::process::ExitCode;

/// Check and repair an indexed triangle mesh (STL, OBJ, or PLY).
#[derive(Parser, Debug)]
#[command(name = "mesh-cli", version, about)]
struct Cli {
    /// path to the mesh to load
    input: PathBuf,
    /// path the repaired mesh is written to
    output: PathBuf,
    /// optional path the JSON report is written to; stdout if omitted
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.input == cli.output {
        log::error!("input and output paths must differ: {}", cli.input.display());
        return ExitCode::FAILURE;
    }

    let mut mesh = match io::load(&cli.input) {
        Ok((mesh, warnings)) => {
            for warning in &warnings {
                log::warn!("{warning}");
            }
            mesh
        }
        Err(err) => {
            log::error!("failed to load {}: {err}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    rebuild_topology_from_scratch(&mut mesh);
    let pre = DiagnosticRecord::evaluate(&mesh);
    let (repair_record, post) = mesh_core::repair::repair(
        &mut mesh,
        &pre,
        mesh_core::repair::RepairPolicy::default(),
        None,
    );

    if let Err(err) = io::save(&cli.output, &mesh) {
        log::error!("failed to write repaired mesh to {}: {err}", cli.output.display());
        return ExitCode::FAILURE;
    }

    let report = Report { pre, repaired: Some((repair_record, post)) };
    let rendered = match serde_json::to_string_pretty(&report) {
        Ok(rendered) => rendered,
        Err(err) => {
            log::error!("failed to render report: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.report {
        Some(path) => {
            if let Err(err) = std::fs::write(&path, rendered) {
                log::error!("failed to write report to {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
        None => println!("{rendered}"),
    }

    ExitCode::SUCCESS
}
