//! Voltaic command-line interface.
//!
//! Run time-stepped field simulations from TOML configuration files:
//! ```sh
//! voltaic-cli run job.toml
//! voltaic-cli validate job.toml
//! voltaic-cli grammar
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use voltaic_expr::ast::{Function, Var};

#[derive(Parser)]
#[command(name = "voltaic-cli")]
#[command(about = "Voltaic: electric and magnetic fields from expression-defined sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of frames (overrides config file setting).
        #[arg(short, long)]
        frames: Option<usize>,
    },
    /// Validate a configuration file and its expressions without solving.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Describe the source expression language.
    Grammar,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output, frames } => {
            println!("Voltaic Field Engine");
            println!("====================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let count = frames.unwrap_or(job.output.frames);
            let result = runner::run_simulation(&job, count)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            for frame in &result {
                if job.output.save_csv {
                    let path = out_dir.join(runner::frame_file_name(frame.index, "csv"));
                    runner::write_frame_csv(frame, &path, &job)?;
                }
                if job.output.save_json {
                    let path = out_dir.join(runner::frame_file_name(frame.index, "json"));
                    runner::write_frame_json(frame, &path)?;
                }
            }

            println!("{} frame(s) written to: {}", result.len(), out_dir.display());
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let report = runner::validate(&job)?;
            let (nx, ny, nz) = report.dims;
            println!("Configuration is valid: {}", config.display());
            println!("  Grid: {nx} x {ny} x {nz}");
            println!("  Charged cells: {}", report.charged_cells);
            println!("  Current-carrying cells: {}", report.current_cells);
            println!("  Solver: {}", report.method);
            Ok(())
        }
        Commands::Grammar => {
            println!("Source expressions");
            println!();
            println!("  Position: clauses joined by 'or'; conditions in a clause joined by 'and'.");
            println!("  Strength: one formula per position clause, joined by 'or'.");
            println!("  Current strength: three comma-separated formulas (x, y, z) per clause.");
            println!();
            println!("  Variables: {}", Var::NAMES.join(" "));
            println!("    r = sqrt(x^2 + y^2 + z^2), s = sqrt(x^2 + y^2)");
            println!("    phi = atan2(y, x) in degrees + 180, theta = atan2(s, z) in degrees");
            println!("  Constants: pi e");
            println!("  Functions: {}", Function::NAMES.join(" "));
            println!("    (an 'np.' prefix is accepted)");
            println!("  Operators: + - * / % ^ ** < <= > >= == != not and or ( )");
            println!();
            println!("  Example: position 'r < 0.5 or x > 1 and y > 0', strength '1 or -2'");
            Ok(())
        }
    }
}
