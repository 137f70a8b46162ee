//! Coupled rigid-block analysis from the command line.
//!
//! # Commands
//!
//! - `cra solve <input.json>` - Solve and write the assembly with results
//! - `cra inspect <input.json>` - Print vertex, block and interface counts
//!
//! The input is an assembly serialized with `serde_json`. Logging goes to
//! stderr and is controlled by `RUST_LOG` (default `info`, or `debug` with
//! `--verbose`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cra_equilibrium::{
    cra_penalty_solve, interface_resultant, total_self_weight, CraConfig, FrictionLaw, Topology,
};
use cra_types::Assembly;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Equilibrium analysis of rigid-block assemblies
#[derive(Parser)]
#[command(name = "cra")]
#[command(about = "Coupled rigid-block analysis, penalty formulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for contact forces and virtual displacements
    Solve(SolveArgs),

    /// Summarize an assembly without solving it
    Inspect {
        /// Assembly JSON file
        input: PathBuf,
    },
}

#[derive(clap::Args)]
struct SolveArgs {
    /// Assembly JSON file
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Friction coefficient
    #[arg(long, default_value_t = 0.84)]
    mu: f64,

    /// Material density
    #[arg(long, default_value_t = 1.0)]
    density: f64,

    /// Bound on kinematic components
    #[arg(long, default_value_t = 1e-3)]
    d_bnd: f64,

    /// Contact offset
    #[arg(long, default_value_t = 1e-4)]
    eps: f64,

    /// Friction law
    #[arg(long, value_enum, default_value_t = FrictionArg::Slip)]
    friction: FrictionArg,

    /// Faces of the friction pyramid
    #[arg(long, default_value_t = 4)]
    faces: usize,

    /// Log per-vertex results and solver iterations
    #[arg(long)]
    verbose: bool,

    /// Log phase durations
    #[arg(long)]
    timer: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FrictionArg {
    /// Tangential force coupled to slip
    Slip,
    /// Linearized friction pyramid
    Pyramid,
}

impl SolveArgs {
    fn config(&self) -> CraConfig {
        let friction = match self.friction {
            FrictionArg::Slip => FrictionLaw::SlipCoupling,
            FrictionArg::Pyramid => FrictionLaw::PyramidalCone { faces: self.faces },
        };
        CraConfig::default()
            .with_mu(self.mu)
            .with_density(self.density)
            .with_d_bnd(self.d_bnd)
            .with_eps(self.eps)
            .with_friction(friction)
            .verbose(self.verbose)
            .timer(self.timer)
    }
}

#[derive(Serialize)]
struct Summary {
    blocks: usize,
    free_blocks: usize,
    interfaces: usize,
    contact_vertices: usize,
    self_weight: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Commands::Solve(args) if args.verbose);
    init_tracing(verbose);

    match cli.command {
        Commands::Solve(args) => solve(&args),
        Commands::Inspect { input } => inspect(&input),
    }
}

/// `RUST_LOG` wins; otherwise `debug` when verbose, else `info`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(path: &Path) -> Result<Assembly> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn solve(args: &SolveArgs) -> Result<()> {
    let mut assembly = load(&args.input)?;
    let config = args.config();
    let report = cra_penalty_solve(&mut assembly, &config).context("analysis failed")?;

    info!(
        status = %report.status,
        objective = report.objective,
        iterations = report.iterations,
        warnings = report.warnings.len(),
        "solved"
    );
    for (k, interface) in assembly.interfaces().iter().enumerate() {
        if let Some(resultant) = interface_resultant(interface) {
            info!(
                interface = k,
                position = ?resultant.position.coords.as_slice(),
                force = ?resultant.force.as_slice(),
                "resultant"
            );
        }
    }

    let json = serde_json::to_string_pretty(&assembly)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let assembly = load(input)?;
    let summary = summarize(&assembly)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize(assembly: &Assembly) -> Result<Summary> {
    let topology = Topology::extract(assembly).context("assembly cannot be analysed")?;
    Ok(Summary {
        blocks: assembly.num_blocks(),
        free_blocks: topology.num_free(),
        interfaces: assembly.interfaces().len(),
        contact_vertices: topology.num_vertices(),
        self_weight: total_self_weight(assembly, 1.0),
    })
}
