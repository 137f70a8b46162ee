//! Solve entry points.

use std::time::Instant;

use cra_nlp::{AugmentedLagrangianSolver, NlpSolver, TerminationStatus};
use cra_types::Assembly;
use tracing::{debug, info, warn};

use crate::{
    check_residuals, CraConfig, PenaltyFormulation, PenaltySolution, ResidualWarning, Result,
    Topology,
};

/// Outcome of a successful solve. The assembly already carries the results.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    /// Name of the solver used.
    pub solver: String,
    /// Termination status (optimal or feasible).
    pub status: TerminationStatus,
    /// Objective value.
    pub objective: f64,
    /// Solver iterations.
    pub iterations: usize,
    /// Number of contact vertices.
    pub num_vertices: usize,
    /// Number of free blocks.
    pub num_free_blocks: usize,
    /// Residuals above tolerance.
    pub warnings: Vec<ResidualWarning>,
    /// The extracted solution.
    pub solution: PenaltySolution,
}

impl SolveReport {
    /// Whether every residual check passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Solve with the built-in augmented Lagrangian solver.
///
/// On success, every interface carrying contact vertices receives one
/// [`ContactForce`](cra_types::ContactForce) per point and every free block
/// a virtual displacement. On failure the assembly is left unchanged.
///
/// # Example
///
/// ```
/// use cra_equilibrium::{cra_penalty_solve, CraConfig};
/// use cra_types::{Assembly, Block, BlockId};
/// use nalgebra::Point3;
///
/// let mut assembly = Assembly::new();
/// assembly.add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0)).ok();
/// // A free block with no interface cannot be analysed.
/// let err = cra_penalty_solve(&mut assembly, &CraConfig::default()).unwrap_err();
/// assert!(err.is_setup_error());
/// ```
pub fn cra_penalty_solve(assembly: &mut Assembly, config: &CraConfig) -> Result<SolveReport> {
    let mut solver = AugmentedLagrangianSolver::new(config.solver_config());
    cra_penalty_solve_with(assembly, config, &mut solver)
}

/// Solve with any [`NlpSolver`].
///
/// Steps: index the assembly, build the formulation, submit once, extract,
/// check residuals, write back. Setup errors are raised before the solver
/// is called. There is no retry.
pub fn cra_penalty_solve_with<S>(
    assembly: &mut Assembly,
    config: &CraConfig,
    solver: &mut S,
) -> Result<SolveReport>
where
    S: NlpSolver + ?Sized,
{
    config.validate()?;
    let start = Instant::now();

    let topology = Topology::extract(assembly)?;
    let formulation = PenaltyFormulation::build(&topology, config)?;
    if config.timer {
        info!(
            elapsed_ms = elapsed_ms(start),
            variables = formulation.problem().num_variables(),
            constraints = formulation.problem().num_constraints(),
            "setup finished"
        );
    }
    debug!(solver = solver.name(), "setup finished, submitting problem");

    let solve_start = Instant::now();
    let output = solver.submit(formulation.problem());
    if config.timer {
        info!(
            elapsed_ms = elapsed_ms(solve_start),
            iterations = output.iterations,
            "solver finished"
        );
    }
    debug!(
        status = %output.status,
        objective = output.objective,
        violation = output.constraint_violation,
        "solver returned"
    );

    let solution = match PenaltySolution::extract(&topology, &formulation, &output) {
        Ok(solution) => solution,
        Err(err) => {
            warn!(%err, solver = solver.name(), "no solution written");
            return Err(err);
        }
    };
    let warnings = check_residuals(&formulation, &solution);
    solution.apply(assembly)?;

    if config.verbose {
        for (v, (force, d)) in solution.forces.iter().zip(&solution.kinematics).enumerate() {
            debug!(
                vertex = v,
                fn_plus = force.normal_push,
                fn_minus = force.normal_pull,
                fu = force.tangent_u,
                fv = force.tangent_v,
                dn = d.x,
                du = d.y,
                dv = d.z,
                alpha = solution.alpha[v],
                "vertex"
            );
        }
        for (id, q) in &solution.displacements {
            debug!(block = %id, displacement = ?q.as_slice(), "block");
        }
    }
    if config.timer {
        info!(elapsed_ms = elapsed_ms(start), "analysis finished");
    }

    Ok(SolveReport {
        solver: solver.name().to_string(),
        status: output.status,
        objective: output.objective,
        iterations: output.iterations,
        num_vertices: topology.num_vertices(),
        num_free_blocks: topology.num_free(),
        warnings,
        solution,
    })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1e3
}
