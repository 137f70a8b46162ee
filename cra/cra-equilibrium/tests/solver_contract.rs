//! Behavior at the solver boundary, using scripted solvers.
//!
//! - Setup errors are raised before anything is submitted
//! - Non-success statuses leave the assembly untouched
//! - Write-back is idempotent
//! - Malformed solver output is rejected

mod common;

use common::{cube_on_support, formulate, resting_cube_primal, ScriptedSolver};
use cra_equilibrium::{cra_penalty_solve_with, CraConfig, CraError, SetupError};
use cra_nlp::TerminationStatus;
use cra_types::{Block, BlockId, ContactForce};
use nalgebra::{DVector, Point3};

// ============================================================================
// Setup errors
// ============================================================================

#[test]
fn test_isolated_block_never_reaches_solver() {
    let mut assembly = cube_on_support();
    assembly
        .add_block(Block::new(BlockId::new(5), Point3::new(4.0, 0.0, 0.5), 1.0))
        .expect("block");
    let snapshot = assembly.clone();

    let mut solver = ScriptedSolver::returning(TerminationStatus::Optimal);
    let err = cra_penalty_solve_with(&mut assembly, &CraConfig::default(), &mut solver)
        .expect_err("isolated block must be rejected");

    assert_eq!(err, CraError::Setup(SetupError::IsolatedFreeBlock(BlockId::new(5))));
    assert_eq!(solver.calls, 0);
    assert_eq!(assembly, snapshot);
}

#[test]
fn test_invalid_config_never_reaches_solver() {
    let mut assembly = cube_on_support();
    let mut solver = ScriptedSolver::returning(TerminationStatus::Optimal);
    let err = cra_penalty_solve_with(
        &mut assembly,
        &CraConfig::default().with_d_bnd(0.0),
        &mut solver,
    )
    .expect_err("zero kinematic bound must be rejected");

    assert!(err.is_config_error());
    assert_eq!(solver.calls, 0);
}

// ============================================================================
// Non-convergence
// ============================================================================

#[test]
fn test_iteration_limit_leaves_assembly_unchanged() {
    let mut assembly = cube_on_support();
    let snapshot = assembly.clone();

    let mut solver = ScriptedSolver::returning(TerminationStatus::IterationLimit);
    let err = cra_penalty_solve_with(&mut assembly, &CraConfig::default(), &mut solver)
        .expect_err("iteration limit must be reported");

    assert_eq!(
        err,
        CraError::SolverNonConvergence {
            status: TerminationStatus::IterationLimit
        }
    );
    assert_eq!(solver.calls, 1);
    assert_eq!(assembly, snapshot);
}

#[test]
fn test_failure_keeps_previous_results() {
    let mut assembly = cube_on_support();
    assembly.interfaces_mut()[0].forces = Some(vec![ContactForce::new(9.0, 0.0, 0.0, 0.0); 4]);
    let snapshot = assembly.clone();

    for status in [
        TerminationStatus::Infeasible,
        TerminationStatus::Unbounded,
        TerminationStatus::NumericalError,
        TerminationStatus::InvalidProblem,
    ] {
        let mut solver = ScriptedSolver::returning(status);
        let err = cra_penalty_solve_with(&mut assembly, &CraConfig::default(), &mut solver)
            .expect_err("failure status must be reported");
        assert!(err.is_non_convergence());
        assert_eq!(assembly, snapshot);
    }
}

#[test]
fn test_wrong_primal_length_rejected() {
    let mut assembly = cube_on_support();
    let snapshot = assembly.clone();

    // The cube on its support has 26 decision variables.
    for length in [5, 27] {
        let mut solver = ScriptedSolver::returning(TerminationStatus::Optimal)
            .with_primal(DVector::zeros(length));
        let err = cra_penalty_solve_with(&mut assembly, &CraConfig::default(), &mut solver)
            .expect_err("wrong length must be rejected");

        assert_eq!(
            err,
            CraError::PrimalDimension {
                expected: 26,
                actual: length
            }
        );
        assert_eq!(solver.calls, 1);
        assert_eq!(assembly, snapshot);
    }
}

// ============================================================================
// Write-back
// ============================================================================

#[test]
fn test_exact_answer_is_written_verbatim() {
    let config = CraConfig::default();
    let mut assembly = cube_on_support();
    let primal = resting_cube_primal(&formulate(&assembly, &config));

    let mut solver = ScriptedSolver::returning(TerminationStatus::Optimal).with_primal(primal);
    let report = cra_penalty_solve_with(&mut assembly, &config, &mut solver).expect("solve");

    assert_eq!(report.solver, "scripted");
    assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    let forces = assembly.interfaces()[0].forces.as_ref().expect("forces");
    assert!(forces
        .iter()
        .all(|f| *f == ContactForce::new(0.25, 0.0, 0.0, 0.0)));
    let cube = assembly.block(BlockId::new(1)).expect("cube");
    assert_eq!(cube.translation().expect("displacement").z, -config.eps);
}

#[test]
fn test_repeated_solve_is_idempotent() {
    let config = CraConfig::default();
    let mut assembly = cube_on_support();
    let primal = resting_cube_primal(&formulate(&assembly, &config));
    let mut solver = ScriptedSolver::returning(TerminationStatus::Feasible).with_primal(primal);

    cra_penalty_solve_with(&mut assembly, &config, &mut solver).expect("first solve");
    let first = assembly.clone();
    cra_penalty_solve_with(&mut assembly, &config, &mut solver).expect("second solve");

    assert_eq!(assembly, first);
    assert_eq!(solver.calls, 2);
}

#[test]
fn test_residual_warnings_do_not_block_write_back() {
    let config = CraConfig::default();
    let mut assembly = cube_on_support();
    let formulation = formulate(&assembly, &config);
    let layout = *formulation.layout();
    let mut primal = resting_cube_primal(&formulation);
    primal[layout.normal_push(0)] = 1.0;

    let mut solver = ScriptedSolver::returning(TerminationStatus::Feasible).with_primal(primal);
    let report = cra_penalty_solve_with(&mut assembly, &config, &mut solver).expect("solve");

    assert!(!report.is_clean());
    assert!(assembly.has_results());
    let forces = assembly.interfaces()[0].forces.as_ref().expect("forces");
    assert_eq!(forces[0].normal_push, 1.0);
}
