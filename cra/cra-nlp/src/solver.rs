//! Solver interface.

use nalgebra::DVector;

use crate::NlpProblem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationStatus {
    /// Feasible and stationary within tolerance.
    Optimal,
    /// Feasible within tolerance; optimality not certified.
    Feasible,
    /// The constraints could not be satisfied.
    Infeasible,
    /// The objective decreased without bound.
    Unbounded,
    /// Iteration budget exhausted before feasibility.
    IterationLimit,
    /// Non-finite values or an unrecoverable linear algebra failure.
    NumericalError,
    /// The problem failed structural validation.
    InvalidProblem,
}

impl TerminationStatus {
    /// Whether the primal values may be used.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Optimal => "optimal",
            Self::Feasible => "feasible",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::IterationLimit => "iteration limit",
            Self::NumericalError => "numerical error",
            Self::InvalidProblem => "invalid problem",
        };
        f.write_str(name)
    }
}

/// What a solver returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// Termination status.
    pub status: TerminationStatus,
    /// Primal values, one per variable (last iterate on failure).
    pub primal: DVector<f64>,
    /// Objective at `primal`.
    pub objective: f64,
    /// Largest constraint or bound violation at `primal`.
    pub constraint_violation: f64,
    /// Iterations performed (solver-specific meaning).
    pub iterations: usize,
}

impl SolverOutput {
    /// Output for a solve that never started.
    #[must_use]
    pub fn failed(status: TerminationStatus, num_variables: usize) -> Self {
        Self {
            status,
            primal: DVector::zeros(num_variables),
            objective: f64::NAN,
            constraint_violation: f64::INFINITY,
            iterations: 0,
        }
    }
}

/// A nonlinear programming solver.
///
/// Implementations take a fully assembled [`NlpProblem`] and return a status
/// plus primal values. A solve is a single blocking call; there is no retry
/// or cancellation at this level.
pub trait NlpSolver {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Solve the problem.
    fn submit(&mut self, problem: &NlpProblem) -> SolverOutput;
}

impl<S: NlpSolver + ?Sized> NlpSolver for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&mut self, problem: &NlpProblem) -> SolverOutput {
        (**self).submit(problem)
    }
}
