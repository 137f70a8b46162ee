//! Augmented Lagrangian solver with projected Newton inner iterations.
//!
//! # Method
//!
//! Constraints are moved into a merit function (Powell-Hestenes-Rockafellar
//! form), variable bounds are kept explicit:
//!
//! ```text
//! Φ(x) = f(x) + Σ_eq [λ·c + ρ/2·c²] + Σ_ineq ρ/2·[max(0, h + μ/ρ)² − (μ/ρ)²]
//! ```
//!
//! with `c = g − target` for equalities and `h ≤ 0` for each finite side of an
//! inequality. Each outer iteration minimizes `Φ` over the box with projected
//! Newton steps (exact Hessian, diagonal regularization, Armijo search along
//! the projection arc), then updates multipliers and, when feasibility stalls,
//! the penalty `ρ`.
//!
//! Degenerate constraint sets (complementarity products, constraints that are
//! active together with their own product form) are handled without special
//! casing: the multipliers need not be unique for the merit function to have
//! a well-defined minimizer.
//!
//! The Newton systems are dense. This is a reference solver for small and
//! medium problems; large assemblies should submit to a sparse
//! interior-point implementation through [`NlpSolver`].

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, trace, warn};

use crate::linalg::regularized_newton_step;
use crate::{NlpProblem, NlpSolver, SolverOutput, TerminationStatus};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sufficient decrease parameter for the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Maximum step halvings per line search.
const MAX_BACKTRACKS: usize = 60;

/// Distance to a bound below which a variable may be treated as binding.
const ACTIVE_EPSILON: f64 = 1e-8;

/// Largest Newton step relative to `1 + ‖x‖∞`.
const MAX_RELATIVE_STEP: f64 = 1e3;

/// Penalty grows when constraint progress is worse than this ratio.
const PROGRESS_RATIO: f64 = 0.25;

/// Objective values below `-UNBOUNDED_OBJECTIVE` are reported as unbounded.
const UNBOUNDED_OBJECTIVE: f64 = 1e20;

/// Configuration for [`AugmentedLagrangianSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AugmentedLagrangianConfig {
    /// Stationarity tolerance (projected gradient of the merit function).
    pub tolerance: f64,

    /// Constraint violation tolerance.
    pub constraint_tolerance: f64,

    /// Maximum number of multiplier updates.
    pub max_outer_iterations: usize,

    /// Maximum number of Newton iterations per outer iteration.
    pub max_inner_iterations: usize,

    /// Initial penalty parameter.
    pub initial_penalty: f64,

    /// Factor applied to the penalty when feasibility stalls.
    pub penalty_growth: f64,

    /// Upper limit on the penalty parameter.
    pub max_penalty: f64,

    /// Log every outer iteration at `info` level instead of `trace`.
    pub verbose: bool,
}

impl Default for AugmentedLagrangianConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            constraint_tolerance: 1e-7,
            max_outer_iterations: 100,
            max_inner_iterations: 200,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e12,
            verbose: false,
        }
    }
}

impl AugmentedLagrangianConfig {
    /// Tighter tolerances and larger iteration budgets.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            tolerance: 1e-10,
            constraint_tolerance: 1e-9,
            max_outer_iterations: 200,
            max_inner_iterations: 400,
            ..Default::default()
        }
    }

    /// Looser tolerances for quick exploratory solves.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            tolerance: 1e-6,
            constraint_tolerance: 1e-5,
            max_outer_iterations: 50,
            max_inner_iterations: 100,
            ..Default::default()
        }
    }

    /// Set both convergence tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, tolerance: f64, constraint_tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self.constraint_tolerance = constraint_tolerance;
        self
    }

    /// Enable per-iteration logging.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.tolerance > 0.0) {
            return Err("tolerance must be positive");
        }
        if !(self.constraint_tolerance > 0.0) {
            return Err("constraint_tolerance must be positive");
        }
        if self.max_outer_iterations == 0 || self.max_inner_iterations == 0 {
            return Err("iteration limits must be at least 1");
        }
        if !(self.initial_penalty > 0.0) || self.initial_penalty > self.max_penalty {
            return Err("initial_penalty must be in (0, max_penalty]");
        }
        if !(self.penalty_growth > 1.0) {
            return Err("penalty_growth must exceed 1");
        }
        Ok(())
    }
}

/// Pure-Rust augmented Lagrangian NLP solver.
#[derive(Debug, Clone, Default)]
pub struct AugmentedLagrangianSolver {
    config: AugmentedLagrangianConfig,
}

impl AugmentedLagrangianSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: AugmentedLagrangianConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &AugmentedLagrangianConfig {
        &self.config
    }

    fn solve(&self, problem: &NlpProblem) -> SolverOutput {
        let n = problem.num_variables();
        if let Err(err) = problem.validate() {
            warn!(%err, "rejecting malformed problem");
            return SolverOutput::failed(TerminationStatus::InvalidProblem, n);
        }
        if let Err(reason) = self.config.validate() {
            warn!(reason, "rejecting solver configuration");
            return SolverOutput::failed(TerminationStatus::InvalidProblem, n);
        }
        if !problem.is_scaled() {
            return self.minimize(problem);
        }

        // Iterate in y = x / s; report in x.
        let scaled = self.minimize(&problem.scaled());
        let primal = problem.unscale(&scaled.primal);
        SolverOutput {
            status: scaled.status,
            objective: problem.objective().evaluate(&primal),
            constraint_violation: problem.max_violation(&primal),
            primal,
            iterations: scaled.iterations,
        }
    }

    #[allow(clippy::too_many_lines)]
    fn minimize(&self, problem: &NlpProblem) -> SolverOutput {
        let n = problem.num_variables();
        let rows = build_rows(problem);
        let lower = problem.lower_bounds();
        let upper = problem.upper_bounds();
        let tolerance = self.config.tolerance;
        let constraint_tolerance = self.config.constraint_tolerance;

        let mut x = problem.project(&DVector::from_column_slice(problem.initial()));
        let mut multipliers = vec![0.0; rows.len()];
        let mut penalty = self.config.initial_penalty;
        let mut inner_tolerance = if rows.is_empty() {
            tolerance
        } else {
            1e-2_f64.max(tolerance)
        };
        let mut previous_progress = f64::INFINITY;
        let mut iterations = 0;
        let mut status = None;

        debug!(
            variables = n,
            constraints = problem.num_constraints(),
            rows = rows.len(),
            "augmented Lagrangian solve"
        );

        for outer in 0..self.config.max_outer_iterations {
            let merit = Merit {
                problem,
                rows: &rows,
                multipliers: &multipliers,
                penalty,
            };
            let inner = minimize_in_box(
                &merit,
                &mut x,
                lower,
                upper,
                inner_tolerance,
                self.config.max_inner_iterations,
            );
            iterations += inner.iterations;

            if inner.failed || x.iter().any(|v| !v.is_finite()) {
                status = Some(TerminationStatus::NumericalError);
                break;
            }
            let objective = problem.objective().evaluate(&x);
            if objective < -UNBOUNDED_OBJECTIVE {
                status = Some(TerminationStatus::Unbounded);
                break;
            }

            let (feasibility, progress) = merit.measure(&x);
            update_multipliers(problem, &rows, &mut multipliers, penalty, &x);

            if self.config.verbose {
                info!(
                    outer,
                    objective,
                    feasibility,
                    stationarity = inner.stationarity,
                    penalty,
                    inner = inner.iterations,
                    "outer iteration"
                );
            } else {
                trace!(
                    outer,
                    objective,
                    feasibility,
                    stationarity = inner.stationarity,
                    penalty,
                    "outer iteration"
                );
            }

            if feasibility <= constraint_tolerance
                && progress <= constraint_tolerance
                && inner.converged
                && inner_tolerance <= tolerance
            {
                status = Some(TerminationStatus::Optimal);
                break;
            }

            if progress > PROGRESS_RATIO * previous_progress {
                penalty = (penalty * self.config.penalty_growth).min(self.config.max_penalty);
            }
            previous_progress = progress;
            inner_tolerance = (inner_tolerance * 0.1).max(tolerance);
        }

        let constraint_violation = problem.max_violation(&x);
        let status = status.unwrap_or(if constraint_violation <= constraint_tolerance {
            TerminationStatus::Feasible
        } else if penalty >= self.config.max_penalty {
            TerminationStatus::Infeasible
        } else {
            TerminationStatus::IterationLimit
        });

        debug!(%status, iterations, constraint_violation, "augmented Lagrangian finished");

        SolverOutput {
            status,
            objective: problem.objective().evaluate(&x),
            constraint_violation,
            primal: x,
            iterations,
        }
    }
}

impl NlpSolver for AugmentedLagrangianSolver {
    fn name(&self) -> &str {
        "augmented-lagrangian"
    }

    fn submit(&mut self, problem: &NlpProblem) -> SolverOutput {
        self.solve(problem)
    }
}

/// One scalar condition derived from a constraint.
#[derive(Debug, Clone, Copy)]
enum Row {
    /// `g(x) − target = 0`.
    Equality { constraint: usize, target: f64 },
    /// `sign·(g(x) − bound) ≤ 0`.
    Inequality {
        constraint: usize,
        sign: f64,
        bound: f64,
    },
}

fn build_rows(problem: &NlpProblem) -> Vec<Row> {
    let mut rows = Vec::with_capacity(problem.num_constraints());
    for (k, c) in problem.constraints().iter().enumerate() {
        if c.is_equality() {
            rows.push(Row::Equality {
                constraint: k,
                target: c.lower,
            });
            continue;
        }
        if c.lower.is_finite() {
            rows.push(Row::Inequality {
                constraint: k,
                sign: -1.0,
                bound: c.lower,
            });
        }
        if c.upper.is_finite() {
            rows.push(Row::Inequality {
                constraint: k,
                sign: 1.0,
                bound: c.upper,
            });
        }
    }
    rows
}

fn update_multipliers(
    problem: &NlpProblem,
    rows: &[Row],
    multipliers: &mut [f64],
    penalty: f64,
    x: &DVector<f64>,
) {
    let constraints = problem.constraints();
    for (row, lambda) in rows.iter().zip(multipliers.iter_mut()) {
        match *row {
            Row::Equality { constraint, target } => {
                *lambda += penalty * (constraints[constraint].expr.evaluate(x) - target);
            }
            Row::Inequality {
                constraint,
                sign,
                bound,
            } => {
                let h = sign * (constraints[constraint].expr.evaluate(x) - bound);
                *lambda = (*lambda + penalty * h).max(0.0);
            }
        }
    }
}

/// The augmented Lagrangian for fixed multipliers and penalty.
struct Merit<'a> {
    problem: &'a NlpProblem,
    rows: &'a [Row],
    multipliers: &'a [f64],
    penalty: f64,
}

/// Per-row contribution: (value, gradient weight, curvature weight).
struct RowTerm {
    value: f64,
    weight: f64,
    curvature: f64,
}

impl Merit<'_> {
    fn row_term(&self, row: Row, lambda: f64, x: &DVector<f64>) -> RowTerm {
        let rho = self.penalty;
        match row {
            Row::Equality { constraint, target } => {
                let c = self.problem.constraints()[constraint].expr.evaluate(x) - target;
                RowTerm {
                    value: lambda * c + 0.5 * rho * c * c,
                    weight: lambda + rho * c,
                    curvature: rho,
                }
            }
            Row::Inequality {
                constraint,
                sign,
                bound,
            } => {
                let h = sign * (self.problem.constraints()[constraint].expr.evaluate(x) - bound);
                let shifted = lambda / rho;
                let s = (h + shifted).max(0.0);
                RowTerm {
                    value: 0.5 * rho * (s * s - shifted * shifted),
                    weight: rho * s * sign,
                    curvature: if s > 0.0 { rho } else { 0.0 },
                }
            }
        }
    }

    fn constraint_of(row: Row) -> usize {
        match row {
            Row::Equality { constraint, .. } | Row::Inequality { constraint, .. } => constraint,
        }
    }

    fn value(&self, x: &DVector<f64>) -> f64 {
        self.rows
            .iter()
            .zip(self.multipliers)
            .fold(self.problem.objective().evaluate(x), |acc, (&row, &lambda)| {
                acc + self.row_term(row, lambda, x).value
            })
    }

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut gradient = DVector::zeros(x.len());
        self.problem.objective().add_gradient(x, 1.0, &mut gradient);
        for (&row, &lambda) in self.rows.iter().zip(self.multipliers) {
            let term = self.row_term(row, lambda, x);
            if term.weight != 0.0 {
                self.problem.constraints()[Self::constraint_of(row)]
                    .expr
                    .add_gradient(x, term.weight, &mut gradient);
            }
        }
        gradient
    }

    fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let n = x.len();
        let mut hessian = DMatrix::zeros(n, n);
        self.problem.objective().add_hessian(1.0, &mut hessian);
        for (&row, &lambda) in self.rows.iter().zip(self.multipliers) {
            let term = self.row_term(row, lambda, x);
            let expr = &self.problem.constraints()[Self::constraint_of(row)].expr;
            if term.weight != 0.0 {
                expr.add_hessian(term.weight, &mut hessian);
            }
            if term.curvature > 0.0 {
                let grad = expr.gradient_terms(x);
                for &(i, a) in &grad {
                    for &(j, b) in &grad {
                        hessian[(i, j)] += term.curvature * a * b;
                    }
                }
            }
        }
        hessian
    }

    /// Returns (plain infeasibility, multiplier-aware progress measure).
    fn measure(&self, x: &DVector<f64>) -> (f64, f64) {
        let mut feasibility = 0.0_f64;
        let mut progress = 0.0_f64;
        for (&row, &lambda) in self.rows.iter().zip(self.multipliers) {
            match row {
                Row::Equality { constraint, target } => {
                    let c = (self.problem.constraints()[constraint].expr.evaluate(x) - target).abs();
                    feasibility = feasibility.max(c);
                    progress = progress.max(c);
                }
                Row::Inequality {
                    constraint,
                    sign,
                    bound,
                } => {
                    let h = sign * (self.problem.constraints()[constraint].expr.evaluate(x) - bound);
                    feasibility = feasibility.max(h.max(0.0));
                    progress = progress.max((-h).min(lambda / self.penalty).abs());
                }
            }
        }
        (feasibility, progress)
    }
}

struct InnerOutcome {
    iterations: usize,
    stationarity: f64,
    converged: bool,
    failed: bool,
}

fn projected_gradient_norm(x: &DVector<f64>, gradient: &DVector<f64>, lower: &[f64], upper: &[f64]) -> f64 {
    (0..x.len())
        .map(|i| (x[i] - (x[i] - gradient[i]).max(lower[i]).min(upper[i])).abs())
        .fold(0.0, f64::max)
}

fn project(x: &DVector<f64>, lower: &[f64], upper: &[f64]) -> DVector<f64> {
    DVector::from_fn(x.len(), |i, _| x[i].max(lower[i]).min(upper[i]))
}

/// Minimize the merit function over the box `[lower, upper]`, starting at `x`.
fn minimize_in_box(
    merit: &Merit<'_>,
    x: &mut DVector<f64>,
    lower: &[f64],
    upper: &[f64],
    tolerance: f64,
    max_iterations: usize,
) -> InnerOutcome {
    let n = x.len();
    let mut value = merit.value(x);
    let mut stationarity = f64::INFINITY;

    for iteration in 0..max_iterations {
        let gradient = merit.gradient(x);
        stationarity = projected_gradient_norm(x, &gradient, lower, upper);
        if !stationarity.is_finite() || !value.is_finite() {
            return InnerOutcome {
                iterations: iteration,
                stationarity,
                converged: false,
                failed: true,
            };
        }
        if stationarity <= tolerance {
            return InnerOutcome {
                iterations: iteration,
                stationarity,
                converged: true,
                failed: false,
            };
        }

        // Variables pinned at a bound with the gradient pushing outward take a
        // gradient step (projected away); the rest take a Newton step.
        let epsilon = stationarity.min(ACTIVE_EPSILON);
        let binding: Vec<bool> = (0..n)
            .map(|i| {
                (x[i] - lower[i] <= epsilon && gradient[i] > 0.0)
                    || (upper[i] - x[i] <= epsilon && gradient[i] < 0.0)
            })
            .collect();
        let free: Vec<usize> = (0..n).filter(|&i| !binding[i]).collect();

        let mut direction = DVector::zeros(n);
        for i in (0..n).filter(|&i| binding[i]) {
            direction[i] = -gradient[i];
        }
        if !free.is_empty() {
            let hessian = merit.hessian(x);
            let reduced_hessian =
                DMatrix::from_fn(free.len(), free.len(), |a, b| hessian[(free[a], free[b])]);
            let reduced_gradient = DVector::from_fn(free.len(), |a, _| gradient[free[a]]);
            match regularized_newton_step(&reduced_hessian, &reduced_gradient) {
                Some((step, _)) => {
                    for (a, &i) in free.iter().enumerate() {
                        direction[i] = step[a];
                    }
                }
                None => {
                    for &i in &free {
                        direction[i] = -gradient[i];
                    }
                }
            }
        }

        let limit = MAX_RELATIVE_STEP * (1.0 + x.amax());
        let longest = direction.amax();
        if longest > limit {
            direction *= limit / longest;
        }

        let accepted = line_search(merit, x, value, &gradient, &direction, lower, upper)
            .or_else(|| line_search(merit, x, value, &gradient, &(-&gradient), lower, upper));
        match accepted {
            Some((next, next_value)) => {
                *x = next;
                value = next_value;
            }
            None => {
                // No decrease possible at working precision.
                return InnerOutcome {
                    iterations: iteration + 1,
                    stationarity,
                    converged: false,
                    failed: false,
                };
            }
        }
    }

    let gradient = merit.gradient(x);
    stationarity = stationarity.min(projected_gradient_norm(x, &gradient, lower, upper));
    InnerOutcome {
        iterations: max_iterations,
        stationarity,
        converged: stationarity <= tolerance,
        failed: !stationarity.is_finite(),
    }
}

/// Armijo backtracking along the projection arc `P(x + t·d)`.
fn line_search(
    merit: &Merit<'_>,
    x: &DVector<f64>,
    value: f64,
    gradient: &DVector<f64>,
    direction: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
) -> Option<(DVector<f64>, f64)> {
    let mut t = 1.0;
    for _ in 0..MAX_BACKTRACKS {
        let trial = project(&(x + direction * t), lower, upper);
        let step = &trial - x;
        if step.amax() == 0.0 {
            return None;
        }
        let slope = gradient.dot(&step);
        if slope < 0.0 {
            let trial_value = merit.value(&trial);
            if trial_value.is_finite() && trial_value <= value + ARMIJO * slope {
                return Some((trial, trial_value));
            }
        }
        t *= 0.5;
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{Constraint, LinearExpr, QuadraticExpr};
    use approx::assert_relative_eq;

    fn sum_of_squares(n: usize) -> QuadraticExpr {
        (0..n).fold(QuadraticExpr::zero(), |acc, i| {
            acc + LinearExpr::variable(i).square()
        })
    }

    #[test]
    fn test_config_validation() {
        assert!(AugmentedLagrangianConfig::default().validate().is_ok());
        assert!(AugmentedLagrangianConfig::fast().validate().is_ok());
        assert!(AugmentedLagrangianConfig::high_accuracy().validate().is_ok());

        let bad = AugmentedLagrangianConfig::default().with_tolerances(0.0, 1e-7);
        assert!(bad.validate().is_err());

        let bad = AugmentedLagrangianConfig {
            penalty_growth: 1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_unconstrained_quadratic() {
        // minimize (x0 - 1)² + (x1 + 2)²
        let mut problem = NlpProblem::new(2);
        problem.set_objective(
            LinearExpr::variable(0).plus_constant(-1.0).square()
                + LinearExpr::variable(1).plus_constant(2.0).square(),
        );
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert_eq!(output.status, TerminationStatus::Optimal);
        assert_relative_eq!(output.primal[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(output.primal[1], -2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_equality_constrained() {
        // minimize x0² + x1² + x2²  subject to  x0 + 2·x1 + 3·x2 = 14
        // → x = 14/14·(1, 2, 3) = (1, 2, 3)
        let mut problem = NlpProblem::new(3);
        problem.set_objective(sum_of_squares(3));
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(0)
                .with_term(1, 2.0)
                .with_term(2, 3.0)
                .into(),
            14.0,
        ));
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert!(output.status.is_success(), "status: {}", output.status);
        assert_relative_eq!(output.primal[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(output.primal[1], 2.0, epsilon = 1e-5);
        assert_relative_eq!(output.primal[2], 3.0, epsilon = 1e-5);
        assert!(output.constraint_violation <= 1e-7);
    }

    #[test]
    fn test_bounds_are_exact() {
        // minimize (x0 + 1)²  with x0 ≥ 0 → x0 = 0 exactly
        let mut problem = NlpProblem::new(1);
        problem.set_non_negative(0);
        problem.set_objective(LinearExpr::variable(0).plus_constant(1.0).square());
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert!(output.status.is_success());
        assert_eq!(output.primal[0], 0.0);
    }

    #[test]
    fn test_inequality_active() {
        // minimize (x0 - 3)²  subject to  x0 ≤ 1
        let mut problem = NlpProblem::new(1);
        problem.set_objective(LinearExpr::variable(0).plus_constant(-3.0).square());
        problem.add_constraint(Constraint::at_most(LinearExpr::variable(0).into(), 1.0));
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert!(output.status.is_success(), "status: {}", output.status);
        assert_relative_eq!(output.primal[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bilinear_complementarity() {
        // minimize (a - 1)² + (b - 1)²  subject to  a·b = 0,  a, b ≥ 0,  a - b = 0.5
        // → a = 0.5, b = 0
        let mut problem = NlpProblem::new(2);
        problem.set_non_negative(0);
        problem.set_non_negative(1);
        problem.set_objective(
            LinearExpr::variable(0).plus_constant(-1.0).square()
                + LinearExpr::variable(1).plus_constant(-1.0).square(),
        );
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(0).product(&LinearExpr::variable(1)),
            0.0,
        ));
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(0).with_term(1, -1.0).into(),
            0.5,
        ));
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert!(output.status.is_success(), "status: {}", output.status);
        assert_relative_eq!(output.primal[0], 0.5, epsilon = 1e-5);
        assert!(output.primal[1].abs() < 1e-5);
    }

    #[test]
    fn test_scaled_bilinear_coupling() {
        // minimize 1e-6·a²  subject to  t = 1,  t + a·d = 0,  a ≥ 0,  |d| ≤ 1e-3
        // → a = 1e3, d = -1e-3
        let mut problem = NlpProblem::new(3);
        problem.set_non_negative(1);
        problem.set_bounds(2, -1e-3, 1e-3);
        problem.set_scaling(1, 1e3);
        problem.set_scaling(2, 1e-3);
        problem.set_initial(vec![0.0, 10.0, 0.0]);
        problem.set_objective(LinearExpr::term(1, 1e-3).square());
        problem.add_constraint(Constraint::equal(LinearExpr::variable(0).into(), 1.0));
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(1).product(&LinearExpr::variable(2))
                + LinearExpr::variable(0).into(),
            0.0,
        ));

        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert!(output.status.is_success(), "status: {}", output.status);
        assert_relative_eq!(output.primal[1], 1e3, max_relative = 1e-4);
        assert_relative_eq!(output.primal[2], -1e-3, max_relative = 1e-4);
        assert_relative_eq!(output.objective, 1.0, max_relative = 1e-4);
        assert_relative_eq!(
            output.constraint_violation,
            problem.max_violation(&output.primal)
        );
    }

    #[test]
    fn test_infeasible_problem_reported() {
        // x0 = 1 and x0 = 2 cannot both hold.
        let mut problem = NlpProblem::new(1);
        problem.add_constraint(Constraint::equal(LinearExpr::variable(0).into(), 1.0));
        problem.add_constraint(Constraint::equal(LinearExpr::variable(0).into(), 2.0));
        let mut solver = AugmentedLagrangianSolver::new(AugmentedLagrangianConfig {
            max_outer_iterations: 30,
            ..Default::default()
        });
        let output = solver.submit(&problem);
        assert!(!output.status.is_success());
    }

    #[test]
    fn test_iteration_limit_reported() {
        let mut problem = NlpProblem::new(3);
        problem.set_objective(sum_of_squares(3));
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(0).with_term(1, 1.0).with_term(2, 1.0).into(),
            3.0,
        ));
        let mut solver = AugmentedLagrangianSolver::new(AugmentedLagrangianConfig {
            max_outer_iterations: 1,
            ..Default::default()
        });
        let output = solver.submit(&problem);
        assert_eq!(output.status, TerminationStatus::IterationLimit);
    }

    #[test]
    fn test_invalid_problem_rejected() {
        let mut problem = NlpProblem::new(1);
        problem.add_constraint(Constraint::equal(LinearExpr::variable(3).into(), 0.0));
        let output = AugmentedLagrangianSolver::default().submit(&problem);
        assert_eq!(output.status, TerminationStatus::InvalidProblem);
    }

    #[test]
    fn test_merit_gradient_matches_finite_difference() {
        let mut problem = NlpProblem::new(2);
        problem.set_objective(sum_of_squares(2));
        problem.add_constraint(Constraint::equal(
            LinearExpr::variable(0).product(&LinearExpr::variable(1).plus_constant(0.3)),
            0.2,
        ));
        problem.add_constraint(Constraint::between(
            LinearExpr::variable(0).with_term(1, -1.0).into(),
            -0.1,
            0.1,
        ));
        let rows = build_rows(&problem);
        let multipliers = vec![0.4, 0.0, 1.5];
        let merit = Merit {
            problem: &problem,
            rows: &rows,
            multipliers: &multipliers,
            penalty: 7.0,
        };

        let x = DVector::from_vec(vec![0.8, -0.4]);
        let gradient = merit.gradient(&x);
        let h = 1e-6;
        for i in 0..2 {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[i] += h;
            minus[i] -= h;
            let fd = (merit.value(&plus) - merit.value(&minus)) / (2.0 * h);
            assert_relative_eq!(gradient[i], fd, epsilon = 1e-5);
        }
    }
}
