//! Problem instance handed to a solver.

use nalgebra::DVector;

use crate::{NlpError, QuadraticExpr, Result};

/// A bounded constraint `lower ≤ g(x) ≤ upper`.
///
/// Use `f64::NEG_INFINITY` / `f64::INFINITY` for one-sided constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Constraint function.
    pub expr: QuadraticExpr,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Family name, used in diagnostics.
    pub group: &'static str,
}

impl Constraint {
    /// `g(x) = value`.
    #[must_use]
    pub fn equal(expr: QuadraticExpr, value: f64) -> Self {
        Self::between(expr, value, value)
    }

    /// `g(x) ≥ lower`.
    #[must_use]
    pub fn at_least(expr: QuadraticExpr, lower: f64) -> Self {
        Self::between(expr, lower, f64::INFINITY)
    }

    /// `g(x) ≤ upper`.
    #[must_use]
    pub fn at_most(expr: QuadraticExpr, upper: f64) -> Self {
        Self::between(expr, f64::NEG_INFINITY, upper)
    }

    /// `lower ≤ g(x) ≤ upper`.
    #[must_use]
    pub fn between(expr: QuadraticExpr, lower: f64, upper: f64) -> Self {
        Self {
            expr,
            lower,
            upper,
            group: "constraint",
        }
    }

    /// Tag the constraint with a family name.
    #[must_use]
    pub fn in_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Whether this is an equality constraint.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// Amount by which `x` violates the constraint (0 when satisfied).
    #[must_use]
    pub fn violation(&self, x: &DVector<f64>) -> f64 {
        let g = self.expr.evaluate(x);
        (self.lower - g).max(g - self.upper).max(0.0)
    }
}

/// A nonlinear program with quadratic objective and constraints.
///
/// Each variable carries a scale factor `s`. Solvers that honor scaling work
/// on `y = x / s`, so a variable of natural magnitude `s` becomes order one.
/// The problem is always stated and reported in `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpProblem {
    lower: Vec<f64>,
    upper: Vec<f64>,
    initial: Vec<f64>,
    scaling: Vec<f64>,
    objective: QuadraticExpr,
    constraints: Vec<Constraint>,
}

impl NlpProblem {
    /// Create a problem with `num_variables` free variables, zero initial
    /// point, unit scaling, zero objective and no constraints.
    #[must_use]
    pub fn new(num_variables: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; num_variables],
            upper: vec![f64::INFINITY; num_variables],
            initial: vec![0.0; num_variables],
            scaling: vec![1.0; num_variables],
            objective: QuadraticExpr::zero(),
            constraints: Vec::new(),
        }
    }

    /// Set bounds on one variable.
    pub fn set_bounds(&mut self, index: usize, lower: f64, upper: f64) {
        if index < self.lower.len() {
            self.lower[index] = lower;
            self.upper[index] = upper;
        }
    }

    /// Restrict one variable to `[0, ∞)`.
    pub fn set_non_negative(&mut self, index: usize) {
        self.set_bounds(index, 0.0, f64::INFINITY);
    }

    /// Set the typical magnitude of one variable.
    pub fn set_scaling(&mut self, index: usize, factor: f64) {
        if let Some(s) = self.scaling.get_mut(index) {
            *s = factor;
        }
    }

    /// Replace the initial point.
    pub fn set_initial(&mut self, initial: Vec<f64>) {
        self.initial = initial;
    }

    /// Replace the objective.
    pub fn set_objective(&mut self, objective: QuadraticExpr) {
        self.objective = objective;
    }

    /// Append a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Number of decision variables.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.lower.len()
    }

    /// Number of constraints.
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of equality constraints.
    #[must_use]
    pub fn num_equalities(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_equality()).count()
    }

    /// Variable lower bounds.
    #[must_use]
    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    /// Variable upper bounds.
    #[must_use]
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    /// Initial point.
    #[must_use]
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    /// Variable scale factors.
    #[must_use]
    pub fn scaling(&self) -> &[f64] {
        &self.scaling
    }

    /// Whether any variable has a non-unit scale.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_scaled(&self) -> bool {
        self.scaling.iter().any(|&s| s != 1.0)
    }

    /// The same program stated in `y = x / s`, with unit scaling.
    ///
    /// Constraint values are unchanged by the substitution, so a point is
    /// feasible for the scaled program exactly when its image under
    /// [`unscale`](Self::unscale) is feasible for this one.
    #[must_use]
    pub fn scaled(&self) -> Self {
        let s = &self.scaling;
        let divide = |values: &[f64]| -> Vec<f64> {
            values.iter().zip(s).map(|(&v, &si)| v / si).collect()
        };
        Self {
            lower: divide(&self.lower),
            upper: divide(&self.upper),
            initial: divide(&self.initial),
            scaling: vec![1.0; s.len()],
            objective: self.objective.rescaled(s),
            constraints: self
                .constraints
                .iter()
                .map(|c| Constraint {
                    expr: c.expr.rescaled(s),
                    ..c.clone()
                })
                .collect(),
        }
    }

    /// Map a point of the [`scaled`](Self::scaled) program back to `x`.
    #[must_use]
    pub fn unscale(&self, y: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            y.len(),
            y.iter()
                .enumerate()
                .map(|(i, &v)| v * self.scaling.get(i).copied().unwrap_or(1.0)),
        )
    }

    /// Objective.
    #[must_use]
    pub fn objective(&self) -> &QuadraticExpr {
        &self.objective
    }

    /// Constraints in insertion order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Constraints belonging to one family.
    pub fn constraints_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Constraint> {
        self.constraints.iter().filter(move |c| c.group == group)
    }

    /// Clamp a point into the variable bounds.
    #[must_use]
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            x.len(),
            x.iter()
                .enumerate()
                .map(|(i, &v)| v.max(self.lower[i]).min(self.upper[i])),
        )
    }

    /// Largest constraint or bound violation at `x`.
    #[must_use]
    pub fn max_violation(&self, x: &DVector<f64>) -> f64 {
        let bounds = x
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.lower[i] - v).max(v - self.upper[i]).max(0.0));
        let constraints = self.constraints.iter().map(|c| c.violation(x));
        bounds.chain(constraints).fold(0.0, f64::max)
    }

    /// Check that every index is in range, every bound pair is ordered and
    /// every scale factor is positive.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_variables();
        if self.initial.len() != n {
            return Err(NlpError::DimensionMismatch {
                expected: n,
                actual: self.initial.len(),
            });
        }

        if let Some((index, &factor)) = self
            .scaling
            .iter()
            .enumerate()
            .find(|&(_, &s)| !(s.is_finite() && s > 0.0))
        {
            return Err(NlpError::InvalidScaling { index, factor });
        }

        for i in 0..n {
            if self.lower[i].is_nan() || self.upper[i].is_nan() || self.lower[i] > self.upper[i] {
                return Err(NlpError::InvalidBounds {
                    context: format!("x[{i}]"),
                    lower: self.lower[i],
                    upper: self.upper[i],
                });
            }
        }

        let check_index = |context: String, expr: &QuadraticExpr| match expr.max_index() {
            Some(index) if index >= n => Err(NlpError::VariableOutOfRange {
                context,
                index,
                num_variables: n,
            }),
            _ => Ok(()),
        };

        check_index("objective".to_string(), &self.objective)?;
        for (k, c) in self.constraints.iter().enumerate() {
            check_index(format!("{} constraint {k}", c.group), &c.expr)?;
            if c.lower.is_nan() || c.upper.is_nan() || c.lower > c.upper {
                return Err(NlpError::InvalidBounds {
                    context: format!("{} constraint {k}", c.group),
                    lower: c.lower,
                    upper: c.upper,
                });
            }
        }

        Ok(())
    }
}
