//! Penalty formulation of the equilibrium problem.
//!
//! # Variables
//!
//! ```text
//! x = [ f (4V) | q (6F) | alpha (V) ]
//! ```
//!
//! `f` holds `[fn+, fn-, fu, fv]` per vertex, `q` the virtual displacement
//! `[tx, ty, tz, rx, ry, rz]` per free block and `alpha` one friction slack per
//! vertex. `fn+`, `fn-` and `alpha` are bounded below by zero; the rest are
//! free. The initial point is zero.
//!
//! # Objective
//!
//! ```text
//! Σ w_alpha·alpha² + w_tension·fn-² + w_compression·fn+²
//! ```
//!
//! # Constraints
//!
//! | group              | rows      | form                                |
//! |--------------------|-----------|-------------------------------------|
//! | `equilibrium`      | 6F        | `A f = -p`                          |
//! | `complementarity`  | V         | `fn+ · fn- = 0`                     |
//! | `contact`          | V         | `(dn + eps) · fn+ = 0`              |
//! | `no_penetration`   | V         | `dn ≥ -eps`                         |
//! | `kinematic_bound`  | 3V        | `-d_bnd ≤ d_k ≤ d_bnd`              |
//! | `friction`         | 3V or N·V | depends on [`FrictionLaw`]          |
//!
//! The kinematic quantities `d = Kᵀ q` are never unknowns; each `dn`, `du`,
//! `dv` is an affine form in `q` substituted directly into the rows above.
//!
//! # Scaling
//!
//! Displacements live in `[-d_bnd, d_bnd]` while the slip coupling
//! `f_t + alpha·d_t = 0` drives `alpha` toward `|f_t| / d_bnd`. Each `q` is
//! scaled by `d_bnd` and each `alpha` by `1 / d_bnd`, so solvers that honor
//! [`NlpProblem::scaling`] see order-one unknowns on both sides of the product.

use std::ops::Range;

use cra_nlp::{Constraint, LinearExpr, NlpProblem, QuadraticExpr};
use nalgebra::DVector;
use tracing::debug;

use crate::{
    kinematic_operator, load_vector, static_operator, CraConfig, FrictionLaw, FrictionMatrix,
    Result, SparseOperator, Topology, VertexBases,
};

/// Constraint group names.
pub mod groups {
    /// Force and moment balance of each free block.
    pub const EQUILIBRIUM: &str = "equilibrium";
    /// `fn+ · fn- = 0`.
    pub const COMPLEMENTARITY: &str = "complementarity";
    /// `(dn + eps) · fn+ = 0`.
    pub const CONTACT: &str = "contact";
    /// Friction law rows.
    pub const FRICTION: &str = "friction";
    /// `dn + eps ≥ 0`.
    pub const NO_PENETRATION: &str = "no_penetration";
    /// `|d_k| ≤ d_bnd`.
    pub const KINEMATIC_BOUND: &str = "kinematic_bound";
}

/// Positions of the decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    num_vertices: usize,
    num_free: usize,
}

impl VariableLayout {
    /// Layout for `num_vertices` vertices and `num_free` free blocks.
    #[must_use]
    pub const fn new(num_vertices: usize, num_free: usize) -> Self {
        Self {
            num_vertices,
            num_free,
        }
    }

    /// Number of contact vertices.
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of free blocks.
    #[must_use]
    pub const fn num_free(&self) -> usize {
        self.num_free
    }

    /// Total number of variables, `4V + 6F + V`.
    #[must_use]
    pub const fn num_variables(&self) -> usize {
        5 * self.num_vertices + 6 * self.num_free
    }

    /// Force component `c` (0..4) of vertex `v`.
    #[must_use]
    pub const fn force(&self, v: usize, c: usize) -> usize {
        4 * v + c
    }

    /// `fn+` of vertex `v`.
    #[must_use]
    pub const fn normal_push(&self, v: usize) -> usize {
        4 * v
    }

    /// `fn-` of vertex `v`.
    #[must_use]
    pub const fn normal_pull(&self, v: usize) -> usize {
        4 * v + 1
    }

    /// `fu` of vertex `v`.
    #[must_use]
    pub const fn tangent_u(&self, v: usize) -> usize {
        4 * v + 2
    }

    /// `fv` of vertex `v`.
    #[must_use]
    pub const fn tangent_v(&self, v: usize) -> usize {
        4 * v + 3
    }

    /// First displacement variable.
    #[must_use]
    pub const fn displacement_offset(&self) -> usize {
        4 * self.num_vertices
    }

    /// Displacement component `dof` (0..6) of the free block at `row`.
    #[must_use]
    pub const fn displacement(&self, row: usize, dof: usize) -> usize {
        self.displacement_offset() + 6 * row + dof
    }

    /// First slack variable.
    #[must_use]
    pub const fn alpha_offset(&self) -> usize {
        4 * self.num_vertices + 6 * self.num_free
    }

    /// Friction slack of vertex `v`.
    #[must_use]
    pub const fn alpha(&self, v: usize) -> usize {
        self.alpha_offset() + v
    }

    /// All force variables.
    #[must_use]
    pub const fn forces(&self) -> Range<usize> {
        0..self.displacement_offset()
    }

    /// All displacement variables.
    #[must_use]
    pub const fn displacements(&self) -> Range<usize> {
        self.displacement_offset()..self.alpha_offset()
    }

    /// All slack variables.
    #[must_use]
    pub const fn alphas(&self) -> Range<usize> {
        self.alpha_offset()..self.num_variables()
    }
}

/// The assembled NLP together with the operators it was built from.
#[derive(Debug, Clone)]
pub struct PenaltyFormulation {
    layout: VariableLayout,
    problem: NlpProblem,
    static_op: SparseOperator,
    kinematic_op: SparseOperator,
    load: DVector<f64>,
    friction: Option<FrictionMatrix>,
    kinematics: Vec<LinearExpr>,
    config: CraConfig,
}

impl PenaltyFormulation {
    /// Assemble operators, load and friction rows, and declare the problem.
    pub fn build(topology: &Topology, config: &CraConfig) -> Result<Self> {
        config.validate()?;

        let layout = VariableLayout::new(topology.num_vertices(), topology.num_free());
        let num_vertices = layout.num_vertices();
        let bases = VertexBases::build(topology);
        let static_op = static_operator(topology, &bases);
        let kinematic_op = kinematic_operator(topology, &bases);
        let load = load_vector(topology, config.density);
        let kinematics = kinematic_op.transpose_exprs(layout.displacement_offset());

        let mut problem = NlpProblem::new(layout.num_variables());
        for v in 0..num_vertices {
            problem.set_non_negative(layout.normal_push(v));
            problem.set_non_negative(layout.normal_pull(v));
            problem.set_non_negative(layout.alpha(v));
            problem.set_scaling(layout.alpha(v), config.d_bnd.recip());
        }
        for index in layout.displacements() {
            problem.set_scaling(index, config.d_bnd);
        }

        let weights = config.weights;
        let mut objective = QuadraticExpr::zero();
        for v in 0..num_vertices {
            objective.add_quadratic(layout.alpha(v), layout.alpha(v), weights.alpha);
            objective.add_quadratic(layout.normal_pull(v), layout.normal_pull(v), weights.tension);
            objective.add_quadratic(
                layout.normal_push(v),
                layout.normal_push(v),
                weights.compression,
            );
        }
        problem.set_objective(objective);

        for (row, expr) in static_op.row_exprs(0).into_iter().enumerate() {
            problem.add_constraint(
                Constraint::equal(expr.into(), -load[row]).in_group(groups::EQUILIBRIUM),
            );
        }

        for v in 0..num_vertices {
            let push = LinearExpr::variable(layout.normal_push(v));
            let pull = LinearExpr::variable(layout.normal_pull(v));
            let dn = &kinematics[3 * v];

            problem.add_constraint(
                Constraint::equal(push.product(&pull), 0.0).in_group(groups::COMPLEMENTARITY),
            );
            problem.add_constraint(
                Constraint::equal(dn.clone().plus_constant(config.eps).product(&push), 0.0)
                    .in_group(groups::CONTACT),
            );
            problem.add_constraint(
                Constraint::at_least(dn.clone().into(), -config.eps)
                    .in_group(groups::NO_PENETRATION),
            );
        }

        let friction = match config.friction {
            FrictionLaw::SlipCoupling => {
                add_slip_coupling(&mut problem, &layout, &kinematics, config.mu);
                None
            }
            FrictionLaw::PyramidalCone { faces } => {
                let matrix = FrictionMatrix::pyramidal(num_vertices, config.mu, faces);
                for expr in matrix.row_exprs(0) {
                    problem.add_constraint(
                        Constraint::at_most(expr.into(), 0.0).in_group(groups::FRICTION),
                    );
                }
                Some(matrix)
            }
        };

        for d in &kinematics {
            problem.add_constraint(
                Constraint::between(d.clone().into(), -config.d_bnd, config.d_bnd)
                    .in_group(groups::KINEMATIC_BOUND),
            );
        }

        problem.validate()?;

        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            equalities = problem.num_equalities(),
            static_nnz = static_op.nnz(),
            kinematic_nnz = kinematic_op.nnz(),
            "penalty formulation assembled"
        );

        Ok(Self {
            layout,
            problem,
            static_op,
            kinematic_op,
            load,
            friction,
            kinematics,
            config: *config,
        })
    }

    /// Variable layout.
    #[must_use]
    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// The NLP to submit.
    #[must_use]
    pub fn problem(&self) -> &NlpProblem {
        &self.problem
    }

    /// Static operator `A`.
    #[must_use]
    pub fn static_operator(&self) -> &SparseOperator {
        &self.static_op
    }

    /// Kinematic operator `K`.
    #[must_use]
    pub fn kinematic_operator(&self) -> &SparseOperator {
        &self.kinematic_op
    }

    /// Load vector `p`.
    #[must_use]
    pub fn load(&self) -> &DVector<f64> {
        &self.load
    }

    /// Friction matrix, when the pyramidal law is active.
    #[must_use]
    pub fn friction_matrix(&self) -> Option<&FrictionMatrix> {
        self.friction.as_ref()
    }

    /// `[dn, du, dv]` of every vertex as affine forms in `q`, vertex-major.
    #[must_use]
    pub fn kinematics(&self) -> &[LinearExpr] {
        &self.kinematics
    }

    /// Configuration the problem was built with.
    #[must_use]
    pub fn config(&self) -> &CraConfig {
        &self.config
    }
}

/// `fu + alpha·du = 0`, `fv + alpha·dv = 0` and `mu²·fn+² ≥ fu² + fv²`.
fn add_slip_coupling(
    problem: &mut NlpProblem,
    layout: &VariableLayout,
    kinematics: &[LinearExpr],
    mu: f64,
) {
    for v in 0..layout.num_vertices() {
        let alpha = LinearExpr::variable(layout.alpha(v));
        let fu = LinearExpr::variable(layout.tangent_u(v));
        let fv = LinearExpr::variable(layout.tangent_v(v));
        let push = LinearExpr::variable(layout.normal_push(v));

        for (tangent, d) in [(&fu, &kinematics[3 * v + 1]), (&fv, &kinematics[3 * v + 2])] {
            let row = QuadraticExpr::from(tangent.clone()) + alpha.product(d);
            problem.add_constraint(Constraint::equal(row, 0.0).in_group(groups::FRICTION));
        }

        let cone = push.square() * (mu * mu) - fu.square() - fv.square();
        problem.add_constraint(Constraint::at_least(cone, 0.0).in_group(groups::FRICTION));
    }
}
