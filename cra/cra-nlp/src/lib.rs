//! Nonlinear programs with quadratic structure, and the solvers that take them.
//!
//! This crate is the seam between a problem formulation and the numerical
//! method that solves it:
//!
//! - [`LinearExpr`] / [`QuadraticExpr`] - Sparse expressions over the decision vector
//! - [`NlpProblem`] - Variable bounds and scales, initial point, objective, bounded constraints
//! - [`NlpSolver`] - The capability a formulation submits to
//! - [`AugmentedLagrangianSolver`] - A pure-Rust reference implementation
//!
//! # Problem Form
//!
//! ```text
//! minimize    f(x)
//! subject to  g_l ≤ g(x) ≤ g_u
//!             x_l ≤ x ≤ x_u
//! ```
//!
//! where `f` and every `g_i` are quadratic. Equalities have `g_l = g_u`.
//! Quadratic structure is enough for bilinear complementarity products and
//! smooth friction cones, and gives exact first and second derivatives.
//!
//! # Example
//!
//! ```
//! use cra_nlp::{AugmentedLagrangianSolver, Constraint, LinearExpr, NlpProblem, NlpSolver};
//!
//! // minimize x0² + x1²  subject to  x0 + x1 = 1
//! let mut problem = NlpProblem::new(2);
//! problem.set_objective(
//!     LinearExpr::variable(0).product(&LinearExpr::variable(0))
//!         + LinearExpr::variable(1).product(&LinearExpr::variable(1)),
//! );
//! problem.add_constraint(Constraint::equal(
//!     LinearExpr::variable(0).with_term(1, 1.0).into(),
//!     1.0,
//! ));
//!
//! let output = AugmentedLagrangianSolver::default().submit(&problem);
//! assert!(output.status.is_success());
//! assert!((output.primal[0] - 0.5).abs() < 1e-6);
//! ```

#![doc(html_root_url = "https://docs.rs/cra-nlp/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::suboptimal_flops,
    clippy::many_single_char_names
)]

mod augmented;
mod error;
mod expr;
mod linalg;
mod problem;
mod solver;

pub use augmented::{AugmentedLagrangianConfig, AugmentedLagrangianSolver};
pub use error::NlpError;
pub use expr::{LinearExpr, QuadraticExpr};
pub use problem::{Constraint, NlpProblem};
pub use solver::{NlpSolver, SolverOutput, TerminationStatus};

/// Result type for problem validation.
pub type Result<T> = std::result::Result<T, NlpError>;
