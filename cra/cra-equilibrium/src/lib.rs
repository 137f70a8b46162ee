//! Coupled rigid-block analysis with a penalty formulation.
//!
//! Given an [`Assembly`](cra_types::Assembly) of rigid blocks in frictional
//! unilateral contact, this crate finds contact forces that hold every free
//! block in static equilibrium under self-weight, together with a compatible
//! virtual displacement field, and writes both back onto the assembly.
//!
//! # Pipeline
//!
//! 1. [`Topology`] - Orders contact vertices and free blocks, validates setup
//! 2. [`VertexBases`] - Per-vertex force and kinematic bases from interface frames
//! 3. [`static_operator`] / [`kinematic_operator`] - Sparse equilibrium operators
//! 4. [`load_vector`] - Self-weight per free block
//! 5. [`FrictionMatrix`] - Linearized friction cone rows
//! 6. [`PenaltyFormulation`] - Variables, objective and constraints as an NLP
//! 7. [`NlpSolver`](cra_nlp::NlpSolver) - Any solver; one submission, no retry
//! 8. [`PenaltySolution`] - Extraction and atomic write-back
//! 9. [`check_residuals`] - Non-fatal physical residual checks
//!
//! [`cra_penalty_solve`] runs all of it with the built-in solver;
//! [`cra_penalty_solve_with`] takes any solver.
//!
//! # Formulation
//!
//! Normal forces are split into compression `fn+ ≥ 0` and tension `fn- ≥ 0`
//! with `fn+ · fn- = 0`. Tension is heavily penalized, so it appears only
//! where equilibrium is impossible without it. A vertex may carry
//! compression only where the relative normal displacement reaches the
//! contact offset, `(dn + eps) · fn+ = 0`, and may never penetrate past it.
//! Friction follows the configured [`FrictionLaw`].
//!
//! # Conventions
//!
//! Interface normals point from the `from` block into the `to` block.
//! Reported forces act on `to`; `from` receives the opposite.

#![doc(html_root_url = "https://docs.rs/cra-equilibrium/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::suboptimal_flops
)]

mod basis;
mod config;
mod error;
mod extract;
mod formulation;
mod friction;
mod load;
mod operator;
mod residual;
mod resultant;
mod solve;
mod topology;

pub use basis::{force_basis, kinematic_basis, VertexBases};
pub use config::{CraConfig, FrictionLaw, ObjectiveWeights};
pub use error::{CraError, SetupError};
pub use extract::PenaltySolution;
pub use formulation::{groups, PenaltyFormulation, VariableLayout};
pub use friction::FrictionMatrix;
pub use load::load_vector;
pub use operator::{kinematic_operator, static_operator, SparseOperator};
pub use residual::{check_residuals, ResidualKind, ResidualWarning};
pub use resultant::{interface_resultant, total_self_weight, InterfaceResultant};
pub use solve::{cra_penalty_solve, cra_penalty_solve_with, SolveReport};
pub use topology::{ContactVertex, FreeBlock, Topology, FRAME_TOLERANCE};

/// Result type for equilibrium analysis.
pub type Result<T> = std::result::Result<T, CraError>;
