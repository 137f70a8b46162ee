//! Error types for equilibrium analysis.

use cra_nlp::{NlpError, TerminationStatus};
use cra_types::BlockId;
use thiserror::Error;

/// The assembly cannot be turned into a well-posed problem.
///
/// Detected before anything is submitted to a solver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// No interface contributes a contact point between a free block and
    /// anything else.
    #[error("assembly has no contact vertices")]
    NoContactVertices,

    /// Every block is a support.
    #[error("assembly has no free blocks")]
    NoFreeBlocks,

    /// A free block is not touched by any interface.
    #[error("free block {0} has no incident interface")]
    IsolatedFreeBlock(BlockId),

    /// An interface frame is not orthonormal.
    #[error("interface {interface} has a non-orthonormal frame")]
    NonOrthonormalFrame {
        /// Interface index in assembly order.
        interface: usize,
    },

    /// An interface references a block that is not in the assembly.
    #[error("interface {interface} references unknown block {block}")]
    UnknownBlock {
        /// Interface index in assembly order.
        interface: usize,
        /// The missing block.
        block: BlockId,
    },
}

/// Errors from [`cra_penalty_solve`](crate::cra_penalty_solve) and its parts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CraError {
    /// The assembly failed setup validation.
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// The formulation produced a problem the solver layer rejects.
    #[error("malformed problem: {0}")]
    Problem(#[from] NlpError),

    /// The solver ended with a status other than optimal or feasible.
    #[error("solver did not converge: {status}")]
    SolverNonConvergence {
        /// The reported termination status.
        status: TerminationStatus,
    },

    /// The solver returned a primal vector of the wrong length.
    #[error("solver returned {actual} primal values, expected {expected}")]
    PrimalDimension {
        /// Number of declared variables.
        expected: usize,
        /// Number returned.
        actual: usize,
    },

    /// A solution was applied to an assembly with a different topology.
    #[error("solution does not match assembly: {reason}")]
    IncompatibleAssembly {
        /// What differs.
        reason: String,
    },
}

impl CraError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an incompatible assembly error.
    #[must_use]
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::IncompatibleAssembly {
            reason: reason.into(),
        }
    }

    /// Check if this is a setup error.
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::Setup(_))
    }

    /// Check if this is a solver non-convergence error.
    #[must_use]
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::SolverNonConvergence { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
