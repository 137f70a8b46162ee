//! Error types for assembly construction.

use thiserror::Error;

use crate::BlockId;

/// Errors raised while building an [`Assembly`](crate::Assembly).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// A block with this ID already exists.
    #[error("duplicate block: {0}")]
    DuplicateBlock(BlockId),

    /// An interface references a block that is not in the assembly.
    #[error("unknown block: {0}")]
    UnknownBlock(BlockId),

    /// An interface connects a block to itself.
    #[error("interface connects {0} to itself")]
    SelfContact(BlockId),

    /// An interface has no contact points.
    #[error("interface between {from} and {to} has no contact points")]
    EmptyInterface {
        /// Block on the negative side of the normal.
        from: BlockId,
        /// Block on the positive side of the normal.
        to: BlockId,
    },
}

impl AssemblyError {
    /// Check if this error references a missing block.
    #[must_use]
    pub fn is_unknown_block(&self) -> bool {
        matches!(self, Self::UnknownBlock(_))
    }
}
