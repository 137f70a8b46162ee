//! Ordered collection of blocks and contact interfaces.

use crate::{AssemblyError, Block, BlockId, Interface, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An assembly of rigid blocks connected by contact interfaces.
///
/// Blocks and interfaces keep insertion order. Analyses enumerate contact
/// vertices and free blocks in this order, so it must not change between
/// formulating a problem and writing its results back.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assembly {
    blocks: Vec<Block>,
    interfaces: Vec<Interface>,
}

impl Assembly {
    /// Create an empty assembly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block. Fails if its ID is already taken.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if self.block(block.id).is_some() {
            return Err(AssemblyError::DuplicateBlock(block.id));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Add an interface between two existing blocks.
    pub fn add_interface(&mut self, interface: Interface) -> Result<()> {
        if interface.from == interface.to {
            return Err(AssemblyError::SelfContact(interface.from));
        }
        for id in [interface.from, interface.to] {
            if self.block(id).is_none() {
                return Err(AssemblyError::UnknownBlock(id));
            }
        }
        if interface.is_empty() {
            return Err(AssemblyError::EmptyInterface {
                from: interface.from,
                to: interface.to,
            });
        }
        self.interfaces.push(interface);
        Ok(())
    }

    /// All blocks in insertion order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable access to all blocks.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// All interfaces in insertion order.
    #[must_use]
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Mutable access to all interfaces.
    pub fn interfaces_mut(&mut self) -> &mut [Interface] {
        &mut self.interfaces
    }

    /// Look up a block by ID.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Look up a block by ID for mutation.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Mark a block as support (or release it).
    pub fn set_support(&mut self, id: BlockId, is_support: bool) -> Result<()> {
        let block = self
            .block_mut(id)
            .ok_or(AssemblyError::UnknownBlock(id))?;
        block.is_support = is_support;
        Ok(())
    }

    /// Number of blocks.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of non-support blocks.
    #[must_use]
    pub fn num_free(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free()).count()
    }

    /// Total number of contact points over all interfaces.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.interfaces.iter().map(Interface::len).sum()
    }

    /// Interfaces touching the given block.
    pub fn incident_interfaces(&self, id: BlockId) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(move |i| i.touches(id))
    }

    /// Whether every interface and every free block carries analysis results.
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.interfaces.iter().all(|i| i.forces.is_some())
            && self
                .blocks
                .iter()
                .filter(|b| b.is_free())
                .all(|b| b.displacement.is_some())
    }

    /// Drop all forces and displacements written by previous analyses.
    pub fn clear_results(&mut self) {
        for interface in &mut self.interfaces {
            interface.forces = None;
        }
        for block in &mut self.blocks {
            block.displacement = None;
        }
    }
}
