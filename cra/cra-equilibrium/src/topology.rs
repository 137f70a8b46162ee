//! Contact vertex and free block indexing.
//!
//! Walks the assembly once and fixes the two orderings every other stage
//! relies on: contact vertices (interfaces in assembly order, points in
//! interface order) and free blocks (assembly order). Interfaces between two
//! supports contribute nothing and are skipped.

use std::ops::Range;

use cra_types::{Assembly, BlockId, ContactFrame};
use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::SetupError;

/// Tolerance for the frame orthonormality check.
pub const FRAME_TOLERANCE: f64 = 1e-6;

/// One contact point of one interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactVertex {
    /// Interface index in assembly order.
    pub interface: usize,
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Frame of the owning interface.
    pub frame: ContactFrame,
    /// Block the normal points away from.
    pub from: BlockId,
    /// Block the normal points into.
    pub to: BlockId,
}

impl ContactVertex {
    /// The two blocks with the sign each one's equilibrium receives:
    /// `+1` for `to`, `-1` for `from`.
    #[must_use]
    pub fn sides(&self) -> [(BlockId, f64); 2] {
        [(self.to, 1.0), (self.from, -1.0)]
    }
}

/// A non-support block that owns six displacement unknowns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeBlock {
    /// Block id.
    pub id: BlockId,
    /// Centroid, the reference point for moments and rotations.
    pub centroid: Point3<f64>,
    /// Volume.
    pub volume: f64,
}

/// Ordered vertex and free block mappings for one assembly.
#[derive(Debug, Clone)]
pub struct Topology {
    vertices: Vec<ContactVertex>,
    free_blocks: Vec<FreeBlock>,
    free_index: HashMap<BlockId, usize>,
    interface_ranges: Vec<Option<Range<usize>>>,
}

impl Topology {
    /// Index an assembly, rejecting anything that cannot yield a
    /// well-posed problem.
    pub fn extract(assembly: &Assembly) -> Result<Self, SetupError> {
        let mut support = HashMap::with_capacity(assembly.num_blocks());
        let mut free_blocks = Vec::new();
        let mut free_index = HashMap::new();
        for block in assembly.blocks() {
            support.insert(block.id, block.is_support);
            if block.is_free() {
                free_index.insert(block.id, free_blocks.len());
                free_blocks.push(FreeBlock {
                    id: block.id,
                    centroid: block.centroid,
                    volume: block.volume,
                });
            }
        }
        if free_blocks.is_empty() {
            return Err(SetupError::NoFreeBlocks);
        }

        let mut vertices = Vec::with_capacity(assembly.num_vertices());
        let mut interface_ranges = Vec::with_capacity(assembly.interfaces().len());
        let mut touched = vec![false; free_blocks.len()];

        for (k, interface) in assembly.interfaces().iter().enumerate() {
            let mut both_supports = true;
            for block in [interface.from, interface.to] {
                match support.get(&block) {
                    Some(&is_support) => both_supports &= is_support,
                    None => return Err(SetupError::UnknownBlock { interface: k, block }),
                }
            }
            if both_supports || interface.is_empty() {
                interface_ranges.push(None);
                continue;
            }
            if !interface.frame.is_orthonormal(FRAME_TOLERANCE) {
                return Err(SetupError::NonOrthonormalFrame { interface: k });
            }

            for block in [interface.from, interface.to] {
                if let Some(&row) = free_index.get(&block) {
                    touched[row] = true;
                }
            }

            let start = vertices.len();
            vertices.extend(interface.points.iter().map(|&position| ContactVertex {
                interface: k,
                position,
                frame: interface.frame,
                from: interface.from,
                to: interface.to,
            }));
            interface_ranges.push(Some(start..vertices.len()));
        }

        if let Some(row) = touched.iter().position(|t| !t) {
            return Err(SetupError::IsolatedFreeBlock(free_blocks[row].id));
        }
        if vertices.is_empty() {
            return Err(SetupError::NoContactVertices);
        }

        debug!(
            vertices = vertices.len(),
            free_blocks = free_blocks.len(),
            interfaces = interface_ranges.iter().flatten().count(),
            "indexed assembly"
        );

        Ok(Self {
            vertices,
            free_blocks,
            free_index,
            interface_ranges,
        })
    }

    /// Contact vertices in global order.
    #[must_use]
    pub fn vertices(&self) -> &[ContactVertex] {
        &self.vertices
    }

    /// Free blocks in assembly order.
    #[must_use]
    pub fn free_blocks(&self) -> &[FreeBlock] {
        &self.free_blocks
    }

    /// Number of contact vertices `V`.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of free blocks `F`.
    #[must_use]
    pub fn num_free(&self) -> usize {
        self.free_blocks.len()
    }

    /// Position of a block among the free blocks, or `None` for supports.
    #[must_use]
    pub fn free_row(&self, id: BlockId) -> Option<usize> {
        self.free_index.get(&id).copied()
    }

    /// Vertex range of an interface, or `None` if it was skipped.
    #[must_use]
    pub fn interface_vertices(&self, interface: usize) -> Option<Range<usize>> {
        self.interface_ranges.get(interface).cloned().flatten()
    }

    /// Number of interfaces in the indexed assembly, skipped ones included.
    #[must_use]
    pub fn num_interfaces(&self) -> usize {
        self.interface_ranges.len()
    }
}
