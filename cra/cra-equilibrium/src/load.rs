//! Self-weight load vector.

use nalgebra::DVector;

use crate::Topology;

/// Gravity load on the free blocks, 6 entries per block in operator row
/// order: `[0, 0, -volume·density, 0, 0, 0]`.
///
/// Equilibrium requires `A f + p = 0`.
#[must_use]
pub fn load_vector(topology: &Topology, density: f64) -> DVector<f64> {
    let mut load = DVector::zeros(6 * topology.num_free());
    for (row, block) in topology.free_blocks().iter().enumerate() {
        load[6 * row + 2] = -block.volume * density;
    }
    load
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use cra_types::{Assembly, Block, BlockId, ContactFrame, Interface};
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_only_vertical_force_entries() {
        let mut assembly = Assembly::new();
        assembly
            .add_block(Block::support(BlockId::new(0), Point3::origin(), 8.0))
            .unwrap();
        assembly
            .add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 1.0), 2.0))
            .unwrap();
        assembly
            .add_block(Block::new(BlockId::new(2), Point3::new(0.0, 0.0, 2.0), 0.5))
            .unwrap();
        let frame = ContactFrame::from_normal(Vector3::z());
        assembly
            .add_interface(Interface::new(
                BlockId::new(0),
                BlockId::new(1),
                vec![Point3::new(0.0, 0.0, 0.5)],
                frame,
            ))
            .unwrap();
        assembly
            .add_interface(Interface::new(
                BlockId::new(1),
                BlockId::new(2),
                vec![Point3::new(0.0, 0.0, 1.5)],
                frame,
            ))
            .unwrap();
        let topology = Topology::extract(&assembly).unwrap();

        let load = load_vector(&topology, 2.5);
        assert_eq!(load.len(), 12);
        assert_eq!(load[2], -5.0);
        assert_eq!(load[8], -1.25);
        let others: f64 = load.iter().map(|v| v.abs()).sum::<f64>() - 6.25;
        assert!(others.abs() < 1e-12);
    }
}
