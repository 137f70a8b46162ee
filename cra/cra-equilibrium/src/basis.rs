//! Per-vertex force and kinematic bases.

use cra_types::ContactFrame;
use nalgebra::{Matrix3, Matrix3x4, Vector3};

use crate::Topology;

/// Maps `[fn+, fn-, fu, fv]` to a world force: columns `w`, `-w`, `u`, `v`.
#[must_use]
pub fn force_basis(frame: &ContactFrame) -> Matrix3x4<f64> {
    Matrix3x4::from_columns(&[frame.normal, -frame.normal, frame.u, frame.v])
}

/// Maps a world displacement to `[dn, du, dv]`: rows `w`, `u`, `v`.
///
/// The transpose maps local kinematic components back to world.
#[must_use]
pub fn kinematic_basis(frame: &ContactFrame) -> Matrix3<f64> {
    Matrix3::from_rows(&[
        frame.normal.transpose(),
        frame.u.transpose(),
        frame.v.transpose(),
    ])
}

/// Bases for every contact vertex, in vertex order.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBases {
    force: Vec<Matrix3x4<f64>>,
    kinematic: Vec<Matrix3<f64>>,
}

impl VertexBases {
    /// Build both bases for every vertex.
    #[must_use]
    pub fn build(topology: &Topology) -> Self {
        let vertices = topology.vertices();
        Self {
            force: vertices.iter().map(|v| force_basis(&v.frame)).collect(),
            kinematic: vertices.iter().map(|v| kinematic_basis(&v.frame)).collect(),
        }
    }

    /// Number of vertices covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.force.len()
    }

    /// Whether no vertex is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// Force basis of one vertex.
    #[must_use]
    pub fn force(&self, vertex: usize) -> &Matrix3x4<f64> {
        &self.force[vertex]
    }

    /// Kinematic basis of one vertex.
    #[must_use]
    pub fn kinematic(&self, vertex: usize) -> &Matrix3<f64> {
        &self.kinematic[vertex]
    }

    /// Force direction `k` (0..4) of a vertex.
    #[must_use]
    pub fn force_direction(&self, vertex: usize, k: usize) -> Vector3<f64> {
        self.force[vertex].column(k).into_owned()
    }

    /// Kinematic direction `k` (0..3) of a vertex.
    #[must_use]
    pub fn kinematic_direction(&self, vertex: usize, k: usize) -> Vector3<f64> {
        self.kinematic[vertex].row(k).transpose()
    }
}
