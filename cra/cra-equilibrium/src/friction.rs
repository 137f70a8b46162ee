//! Linearized friction cone.
//!
//! The Coulomb condition `|ft| ≤ mu·fn+` is replaced by a regular polygon
//! with `N` faces inscribed in the circle of radius `mu·fn+`. Face `k` has
//! outward direction `θ_k = 2πk/N` and sits at distance `mu·cos(π/N)·fn+`
//! from the axis, giving one row per face:
//!
//! ```text
//! cos θ_k · fu + sin θ_k · fv - mu·cos(π/N) · fn+ ≤ 0
//! ```
//!
//! Every force the polygon admits also satisfies the circular cone.

use std::f64::consts::PI;

use cra_nlp::LinearExpr;
use nalgebra::{DVector, Vector2};

use crate::SparseOperator;

/// Sparse `N·V × 4V` friction constraint matrix. `A_fr f ≤ 0`.
#[derive(Debug, Clone)]
pub struct FrictionMatrix {
    operator: SparseOperator,
    faces: usize,
}

impl FrictionMatrix {
    /// Build the pyramid rows for `num_vertices` vertices.
    ///
    /// `faces` is clamped to at least 3.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pyramidal(num_vertices: usize, mu: f64, faces: usize) -> Self {
        let faces = faces.max(3);
        let apothem = mu * (PI / faces as f64).cos();
        let directions: Vec<Vector2<f64>> = (0..faces)
            .map(|k| {
                let angle = 2.0 * PI * k as f64 / faces as f64;
                Vector2::new(angle.cos(), angle.sin())
            })
            .collect();

        let mut triplets = Vec::with_capacity(3 * faces * num_vertices);
        for v in 0..num_vertices {
            for (k, direction) in directions.iter().enumerate() {
                let row = faces * v + k;
                triplets.push((row, 4 * v, -apothem));
                triplets.push((row, 4 * v + 2, direction.x));
                triplets.push((row, 4 * v + 3, direction.y));
            }
        }

        Self {
            operator: SparseOperator::from_triplets(
                faces * num_vertices,
                4 * num_vertices,
                &triplets,
            ),
            faces,
        }
    }

    /// Faces per vertex.
    #[must_use]
    pub const fn faces(&self) -> usize {
        self.faces
    }

    /// The sparse matrix.
    #[must_use]
    pub const fn operator(&self) -> &SparseOperator {
        &self.operator
    }

    /// Rows as linear forms, force variables starting at `offset`.
    #[must_use]
    pub fn row_exprs(&self, offset: usize) -> Vec<LinearExpr> {
        self.operator.row_exprs(offset)
    }

    /// Largest row value `A_fr f` (positive means outside the pyramid).
    #[must_use]
    pub fn max_violation(&self, forces: &DVector<f64>) -> f64 {
        self.operator
            .mul_vec(forces)
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &r| acc.max(r))
    }
}
