//! Sparse equilibrium operators.
//!
//! Both operators have 6 rows per free block (force xyz, then moment xyz
//! about the centroid) and a fixed number of columns per contact vertex:
//!
//! - **kinematic** `K` (3 per vertex, directions `w`, `u`, `v`): `d = Kᵀ q`
//!   gives the relative normal and tangential displacement at each vertex.
//! - **static** `A` (4 per vertex, directions `w`, `-w`, `u`, `v`): `A f` is
//!   the net contact wrench on each free block.
//!
//! A direction `e` at point `p` adds `s·e` to the force rows and
//! `s·(p - c)×e` to the moment rows of each free block it touches, with
//! `s = +1` for the interface's `to` block and `s = -1` for `from`.
//!
//! # Sparsity
//!
//! Each column touches at most two blocks, so it carries at most 12
//! non-zeros regardless of assembly size.

use cra_nlp::LinearExpr;
use nalgebra::{DMatrix, DVector, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::{Topology, VertexBases};

/// Entries below this magnitude are dropped when assembling.
const DROP_TOLERANCE: f64 = 1e-15;

/// Sparse matrix in CSR format with the products the formulation needs.
#[derive(Debug, Clone)]
pub struct SparseOperator {
    matrix: CsrMatrix<f64>,
    num_rows: usize,
    num_cols: usize,
}

impl SparseOperator {
    /// Build from `(row, col, value)` triplets. Duplicates are summed.
    #[must_use]
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Self {
        let mut coo = CooMatrix::new(num_rows, num_cols);
        for &(row, col, val) in triplets {
            if val.abs() > DROP_TOLERANCE {
                coo.push(row, col, val);
            }
        }

        Self {
            matrix: CsrMatrix::from(&coo),
            num_rows,
            num_cols,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn nrows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// `M · v`.
    #[must_use]
    pub fn mul_vec(&self, v: &DVector<f64>) -> DVector<f64> {
        let mut result = DVector::zeros(self.num_rows);
        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            result[row_idx] = row
                .col_indices()
                .iter()
                .zip(row.values())
                .map(|(&col, &val)| val * v[col])
                .sum();
        }
        result
    }

    /// `Mᵀ · v`.
    #[must_use]
    pub fn mul_transpose_vec(&self, v: &DVector<f64>) -> DVector<f64> {
        let mut result = DVector::zeros(self.num_cols);
        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            let v_row = v[row_idx];
            for (&col, &val) in row.col_indices().iter().zip(row.values()) {
                result[col] += val * v_row;
            }
        }
        result
    }

    /// Each row as a linear form over decision variables, with column `j`
    /// mapped to variable `offset + j`.
    #[must_use]
    pub fn row_exprs(&self, offset: usize) -> Vec<LinearExpr> {
        self.matrix
            .row_iter()
            .map(|row| {
                let terms = row
                    .col_indices()
                    .iter()
                    .zip(row.values())
                    .map(|(&col, &val)| (offset + col, val))
                    .collect();
                LinearExpr::from_terms(terms, 0.0)
            })
            .collect()
    }

    /// Each column as a linear form over decision variables (the rows of
    /// `Mᵀ`), with row `i` mapped to variable `offset + i`.
    #[must_use]
    pub fn transpose_exprs(&self, offset: usize) -> Vec<LinearExpr> {
        let mut exprs = vec![LinearExpr::zero(); self.num_cols];
        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            for (&col, &val) in row.col_indices().iter().zip(row.values()) {
                exprs[col].add_term(offset + row_idx, val);
            }
        }
        exprs
    }

    /// Dense copy, for tests and small systems.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.num_rows, self.num_cols);
        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            for (&col, &val) in row.col_indices().iter().zip(row.values()) {
                dense[(row_idx, col)] = val;
            }
        }
        dense
    }

    /// Underlying CSR matrix.
    #[must_use]
    pub const fn csr(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }
}

/// Assemble an operator with `width` columns per vertex, where
/// `direction(vertex, k)` is the world direction of column `k`.
fn assemble<D>(topology: &Topology, width: usize, direction: D) -> SparseOperator
where
    D: Fn(usize, usize) -> Vector3<f64>,
{
    let num_rows = 6 * topology.num_free();
    let num_cols = width * topology.num_vertices();
    let mut triplets = Vec::with_capacity(12 * num_cols);

    for (v, vertex) in topology.vertices().iter().enumerate() {
        for (block, sign) in vertex.sides() {
            let Some(row) = topology.free_row(block) else {
                continue;
            };
            let lever = vertex.position - topology.free_blocks()[row].centroid;
            for k in 0..width {
                let e = direction(v, k);
                let moment = lever.cross(&e);
                let col = width * v + k;
                for i in 0..3 {
                    triplets.push((6 * row + i, col, sign * e[i]));
                    triplets.push((6 * row + 3 + i, col, sign * moment[i]));
                }
            }
        }
    }

    SparseOperator::from_triplets(num_rows, num_cols, &triplets)
}

/// Kinematic operator `K` (6F × 3V).
#[must_use]
pub fn kinematic_operator(topology: &Topology, bases: &VertexBases) -> SparseOperator {
    assemble(topology, 3, |v, k| bases.kinematic_direction(v, k))
}

/// Static operator `A` (6F × 4V).
#[must_use]
pub fn static_operator(topology: &Topology, bases: &VertexBases) -> SparseOperator {
    assemble(topology, 4, |v, k| bases.force_direction(v, k))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cra_types::{Assembly, Block, BlockId, ContactFrame, Interface};
    use nalgebra::Point3;
    use proptest::prelude::*;

    fn single_block(frame: ContactFrame) -> Topology {
        let mut assembly = Assembly::new();
        assembly
            .add_block(Block::support(BlockId::new(0), Point3::new(0.0, 0.0, -0.5), 1.0))
            .unwrap();
        assembly
            .add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0))
            .unwrap();
        let points = vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ];
        assembly
            .add_interface(Interface::new(BlockId::new(0), BlockId::new(1), points, frame))
            .unwrap();
        Topology::extract(&assembly).unwrap()
    }

    #[test]
    fn test_from_triplets_products() {
        let op = SparseOperator::from_triplets(
            2,
            3,
            &[(0, 0, 1.0), (0, 2, 2.0), (1, 1, -1.0), (1, 1, 4.0)],
        );
        assert_eq!(op.nnz(), 3);
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(op.mul_vec(&v), DVector::from_vec(vec![7.0, 6.0]));
        let w = DVector::from_vec(vec![1.0, -1.0]);
        assert_relative_eq!(op.mul_transpose_vec(&w), op.to_dense().transpose() * &w);
    }

    #[test]
    fn test_exprs_match_products() {
        let op = SparseOperator::from_triplets(2, 3, &[(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0)]);

        // Row forms over x = [pad, pad, c0, c1, c2]
        let x = DVector::from_vec(vec![9.0, 9.0, 1.0, 2.0, 3.0]);
        let rows = op.row_exprs(2);
        let direct = op.mul_vec(&DVector::from_vec(vec![1.0, 2.0, 3.0]));
        for (expr, expected) in rows.iter().zip(direct.iter()) {
            assert_relative_eq!(expr.evaluate(&x), *expected);
        }

        // Column forms over x = [pad, r0, r1]
        let x = DVector::from_vec(vec![9.0, 0.5, -2.0]);
        let cols = op.transpose_exprs(1);
        let direct = op.mul_transpose_vec(&DVector::from_vec(vec![0.5, -2.0]));
        assert_eq!(cols.len(), 3);
        for (expr, expected) in cols.iter().zip(direct.iter()) {
            assert_relative_eq!(expr.evaluate(&x), *expected);
        }
    }

    #[test]
    fn test_static_operator_single_block() {
        let topology = single_block(ContactFrame::from_normal(Vector3::z()));
        let bases = VertexBases::build(&topology);
        let a = static_operator(&topology, &bases);
        assert_eq!(a.nrows(), 6);
        assert_eq!(a.ncols(), 16);

        // Equal push at all four corners: pure vertical force, no moment.
        let mut f = DVector::zeros(16);
        for v in 0..4 {
            f[4 * v] = 0.25;
        }
        let wrench = a.mul_vec(&f);
        assert_relative_eq!(wrench[2], 1.0, epsilon = 1e-12);
        for i in [0, 1, 3, 4, 5] {
            assert_relative_eq!(wrench[i], 0.0, epsilon = 1e-12);
        }

        // Push at one corner tilts the block.
        let mut f = DVector::zeros(16);
        f[0] = 1.0;
        let wrench = a.mul_vec(&f);
        // lever (-0.5, -0.5, -0.5) × (0, 0, 1) = (-0.5, 0.5, 0)
        assert_relative_eq!(wrench[3], -0.5, epsilon = 1e-12);
        assert_relative_eq!(wrench[4], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_kinematics_follow_rigid_motion() {
        let topology = single_block(ContactFrame::from_normal(Vector3::z()));
        let bases = VertexBases::build(&topology);
        let k = kinematic_operator(&topology, &bases);

        // Compare with the rigid-body displacement of each vertex.
        let q = DVector::from_vec(vec![0.1, 0.0, 0.2, 0.01, 0.0, 0.0]);
        let d = k.mul_transpose_vec(&q);
        let t = Vector3::new(q[0], q[1], q[2]);
        let r = Vector3::new(q[3], q[4], q[5]);
        let centroid = Point3::new(0.0, 0.0, 0.5);
        for (v, vertex) in topology.vertices().iter().enumerate() {
            let moved = t + r.cross(&(vertex.position - centroid));
            let local = bases.kinematic(v) * moved;
            assert_relative_eq!(d[3 * v], local[0], epsilon = 1e-12);
            assert_relative_eq!(d[3 * v + 1], local[1], epsilon = 1e-12);
            assert_relative_eq!(d[3 * v + 2], local[2], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_from_block_sign_is_negative() {
        // Same contact seen with the free block as `from`.
        let mut assembly = Assembly::new();
        assembly
            .add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0))
            .unwrap();
        assembly
            .add_block(Block::support(BlockId::new(0), Point3::new(0.0, 0.0, -0.5), 1.0))
            .unwrap();
        assembly
            .add_interface(Interface::new(
                BlockId::new(1),
                BlockId::new(0),
                vec![Point3::new(0.0, 0.0, 0.0)],
                ContactFrame::from_normal(-Vector3::z()),
            ))
            .unwrap();
        let topology = Topology::extract(&assembly).unwrap();
        let bases = VertexBases::build(&topology);
        let a = static_operator(&topology, &bases);
        let wrench = a.mul_vec(&DVector::from_vec(vec![1.0, 0.0, 0.0, 0.0]));
        // Normal points down into the support; the push lifts the free block.
        assert_relative_eq!(wrench[2], 1.0, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn prop_duality(
            f in proptest::collection::vec(-1.0..1.0f64, 16),
            q in proptest::collection::vec(-1.0..1.0f64, 6),
        ) {
            // Virtual work: qᵀ(A f) equals the work of the world forces
            // through the kinematic operator's displacements.
            let topology = single_block(ContactFrame::from_normal(Vector3::new(0.1, -0.2, 1.0)));
            let bases = VertexBases::build(&topology);
            let a = static_operator(&topology, &bases);
            let k = kinematic_operator(&topology, &bases);
            let f = DVector::from_vec(f);
            let q = DVector::from_vec(q);

            let lhs = q.dot(&a.mul_vec(&f));
            let d = k.mul_transpose_vec(&q);
            let mut rhs = 0.0;
            for v in 0..topology.num_vertices() {
                let world_force = bases.force(v) * f.fixed_rows::<4>(4 * v);
                let world_disp = bases.kinematic(v).transpose() * d.fixed_rows::<3>(3 * v);
                rhs += world_force.dot(&world_disp);
            }
            prop_assert!((lhs - rhs).abs() < 1e-9);
        }
    }
}
