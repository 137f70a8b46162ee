//! Result extraction and write-back.

use std::ops::Range;

use cra_nlp::{SolverOutput, TerminationStatus};
use cra_types::{Assembly, BlockId, ContactForce, Displacement};
use nalgebra::{DVector, Vector3};
use tracing::debug;

use crate::{CraError, PenaltyFormulation, Result, Topology};

/// Everything a successful solve determined, in vertex and free block order.
///
/// Immutable once extracted; [`apply`](Self::apply) only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltySolution {
    /// Termination status reported by the solver.
    pub status: TerminationStatus,
    /// Objective value at the solution.
    pub objective: f64,
    /// Contact force per vertex.
    pub forces: Vec<ContactForce>,
    /// Virtual displacement per free block.
    pub displacements: Vec<(BlockId, Displacement)>,
    /// Friction slack per vertex.
    pub alpha: Vec<f64>,
    /// `[dn, du, dv]` per vertex.
    pub kinematics: Vec<Vector3<f64>>,
    interface_ranges: Vec<Option<Range<usize>>>,
}

impl PenaltySolution {
    /// Interpret a solver output.
    ///
    /// Fails with [`CraError::SolverNonConvergence`] unless the status is
    /// optimal or feasible.
    pub fn extract(
        topology: &Topology,
        formulation: &PenaltyFormulation,
        output: &SolverOutput,
    ) -> Result<Self> {
        if !output.status.is_success() {
            return Err(CraError::SolverNonConvergence {
                status: output.status,
            });
        }

        let layout = formulation.layout();
        let expected = layout.num_variables();
        if output.primal.len() != expected {
            return Err(CraError::PrimalDimension {
                expected,
                actual: output.primal.len(),
            });
        }
        let x = &output.primal;

        let forces = (0..layout.num_vertices())
            .map(|v| {
                ContactForce::from_components([
                    x[layout.force(v, 0)],
                    x[layout.force(v, 1)],
                    x[layout.force(v, 2)],
                    x[layout.force(v, 3)],
                ])
            })
            .collect();

        let displacements = topology
            .free_blocks()
            .iter()
            .enumerate()
            .map(|(row, block)| {
                let q = Displacement::from_fn(|dof, _| x[layout.displacement(row, dof)]);
                (block.id, q)
            })
            .collect();

        let alpha = layout.alphas().map(|i| x[i]).collect();

        let q = DVector::from_iterator(
            layout.displacements().len(),
            layout.displacements().map(|i| x[i]),
        );
        let d = formulation.kinematic_operator().mul_transpose_vec(&q);
        let kinematics = (0..layout.num_vertices())
            .map(|v| Vector3::new(d[3 * v], d[3 * v + 1], d[3 * v + 2]))
            .collect();

        let interface_ranges = (0..topology.num_interfaces())
            .map(|k| topology.interface_vertices(k))
            .collect();

        Ok(Self {
            status: output.status,
            objective: output.objective,
            forces,
            displacements,
            alpha,
            kinematics,
            interface_ranges,
        })
    }

    /// Forces of one interface, or `None` if it carried no vertices.
    #[must_use]
    pub fn interface_forces(&self, interface: usize) -> Option<&[ContactForce]> {
        let range = self.interface_ranges.get(interface)?.clone()?;
        self.forces.get(range)
    }

    /// Decision-vector forces `[fn+, fn-, fu, fv]` stacked per vertex.
    #[must_use]
    pub fn force_vector(&self) -> DVector<f64> {
        DVector::from_iterator(
            4 * self.forces.len(),
            self.forces.iter().flat_map(ContactForce::components),
        )
    }

    /// Write forces onto interfaces and displacements onto free blocks.
    ///
    /// Checks that the assembly matches the one the solution came from
    /// before touching anything, so a mismatch leaves it unchanged.
    /// Interfaces the analysis skipped (between two supports, or without
    /// points) have their forces cleared. Applying the same solution twice
    /// gives the same state.
    pub fn apply(&self, assembly: &mut Assembly) -> Result<()> {
        if assembly.interfaces().len() != self.interface_ranges.len() {
            return Err(CraError::incompatible(format!(
                "assembly has {} interfaces, solution has {}",
                assembly.interfaces().len(),
                self.interface_ranges.len()
            )));
        }
        for (k, (interface, range)) in assembly
            .interfaces()
            .iter()
            .zip(&self.interface_ranges)
            .enumerate()
        {
            if let Some(range) = range {
                if interface.len() != range.len() {
                    return Err(CraError::incompatible(format!(
                        "interface {k} has {} points, solution has {}",
                        interface.len(),
                        range.len()
                    )));
                }
            }
        }
        for (id, _) in &self.displacements {
            match assembly.block(*id) {
                Some(block) if block.is_free() => {}
                _ => {
                    return Err(CraError::incompatible(format!(
                        "{id} is not a free block of the assembly"
                    )));
                }
            }
        }

        for (interface, range) in assembly.interfaces_mut().iter_mut().zip(&self.interface_ranges) {
            interface.forces = range
                .as_ref()
                .map(|range| self.forces[range.clone()].to_vec());
        }
        for (id, q) in &self.displacements {
            if let Some(block) = assembly.block_mut(*id) {
                block.displacement = Some(*q);
            }
        }

        debug!(
            vertices = self.forces.len(),
            blocks = self.displacements.len(),
            "wrote solution onto assembly"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::CraConfig;
    use cra_types::{Block, ContactFrame, Interface};
    use nalgebra::Point3;

    fn assembly() -> Assembly {
        let mut assembly = Assembly::new();
        assembly
            .add_block(Block::support(BlockId::new(0), Point3::new(0.0, 0.0, -0.5), 1.0))
            .unwrap();
        assembly
            .add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0))
            .unwrap();
        assembly
            .add_interface(Interface::new(
                BlockId::new(0),
                BlockId::new(1),
                vec![Point3::new(-0.5, 0.0, 0.0), Point3::new(0.5, 0.0, 0.0)],
                ContactFrame::from_normal(Vector3::z()),
            ))
            .unwrap();
        assembly
    }

    fn solved(status: TerminationStatus) -> (Topology, PenaltyFormulation, SolverOutput) {
        let topology = Topology::extract(&assembly()).unwrap();
        let formulation = PenaltyFormulation::build(&topology, &CraConfig::default()).unwrap();
        let layout = formulation.layout();
        let mut primal = DVector::zeros(layout.num_variables());
        primal[layout.normal_push(0)] = 0.5;
        primal[layout.normal_push(1)] = 0.5;
        primal[layout.tangent_u(1)] = 0.01;
        primal[layout.displacement(0, 2)] = -1e-4;
        primal[layout.alpha(1)] = 0.2;
        let output = SolverOutput {
            status,
            primal,
            objective: 0.5,
            constraint_violation: 0.0,
            iterations: 3,
        };
        (topology, formulation, output)
    }

    #[test]
    fn test_extract_values() {
        let (topology, formulation, output) = solved(TerminationStatus::Optimal);
        let solution = PenaltySolution::extract(&topology, &formulation, &output).unwrap();
        assert_eq!(solution.forces.len(), 2);
        assert_eq!(solution.forces[1], ContactForce::new(0.5, 0.0, 0.01, 0.0));
        assert_eq!(solution.alpha, vec![0.0, 0.2]);
        assert_eq!(solution.displacements[0].0, BlockId::new(1));
        assert_eq!(solution.displacements[0].1[2], -1e-4);
        assert!((solution.kinematics[0].x + 1e-4).abs() < 1e-15);
        assert_eq!(solution.interface_forces(0).unwrap().len(), 2);
        assert_eq!(solution.force_vector()[4], 0.5);
    }

    #[test]
    fn test_failed_status_rejected() {
        let (topology, formulation, output) = solved(TerminationStatus::Infeasible);
        let err = PenaltySolution::extract(&topology, &formulation, &output).unwrap_err();
        assert_eq!(
            err,
            CraError::SolverNonConvergence {
                status: TerminationStatus::Infeasible
            }
        );
    }

    #[test]
    fn test_wrong_primal_length_rejected() {
        let (topology, formulation, mut output) = solved(TerminationStatus::Feasible);
        output.primal = DVector::zeros(3);
        assert!(matches!(
            PenaltySolution::extract(&topology, &formulation, &output),
            Err(CraError::PrimalDimension { actual: 3, .. })
        ));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (topology, formulation, output) = solved(TerminationStatus::Optimal);
        let solution = PenaltySolution::extract(&topology, &formulation, &output).unwrap();

        let mut target = assembly();
        solution.apply(&mut target).unwrap();
        let once = target.clone();
        solution.apply(&mut target).unwrap();
        assert_eq!(once, target);

        assert!(target.has_results());
        assert!(target.block(BlockId::new(0)).unwrap().displacement.is_none());
        let forces = target.interfaces()[0].forces.as_ref().unwrap();
        assert_eq!(forces[0].normal_push, 0.5);
    }

    #[test]
    fn test_apply_clears_skipped_interfaces() {
        let mut target = assembly();
        target
            .add_block(Block::support(BlockId::new(2), Point3::new(2.0, 0.0, -0.5), 1.0))
            .unwrap();
        target
            .add_interface(Interface::new(
                BlockId::new(0),
                BlockId::new(2),
                vec![Point3::new(1.0, 0.0, -0.5)],
                ContactFrame::from_normal(Vector3::x()),
            ))
            .unwrap();
        target.interfaces_mut()[1].forces = Some(vec![ContactForce::new(3.0, 0.0, 0.0, 0.0)]);

        let topology = Topology::extract(&target).unwrap();
        assert_eq!(topology.interface_vertices(1), None);
        let formulation = PenaltyFormulation::build(&topology, &CraConfig::default()).unwrap();
        let (_, _, output) = solved(TerminationStatus::Optimal);
        let solution = PenaltySolution::extract(&topology, &formulation, &output).unwrap();

        solution.apply(&mut target).unwrap();
        assert!(target.interfaces()[0].forces.is_some());
        assert!(target.interfaces()[1].forces.is_none());
    }

    #[test]
    fn test_apply_mismatch_leaves_assembly_untouched() {
        let (topology, formulation, output) = solved(TerminationStatus::Optimal);
        let solution = PenaltySolution::extract(&topology, &formulation, &output).unwrap();

        let mut other = assembly();
        other.interfaces_mut()[0].points.push(Point3::new(0.0, 0.5, 0.0));
        let snapshot = other.clone();
        assert!(matches!(
            solution.apply(&mut other),
            Err(CraError::IncompatibleAssembly { .. })
        ));
        assert_eq!(other, snapshot);
    }
}
