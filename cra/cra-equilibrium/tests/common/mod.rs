//! Shared assembly fixtures and scripted solvers.

#![allow(dead_code)]

use cra_equilibrium::{PenaltyFormulation, Topology};
use cra_nlp::{NlpProblem, NlpSolver, SolverOutput, TerminationStatus};
use cra_types::{Assembly, Block, BlockId, ContactFrame, Interface};
use nalgebra::{DVector, Point3, Vector3};

/// Corners of a unit square centered at `center`, spanned by the frame tangents.
pub fn square(center: Point3<f64>, frame: &ContactFrame, half: f64) -> Vec<Point3<f64>> {
    [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .iter()
        .map(|&(a, b)| center + frame.u * (a * half) + frame.v * (b * half))
        .collect()
}

/// A unit cube resting on a support, touching it at four corners.
pub fn cube_on_support() -> Assembly {
    let mut assembly = Assembly::new();
    assembly
        .add_block(Block::support(BlockId::new(0), Point3::new(0.0, 0.0, -0.5), 1.0))
        .expect("support");
    assembly
        .add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0))
        .expect("cube");
    let frame = ContactFrame::from_normal(Vector3::z());
    assembly
        .add_interface(Interface::new(
            BlockId::new(0),
            BlockId::new(1),
            square(Point3::origin(), &frame, 0.5),
            frame,
        ))
        .expect("interface");
    assembly
}

/// Two unit cubes stacked on a support.
pub fn two_block_stack() -> Assembly {
    let mut assembly = cube_on_support();
    assembly
        .add_block(Block::new(BlockId::new(2), Point3::new(0.0, 0.0, 1.5), 1.0))
        .expect("top cube");
    let frame = ContactFrame::from_normal(Vector3::z());
    assembly
        .add_interface(Interface::new(
            BlockId::new(1),
            BlockId::new(2),
            square(Point3::new(0.0, 0.0, 1.0), &frame, 0.5),
            frame,
        ))
        .expect("upper interface");
    assembly
}

/// Corners of an equilateral triangle inscribed in a circle of `radius`.
pub fn triangle(center: Point3<f64>, frame: &ContactFrame, radius: f64) -> Vec<Point3<f64>> {
    (0..3_u32)
        .map(|k| {
            let theta = std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * f64::from(k) / 3.0;
            center + frame.u * (radius * theta.cos()) + frame.v * (radius * theta.sin())
        })
        .collect()
}

/// A unit block on a plane tilted by `angle` about the y axis, touching it at
/// the points `outline` lays out in the plane.
fn block_on_incline(
    angle: f64,
    outline: impl FnOnce(Point3<f64>, &ContactFrame) -> Vec<Point3<f64>>,
) -> Assembly {
    let normal = Vector3::new(-angle.sin(), 0.0, angle.cos());
    let frame = ContactFrame::from_normal(normal);
    let center = Point3::origin();

    let mut assembly = Assembly::new();
    assembly
        .add_block(Block::support(BlockId::new(0), center - normal * 0.5, 1.0))
        .expect("support");
    assembly
        .add_block(Block::new(BlockId::new(1), center + normal * 0.5, 1.0))
        .expect("block");
    assembly
        .add_interface(Interface::new(
            BlockId::new(0),
            BlockId::new(1),
            outline(center, &frame),
            frame,
        ))
        .expect("interface");
    assembly
}

/// A unit cube on a plane tilted by `angle` about the y axis.
pub fn cube_on_incline(angle: f64) -> Assembly {
    block_on_incline(angle, |center, frame| square(center, frame, 0.5))
}

/// A unit block on a tilted plane, resting on three points.
///
/// With three contacts the normal forces follow from equilibrium alone, so no
/// internal tension can stand in for missing friction.
pub fn triangle_on_incline(angle: f64) -> Assembly {
    block_on_incline(angle, |center, frame| triangle(center, frame, 0.5))
}

/// Sum of `fn+` over an interface.
pub fn total_push(assembly: &Assembly, interface: usize) -> f64 {
    assembly.interfaces()[interface]
        .forces
        .as_ref()
        .map_or(0.0, |forces| forces.iter().map(|f| f.normal_push).sum())
}

/// The exact resting equilibrium of [`cube_on_support`] as a decision vector.
pub fn resting_cube_primal(formulation: &PenaltyFormulation) -> DVector<f64> {
    let layout = formulation.layout();
    let mut x = DVector::zeros(layout.num_variables());
    for v in 0..layout.num_vertices() {
        x[layout.normal_push(v)] = 0.25;
    }
    x[layout.displacement(0, 2)] = -formulation.config().eps;
    x
}

/// Solver that returns a fixed answer and counts submissions.
pub struct ScriptedSolver {
    pub status: TerminationStatus,
    pub primal: Option<DVector<f64>>,
    pub calls: usize,
}

impl ScriptedSolver {
    pub fn returning(status: TerminationStatus) -> Self {
        Self {
            status,
            primal: None,
            calls: 0,
        }
    }

    pub fn with_primal(mut self, primal: DVector<f64>) -> Self {
        self.primal = Some(primal);
        self
    }
}

impl NlpSolver for ScriptedSolver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn submit(&mut self, problem: &NlpProblem) -> SolverOutput {
        self.calls += 1;
        let primal = self
            .primal
            .clone()
            .unwrap_or_else(|| DVector::from_element(problem.num_variables(), 0.125));
        // A primal of the wrong length cannot be evaluated against the problem.
        let (objective, constraint_violation) = if primal.len() == problem.num_variables() {
            (
                problem.objective().evaluate(&primal),
                problem.max_violation(&primal),
            )
        } else {
            (f64::NAN, f64::INFINITY)
        };
        SolverOutput {
            status: self.status,
            objective,
            constraint_violation,
            primal,
            iterations: 1,
        }
    }
}

/// Build the formulation of an assembly without solving it.
pub fn formulate(assembly: &Assembly, config: &cra_equilibrium::CraConfig) -> PenaltyFormulation {
    let topology = Topology::extract(assembly).expect("valid assembly");
    PenaltyFormulation::build(&topology, config).expect("valid formulation")
}
