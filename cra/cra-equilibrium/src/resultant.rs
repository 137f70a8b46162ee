//! Interface force resultants.

use cra_types::{Assembly, Interface};
use nalgebra::{Point3, Vector3};

/// Net contact force of an interface and its point of application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceResultant {
    /// Application point, the contact points averaged with weights `fn+ - fn-`.
    pub position: Point3<f64>,
    /// Net force in world coordinates, as applied to the `to` block.
    pub force: Vector3<f64>,
}

/// Resultant of the forces written on an interface.
///
/// Returns `None` when the interface has no forces or the net normal force
/// is exactly zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn interface_resultant(interface: &Interface) -> Option<InterfaceResultant> {
    let forces = interface.forces.as_ref()?;

    let mut sum_n = 0.0;
    let mut sum_u = 0.0;
    let mut sum_v = 0.0;
    let mut weighted = Vector3::zeros();
    for (point, force) in interface.points.iter().zip(forces) {
        let n = force.net_normal();
        sum_n += n;
        sum_u += force.tangent_u;
        sum_v += force.tangent_v;
        weighted += point.coords * n;
    }

    if sum_n == 0.0 {
        return None;
    }

    Some(InterfaceResultant {
        position: Point3::from(weighted / sum_n),
        force: interface.frame.to_world(sum_n, sum_u, sum_v),
    })
}

/// Total weight of the free blocks, `Σ volume · density`.
#[must_use]
pub fn total_self_weight(assembly: &Assembly, density: f64) -> f64 {
    assembly
        .blocks()
        .iter()
        .filter(|b| b.is_free())
        .map(|b| b.weight(density))
        .sum()
}
