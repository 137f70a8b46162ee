//! Post-solve residual checks.
//!
//! A solver that reports success has satisfied its own tolerances, which are
//! measured on the scaled problem it actually solved. These checks recompute
//! each physical condition from the extracted values and report whatever
//! exceeds the configured residual tolerance. Warnings never block write-back.

use std::fmt;

use tracing::warn;

use crate::{FrictionLaw, PenaltyFormulation, PenaltySolution};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which condition a residual measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResidualKind {
    /// Force and moment balance of a free block (index is the free block row).
    Equilibrium,
    /// `fn+ · fn-` at a vertex.
    Complementarity,
    /// `-(dn + eps)` where positive.
    Penetration,
    /// `(dn + eps) · fn+` at a vertex.
    Contact,
    /// Friction law residual at a vertex.
    Friction,
    /// `|d_k| - d_bnd` where positive.
    KinematicBound,
}

impl fmt::Display for ResidualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equilibrium => "equilibrium",
            Self::Complementarity => "complementarity",
            Self::Penetration => "penetration",
            Self::Contact => "contact",
            Self::Friction => "friction",
            Self::KinematicBound => "kinematic bound",
        };
        f.write_str(name)
    }
}

/// A residual above tolerance. Non-fatal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResidualWarning {
    /// What was measured.
    pub kind: ResidualKind,
    /// Vertex index, or free block row for equilibrium.
    pub index: usize,
    /// Magnitude of the residual.
    pub value: f64,
}

impl fmt::Display for ResidualWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} residual {:.3e} at {}", self.kind, self.value, self.index)
    }
}

/// Recompute every condition and collect those above `residual_tolerance`.
///
/// Each warning is also logged at `warn` level.
#[must_use]
pub fn check_residuals(
    formulation: &PenaltyFormulation,
    solution: &PenaltySolution,
) -> Vec<ResidualWarning> {
    let config = formulation.config();
    let tolerance = config.residual_tolerance;
    let mut warnings = Vec::new();
    let mut report = |kind, index, value: f64| {
        if !(value.abs() <= tolerance) {
            warnings.push(ResidualWarning {
                kind,
                index,
                value: value.abs(),
            });
        }
    };

    let wrench = formulation
        .static_operator()
        .mul_vec(&solution.force_vector())
        + formulation.load();
    for row in 0..wrench.len() / 6 {
        let worst = wrench.rows(6 * row, 6).amax();
        report(ResidualKind::Equilibrium, row, worst);
    }

    for (v, (force, d)) in solution.forces.iter().zip(&solution.kinematics).enumerate() {
        let gap = d.x + config.eps;
        report(
            ResidualKind::Complementarity,
            v,
            force.normal_push * force.normal_pull,
        );
        report(ResidualKind::Penetration, v, (-gap).max(0.0));
        report(ResidualKind::Contact, v, gap * force.normal_push);
        report(
            ResidualKind::KinematicBound,
            v,
            (d.amax() - config.d_bnd).max(0.0),
        );

        if config.friction == FrictionLaw::SlipCoupling {
            let alpha = solution.alpha[v];
            let slip = (force.tangent_u + alpha * d.y)
                .abs()
                .max((force.tangent_v + alpha * d.z).abs());
            let cone = (force.tangent_magnitude() - config.mu * force.normal_push).max(0.0);
            report(ResidualKind::Friction, v, slip.max(cone));
        }
    }

    if let Some(matrix) = formulation.friction_matrix() {
        let rows = matrix.operator().mul_vec(&solution.force_vector());
        let faces = matrix.faces();
        for v in 0..solution.forces.len() {
            let worst = rows.rows(faces * v, faces).max().max(0.0);
            report(ResidualKind::Friction, v, worst);
        }
    }

    for warning in &warnings {
        warn!(
            kind = %warning.kind,
            index = warning.index,
            value = warning.value,
            "residual above tolerance"
        );
    }
    warnings
}
