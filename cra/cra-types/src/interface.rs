//! Contact interfaces, local frames and force records.

use nalgebra::{Point3, Vector3};

use crate::BlockId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Local orthonormal frame of a contact interface.
///
/// `normal` points from the interface's `from` block into its `to` block.
/// `u` and `v` span the tangent plane, with `u × v = normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactFrame {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// First unit tangent.
    pub u: Vector3<f64>,
    /// Second unit tangent.
    pub v: Vector3<f64>,
}

impl ContactFrame {
    /// Create a frame from explicit axes. No orthonormalization is applied.
    #[must_use]
    pub const fn new(normal: Vector3<f64>, u: Vector3<f64>, v: Vector3<f64>) -> Self {
        Self { normal, u, v }
    }

    /// Build a right-handed frame around a normal.
    ///
    /// The first tangent is the component of world X orthogonal to the normal,
    /// or of world Y when the normal is nearly parallel to X.
    #[must_use]
    pub fn from_normal(normal: Vector3<f64>) -> Self {
        let n = normal.normalize();
        let reference = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = (reference - n * n.dot(&reference)).normalize();
        let v = n.cross(&u);
        Self { normal: n, u, v }
    }

    /// Check that all three axes are unit length and mutually orthogonal.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |a: &Vector3<f64>| (a.norm() - 1.0).abs() <= tolerance;
        unit(&self.normal)
            && unit(&self.u)
            && unit(&self.v)
            && self.normal.dot(&self.u).abs() <= tolerance
            && self.normal.dot(&self.v).abs() <= tolerance
            && self.u.dot(&self.v).abs() <= tolerance
    }

    /// Map local components `(normal, u, v)` to a world vector.
    #[must_use]
    pub fn to_world(&self, n: f64, u: f64, v: f64) -> Vector3<f64> {
        self.normal * n + self.u * u + self.v * v
    }
}

impl Default for ContactFrame {
    fn default() -> Self {
        Self::new(Vector3::z(), Vector3::x(), Vector3::y())
    }
}

/// Force at one contact point, in the interface's local frame.
///
/// The signed normal force is split into two non-negative parts: compression
/// (`normal_push`) and tension (`normal_pull`). At most one of them is
/// non-zero in an admissible solution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactForce {
    /// Compression magnitude (>= 0).
    pub normal_push: f64,
    /// Tension magnitude (>= 0).
    pub normal_pull: f64,
    /// Tangential component along `u`.
    pub tangent_u: f64,
    /// Tangential component along `v`.
    pub tangent_v: f64,
}

impl ContactForce {
    /// Create a force record.
    #[must_use]
    pub const fn new(normal_push: f64, normal_pull: f64, tangent_u: f64, tangent_v: f64) -> Self {
        Self {
            normal_push,
            normal_pull,
            tangent_u,
            tangent_v,
        }
    }

    /// Build from the 4-wide decision layout `[fn+, fn-, fu, fv]`.
    #[must_use]
    pub const fn from_components(components: [f64; 4]) -> Self {
        Self::new(components[0], components[1], components[2], components[3])
    }

    /// The 4-wide decision layout `[fn+, fn-, fu, fv]`.
    #[must_use]
    pub const fn components(&self) -> [f64; 4] {
        [
            self.normal_push,
            self.normal_pull,
            self.tangent_u,
            self.tangent_v,
        ]
    }

    /// Signed normal force (compression positive).
    #[must_use]
    pub fn net_normal(&self) -> f64 {
        self.normal_push - self.normal_pull
    }

    /// Magnitude of the tangential force.
    #[must_use]
    pub fn tangent_magnitude(&self) -> f64 {
        self.tangent_u.hypot(self.tangent_v)
    }

    /// Force vector in world coordinates, as applied to the `to` block.
    #[must_use]
    pub fn to_world(&self, frame: &ContactFrame) -> Vector3<f64> {
        frame.to_world(self.net_normal(), self.tangent_u, self.tangent_v)
    }
}

/// Contact interface between two blocks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interface {
    /// Block on the negative side of the normal.
    pub from: BlockId,
    /// Block on the positive side of the normal.
    pub to: BlockId,
    /// Ordered contact points (usually the interface polygon corners).
    pub points: Vec<Point3<f64>>,
    /// Local frame shared by all points.
    pub frame: ContactFrame,
    /// One force record per point, written by the last successful analysis.
    #[cfg_attr(feature = "serde", serde(default))]
    pub forces: Option<Vec<ContactForce>>,
}

impl Interface {
    /// Create an interface without results.
    #[must_use]
    pub fn new(from: BlockId, to: BlockId, points: Vec<Point3<f64>>, frame: ContactFrame) -> Self {
        Self {
            from,
            to,
            points,
            frame,
            forces: None,
        }
    }

    /// Number of contact points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the interface has no contact points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the interface touches the given block.
    #[must_use]
    pub fn touches(&self, block: BlockId) -> bool {
        self.from == block || self.to == block
    }

    /// Centroid of the contact points.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.points.len() as f64))
    }
}
