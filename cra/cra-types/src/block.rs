//! Rigid block types.

use nalgebra::{Point3, Vector3, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Virtual displacement of a block: `[tx, ty, tz, rx, ry, rz]`.
///
/// Translations first, then small rotations about the centroid.
pub type Displacement = Vector6<f64>;

/// Unique identifier for a block in an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockId(pub u64);

impl BlockId {
    /// Create a new block ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// A rigid block.
///
/// Supports are fixed in space: they carry no displacement unknowns and never
/// receive a displacement during write-back.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    /// Block identifier.
    pub id: BlockId,
    /// Whether this block is a fixed support.
    pub is_support: bool,
    /// Block volume.
    pub volume: f64,
    /// Block centroid in world coordinates.
    pub centroid: Point3<f64>,
    /// Virtual displacement computed by the last successful analysis.
    #[cfg_attr(feature = "serde", serde(default))]
    pub displacement: Option<Displacement>,
}

impl Block {
    /// Create a free block.
    #[must_use]
    pub fn new(id: BlockId, centroid: Point3<f64>, volume: f64) -> Self {
        Self {
            id,
            is_support: false,
            volume,
            centroid,
            displacement: None,
        }
    }

    /// Create a support block.
    #[must_use]
    pub fn support(id: BlockId, centroid: Point3<f64>, volume: f64) -> Self {
        Self {
            is_support: true,
            ..Self::new(id, centroid, volume)
        }
    }

    /// Set the support flag.
    #[must_use]
    pub fn with_support(mut self, is_support: bool) -> Self {
        self.is_support = is_support;
        self
    }

    /// Whether this block carries displacement unknowns.
    #[must_use]
    pub fn is_free(&self) -> bool {
        !self.is_support
    }

    /// Self-weight for the given density (volume times density).
    #[must_use]
    pub fn weight(&self, density: f64) -> f64 {
        self.volume * density
    }

    /// Translational part of the stored displacement.
    #[must_use]
    pub fn translation(&self) -> Option<Vector3<f64>> {
        self.displacement.map(|d| Vector3::new(d[0], d[1], d[2]))
    }

    /// Rotational part of the stored displacement.
    #[must_use]
    pub fn rotation(&self) -> Option<Vector3<f64>> {
        self.displacement.map(|d| Vector3::new(d[3], d[4], d[5]))
    }

    /// Displace a point rigidly with the stored (small) displacement.
    ///
    /// Returns the point unchanged when the block has no displacement.
    #[must_use]
    pub fn displaced_point(&self, point: &Point3<f64>) -> Point3<f64> {
        match (self.translation(), self.rotation()) {
            (Some(t), Some(r)) => point + t + r.cross(&(point - self.centroid)),
            _ => *point,
        }
    }
}
