//! Assembly model for coupled rigid-block analysis.
//!
//! This crate provides the data an equilibrium analysis consumes and the
//! attributes it writes back:
//!
//! - [`Block`] - A rigid block with volume, centroid and support flag
//! - [`Interface`] - A contact interface between two blocks, discretized into
//!   ordered contact points with a local [`ContactFrame`]
//! - [`ContactForce`] - The split-normal force record written per contact point
//! - [`Assembly`] - The ordered collection of blocks and interfaces
//!
//! # Design Philosophy
//!
//! These types are **pure data**. Contact geometry discovery happens elsewhere;
//! the analysis reads blocks and interfaces from here and writes forces and
//! virtual displacements back onto them.
//!
//! # Conventions
//!
//! - Z is up; gravity acts along -Z.
//! - An interface's normal points from its `from` block into its `to` block.
//!   A positive normal force pushes `to` along the normal and `from` against it.
//! - Block displacements are 6-vectors `[tx, ty, tz, rx, ry, rz]`.
//!
//! # Example
//!
//! ```
//! use cra_types::{Assembly, Block, BlockId, ContactFrame, Interface};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut assembly = Assembly::new();
//! assembly.add_block(Block::support(BlockId::new(0), Point3::new(0.0, 0.0, -0.5), 1.0)).ok();
//! assembly.add_block(Block::new(BlockId::new(1), Point3::new(0.0, 0.0, 0.5), 1.0)).ok();
//!
//! let interface = Interface::new(
//!     BlockId::new(0),
//!     BlockId::new(1),
//!     vec![
//!         Point3::new(-0.5, -0.5, 0.0),
//!         Point3::new(0.5, -0.5, 0.0),
//!         Point3::new(0.5, 0.5, 0.0),
//!         Point3::new(-0.5, 0.5, 0.0),
//!     ],
//!     ContactFrame::from_normal(Vector3::z()),
//! );
//! assembly.add_interface(interface).ok();
//!
//! assert_eq!(assembly.num_free(), 1);
//! assert_eq!(assembly.num_vertices(), 4);
//! ```

#![doc(html_root_url = "https://docs.rs/cra-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod assembly;
mod block;
mod error;
mod interface;

pub use assembly::Assembly;
pub use block::{Block, BlockId, Displacement};
pub use error::AssemblyError;
pub use interface::{ContactForce, ContactFrame, Interface};

// Re-export math types for convenience
pub use nalgebra::{Point3, Vector3, Vector6};

/// Result type for assembly construction.
pub type Result<T> = std::result::Result<T, AssemblyError>;
