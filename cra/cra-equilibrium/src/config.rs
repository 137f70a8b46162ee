//! Analysis configuration.

use cra_nlp::AugmentedLagrangianConfig;

use crate::{CraError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which friction law the formulation imposes. Exactly one is used per solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrictionLaw {
    /// Tangential force opposes tangential displacement, `ft = -alpha·dt`,
    /// with the smooth Coulomb bound `|ft| ≤ mu·fn+`.
    #[default]
    SlipCoupling,

    /// Linearized cone: a regular polygon with `faces` sides inscribed in
    /// the Coulomb circle. No coupling to displacements.
    PyramidalCone {
        /// Number of facets (at least 3).
        faces: usize,
    },
}

impl FrictionLaw {
    /// Four-sided pyramid.
    #[must_use]
    pub const fn pyramid() -> Self {
        Self::PyramidalCone { faces: 4 }
    }

    /// Eight-sided pyramid, a closer fit to the circular cone.
    #[must_use]
    pub const fn octagonal() -> Self {
        Self::PyramidalCone { faces: 8 }
    }
}

/// Objective weights.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectiveWeights {
    /// Weight on `alpha²` (friction slack).
    pub alpha: f64,
    /// Weight on `fn-²` (tension). Large, so tension is a last resort.
    pub tension: f64,
    /// Weight on `fn+²` (compression).
    pub compression: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            tension: 1e4,
            compression: 1.0,
        }
    }
}

/// Configuration for [`cra_penalty_solve`](crate::cra_penalty_solve).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CraConfig {
    /// Friction coefficient.
    pub mu: f64,

    /// Material density; block weight is `volume · density`.
    pub density: f64,

    /// Bound on every kinematic component `dn`, `du`, `dv`.
    pub d_bnd: f64,

    /// Contact offset: a vertex carries compression only where `dn = -eps`.
    pub eps: f64,

    /// Log per-vertex results and solver iterations.
    pub verbose: bool,

    /// Log phase durations.
    pub timer: bool,

    /// Friction law.
    pub friction: FrictionLaw,

    /// Objective weights.
    pub weights: ObjectiveWeights,

    /// Solver stationarity tolerance.
    pub tolerance: f64,

    /// Solver constraint violation tolerance.
    pub constraint_tolerance: f64,

    /// Threshold above which a post-solve residual is reported.
    pub residual_tolerance: f64,
}

impl Default for CraConfig {
    fn default() -> Self {
        Self {
            mu: 0.84,
            density: 1.0,
            d_bnd: 1e-3,
            eps: 1e-4,
            verbose: false,
            timer: false,
            friction: FrictionLaw::SlipCoupling,
            weights: ObjectiveWeights::default(),
            tolerance: 1e-8,
            constraint_tolerance: 1e-7,
            residual_tolerance: 1e-5,
        }
    }
}

impl CraConfig {
    /// Set the friction coefficient.
    #[must_use]
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Set the density.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the kinematic bound.
    #[must_use]
    pub fn with_d_bnd(mut self, d_bnd: f64) -> Self {
        self.d_bnd = d_bnd;
        self
    }

    /// Set the contact offset.
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the friction law.
    #[must_use]
    pub fn with_friction(mut self, friction: FrictionLaw) -> Self {
        self.friction = friction;
        self
    }

    /// Set the objective weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set solver tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, tolerance: f64, constraint_tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self.constraint_tolerance = constraint_tolerance;
        self
    }

    /// Set the residual reporting threshold.
    #[must_use]
    pub fn with_residual_tolerance(mut self, residual_tolerance: f64) -> Self {
        self.residual_tolerance = residual_tolerance;
        self
    }

    /// Enable verbose logging.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable phase timing.
    #[must_use]
    pub fn timer(mut self, timer: bool) -> Self {
        self.timer = timer;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("mu", self.mu),
            ("density", self.density),
            ("d_bnd", self.d_bnd),
            ("eps", self.eps),
            ("tolerance", self.tolerance),
            ("constraint_tolerance", self.constraint_tolerance),
            ("residual_tolerance", self.residual_tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CraError::invalid_config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if self.eps > self.d_bnd {
            return Err(CraError::invalid_config(
                "eps must not exceed d_bnd, or no vertex can reach contact",
            ));
        }

        let weights = [
            self.weights.alpha,
            self.weights.tension,
            self.weights.compression,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CraError::invalid_config(
                "objective weights must be non-negative and finite",
            ));
        }

        if let FrictionLaw::PyramidalCone { faces } = self.friction {
            if faces < 3 {
                return Err(CraError::invalid_config(
                    "a friction pyramid needs at least 3 faces",
                ));
            }
        }

        Ok(())
    }

    /// Configuration for the reference solver matching these tolerances.
    #[must_use]
    pub fn solver_config(&self) -> AugmentedLagrangianConfig {
        AugmentedLagrangianConfig::default()
            .with_tolerances(self.tolerance, self.constraint_tolerance)
            .verbose(self.verbose)
    }
}
