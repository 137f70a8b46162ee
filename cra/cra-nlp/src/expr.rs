//! Sparse linear and quadratic expressions over the decision vector.
//!
//! Expressions are stored as unsorted term lists. Repeated indices are
//! allowed and simply add up, which keeps construction cheap: a formulation
//! can emit terms in whatever order its operators produce them.

use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{DMatrix, DVector};

fn scale_of(scales: &[f64], index: usize) -> f64 {
    scales.get(index).copied().unwrap_or(1.0)
}

/// Affine expression `c + Σ aᵢ·xᵢ`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    constant: f64,
    terms: Vec<(usize, f64)>,
}

impl LinearExpr {
    /// The zero expression.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant expression.
    #[must_use]
    pub fn from_constant(constant: f64) -> Self {
        Self {
            constant,
            terms: Vec::new(),
        }
    }

    /// The expression `xᵢ`.
    #[must_use]
    pub fn variable(index: usize) -> Self {
        Self::term(index, 1.0)
    }

    /// The expression `a·xᵢ`.
    #[must_use]
    pub fn term(index: usize, coefficient: f64) -> Self {
        Self {
            constant: 0.0,
            terms: vec![(index, coefficient)],
        }
    }

    /// Build from `(index, coefficient)` pairs and a constant.
    #[must_use]
    pub fn from_terms(terms: Vec<(usize, f64)>, constant: f64) -> Self {
        Self { constant, terms }
    }

    /// Append `a·xᵢ`.
    pub fn add_term(&mut self, index: usize, coefficient: f64) {
        self.terms.push((index, coefficient));
    }

    /// Append `a·xᵢ`, builder style.
    #[must_use]
    pub fn with_term(mut self, index: usize, coefficient: f64) -> Self {
        self.add_term(index, coefficient);
        self
    }

    /// Add a constant offset.
    #[must_use]
    pub fn plus_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    /// Add `scale · other` in place.
    pub fn add_scaled(&mut self, other: &Self, scale: f64) {
        self.constant += scale * other.constant;
        self.terms
            .extend(other.terms.iter().map(|&(i, a)| (i, scale * a)));
    }

    /// The expression multiplied by a scalar.
    #[must_use]
    pub fn scaled(&self, scale: f64) -> Self {
        let mut out = Self::zero();
        out.add_scaled(self, scale);
        out
    }

    /// The expression after substituting `xᵢ = sᵢ·yᵢ`.
    ///
    /// Indices beyond `scales` keep a unit scale.
    #[must_use]
    pub fn rescaled(&self, scales: &[f64]) -> Self {
        Self {
            constant: self.constant,
            terms: self
                .terms
                .iter()
                .map(|&(i, a)| (i, a * scale_of(scales, i)))
                .collect(),
        }
    }

    /// Constant part.
    #[must_use]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Linear terms.
    #[must_use]
    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    /// Largest variable index referenced.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        self.terms.iter().map(|&(i, _)| i).max()
    }

    /// Evaluate at `x`.
    #[must_use]
    pub fn evaluate(&self, x: &DVector<f64>) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(i, a)| acc + a * x[i])
    }

    /// Product of two affine expressions, a quadratic expression.
    #[must_use]
    pub fn product(&self, other: &Self) -> QuadraticExpr {
        let mut linear = Self::from_constant(self.constant * other.constant);
        if other.constant != 0.0 {
            linear.add_scaled(&Self::from_terms(self.terms.clone(), 0.0), other.constant);
        }
        if self.constant != 0.0 {
            linear.add_scaled(&Self::from_terms(other.terms.clone(), 0.0), self.constant);
        }

        let mut quadratic = Vec::with_capacity(self.terms.len() * other.terms.len());
        for &(i, a) in &self.terms {
            for &(j, b) in &other.terms {
                quadratic.push((i, j, a * b));
            }
        }

        QuadraticExpr { linear, quadratic }
    }

    /// Square of the expression.
    #[must_use]
    pub fn square(&self) -> QuadraticExpr {
        self.product(self)
    }
}

impl Add for LinearExpr {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.add_scaled(&rhs, 1.0);
        self
    }
}

impl Sub for LinearExpr {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self.add_scaled(&rhs, -1.0);
        self
    }
}

impl Neg for LinearExpr {
    type Output = Self;

    fn neg(self) -> Self {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for LinearExpr {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scaled(rhs)
    }
}

/// Quadratic expression `c + Σ aᵢ·xᵢ + Σ hᵢⱼ·xᵢ·xⱼ`.
///
/// Each quadratic term `(i, j, h)` contributes `h·xᵢ·xⱼ` exactly once; the
/// pair is not symmetrized on storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadraticExpr {
    linear: LinearExpr,
    quadratic: Vec<(usize, usize, f64)>,
}

impl QuadraticExpr {
    /// The zero expression.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Append `h·xᵢ·xⱼ`.
    pub fn add_quadratic(&mut self, i: usize, j: usize, coefficient: f64) {
        self.quadratic.push((i, j, coefficient));
    }

    /// Append `a·xᵢ`.
    pub fn add_linear(&mut self, index: usize, coefficient: f64) {
        self.linear.add_term(index, coefficient);
    }

    /// Add `scale · other` in place.
    pub fn add_scaled(&mut self, other: &Self, scale: f64) {
        self.linear.add_scaled(&other.linear, scale);
        self.quadratic
            .extend(other.quadratic.iter().map(|&(i, j, h)| (i, j, scale * h)));
    }

    /// The expression after substituting `xᵢ = sᵢ·yᵢ`.
    #[must_use]
    pub fn rescaled(&self, scales: &[f64]) -> Self {
        Self {
            linear: self.linear.rescaled(scales),
            quadratic: self
                .quadratic
                .iter()
                .map(|&(i, j, h)| (i, j, h * scale_of(scales, i) * scale_of(scales, j)))
                .collect(),
        }
    }

    /// Affine part.
    #[must_use]
    pub fn linear(&self) -> &LinearExpr {
        &self.linear
    }

    /// Quadratic terms.
    #[must_use]
    pub fn quadratic_terms(&self) -> &[(usize, usize, f64)] {
        &self.quadratic
    }

    /// Whether the expression has no quadratic terms.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        self.quadratic.is_empty()
    }

    /// Largest variable index referenced.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        self.quadratic
            .iter()
            .map(|&(i, j, _)| i.max(j))
            .chain(self.linear.max_index())
            .max()
    }

    /// Evaluate at `x`.
    #[must_use]
    pub fn evaluate(&self, x: &DVector<f64>) -> f64 {
        self.quadratic
            .iter()
            .fold(self.linear.evaluate(x), |acc, &(i, j, h)| acc + h * x[i] * x[j])
    }

    /// Sparse gradient at `x` as `(index, value)` pairs (indices may repeat).
    #[must_use]
    pub fn gradient_terms(&self, x: &DVector<f64>) -> Vec<(usize, f64)> {
        let mut out = Vec::with_capacity(self.linear.terms.len() + 2 * self.quadratic.len());
        out.extend_from_slice(&self.linear.terms);
        for &(i, j, h) in &self.quadratic {
            out.push((i, h * x[j]));
            out.push((j, h * x[i]));
        }
        out
    }

    /// Accumulate `scale · ∇q(x)` into a dense gradient.
    pub fn add_gradient(&self, x: &DVector<f64>, scale: f64, gradient: &mut DVector<f64>) {
        for &(i, a) in &self.linear.terms {
            gradient[i] += scale * a;
        }
        for &(i, j, h) in &self.quadratic {
            gradient[i] += scale * h * x[j];
            gradient[j] += scale * h * x[i];
        }
    }

    /// Accumulate `scale · ∇²q` into a dense Hessian.
    pub fn add_hessian(&self, scale: f64, hessian: &mut DMatrix<f64>) {
        for &(i, j, h) in &self.quadratic {
            hessian[(i, j)] += scale * h;
            hessian[(j, i)] += scale * h;
        }
    }
}

impl From<LinearExpr> for QuadraticExpr {
    fn from(linear: LinearExpr) -> Self {
        Self {
            linear,
            quadratic: Vec::new(),
        }
    }
}

impl Add for QuadraticExpr {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.add_scaled(&rhs, 1.0);
        self
    }
}

impl Sub for QuadraticExpr {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self.add_scaled(&rhs, -1.0);
        self
    }
}

impl Mul<f64> for QuadraticExpr {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        let mut out = Self::zero();
        out.add_scaled(&self, rhs);
        out
    }
}
