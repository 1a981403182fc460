//! Potential solver abstraction and implementations.
//!
//! The [`PotentialSolver`] trait inverts the discrete Laplacian for a scalar
//! source (charge density, giving the electric potential) and for a
//! 3-component source (current density, giving the magnetic vector
//! potential). Fixed-iteration relaxation is the only method for now.
//!
//! # Boundary conditions
//!
//! [`relaxation::RelaxationSolver`] wraps neighbours periodically at the
//! grid edges. Sources close to the boundary therefore interact with their
//! own images on the opposite side. An open-boundary method (multigrid with
//! far-field conditions, or a Green's-function convolution) would remove the
//! artefact and would slot in behind this trait.

pub mod relaxation;

use ndarray::Array3;

use crate::mesh::Grid;
use crate::types::VectorField;

pub use relaxation::RelaxationSolver;

/// The interface every potential solver implements.
pub trait PotentialSolver {
    /// Electric potential for `charge_density`, with
    /// `∇²V = -ρ / ε`.
    fn solve_scalar(&self, grid: &Grid, charge_density: &Array3<f64>, epsilon: f64) -> Array3<f64>;

    /// Magnetic vector potential for `current_density`, with
    /// `∇²A = -μ J + μ ε E_ind` applied per component.
    ///
    /// `induced` is the optional `E_ind` coupling term; `None` means zero.
    fn solve_vector(
        &self,
        grid: &Grid,
        current_density: &VectorField,
        mu: f64,
        epsilon: f64,
        induced: Option<&VectorField>,
    ) -> VectorField;

    /// Human-readable name of the method.
    fn method_name(&self) -> &str;
}
