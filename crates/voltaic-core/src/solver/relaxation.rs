//! Jacobi-style relaxation of the discrete Laplacian.
//!
//! Each pass replaces every cell, simultaneously, with
//!
//! $$
//! V' = \frac{1}{8}\Bigl(\sum_{\text{6 neighbours}} V - h^2 L\Bigr)
//! $$
//!
//! where $L$ is the known Laplacian and $h$ the grid step. Neighbours wrap
//! around the grid edges. The field starts at zero, which models potentials
//! vanishing far from a bounded source, and the pass count is fixed by the
//! caller: there is no convergence test, so the cost of a solve is known in
//! advance.

use std::time::Instant;

use ndarray::Array3;

use super::PotentialSolver;
use crate::mesh::Grid;
use crate::types::VectorField;

/// Fixed-iteration relaxation solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaxationSolver {
    /// Number of relaxation passes per solve.
    pub iterations: usize,
}

impl Default for RelaxationSolver {
    fn default() -> Self {
        Self { iterations: 8 }
    }
}

impl RelaxationSolver {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Relax `laplacian` from a zero field for the configured pass count.
    pub fn invert_laplacian(&self, laplacian: &Array3<f64>, step: f64) -> Array3<f64> {
        let h2 = step * step;
        let mut field = Array3::zeros(laplacian.dim());
        for _ in 0..self.iterations {
            field = relax_once(&field, laplacian, h2);
        }
        field
    }
}

impl PotentialSolver for RelaxationSolver {
    fn solve_scalar(&self, grid: &Grid, charge_density: &Array3<f64>, epsilon: f64) -> Array3<f64> {
        let started = Instant::now();
        let laplacian = charge_density.mapv(|rho| -rho / epsilon);
        let potential = self.invert_laplacian(&laplacian, grid.step());
        log::debug!(
            "scalar relaxation: {} cells, {} passes in {:.2?}",
            grid.len(),
            self.iterations,
            started.elapsed()
        );
        potential
    }

    fn solve_vector(
        &self,
        grid: &Grid,
        current_density: &VectorField,
        mu: f64,
        epsilon: f64,
        induced: Option<&VectorField>,
    ) -> VectorField {
        let started = Instant::now();
        let mut potential = VectorField::zeros(current_density.shape());
        let sources = current_density.components();
        let coupling = induced.map(VectorField::components);

        for (axis, target) in potential.components_mut().into_iter().enumerate() {
            let mut laplacian = sources[axis].mapv(|j| -mu * j);
            if let Some(e_ind) = coupling {
                laplacian.scaled_add(mu * epsilon, e_ind[axis]);
            }
            *target = self.invert_laplacian(&laplacian, grid.step());
        }

        log::debug!(
            "vector relaxation: {} cells x 3 components, {} passes in {:.2?}",
            grid.len(),
            self.iterations,
            started.elapsed()
        );
        potential
    }

    fn method_name(&self) -> &str {
        "Jacobi relaxation (periodic)"
    }
}

/// One relaxation pass. Reads only `field`, so every cell sees the previous
/// iterate.
pub fn relax_once(field: &Array3<f64>, laplacian: &Array3<f64>, h2: f64) -> Array3<f64> {
    let (n0, n1, n2) = field.dim();
    Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| {
        let neighbours = field[[wrap_up(i, n0), j, k]]
            + field[[wrap_down(i, n0), j, k]]
            + field[[i, wrap_up(j, n1), k]]
            + field[[i, wrap_down(j, n1), k]]
            + field[[i, j, wrap_up(k, n2)]]
            + field[[i, j, wrap_down(k, n2)]];
        (neighbours - h2 * laplacian[[i, j, k]]) / 8.0
    })
}

#[inline]
pub(crate) fn wrap_up(i: usize, n: usize) -> usize {
    if i + 1 == n {
        0
    } else {
        i + 1
    }
}

#[inline]
pub(crate) fn wrap_down(i: usize, n: usize) -> usize {
    if i == 0 {
        n - 1
    } else {
        i - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeshBounds;
    use approx::assert_relative_eq;

    #[test]
    fn test_wraparound_indices() {
        assert_eq!(wrap_up(4, 5), 0);
        assert_eq!(wrap_down(0, 5), 4);
        assert_eq!(wrap_up(1, 5), 2);
        assert_eq!(wrap_down(3, 5), 2);
    }

    #[test]
    fn test_single_pass_spreads_one_cell() {
        let mut laplacian = Array3::zeros((5, 5, 5));
        laplacian[[2, 2, 2]] = -8.0;
        let once = relax_once(&Array3::zeros((5, 5, 5)), &laplacian, 1.0);
        assert_relative_eq!(once[[2, 2, 2]], 1.0);
        assert_eq!(once[[2, 2, 3]], 0.0);

        let twice = relax_once(&once, &laplacian, 1.0);
        assert_relative_eq!(twice[[2, 2, 3]], 1.0 / 8.0);
        assert_relative_eq!(twice[[2, 2, 2]], 1.0);
    }

    #[test]
    fn test_neighbours_wrap_across_edges() {
        let mut field = Array3::zeros((4, 4, 4));
        field[[0, 1, 1]] = 8.0;
        let next = relax_once(&field, &Array3::zeros((4, 4, 4)), 1.0);
        assert_relative_eq!(next[[3, 1, 1]], 1.0);
        assert_relative_eq!(next[[1, 1, 1]], 1.0);
    }

    #[test]
    fn test_vector_solve_is_componentwise() {
        let grid = Grid::new(MeshBounds::cube(3.0), 0.85).unwrap();
        let mut current = VectorField::zeros(grid.shape());
        current.w[[3, 3, 3]] = 1.0;
        let solver = RelaxationSolver::new(4);
        let a = solver.solve_vector(&grid, &current, 2.0, 1.0, None);
        let az = solver.solve_scalar(&grid, &current.w, 0.5);
        assert!(a.u.iter().all(|&v| v == 0.0));
        assert!(a.v.iter().all(|&v| v == 0.0));
        // -mu * J with mu = 2 matches -rho / eps with eps = 0.5.
        for (lhs, rhs) in a.w.iter().zip(az.iter()) {
            assert_relative_eq!(*lhs, *rhs, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_induced_term_enters_the_source() {
        let grid = Grid::new(MeshBounds::cube(3.0), 0.85).unwrap();
        let current = VectorField::zeros(grid.shape());
        let mut induced = VectorField::zeros(grid.shape());
        induced.u[[3, 3, 3]] = -1.0;
        let solver = RelaxationSolver::new(1);
        let a = solver.solve_vector(&grid, &current, 1.0, 1.0, Some(&induced));
        // One pass from zero: A = -h^2 * (mu * eps * E_ind) / 8.
        assert_relative_eq!(a.u[[3, 3, 3]], 0.85 * 0.85 / 8.0, epsilon = 1e-12);
    }
}
