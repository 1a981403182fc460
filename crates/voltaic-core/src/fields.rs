//! Field operators: electric field from the scalar potential, magnetic field
//! from the vector potential, and the induced electric field from the
//! change of the vector potential between frames.
//!
//! Derivatives are taken along array axes, which in the grid's "xy" layout
//! are `(y, x, z)`. The first two output components are therefore swapped
//! to bring them back to `(x, y, z)` order before the sign convention
//! $\mathbf{E} = -\nabla V$ is applied. The magnetic field receives the
//! same swap-and-negate correction.
//!
//! The gradient for **E** differences neighbouring indices with unit width;
//! the curl for **B** divides by twice the grid step.

use ndarray::{Array3, Axis};

use crate::mesh::Grid;
use crate::solver::relaxation::{wrap_down, wrap_up};
use crate::types::VectorField;

/// $\mathbf{E} = -\nabla V$.
///
/// Differences are per index (unit width), so `E` is in potential per cell.
pub fn electric_field(potential: &Array3<f64>) -> VectorField {
    let d0 = gradient(potential, Axis(0), 1.0);
    let d1 = gradient(potential, Axis(1), 1.0);
    let d2 = gradient(potential, Axis(2), 1.0);
    swap_and_negate(d0, d1, d2)
}

/// Magnetic field from the curl of the vector potential, using the grid step
/// as the difference width.
pub fn magnetic_field(grid: &Grid, vector_potential: &VectorField) -> VectorField {
    let [c0, c1, c2] = curl(vector_potential, grid.step());
    swap_and_negate(c0, c1, c2)
}

/// Periodic centred-difference curl over array axes.
///
/// With `(U, V, W)` the components and `D_a` the centred difference along
/// array axis `a`, returns
/// `(D_1 W - D_2 V, D_2 U - D_0 W, D_0 V - D_1 U)`.
pub fn curl(field: &VectorField, step: f64) -> [Array3<f64>; 3] {
    let du_d1 = centred_difference(&field.u, Axis(1), step);
    let du_d2 = centred_difference(&field.u, Axis(2), step);
    let dv_d0 = centred_difference(&field.v, Axis(0), step);
    let dv_d2 = centred_difference(&field.v, Axis(2), step);
    let dw_d0 = centred_difference(&field.w, Axis(0), step);
    let dw_d1 = centred_difference(&field.w, Axis(1), step);

    [dw_d1 - dv_d2, du_d2 - dw_d0, dv_d0 - du_d1]
}

/// Faraday-style estimate of the induced electric field,
/// `(A_previous - A_current) / dt` per component with the horizontal swap.
///
/// This covers only the `-∂A/∂t` contribution. A zero or non-finite time
/// step yields a zero field instead of infinities.
pub fn induced_electric_field(
    previous: &VectorField,
    current: &VectorField,
    time_step: f64,
) -> VectorField {
    if time_step == 0.0 || !time_step.is_finite() {
        log::warn!("time step {time_step} cannot be used for induction; induced field set to zero");
        return VectorField::zeros(current.shape());
    }
    let du = (&previous.u - &current.u) / time_step;
    let dv = (&previous.v - &current.v) / time_step;
    let dw = (&previous.w - &current.w) / time_step;
    VectorField { u: dv, v: du, w: dw }
}

/// Induced magnetic field from a changing electric field.
///
/// Not modelled: the displacement-current contribution is reserved for
/// future work, so this always returns `None` and callers add nothing.
pub fn induced_magnetic_field(
    _previous_electric: &VectorField,
    _current_electric: &VectorField,
    _time_step: f64,
) -> Option<VectorField> {
    None
}

fn swap_and_negate(d0: Array3<f64>, d1: Array3<f64>, d2: Array3<f64>) -> VectorField {
    VectorField { u: -d1, v: -d0, w: -d2 }
}

/// `(f[i+1] - f[i-1]) / (2 h)` along `axis`, wrapping at the edges.
pub fn centred_difference(field: &Array3<f64>, axis: Axis, step: f64) -> Array3<f64> {
    let dims = field.dim();
    let n = field.len_of(axis);
    let inv = 1.0 / (2.0 * step);
    Array3::from_shape_fn(dims, |idx| {
        let (fwd, back) = shifted(idx, axis, wrap_up, wrap_down, n);
        (field[fwd] - field[back]) * inv
    })
}

/// Gradient along one axis: centred differences in the interior and
/// one-sided differences on the two end layers. No wraparound. An axis with
/// a single point has zero gradient.
pub fn gradient(field: &Array3<f64>, axis: Axis, step: f64) -> Array3<f64> {
    let dims = field.dim();
    let n = field.len_of(axis);
    if n < 2 {
        return Array3::zeros(dims);
    }
    Array3::from_shape_fn(dims, |idx| {
        let pos = index_along(idx, axis);
        let up = |i: usize, n: usize| if i + 1 == n { i } else { i + 1 };
        let down = |i: usize, _: usize| i.saturating_sub(1);
        let (fwd, back) = shifted(idx, axis, up, down, n);
        let width = if pos == 0 || pos + 1 == n { step } else { 2.0 * step };
        (field[fwd] - field[back]) / width
    })
}

type Idx3 = (usize, usize, usize);

fn index_along(idx: Idx3, axis: Axis) -> usize {
    match axis.index() {
        0 => idx.0,
        1 => idx.1,
        _ => idx.2,
    }
}

fn shifted(
    idx: Idx3,
    axis: Axis,
    up: impl Fn(usize, usize) -> usize,
    down: impl Fn(usize, usize) -> usize,
    n: usize,
) -> (Idx3, Idx3) {
    let (i, j, k) = idx;
    match axis.index() {
        0 => ((up(i, n), j, k), (down(i, n), j, k)),
        1 => ((i, up(j, n), k), (i, down(j, n), k)),
        _ => ((i, j, up(k, n)), (i, j, down(k, n))),
    }
}
