//! The discretised 3D coordinate grid.
//!
//! Each axis holds `floor((max - min) / step)` points spread evenly over
//! `[min, max]` with both endpoints included. Spreading the points rather
//! than stepping from `min` means the region near `max` is never dropped
//! when the extent is not a multiple of the step; the actual spacing can
//! therefore differ slightly from `step`.
//!
//! Arrays use the meshgrid "xy" layout: index `[i, j, k]` addresses
//! `y[i]`, `x[j]`, `z[k]`. The field operators in [`fields`](crate::fields)
//! rely on this order when they map array axes back to x/y/z components.

use ndarray::Array3;

use crate::error::FieldError;
use crate::types::MeshBounds;

/// Evenly spaced grid coordinates. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    step: f64,
    xs: Vec<f64>,
    ys: Vec<f64>,
    zs: Vec<f64>,
    x: Array3<f64>,
    y: Array3<f64>,
    z: Array3<f64>,
}

impl Grid {
    /// Build the grid for `bounds` sampled at roughly `step` spacing.
    pub fn new(bounds: MeshBounds, step: f64) -> Result<Self, FieldError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(FieldError::InvalidMeshBounds(format!(
                "step must be a positive finite number, got {step}"
            )));
        }

        let nx = axis_count("x", bounds.x, step)?;
        let ny = axis_count("y", bounds.y, step)?;
        let nz = axis_count("z", bounds.z, step)?;

        let xs = linspace(bounds.x[0], bounds.x[1], nx);
        let ys = linspace(bounds.y[0], bounds.y[1], ny);
        let zs = linspace(bounds.z[0], bounds.z[1], nz);

        let shape = (ny, nx, nz);
        let x = Array3::from_shape_fn(shape, |(_, j, _)| xs[j]);
        let y = Array3::from_shape_fn(shape, |(i, _, _)| ys[i]);
        let z = Array3::from_shape_fn(shape, |(_, _, k)| zs[k]);

        Ok(Self { step, xs, ys, zs, x, y, z })
    }

    /// Points per axis as `(Nx, Ny, Nz)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.xs.len(), self.ys.len(), self.zs.len())
    }

    /// Array shape, `(Ny, Nx, Nz)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.x.dim()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The requested step. The relaxation solver and the curl treat this as
    /// the isotropic cell size.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Actual spacing between neighbouring points along x, y and z.
    pub fn spacing(&self) -> [f64; 3] {
        [axis_spacing(&self.xs), axis_spacing(&self.ys), axis_spacing(&self.zs)]
    }

    pub fn x_axis(&self) -> &[f64] {
        &self.xs
    }

    pub fn y_axis(&self) -> &[f64] {
        &self.ys
    }

    pub fn z_axis(&self) -> &[f64] {
        &self.zs
    }

    pub fn x(&self) -> &Array3<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array3<f64> {
        &self.y
    }

    pub fn z(&self) -> &Array3<f64> {
        &self.z
    }

    /// Coordinates `[x, y, z]` of the cell at array index `(i, j, k)`.
    pub fn position(&self, idx: (usize, usize, usize)) -> [f64; 3] {
        let (i, j, k) = idx;
        [self.xs[j], self.ys[i], self.zs[k]]
    }

    /// Whether an array index lies on the outermost layer of the grid.
    pub fn on_boundary(&self, idx: (usize, usize, usize)) -> bool {
        let (n0, n1, n2) = self.shape();
        let (i, j, k) = idx;
        i == 0 || j == 0 || k == 0 || i + 1 == n0 || j + 1 == n1 || k + 1 == n2
    }
}

fn axis_count(name: &str, range: [f64; 2], step: f64) -> Result<usize, FieldError> {
    let count = ((range[1] - range[0]) / step).floor();
    if !(count.is_finite() && count >= 1.0) {
        return Err(FieldError::InvalidMeshBounds(format!(
            "{name} range [{}, {}] with step {step} yields no points",
            range[0], range[1]
        )));
    }
    Ok(count as usize)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i + 1 == n { end } else { start + delta * i as f64 })
                .collect()
        }
    }
}

fn axis_spacing(axis: &[f64]) -> f64 {
    if axis.len() > 1 {
        axis[1] - axis[0]
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_counts_follow_floor_of_extent_over_step() {
        let bounds = MeshBounds { x: [0.0, 4.0], y: [-1.0, 1.0], z: [-3.0, 3.0] };
        let grid = Grid::new(bounds, 0.7).unwrap();
        assert_eq!(grid.dims(), (5, 2, 8));
        assert_eq!(grid.shape(), (2, 5, 8));
        assert_eq!(grid.len(), 80);
    }

    #[test]
    fn test_endpoints_are_included() {
        let grid = Grid::new(MeshBounds::cube(3.0), 0.85).unwrap();
        assert_eq!(grid.dims(), (7, 7, 7));
        assert_relative_eq!(grid.x_axis()[0], -3.0);
        assert_relative_eq!(grid.x_axis()[6], 3.0);
        assert_relative_eq!(grid.x_axis()[3], 0.0, epsilon = 1e-12);
        assert_relative_eq!(grid.spacing()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(grid.step(), 0.85);
    }

    #[test]
    fn test_xy_layout() {
        let bounds = MeshBounds { x: [0.0, 2.0], y: [10.0, 13.0], z: [-1.0, 1.0] };
        let grid = Grid::new(bounds, 1.0).unwrap();
        let idx = (1, 0, 1);
        assert_eq!(grid.position(idx), [grid.x()[idx], grid.y()[idx], grid.z()[idx]]);
        assert_relative_eq!(grid.y()[[2, 0, 0]], 13.0);
        assert_relative_eq!(grid.x()[[0, 1, 0]], 2.0);
    }

    #[test]
    fn test_axes_are_monotonic() {
        let grid = Grid::new(MeshBounds::cube(2.5), 0.3).unwrap();
        for axis in [grid.x_axis(), grid.y_axis(), grid.z_axis()] {
            assert!(axis.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_rejects_degenerate_bounds() {
        assert!(matches!(
            Grid::new(MeshBounds::cube(1.0), 0.0),
            Err(FieldError::InvalidMeshBounds(_))
        ));
        assert!(matches!(
            Grid::new(MeshBounds::cube(1.0), -0.5),
            Err(FieldError::InvalidMeshBounds(_))
        ));
        assert!(matches!(
            Grid::new(MeshBounds::cube(1.0), 5.0),
            Err(FieldError::InvalidMeshBounds(_))
        ));
        let inverted = MeshBounds { x: [1.0, -1.0], y: [0.0, 1.0], z: [0.0, 1.0] };
        assert!(Grid::new(inverted, 0.1).is_err());
    }

    #[test]
    fn test_boundary_detection() {
        let grid = Grid::new(MeshBounds::cube(3.0), 0.85).unwrap();
        assert!(grid.on_boundary((0, 3, 3)));
        assert!(grid.on_boundary((3, 3, 6)));
        assert!(!grid.on_boundary((3, 3, 3)));
    }
}
