//! Core types shared across the Voltaic engine.
//!
//! This module defines the data that flows between pipeline stages: mesh
//! bounds, vector fields sampled on the grid, run parameters, and the line
//! geometry handed to the renderer.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Axis-aligned extent of the simulation region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
}

impl MeshBounds {
    /// A cube `[-half, half]` on every axis.
    pub fn cube(half: f64) -> Self {
        Self {
            x: [-half, half],
            y: [-half, half],
            z: [-half, half],
        }
    }
}

impl Default for MeshBounds {
    fn default() -> Self {
        Self::cube(3.0)
    }
}

/// A 3-component field sampled at every grid cell.
///
/// Components are stored in the grid's array layout; the sample positions
/// are the [`Grid`](crate::mesh::Grid) coordinate arrays, which every field
/// shares unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub u: Array3<f64>,
    pub v: Array3<f64>,
    pub w: Array3<f64>,
}

impl VectorField {
    pub fn zeros(shape: (usize, usize, usize)) -> Self {
        Self {
            u: Array3::zeros(shape),
            v: Array3::zeros(shape),
            w: Array3::zeros(shape),
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.u.dim()
    }

    pub fn components(&self) -> [&Array3<f64>; 3] {
        [&self.u, &self.v, &self.w]
    }

    pub fn components_mut(&mut self) -> [&mut Array3<f64>; 3] {
        [&mut self.u, &mut self.v, &mut self.w]
    }

    /// The vector at array index `(i, j, k)`.
    pub fn at(&self, idx: (usize, usize, usize)) -> [f64; 3] {
        let (i, j, k) = idx;
        [self.u[[i, j, k]], self.v[[i, j, k]], self.w[[i, j, k]]]
    }

    /// Euclidean norm at every cell.
    pub fn magnitude(&self) -> Array3<f64> {
        let mut mag = Array3::zeros(self.shape());
        ndarray::Zip::from(&mut mag)
            .and(&self.u)
            .and(&self.v)
            .and(&self.w)
            .for_each(|m, &u, &v, &w| *m = (u * u + v * v + w * w).sqrt());
        mag
    }

    /// Element-wise sum of several fields of the same shape.
    pub fn sum(fields: &[&VectorField]) -> Self {
        let shape = fields.first().map_or((0, 0, 0), |f| f.shape());
        let mut total = Self::zeros(shape);
        for field in fields {
            total.u += &field.u;
            total.v += &field.v;
            total.w += &field.w;
        }
        total
    }

    /// Multiply every component by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for c in self.components_mut() {
            c.mapv_inplace(|v| v * factor);
        }
        self
    }
}

/// Physical constants and per-frame controls for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Permittivity used for the scalar potential source term.
    pub epsilon: f64,
    /// Permeability used for the vector potential source term.
    pub mu: f64,
    /// Relaxation passes per solve.
    pub iterations: usize,
    /// Simulation time at which the next frame is evaluated.
    pub time: f64,
    /// Increment applied by `advance_time`; also the induction time step.
    pub time_step: f64,
    /// Multiplier applied to the summed field before encoding.
    pub scale: f64,
    /// Draw every non-zero vector with length `scale`.
    pub normalize: bool,
    /// Colour segments by relative magnitude; white otherwise.
    pub colorize: bool,
    /// Minimum normalised magnitude for a vector to be emitted.
    pub significance_threshold: f64,
    /// Hue (degrees) assigned to the strongest vector.
    pub hue_range: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            mu: 1.0,
            iterations: 8,
            time: 0.0,
            time_step: 0.1,
            scale: 1.0,
            normalize: false,
            colorize: true,
            significance_threshold: 0.05,
            hue_range: 255.0,
        }
    }
}

/// Renderer-ready line segments, one per emitted vector.
///
/// `lines` holds start/end pairs, so it is twice as long as the other
/// vectors. Culled grid cells are absent rather than zero-length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderGeometry {
    /// Segment endpoints: `[start0, end0, start1, end1, ...]`.
    pub lines: Vec<[f64; 3]>,
    /// The same segments as `[sx, sy, sz, ex, ey, ez]` arrow records.
    pub arrows: Vec<[f64; 6]>,
    /// RGB colour per segment, components in [0, 1].
    pub colors: Vec<[f64; 3]>,
    /// Min-max normalised magnitude per segment, in [0, 1].
    pub magnitudes: Vec<f64>,
}

impl RenderGeometry {
    pub fn segment_count(&self) -> usize {
        self.arrows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty()
    }

    /// Each segment colour repeated once per endpoint, matching `lines`.
    pub fn vertex_colors(&self) -> Vec<[f64; 3]> {
        self.colors.iter().flat_map(|&c| [c, c]).collect()
    }
}
