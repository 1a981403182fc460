//! # Voltaic Core
//!
//! The numerical engine of Voltaic. Given textual descriptions of charge and
//! current distributions, it computes approximate electric and magnetic
//! fields on a regular 3D grid and turns them into line geometry that a
//! renderer can draw as-is.
//!
//! ## Pipeline
//!
//! ```text
//! Grid ─► rasterize ─► relaxation solve ─► differentiate ─► encode ─► RenderGeometry
//! ```
//!
//! The potentials are obtained by Jacobi-style relaxation of the discrete
//! Laplacian with periodic wraparound at the grid edges. Sources should
//! therefore be kept away from the boundary; see [`solver`].
//!
//! ## Modules
//!
//! - [`mesh`]: Evenly spaced 3D coordinate grid.
//! - [`rasterize`]: Expression regions to charge/current density grids.
//! - [`solver`]: Potential solver trait and the relaxation implementation.
//! - [`fields`]: Gradient, curl and time-difference field operators.
//! - [`encode`]: Magnitude colouring, normalisation, culling and geometry.
//! - [`session`]: Time-stepping state carried between frames.
//! - [`types`]: Shared data structures (bounds, fields, parameters, geometry).

pub mod encode;
pub mod error;
pub mod fields;
pub mod mesh;
pub mod rasterize;
pub mod session;
pub mod solver;
pub mod types;

pub use error::FieldError;
pub use mesh::Grid;
pub use session::{FieldSet, SimulationSession, SourceExpressions};
pub use types::{MeshBounds, RenderGeometry, SimulationParams, VectorField};
