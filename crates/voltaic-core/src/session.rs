//! Simulation session: the state a time-stepping driver carries between
//! frames.
//!
//! A session owns the grid, the parsed source expressions, the run
//! parameters and the vector potential of the previous frame. The previous
//! potential is what makes the induced electric field possible, so it is
//! only ever replaced after a whole frame has been computed; a failed frame
//! leaves it untouched. Sessions share nothing, so independent sessions can
//! run on separate threads.

use std::time::Instant;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use voltaic_expr::{parse_charge_regions, parse_current_regions, Expr, RegionClause};

use crate::encode::{encode, EncodeOptions};
use crate::error::FieldError;
use crate::fields::{electric_field, induced_electric_field, magnetic_field};
use crate::mesh::Grid;
use crate::rasterize::{rasterize_charge, rasterize_current};
use crate::solver::{PotentialSolver, RelaxationSolver};
use crate::types::{MeshBounds, RenderGeometry, SimulationParams, VectorField};

/// The four source expressions that describe charges and currents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceExpressions {
    pub charge_position: String,
    pub charge_strength: String,
    pub current_position: String,
    pub current_strength: String,
}

/// Everything computed for one frame, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub charge_density: Array3<f64>,
    pub current_density: VectorField,
    pub potential: Array3<f64>,
    pub vector_potential: VectorField,
    pub electric: VectorField,
    pub magnetic: VectorField,
    /// `-∂A/∂t` estimated against the previous frame.
    pub induced_electric: VectorField,
}

struct ParsedSources {
    charges: Vec<RegionClause<Expr>>,
    currents: Vec<RegionClause<[Expr; 3]>>,
}

impl ParsedSources {
    fn parse(sources: &SourceExpressions) -> Result<Self, FieldError> {
        Ok(Self {
            charges: parse_charge_regions(&sources.charge_position, &sources.charge_strength)?,
            currents: parse_current_regions(&sources.current_position, &sources.current_strength)?,
        })
    }
}

/// Time-stepping state for one simulation.
pub struct SimulationSession {
    grid: Grid,
    params: SimulationParams,
    sources: SourceExpressions,
    parsed: ParsedSources,
    /// Replaces the default relaxation solver when set.
    solver: Option<Box<dyn PotentialSolver + Send + Sync>>,
    previous_vector_potential: VectorField,
    boundary_warned: bool,
}

impl SimulationSession {
    /// Build the grid and parse the sources. The previous vector potential
    /// starts at zero.
    pub fn new(
        bounds: MeshBounds,
        step: f64,
        sources: SourceExpressions,
        params: SimulationParams,
    ) -> Result<Self, FieldError> {
        let grid = Grid::new(bounds, step)?;
        let parsed = ParsedSources::parse(&sources)?;
        let (nx, ny, nz) = grid.dims();
        log::info!("session grid {nx} x {ny} x {nz} (step {step})");

        Ok(Self {
            previous_vector_potential: VectorField::zeros(grid.shape()),
            grid,
            params,
            sources,
            parsed,
            solver: None,
            boundary_warned: false,
        })
    }

    /// Use `solver` instead of relaxation with `params.iterations` passes.
    pub fn with_solver(mut self, solver: Box<dyn PotentialSolver + Send + Sync>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn sources(&self) -> &SourceExpressions {
        &self.sources
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.params.time
    }

    pub fn previous_vector_potential(&self) -> &VectorField {
        &self.previous_vector_potential
    }

    pub fn method_name(&self) -> String {
        match &self.solver {
            Some(solver) => solver.method_name().to_string(),
            None => RelaxationSolver::new(self.params.iterations).method_name().to_string(),
        }
    }

    /// Replace the source expressions. On a parse error the session keeps
    /// its old sources. History is cleared on success.
    pub fn set_sources(&mut self, sources: SourceExpressions) -> Result<(), FieldError> {
        self.parsed = ParsedSources::parse(&sources)?;
        self.sources = sources;
        self.boundary_warned = false;
        self.reset_history();
        Ok(())
    }

    /// Replace the parameters and clear the history.
    pub fn set_params(&mut self, params: SimulationParams) {
        self.params = params;
        self.reset_history();
    }

    /// Advance the simulation time by one time step. The grid is unchanged.
    pub fn advance_time(&mut self) {
        self.params.time += self.params.time_step;
    }

    /// Forget the previous vector potential.
    pub fn reset_history(&mut self) {
        self.previous_vector_potential = VectorField::zeros(self.grid.shape());
    }

    /// Charge and current densities at the current time.
    pub fn densities(&self) -> Result<(Array3<f64>, VectorField), FieldError> {
        let t = self.params.time;
        let charge = rasterize_charge(&self.grid, t, &self.parsed.charges)?;
        let current = rasterize_current(&self.grid, t, &self.parsed.currents)?;
        Ok((charge, current))
    }

    /// Rasterize, solve and differentiate for the current time, then store
    /// the new vector potential as the history for the next frame.
    pub fn compute_fields(&mut self) -> Result<FieldSet, FieldError> {
        let started = Instant::now();
        let (charge_density, current_density) = self.densities()?;
        self.warn_on_boundary(&charge_density, &current_density);

        let relaxation = RelaxationSolver::new(self.params.iterations);
        let solver: &dyn PotentialSolver = match &self.solver {
            Some(solver) => solver.as_ref(),
            None => &relaxation,
        };

        let SimulationParams { epsilon, mu, time_step, .. } = self.params;
        let potential = solver.solve_scalar(&self.grid, &charge_density, epsilon);
        let vector_potential = solver.solve_vector(&self.grid, &current_density, mu, epsilon, None);

        let electric = electric_field(&potential);
        let magnetic = magnetic_field(&self.grid, &vector_potential);
        let induced_electric =
            induced_electric_field(&self.previous_vector_potential, &vector_potential, time_step);

        self.previous_vector_potential = vector_potential.clone();
        log::debug!("fields at t = {:.4} in {:.2?}", self.params.time, started.elapsed());

        Ok(FieldSet {
            charge_density,
            current_density,
            potential,
            vector_potential,
            electric,
            magnetic,
            induced_electric,
        })
    }

    /// One full frame: fields for the current time, summed and encoded.
    pub fn compute_frame(&mut self) -> Result<RenderGeometry, FieldError> {
        let fields = self.compute_fields()?;
        Ok(self.encode(&fields))
    }

    /// Encode an already computed field set with the session's display
    /// parameters.
    pub fn encode(&self, fields: &FieldSet) -> RenderGeometry {
        encode(
            &self.grid,
            &[&fields.electric, &fields.magnetic, &fields.induced_electric],
            &EncodeOptions::from(&self.params),
        )
    }

    fn warn_on_boundary(&mut self, charge: &Array3<f64>, current: &VectorField) {
        if self.boundary_warned {
            return;
        }
        let current_magnitude = current.magnitude();
        let touching = charge
            .indexed_iter()
            .zip(current_magnitude.iter())
            .any(|((idx, &rho), &j)| (rho != 0.0 || j != 0.0) && self.grid.on_boundary(idx));
        if touching {
            log::warn!(
                "sources reach the grid boundary; periodic wraparound will couple them to the opposite face"
            );
            self.boundary_warned = true;
        }
    }
}
