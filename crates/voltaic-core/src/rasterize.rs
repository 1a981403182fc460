//! Rasterization of region expressions into density grids.
//!
//! Every clause contributes `mask * strength` to the output, where the mask
//! is the intersection of the clause's conditions at each cell. Clauses are
//! superposed: later clauses add to earlier ones. The strength formula is
//! only evaluated where the mask holds, so `1/r` is fine for a region that
//! excludes the origin.

use ndarray::Array3;
use voltaic_expr::{parse_charge_regions, parse_current_regions, CellVars, Expr, RegionClause};

use crate::error::FieldError;
use crate::mesh::Grid;
use crate::types::VectorField;

/// Rasterize a charge description at time `time`.
pub fn charge_density(
    grid: &Grid,
    time: f64,
    position: &str,
    strength: &str,
) -> Result<Array3<f64>, FieldError> {
    let clauses = parse_charge_regions(position, strength)?;
    rasterize_charge(grid, time, &clauses)
}

/// Rasterize a current description at time `time`.
pub fn current_density(
    grid: &Grid,
    time: f64,
    position: &str,
    strength: &str,
) -> Result<VectorField, FieldError> {
    let clauses = parse_current_regions(position, strength)?;
    rasterize_current(grid, time, &clauses)
}

/// Rasterize already-parsed charge clauses.
pub fn rasterize_charge(
    grid: &Grid,
    time: f64,
    clauses: &[RegionClause<Expr>],
) -> Result<Array3<f64>, FieldError> {
    let mut density = Array3::zeros(grid.shape());
    for (index, clause) in clauses.iter().enumerate() {
        for_each_masked_cell(grid, time, index, clause, |idx, vars| {
            let value = checked(clause.strength.eval(vars), index, &clause.strength_text, vars)?;
            density[idx] += value;
            Ok(())
        })?;
    }
    Ok(density)
}

/// Rasterize already-parsed current clauses.
pub fn rasterize_current(
    grid: &Grid,
    time: f64,
    clauses: &[RegionClause<[Expr; 3]>],
) -> Result<VectorField, FieldError> {
    let mut density = VectorField::zeros(grid.shape());
    for (index, clause) in clauses.iter().enumerate() {
        for_each_masked_cell(grid, time, index, clause, |idx, vars| {
            for (component, expr) in density.components_mut().into_iter().zip(&clause.strength) {
                component[idx] += checked(expr.eval(vars), index, &clause.strength_text, vars)?;
            }
            Ok(())
        })?;
    }
    Ok(density)
}

/// Visit every cell where all of the clause's conditions hold.
fn for_each_masked_cell<S>(
    grid: &Grid,
    time: f64,
    index: usize,
    clause: &RegionClause<S>,
    mut visit: impl FnMut((usize, usize, usize), &CellVars) -> Result<(), FieldError>,
) -> Result<(), FieldError> {
    let (n0, n1, n2) = grid.shape();
    for i in 0..n0 {
        for j in 0..n1 {
            for k in 0..n2 {
                let [x, y, z] = grid.position((i, j, k));
                let vars = CellVars::at(x, y, z, time);
                if inside(clause, index, &vars)? {
                    visit((i, j, k), &vars)?;
                }
            }
        }
    }
    Ok(())
}

fn inside<S>(clause: &RegionClause<S>, index: usize, vars: &CellVars) -> Result<bool, FieldError> {
    for condition in &clause.conditions {
        let value = checked(condition.eval(vars), index, &clause.position_text, vars)?;
        if value == 0.0 {
            return Ok(false);
        }
    }
    Ok(true)
}

fn checked(value: f64, clause: usize, expression: &str, vars: &CellVars) -> Result<f64, FieldError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::ExpressionEval {
            clause,
            expression: expression.to_string(),
            message: format!(
                "non-finite value {value} at (x={:.4}, y={:.4}, z={:.4}, t={:.4})",
                vars.x, vars.y, vars.z, vars.t
            ),
        })
    }
}
