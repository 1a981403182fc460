//! Errors surfaced by grid construction and source rasterization.
//!
//! The solver, the field operators and the encoder are total over finite
//! input and have no error path of their own.

use thiserror::Error;
use voltaic_expr::{ExprError, RegionError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Invalid mesh bounds: {0}")]
    InvalidMeshBounds(String),

    #[error("Expression syntax error in clause {clause} ('{expression}'): {source}")]
    ExpressionSyntax {
        clause: usize,
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("Expression evaluation failed in clause {clause} ('{expression}'): {message}")]
    ExpressionEval {
        clause: usize,
        expression: String,
        message: String,
    },

    #[error("Clause count mismatch: {positions} position clause(s) vs {strengths} strength clause(s) in '{expression}'")]
    ClauseCountMismatch {
        positions: usize,
        strengths: usize,
        expression: String,
    },
}

impl From<RegionError> for FieldError {
    fn from(err: RegionError) -> Self {
        match err {
            RegionError::Syntax { clause, expression, source } => {
                FieldError::ExpressionSyntax { clause, expression, source }
            }
            RegionError::ClauseCountMismatch { positions, strengths, expression } => {
                FieldError::ClauseCountMismatch { positions, strengths, expression }
            }
        }
    }
}
