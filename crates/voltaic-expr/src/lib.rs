//! # Voltaic Expr
//!
//! The small expression language used to describe where charges and
//! currents live and how strong they are. This crate provides:
//!
//! - **Tokenizer** ([`lexer`]): Splits expression text into tokens, treating
//!   `and`, `or` and `not` as keywords only when they stand alone.
//! - **Parser** ([`parser`]): Builds an [`Expr`](ast::Expr) tree with
//!   Python-style precedence (`**`/`^` power, chained comparisons).
//! - **Evaluator** ([`ast`]): Evaluates a tree against the per-cell
//!   variables `x, y, z, r, s, phi, theta, t`.
//! - **Regions** ([`region`]): Splits a position/strength pair into
//!   superposed `or` clauses, each an `and` intersection of conditions.
//!
//! Nothing here knows about grids; `voltaic-core` drives the evaluation
//! over every cell.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod region;

use thiserror::Error;

pub use ast::{CellVars, Expr};
pub use parser::parse_expr;
pub use region::{parse_charge_regions, parse_current_regions, RegionClause, RegionError};

/// Errors raised while tokenizing or parsing a single expression.
///
/// Offsets are byte offsets into the text handed to the tokenizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { offset: usize, text: String },

    #[error("expected {expected} at offset {offset}, found '{found}'")]
    UnexpectedToken {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    #[error("expression ended early, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unknown variable '{name}' at offset {offset}")]
    UnknownIdentifier { offset: usize, name: String },

    #[error("unknown function '{name}' at offset {offset}")]
    UnknownFunction { offset: usize, name: String },

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("empty expression at offset {offset}")]
    EmptyExpression { offset: usize },

    #[error("expected 3 comma-separated components, got {found}")]
    WrongComponentCount { found: usize },
}
