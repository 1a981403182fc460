//! Splitting source descriptions into superposed region clauses.
//!
//! A position expression is a list of clauses joined by top-level `or`.
//! Each clause is either one condition or several joined by top-level
//! `and`, in which case the clause covers the intersection of all of them.
//! The strength expression carries one formula per clause, joined by `or`
//! in the same order. Current strengths hold three comma-separated
//! formulas per clause, one per component.
//!
//! "Top-level" means outside parentheses: `(x > 0 or y > 0)` stays a single
//! boolean condition.

use thiserror::Error;

use crate::ast::Expr;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::parser::parse_tokens;
use crate::ExprError;

/// Errors raised while splitting and parsing a position/strength pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("syntax error in clause {clause} ('{expression}'): {source}")]
    Syntax {
        clause: usize,
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("position has {positions} clause(s) but strength has {strengths} in '{expression}'")]
    ClauseCountMismatch {
        positions: usize,
        strengths: usize,
        expression: String,
    },
}

/// One superposed object: a region mask and the strength inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionClause<S> {
    /// Source text of the position clause.
    pub position_text: String,
    /// Conditions whose intersection defines the region.
    pub conditions: Vec<Expr>,
    /// Source text of the strength clause.
    pub strength_text: String,
    pub strength: S,
}

/// Parse a charge description: one scalar strength formula per clause.
pub fn parse_charge_regions(
    position: &str,
    strength: &str,
) -> Result<Vec<RegionClause<Expr>>, RegionError> {
    parse_regions(position, strength, |tokens, text, offset| {
        parse_tokens(tokens, offset).map_err(|source| syntax(0, text, source))
    })
}

/// Parse a current description: three component formulas per clause.
pub fn parse_current_regions(
    position: &str,
    strength: &str,
) -> Result<Vec<RegionClause<[Expr; 3]>>, RegionError> {
    parse_regions(position, strength, |tokens, text, offset| {
        let parts = split_top_level(tokens, offset, TokenKind::Comma);
        let [u, v, w] = parts.as_slice() else {
            return Err(syntax(0, text, ExprError::WrongComponentCount { found: parts.len() }));
        };
        let parse = |piece: &Piece| {
            parse_tokens(piece.tokens, piece.offset).map_err(|source| syntax(0, text, source))
        };
        Ok([parse(u)?, parse(v)?, parse(w)?])
    })
}

fn parse_regions<S>(
    position: &str,
    strength: &str,
    parse_strength: impl Fn(&[Token], &str, usize) -> Result<S, RegionError>,
) -> Result<Vec<RegionClause<S>>, RegionError> {
    // A blank position means "no objects"; the strength text is not consulted.
    if position.trim().is_empty() {
        return Ok(Vec::new());
    }

    let position_tokens = tokenize(position).map_err(|source| syntax(0, position, source))?;
    let strength_tokens = tokenize(strength).map_err(|source| syntax(0, strength, source))?;

    let position_clauses = split_top_level(&position_tokens, 0, TokenKind::Or);
    let strength_clauses = split_top_level(&strength_tokens, 0, TokenKind::Or);

    if strength_tokens.is_empty() || position_clauses.len() != strength_clauses.len() {
        return Err(RegionError::ClauseCountMismatch {
            positions: position_clauses.len(),
            strengths: if strength_tokens.is_empty() { 0 } else { strength_clauses.len() },
            expression: format!("{} | {}", position.trim(), strength.trim()),
        });
    }

    let mut clauses = Vec::with_capacity(position_clauses.len());
    for (index, (pos_piece, str_piece)) in
        position_clauses.into_iter().zip(strength_clauses).enumerate()
    {
        let position_text = clause_text(position, pos_piece.tokens);
        let strength_text = clause_text(strength, str_piece.tokens);

        let mut conditions = Vec::new();
        for condition in split_top_level(pos_piece.tokens, pos_piece.offset, TokenKind::And) {
            let expr = parse_tokens(condition.tokens, condition.offset)
                .map_err(|source| syntax(index, &position_text, source))?;
            conditions.push(expr);
        }

        let strength_value = parse_strength(str_piece.tokens, &strength_text, str_piece.offset)
            .map_err(|err| match err {
                RegionError::Syntax { source, .. } => syntax(index, &strength_text, source),
                other => other,
            })?;

        clauses.push(RegionClause {
            position_text,
            conditions,
            strength_text,
            strength: strength_value,
        });
    }

    Ok(clauses)
}

fn syntax(clause: usize, expression: &str, source: ExprError) -> RegionError {
    RegionError::Syntax { clause, expression: expression.trim().to_string(), source }
}

/// A run of tokens between separators, with the byte offset where it begins.
#[derive(Debug, Clone, Copy)]
struct Piece<'a> {
    tokens: &'a [Token],
    offset: usize,
}

/// Split `tokens` at every `separator` that sits outside parentheses.
///
/// Always returns at least one (possibly empty) piece.
fn split_top_level(tokens: &[Token], offset: usize, separator: TokenKind) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut piece_offset = offset;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            ref kind if depth == 0 && *kind == separator => {
                pieces.push(Piece { tokens: &tokens[start..i], offset: piece_offset });
                start = i + 1;
                piece_offset = tok.end;
            }
            _ => {}
        }
    }
    pieces.push(Piece { tokens: &tokens[start..], offset: piece_offset });
    pieces
}

fn clause_text(src: &str, tokens: &[Token]) -> String {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => src[first.start..last.end].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CellVars;

    #[test]
    fn test_or_clauses_pair_with_strengths() {
        let clauses = parse_charge_regions("r < 1 or x > 2", "1 or -2").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].position_text, "r < 1");
        assert_eq!(clauses[1].strength_text, "-2");
        let vars = CellVars::at(0.0, 0.0, 0.0, 0.0);
        assert_eq!(clauses[1].strength.eval(&vars), -2.0);
    }

    #[test]
    fn test_and_clause_keeps_every_condition() {
        let clauses = parse_charge_regions("x > 0 and y > 0 and z > 0", "3").unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].conditions.len(), 3);
    }

    #[test]
    fn test_parenthesised_or_is_not_structural() {
        let clauses = parse_charge_regions("(x > 0 or y > 0) and z < 1", "1").unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].conditions.len(), 2);
    }

    #[test]
    fn test_identifiers_containing_keywords_do_not_split() {
        // `random`/`floor` contain `and`/`or`; neither splits nor parses as a
        // keyword, so the error is about the unknown function, not the clause count.
        let err = parse_charge_regions("random(x) > 0", "1").unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { source: ExprError::UnknownFunction { .. }, .. }
        ));
        let ok = parse_charge_regions("floor(x) == 0", "1").unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_clause_count_mismatch() {
        let err = parse_charge_regions("r < 1 or r > 2", "1").unwrap_err();
        assert_eq!(
            err,
            RegionError::ClauseCountMismatch {
                positions: 2,
                strengths: 1,
                expression: "r < 1 or r > 2 | 1".into(),
            }
        );
    }

    #[test]
    fn test_blank_position_means_no_objects() {
        assert!(parse_charge_regions("  ", "1").unwrap().is_empty());
        assert!(parse_current_regions("", "").unwrap().is_empty());
    }

    #[test]
    fn test_current_components_split_on_top_level_commas() {
        let clauses = parse_current_regions("s < 1", "atan2(y, x), 0, 1").unwrap();
        let vars = CellVars::at(1.0, 0.0, 0.0, 0.0);
        let [u, v, w] = &clauses[0].strength;
        assert_eq!(u.eval(&vars), 0.0);
        assert_eq!(v.eval(&vars), 0.0);
        assert_eq!(w.eval(&vars), 1.0);
    }

    #[test]
    fn test_current_needs_three_components() {
        let err = parse_current_regions("s < 1", "0, 1").unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { source: ExprError::WrongComponentCount { found: 2 }, .. }
        ));
    }

    #[test]
    fn test_syntax_error_names_the_clause() {
        let err = parse_charge_regions("r < 1 or x >", "1 or 2").unwrap_err();
        match err {
            RegionError::Syntax { clause, expression, .. } => {
                assert_eq!(clause, 1);
                assert_eq!(expression, "x >");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dangling_or_is_an_empty_clause() {
        let err = parse_charge_regions("r < 1 or", "1 or 2").unwrap_err();
        assert!(matches!(
            err,
            RegionError::Syntax { clause: 1, source: ExprError::EmptyExpression { .. }, .. }
        ));
    }
}
