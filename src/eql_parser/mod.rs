//! Parser for EQL, the entity query language: a SQL-like surface over the
//! domain model (`SELECT e FROM Employee e JOIN FETCH e.department d ...`).
//!
//! Parsing produces an untyped, lifetimed AST borrowing from the input text;
//! type resolution against the domain model happens in the `sqm` stage.

use nom::Parser;

pub mod ast;
mod common;
mod dml_statement;
pub(crate) mod errors;
mod expression;
mod select_statement;

pub use common::strip_comments;
pub use errors::EqlParsingError;

use ast::EqlStatement;
use common::{starts_with_keyword, ws};

/// Parse one complete EQL statement. Trailing whitespace and an optional
/// `;` are accepted; any other unconsumed input is a parse error.
pub fn parse_statement(input: &str) -> Result<EqlStatement<'_>, EqlParsingError<'_>> {
    let (rest, statement) = parse_statement_partial(input).map_err(unwrap_nom_err)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(';').unwrap_or(rest);
    if !rest.trim().is_empty() {
        return Err(EqlParsingError::new(rest, "unexpected trailing input"));
    }
    Ok(statement)
}

fn parse_statement_partial(
    input: &str,
) -> nom::IResult<&str, EqlStatement<'_>, EqlParsingError<'_>> {
    if starts_with_keyword(input, "UPDATE") {
        let (rest, stmt) = dml_statement::parse_update_statement(input)?;
        return Ok((rest, EqlStatement::Update(stmt)));
    }
    if starts_with_keyword(input, "INSERT") {
        let (rest, stmt) = dml_statement::parse_insert_statement(input)?;
        return Ok((rest, EqlStatement::Insert(stmt)));
    }
    if starts_with_keyword(input, "DELETE") {
        let (rest, stmt) = dml_statement::parse_delete_statement(input)?;
        return Ok((rest, EqlStatement::Delete(stmt)));
    }
    let (rest, stmt) = ws(select_statement::parse_select_statement).parse(input)?;
    Ok((rest, EqlStatement::Select(stmt)))
}

fn unwrap_nom_err(err: nom::Err<EqlParsingError<'_>>) -> EqlParsingError<'_> {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => EqlParsingError {
            errors: vec![("", "incomplete input")],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_leading_keyword() {
        assert!(matches!(
            parse_statement("SELECT e FROM Employee e").unwrap(),
            EqlStatement::Select(_)
        ));
        assert!(matches!(
            parse_statement("update Employee e set e.name = 'x'").unwrap(),
            EqlStatement::Update(_)
        ));
        assert!(matches!(
            parse_statement("INSERT INTO Employee (name) VALUES ('a')").unwrap(),
            EqlStatement::Insert(_)
        ));
        assert!(matches!(
            parse_statement("DELETE FROM Employee e").unwrap(),
            EqlStatement::Delete(_)
        ));
    }

    #[test]
    fn test_trailing_semicolon_accepted() {
        assert!(parse_statement("SELECT e FROM Employee e;").is_ok());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_statement("SELECT e FROM Employee e garbage !").unwrap_err();
        assert!(err
            .errors
            .iter()
            .any(|(_, ctx)| ctx.contains("trailing input")));
    }

    #[test]
    fn test_comments_stripped_before_parse() {
        let stripped = strip_comments(
            "SELECT e -- pick the root\nFROM Employee e /* no filter */",
        );
        assert!(parse_statement(&stripped).is_ok());
    }
}
