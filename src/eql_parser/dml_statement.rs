use nom::{
    character::complete::char,
    combinator::opt,
    multi::separated_list1,
    IResult, Parser,
};

use super::ast::{Assignment, DeleteStatement, Expression, InsertStatement, UpdateStatement};
use super::common::{keyword, ws};
use super::errors::EqlParsingError;
use super::expression::{parse_expression, parse_path_segments, plain_identifier};
use super::select_statement::parse_optional_where;

pub fn parse_update_statement(
    input: &str,
) -> IResult<&str, UpdateStatement<'_>, EqlParsingError<'_>> {
    let (input, _) = ws(keyword("UPDATE")).parse(input)?;
    let (input, entity_name) = plain_identifier(input)?;
    let (input, alias) = parse_dml_alias(input)?;
    let (input, _) = ws(keyword("SET")).parse(input)?;
    let (input, assignments) =
        separated_list1(ws(char(',')), parse_assignment).parse(input)?;
    let (input, where_clause) = parse_optional_where(input)?;
    Ok((
        input,
        UpdateStatement {
            entity_name,
            alias,
            assignments,
            where_clause,
        },
    ))
}

fn parse_assignment(input: &str) -> IResult<&str, Assignment<'_>, EqlParsingError<'_>> {
    let (input, target) = ws(parse_path_segments).parse(input)?;
    let (input, _) = ws(char('=')).parse(input)?;
    let (input, value) = parse_expression(input)?;
    Ok((input, Assignment { target, value }))
}

pub fn parse_insert_statement(
    input: &str,
) -> IResult<&str, InsertStatement<'_>, EqlParsingError<'_>> {
    let (input, _) = ws(keyword("INSERT")).parse(input)?;
    let (input, _) = ws(keyword("INTO")).parse(input)?;
    let (input, entity_name) = plain_identifier(input)?;

    let (input, _) = ws(char('(')).parse(input)?;
    let (input, target_paths) =
        separated_list1(ws(char(',')), ws(parse_path_segments)).parse(input)?;
    let (input, _) = ws(char(')')).parse(input)?;

    let (input, _) = ws(keyword("VALUES")).parse(input)?;
    let (input, value_tuples) =
        separated_list1(ws(char(',')), parse_value_tuple).parse(input)?;

    Ok((
        input,
        InsertStatement {
            entity_name,
            target_paths,
            value_tuples,
        },
    ))
}

fn parse_value_tuple(input: &str) -> IResult<&str, Vec<Expression<'_>>, EqlParsingError<'_>> {
    let (input, _) = ws(char('(')).parse(input)?;
    let (input, values) = separated_list1(ws(char(',')), parse_expression).parse(input)?;
    let (input, _) = ws(char(')')).parse(input)?;
    Ok((input, values))
}

pub fn parse_delete_statement(
    input: &str,
) -> IResult<&str, DeleteStatement<'_>, EqlParsingError<'_>> {
    let (input, _) = ws(keyword("DELETE")).parse(input)?;
    let (input, _) = ws(keyword("FROM")).parse(input)?;
    let (input, entity_name) = plain_identifier(input)?;
    let (input, alias) = parse_dml_alias(input)?;
    let (input, where_clause) = parse_optional_where(input)?;
    Ok((
        input,
        DeleteStatement {
            entity_name,
            alias,
            where_clause,
        },
    ))
}

fn parse_dml_alias(input: &str) -> IResult<&str, Option<&str>, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("AS")).parse(input) {
        let (rest, alias) = ws(plain_identifier).parse(rest)?;
        return Ok((rest, Some(alias)));
    }
    match opt(ws(plain_identifier)).parse(input) {
        Ok((rest, alias)) => Ok((rest, alias)),
        Err(_) => Ok((input, None)),
    }
}
