use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::opt,
    multi::{many0, separated_list1},
    IResult, Parser,
};

use super::ast::{
    FetchSpec, JoinItem, JoinKindToken, QueryBlock, QueryBody, RootEntity, SelectStatement,
    SelectionItem, SetOperatorToken, SortItem, SortKey,
};
use super::common::{keyword, ws};
use super::errors::EqlParsingError;
use super::expression::{parse_expression, parse_path_segments, plain_identifier};

pub fn parse_select_statement(
    input: &str,
) -> IResult<&str, SelectStatement<'_>, EqlParsingError<'_>> {
    let (input, body) = parse_query_body(input)?;
    let (input, order_by) = parse_order_by(input)?;
    let (input, (offset, fetch)) = parse_paging(input)?;
    Ok((
        input,
        SelectStatement {
            body,
            order_by,
            offset,
            fetch,
        },
    ))
}

/// Left-associative set-operation chain over query blocks, preserving the
/// textual operand order.
fn parse_query_body(input: &str) -> IResult<&str, QueryBody<'_>, EqlParsingError<'_>> {
    let (mut input, block) = parse_query_block(input)?;
    let mut body = QueryBody::Block(Box::new(block));
    loop {
        let (rest, operator) = match parse_set_operator(input) {
            Ok(parsed) => parsed,
            Err(_) => break,
        };
        let (rest, right) = parse_query_block(rest)?;
        body = QueryBody::SetOperation {
            left: Box::new(body),
            operator,
            right: Box::new(QueryBody::Block(Box::new(right))),
        };
        input = rest;
    }
    Ok((input, body))
}

fn parse_set_operator(input: &str) -> IResult<&str, SetOperatorToken, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("UNION")).parse(input) {
        let (rest, all) = opt(ws(keyword("ALL"))).parse(rest)?;
        let operator = if all.is_some() {
            SetOperatorToken::UnionAll
        } else {
            SetOperatorToken::Union
        };
        return Ok((rest, operator));
    }
    if let Ok((rest, _)) = ws(keyword("INTERSECT")).parse(input) {
        return Ok((rest, SetOperatorToken::Intersect));
    }
    let (rest, _) = ws(keyword("EXCEPT")).parse(input)?;
    Ok((rest, SetOperatorToken::Except))
}

fn parse_query_block(input: &str) -> IResult<&str, QueryBlock<'_>, EqlParsingError<'_>> {
    let (input, _) = ws(keyword("SELECT")).parse(input)?;
    let (input, distinct) = opt(ws(keyword("DISTINCT"))).parse(input)?;
    let (input, selections) =
        separated_list1(ws(char(',')), parse_selection_item).parse(input)?;

    let (input, _) = ws(keyword("FROM")).parse(input)?;
    let (input, entity_name) = plain_identifier(input)?;
    let (input, alias) = parse_optional_alias(input)?;

    let (input, joins) = many0(parse_join).parse(input)?;

    let (input, where_clause) = parse_optional_where(input)?;

    Ok((
        input,
        QueryBlock {
            distinct: distinct.is_some(),
            selections,
            root: RootEntity { entity_name, alias },
            joins,
            where_clause,
        },
    ))
}

fn parse_selection_item(input: &str) -> IResult<&str, SelectionItem<'_>, EqlParsingError<'_>> {
    let (input, expression) = parse_expression(input)?;
    let (input, alias) = parse_optional_alias(input)?;
    Ok((input, SelectionItem { expression, alias }))
}

/// `[AS] alias` where `alias` must not be a clause keyword.
fn parse_optional_alias(input: &str) -> IResult<&str, Option<&str>, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("AS")).parse(input) {
        let (rest, alias) = ws(plain_identifier).parse(rest)?;
        return Ok((rest, Some(alias)));
    }
    match ws(plain_identifier).parse(input) {
        Ok((rest, alias)) => Ok((rest, Some(alias))),
        Err(_) => Ok((input, None)),
    }
}

fn parse_join(input: &str) -> IResult<&str, JoinItem<'_>, EqlParsingError<'_>> {
    let (input, kind) = parse_join_kind(input)?;
    let (input, fetch) = opt(ws(keyword("FETCH"))).parse(input)?;
    let (input, path) = ws(parse_path_segments).parse(input)?;
    let (input, alias) = parse_optional_alias(input)?;
    Ok((
        input,
        JoinItem {
            kind,
            fetch: fetch.is_some(),
            path,
            alias,
        },
    ))
}

fn parse_join_kind(input: &str) -> IResult<&str, JoinKindToken, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("LEFT")).parse(input) {
        let (rest, _) = opt(ws(keyword("OUTER"))).parse(rest)?;
        let (rest, _) = ws(keyword("JOIN")).parse(rest)?;
        return Ok((rest, JoinKindToken::Left));
    }
    if let Ok((rest, _)) = ws(keyword("INNER")).parse(input) {
        let (rest, _) = ws(keyword("JOIN")).parse(rest)?;
        return Ok((rest, JoinKindToken::Inner));
    }
    let (rest, _) = ws(keyword("JOIN")).parse(input)?;
    Ok((rest, JoinKindToken::Inner))
}

pub fn parse_optional_where(
    input: &str,
) -> IResult<&str, Option<super::ast::Expression<'_>>, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("WHERE")).parse(input) {
        let (rest, predicate) = parse_expression(rest)?;
        Ok((rest, Some(predicate)))
    } else {
        Ok((input, None))
    }
}

fn parse_order_by(input: &str) -> IResult<&str, Vec<SortItem<'_>>, EqlParsingError<'_>> {
    if let Ok((rest, _)) = ws(keyword("ORDER")).parse(input) {
        let (rest, _) = ws(keyword("BY")).parse(rest)?;
        let (rest, items) = separated_list1(ws(char(',')), parse_sort_item).parse(rest)?;
        Ok((rest, items))
    } else {
        Ok((input, Vec::new()))
    }
}

fn parse_sort_item(input: &str) -> IResult<&str, SortItem<'_>, EqlParsingError<'_>> {
    // A bare integer is a positional reference into the select list.
    let (input, key) = if let Ok((rest, digits)) = ws(digit1::<_, EqlParsingError>).parse(input) {
        let position = digits.parse::<u64>().map_err(|_| {
            nom::Err::Failure(EqlParsingError::new(input, "sort position out of range"))
        })?;
        (rest, SortKey::Position(position))
    } else {
        let (rest, expr) = parse_expression(input)?;
        (rest, SortKey::Expression(expr))
    };

    let (input, direction) = opt(ws(alt((keyword("ASC"), keyword("DESC"))))).parse(input)?;
    let descending = matches!(direction, Some(d) if d.eq_ignore_ascii_case("DESC"));
    Ok((input, SortItem { key, descending }))
}

/// Paging clauses, accepted in either order: `OFFSET n [ROWS]`,
/// `FETCH FIRST n [PERCENT] ROWS (ONLY | WITH TIES)`, `LIMIT n`.
fn parse_paging(
    input: &str,
) -> IResult<&str, (Option<u64>, Option<FetchSpec>), EqlParsingError<'_>> {
    let mut offset = None;
    let mut fetch = None;
    let mut input = input;
    loop {
        if offset.is_none() {
            if let Ok((rest, n)) = parse_offset(input) {
                offset = Some(n);
                input = rest;
                continue;
            }
        }
        if fetch.is_none() {
            if let Ok((rest, spec)) = parse_fetch_clause(input) {
                fetch = Some(spec);
                input = rest;
                continue;
            }
            if let Ok((rest, spec)) = parse_limit_clause(input) {
                fetch = Some(spec);
                input = rest;
                continue;
            }
        }
        break;
    }
    Ok((input, (offset, fetch)))
}

fn parse_offset(input: &str) -> IResult<&str, u64, EqlParsingError<'_>> {
    let (rest, _) = ws(keyword("OFFSET")).parse(input)?;
    let (rest, digits) = ws(digit1).parse(rest)?;
    let (rest, _) = opt(ws(keyword("ROWS"))).parse(rest)?;
    let n = digits
        .parse::<u64>()
        .map_err(|_| nom::Err::Failure(EqlParsingError::new(input, "offset out of range")))?;
    Ok((rest, n))
}

fn parse_fetch_clause(input: &str) -> IResult<&str, FetchSpec, EqlParsingError<'_>> {
    let (rest, _) = ws(keyword("FETCH")).parse(input)?;
    let (rest, _) = ws(keyword("FIRST")).parse(rest)?;
    let (rest, digits) = ws(digit1).parse(rest)?;
    let (rest, percent) = opt(ws(keyword("PERCENT"))).parse(rest)?;
    let (rest, _) = ws(keyword("ROWS")).parse(rest)?;
    let (rest, with_ties) = alt((
        ws(keyword("ONLY")).map(|_| false),
        ws(keyword("WITH")).and(ws(keyword("TIES"))).map(|_| true),
    ))
    .parse(rest)?;
    let count = digits
        .parse::<u64>()
        .map_err(|_| nom::Err::Failure(EqlParsingError::new(input, "fetch count out of range")))?;
    Ok((
        rest,
        FetchSpec {
            count,
            percent: percent.is_some(),
            with_ties,
        },
    ))
}

fn parse_limit_clause(input: &str) -> IResult<&str, FetchSpec, EqlParsingError<'_>> {
    let (rest, _) = ws(keyword("LIMIT")).parse(input)?;
    let (rest, digits) = ws(digit1).parse(rest)?;
    let count = digits
        .parse::<u64>()
        .map_err(|_| nom::Err::Failure(EqlParsingError::new(input, "limit out of range")))?;
    Ok((
        rest,
        FetchSpec {
            count,
            percent: false,
            with_ties: false,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eql_parser::ast::Expression;

    #[test]
    fn test_simple_select() {
        let (rest, stmt) =
            parse_select_statement("SELECT e.name FROM Employee e WHERE e.salary > 1000").unwrap();
        assert_eq!(rest.trim(), "");
        let QueryBody::Block(block) = &stmt.body else {
            panic!("expected a simple block");
        };
        assert_eq!(block.root.entity_name, "Employee");
        assert_eq!(block.root.alias, Some("e"));
        assert_eq!(block.selections.len(), 1);
        assert!(block.where_clause.is_some());
    }

    #[test]
    fn test_join_fetch() {
        let (_, stmt) = parse_select_statement(
            "SELECT e FROM Employee e JOIN FETCH e.department d LEFT JOIN e.manager m",
        )
        .unwrap();
        let QueryBody::Block(block) = &stmt.body else {
            panic!("expected a simple block");
        };
        assert_eq!(block.joins.len(), 2);
        assert!(block.joins[0].fetch);
        assert_eq!(block.joins[0].kind, JoinKindToken::Inner);
        assert_eq!(block.joins[0].path, vec!["e", "department"]);
        assert_eq!(block.joins[1].kind, JoinKindToken::Left);
        assert!(!block.joins[1].fetch);
    }

    #[test]
    fn test_union_all_chain_preserves_order() {
        let (_, stmt) = parse_select_statement(
            "SELECT e.name FROM Employee e UNION ALL SELECT c.name FROM Customer c \
             UNION SELECT s.name FROM Supplier s",
        )
        .unwrap();
        // ((e UNION ALL c) UNION s) - left-associative.
        let QueryBody::SetOperation { left, operator, .. } = &stmt.body else {
            panic!("expected a set operation");
        };
        assert_eq!(*operator, SetOperatorToken::Union);
        assert!(matches!(
            left.as_ref(),
            QueryBody::SetOperation {
                operator: SetOperatorToken::UnionAll,
                ..
            }
        ));
    }

    #[test]
    fn test_positional_order_by() {
        let (_, stmt) =
            parse_select_statement("SELECT e.name, e.salary FROM Employee e ORDER BY 2 DESC")
                .unwrap();
        assert_eq!(stmt.order_by.len(), 1);
        assert_eq!(stmt.order_by[0].key, SortKey::Position(2));
        assert!(stmt.order_by[0].descending);
    }

    #[test]
    fn test_fetch_first_with_ties() {
        let (_, stmt) = parse_select_statement(
            "SELECT e FROM Employee e ORDER BY e.salary DESC \
             OFFSET 10 ROWS FETCH FIRST 5 PERCENT ROWS WITH TIES",
        )
        .unwrap();
        assert_eq!(stmt.offset, Some(10));
        assert_eq!(
            stmt.fetch,
            Some(FetchSpec {
                count: 5,
                percent: true,
                with_ties: true,
            })
        );
    }

    #[test]
    fn test_limit_shorthand() {
        let (_, stmt) =
            parse_select_statement("SELECT e FROM Employee e LIMIT 3 OFFSET 6").unwrap();
        assert_eq!(stmt.offset, Some(6));
        assert_eq!(
            stmt.fetch,
            Some(FetchSpec {
                count: 3,
                percent: false,
                with_ties: false,
            })
        );
    }

    #[test]
    fn test_selection_alias_does_not_swallow_from() {
        let (_, stmt) = parse_select_statement("SELECT e.name n FROM Employee e").unwrap();
        let QueryBody::Block(block) = &stmt.body else {
            panic!("expected a simple block");
        };
        assert_eq!(block.selections[0].alias, Some("n"));
        assert!(matches!(
            block.selections[0].expression,
            Expression::Path(_)
        ));
    }
}
