use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{opt, recognize},
    multi::separated_list0,
    sequence::{pair, preceded},
    IResult, Parser,
};

use super::ast::{BinaryOp, Expression, Literal, ParameterRef, UnaryOp};
use super::common::{identifier, keyword, quoted_string, ws};
use super::errors::EqlParsingError;

type ExprResult<'a> = IResult<&'a str, Expression<'a>, EqlParsingError<'a>>;

/// Identifiers that can never be an identification variable or alias.
const RESERVED: &[&str] = &[
    "select", "from", "where", "order", "group", "by", "join", "left", "inner", "outer", "on",
    "fetch", "union", "intersect", "except", "all", "distinct", "as", "and", "or", "not", "in",
    "like", "between", "is", "null", "true", "false", "asc", "desc", "set", "values", "into",
    "update", "insert", "delete", "offset", "limit", "first", "rows", "only", "with", "ties",
    "percent", "type",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| word.eq_ignore_ascii_case(r))
}

/// An identifier that is not a reserved word - used for aliases so that a
/// clause keyword is never swallowed as an alias.
pub fn plain_identifier(input: &str) -> IResult<&str, &str, EqlParsingError<'_>> {
    let (rest, ident) = identifier(input)?;
    if is_reserved(ident) {
        Err(nom::Err::Error(EqlParsingError::new(
            input,
            "reserved word cannot be used as an identifier",
        )))
    } else {
        Ok((rest, ident))
    }
}

pub fn parse_expression(input: &str) -> ExprResult<'_> {
    parse_or(input)
}

fn parse_or(input: &str) -> ExprResult<'_> {
    let (mut input, mut lhs) = parse_and(input)?;
    while let Ok((rest, _)) = ws(keyword("OR")).parse(input) {
        let (rest, rhs) = parse_and(rest)?;
        lhs = Expression::Binary {
            op: BinaryOp::Or,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        input = rest;
    }
    Ok((input, lhs))
}

fn parse_and(input: &str) -> ExprResult<'_> {
    let (mut input, mut lhs) = parse_not(input)?;
    while let Ok((rest, _)) = ws(keyword("AND")).parse(input) {
        let (rest, rhs) = parse_not(rest)?;
        lhs = Expression::Binary {
            op: BinaryOp::And,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        input = rest;
    }
    Ok((input, lhs))
}

fn parse_not(input: &str) -> ExprResult<'_> {
    if let Ok((rest, _)) = ws(keyword("NOT")).parse(input) {
        let (rest, operand) = parse_not(rest)?;
        Ok((
            rest,
            Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
        ))
    } else {
        parse_predicate(input)
    }
}

/// An additive expression, optionally followed by one predicate tail:
/// comparison, `[NOT] BETWEEN`, `[NOT] IN`, `[NOT] LIKE`, `IS [NOT] NULL`.
fn parse_predicate(input: &str) -> ExprResult<'_> {
    let (input, operand) = parse_additive(input)?;

    // IS [NOT] NULL
    if let Ok((rest, _)) = ws(keyword("IS")).parse(input) {
        let (rest, negated) = opt(ws(keyword("NOT"))).parse(rest)?;
        let (rest, _) = ws(keyword("NULL")).parse(rest)?;
        return Ok((
            rest,
            Expression::IsNull {
                operand: Box::new(operand),
                negated: negated.is_some(),
            },
        ));
    }

    // Optional NOT before BETWEEN / IN / LIKE
    let (after_not, negation) = opt(ws(keyword("NOT"))).parse(input)?;
    let negated = negation.is_some();

    if let Ok((rest, _)) = ws(keyword("BETWEEN")).parse(after_not) {
        let (rest, low) = parse_additive(rest)?;
        let (rest, _) = ws(keyword("AND")).parse(rest)?;
        let (rest, high) = parse_additive(rest)?;
        return Ok((
            rest,
            Expression::Between {
                operand: Box::new(operand),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            },
        ));
    }
    if let Ok((rest, _)) = ws(keyword("IN")).parse(after_not) {
        let (rest, _) = ws(char('(')).parse(rest)?;
        let (rest, items) = separated_list0(ws(char(',')), parse_expression).parse(rest)?;
        let (rest, _) = ws(char(')')).parse(rest)?;
        return Ok((
            rest,
            Expression::InList {
                operand: Box::new(operand),
                items,
                negated,
            },
        ));
    }
    if let Ok((rest, _)) = ws(keyword("LIKE")).parse(after_not) {
        let (rest, pattern) = parse_additive(rest)?;
        return Ok((
            rest,
            Expression::Like {
                operand: Box::new(operand),
                pattern: Box::new(pattern),
                negated,
            },
        ));
    }
    if negated {
        // A dangling NOT with no predicate keyword is malformed.
        return Err(nom::Err::Error(EqlParsingError::new(
            input,
            "expected BETWEEN, IN or LIKE after NOT",
        )));
    }

    // Plain comparison
    if let Ok((rest, op)) = parse_comparison_op(input) {
        let (rest, rhs) = parse_additive(rest)?;
        return Ok((
            rest,
            Expression::Binary {
                op,
                lhs: Box::new(operand),
                rhs: Box::new(rhs),
            },
        ));
    }

    Ok((input, operand))
}

fn parse_comparison_op(input: &str) -> IResult<&str, BinaryOp, EqlParsingError<'_>> {
    // Longest symbols first so `<=` is not read as `<` `=`.
    ws(alt((
        tag("<>").map(|_| BinaryOp::Ne),
        tag("!=").map(|_| BinaryOp::Ne),
        tag("<=").map(|_| BinaryOp::Le),
        tag(">=").map(|_| BinaryOp::Ge),
        tag("=").map(|_| BinaryOp::Eq),
        tag("<").map(|_| BinaryOp::Lt),
        tag(">").map(|_| BinaryOp::Gt),
    )))
    .parse(input)
}

fn parse_additive(input: &str) -> ExprResult<'_> {
    let (mut input, mut lhs) = parse_multiplicative(input)?;
    loop {
        let op = if let Ok((rest, _)) = ws(char::<_, EqlParsingError>('+')).parse(input) {
            input = rest;
            BinaryOp::Add
        } else if let Ok((rest, _)) = ws(char::<_, EqlParsingError>('-')).parse(input) {
            input = rest;
            BinaryOp::Sub
        } else {
            break;
        };
        let (rest, rhs) = parse_multiplicative(input)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        input = rest;
    }
    Ok((input, lhs))
}

fn parse_multiplicative(input: &str) -> ExprResult<'_> {
    let (mut input, mut lhs) = parse_unary(input)?;
    loop {
        let op = if let Ok((rest, _)) = ws(char::<_, EqlParsingError>('*')).parse(input) {
            input = rest;
            BinaryOp::Mul
        } else if let Ok((rest, _)) = ws(char::<_, EqlParsingError>('/')).parse(input) {
            input = rest;
            BinaryOp::Div
        } else {
            break;
        };
        let (rest, rhs) = parse_unary(input)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        input = rest;
    }
    Ok((input, lhs))
}

fn parse_unary(input: &str) -> ExprResult<'_> {
    if let Ok((rest, _)) = ws(char::<_, EqlParsingError>('-')).parse(input) {
        let (rest, operand) = parse_primary(rest)?;
        Ok((
            rest,
            Expression::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
        ))
    } else {
        parse_primary(input)
    }
}

fn parse_primary(input: &str) -> ExprResult<'_> {
    ws(alt((
        parse_literal_expression,
        parse_parameter,
        parse_entity_type,
        parse_function_call,
        parse_path,
        parse_parenthesized,
    )))
    .parse(input)
}

fn parse_parenthesized(input: &str) -> ExprResult<'_> {
    let (rest, _) = char::<_, EqlParsingError>('(').parse(input)?;
    let (rest, expr) = parse_expression(rest)?;
    let (rest, _) = ws(char(')')).parse(rest)?;
    Ok((rest, expr))
}

/// `:name` or `?1`
fn parse_parameter(input: &str) -> ExprResult<'_> {
    if let Ok((rest, name)) = preceded(char::<_, EqlParsingError>(':'), identifier).parse(input) {
        return Ok((rest, Expression::Parameter(ParameterRef::Named(name))));
    }
    let (rest, digits) = preceded(char::<_, EqlParsingError>('?'), digit1).parse(input)?;
    let position = digits.parse::<u32>().map_err(|_| {
        nom::Err::Failure(EqlParsingError::new(
            input,
            "positional parameter label out of range",
        ))
    })?;
    Ok((rest, Expression::Parameter(ParameterRef::Positional(position))))
}

/// `TYPE(alias)` - terminal entity-type literal.
fn parse_entity_type(input: &str) -> ExprResult<'_> {
    let (rest, _) = keyword("TYPE").parse(input)?;
    let (rest, _) = ws(char('(')).parse(rest)?;
    let (rest, alias) = plain_identifier(rest)?;
    let (rest, _) = ws(char(')')).parse(rest)?;
    Ok((rest, Expression::EntityType(alias)))
}

fn parse_function_call(input: &str) -> ExprResult<'_> {
    let (rest, name) = identifier(input)?;
    if is_reserved(name) && !name.eq_ignore_ascii_case("type") {
        return Err(nom::Err::Error(EqlParsingError::new(
            input,
            "reserved word is not a function name",
        )));
    }
    // Only a function call if '(' follows directly or after whitespace.
    let (rest, _) = ws(char('(')).parse(rest)?;
    let (rest, args) = separated_list0(ws(char(',')), parse_expression).parse(rest)?;
    let (rest, _) = ws(char(')')).parse(rest)?;
    Ok((rest, Expression::FunctionCall { name, args }))
}

pub fn parse_path(input: &str) -> ExprResult<'_> {
    let (rest, segments) = parse_path_segments(input)?;
    Ok((rest, Expression::Path(segments)))
}

pub fn parse_path_segments(input: &str) -> IResult<&str, Vec<&str>, EqlParsingError<'_>> {
    let (mut rest, head) = plain_identifier(input)?;
    let mut segments = vec![head];
    while let Ok((r, seg)) =
        preceded(char::<_, EqlParsingError>('.'), identifier).parse(rest)
    {
        segments.push(seg);
        rest = r;
    }
    Ok((rest, segments))
}

fn parse_literal_expression(input: &str) -> ExprResult<'_> {
    let (rest, literal) = parse_literal(input)?;
    Ok((rest, Expression::Literal(literal)))
}

pub fn parse_literal(input: &str) -> IResult<&str, Literal, EqlParsingError<'_>> {
    alt((
        keyword("NULL").map(|_| Literal::Null),
        keyword("TRUE").map(|_| Literal::Boolean(true)),
        keyword("FALSE").map(|_| Literal::Boolean(false)),
        parse_temporal_literal,
        parse_numeric_literal,
        quoted_string.map(Literal::String),
    ))
    .parse(input)
}

/// Date/time/timestamp literals are coerced at parse time with fixed,
/// locale-independent formats; malformed text is a parse failure, not a
/// deferred error.
fn parse_temporal_literal(input: &str) -> IResult<&str, Literal, EqlParsingError<'_>> {
    if let Ok((rest, _)) = keyword("DATE").parse(input) {
        let (rest, text) = ws(quoted_string).parse(rest)?;
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
            nom::Err::Failure(EqlParsingError::new(
                input,
                "malformed date literal (expected yyyy-MM-dd)",
            ))
        })?;
        return Ok((rest, Literal::Date(date)));
    }
    if let Ok((rest, _)) = keyword("TIMESTAMP").parse(input) {
        let (rest, text) = ws(quoted_string).parse(rest)?;
        let ts = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").map_err(|_| {
            nom::Err::Failure(EqlParsingError::new(
                input,
                "malformed timestamp literal (expected yyyy-MM-dd HH:mm:ss[.SSS])",
            ))
        })?;
        return Ok((rest, Literal::Timestamp(ts)));
    }
    if let Ok((rest, _)) = keyword("TIME").parse(input) {
        let (rest, text) = ws(quoted_string).parse(rest)?;
        let time = NaiveTime::parse_from_str(&text, "%H:%M:%S").map_err(|_| {
            nom::Err::Failure(EqlParsingError::new(
                input,
                "malformed time literal (expected HH:mm:ss)",
            ))
        })?;
        return Ok((rest, Literal::Time(time)));
    }
    Err(nom::Err::Error(EqlParsingError::new(
        input,
        "not a temporal literal",
    )))
}

fn parse_numeric_literal(input: &str) -> IResult<&str, Literal, EqlParsingError<'_>> {
    // Float first so `3.14` is not read as integer `3` followed by junk.
    if let Ok((rest, text)) =
        recognize(pair(digit1::<_, EqlParsingError>, pair(char('.'), digit1))).parse(input)
    {
        let value = text.parse::<f64>().map_err(|_| {
            nom::Err::Failure(EqlParsingError::new(input, "float literal out of range"))
        })?;
        return Ok((rest, Literal::Float(value)));
    }
    let (rest, text) = digit1::<_, EqlParsingError>(input)?;
    let value = text.parse::<i64>().map_err(|_| {
        nom::Err::Failure(EqlParsingError::new(input, "integer literal out of range"))
    })?;
    Ok((rest, Literal::Integer(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let (rest, expr) = parse_expression("e.department.name ").unwrap();
        assert_eq!(rest.trim(), "");
        assert_eq!(expr, Expression::Path(vec!["e", "department", "name"]));
    }

    #[test]
    fn test_parse_comparison_precedence() {
        let (_, expr) = parse_expression("e.salary + 100 > 2000").unwrap();
        match expr {
            Expression::Binary { op: BinaryOp::Gt, lhs, .. } => match *lhs {
                Expression::Binary { op: BinaryOp::Add, .. } => {}
                other => panic!("expected additive lhs, got {:?}", other),
            },
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_logical_operators() {
        let (_, expr) = parse_expression("a.x = 1 and a.y = 2 or a.z = 3").unwrap();
        // OR binds weakest.
        assert!(matches!(expr, Expression::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn test_parse_date_literal() {
        let (_, expr) = parse_expression("DATE '2024-02-29'").unwrap();
        assert_eq!(
            expr,
            Expression::Literal(Literal::Date(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
    }

    #[test]
    fn test_malformed_date_literal_fails_at_parse_time() {
        let err = parse_expression("DATE '2024-13-01'").unwrap_err();
        assert!(matches!(err, nom::Err::Failure(_)));
    }

    #[test]
    fn test_parse_between() {
        let (_, expr) = parse_expression("e.salary BETWEEN 1000 AND 2000").unwrap();
        assert!(matches!(expr, Expression::Between { negated: false, .. }));
    }

    #[test]
    fn test_parse_not_in() {
        let (_, expr) = parse_expression("e.name NOT IN ('a', 'b')").unwrap();
        assert!(matches!(expr, Expression::InList { negated: true, .. }));
    }

    #[test]
    fn test_parse_is_not_null() {
        let (_, expr) = parse_expression("e.manager IS NOT NULL").unwrap();
        assert!(matches!(expr, Expression::IsNull { negated: true, .. }));
    }

    #[test]
    fn test_parse_function_call() {
        let (_, expr) = parse_expression("upper(e.name)").unwrap();
        assert_eq!(
            expr,
            Expression::FunctionCall {
                name: "upper",
                args: vec![Expression::Path(vec!["e", "name"])],
            }
        );
    }

    #[test]
    fn test_parse_entity_type_literal() {
        let (_, expr) = parse_expression("TYPE(e)").unwrap();
        assert_eq!(expr, Expression::EntityType("e"));
    }

    #[test]
    fn test_parse_parameters() {
        let (_, named) = parse_expression(":name").unwrap();
        assert_eq!(named, Expression::Parameter(ParameterRef::Named("name")));
        let (_, positional) = parse_expression("?2").unwrap();
        assert_eq!(
            positional,
            Expression::Parameter(ParameterRef::Positional(2))
        );
    }

    #[test]
    fn test_string_escape() {
        let (_, expr) = parse_expression("'o''brien'").unwrap();
        assert_eq!(expr, Expression::Literal(Literal::String("o'brien".into())));
    }
}
