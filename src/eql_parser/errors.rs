use nom::error::{ContextError, ParseError};
use std::fmt;

/// Parse error carrying the offending input slice for each context frame,
/// so diagnostics can name the query fragment that failed.
#[derive(Debug, PartialEq)]
pub struct EqlParsingError<'a> {
    pub errors: Vec<(&'a str, &'static str)>,
}

impl<'a> EqlParsingError<'a> {
    pub fn new(input: &'a str, ctx: &'static str) -> Self {
        EqlParsingError {
            errors: vec![(input, ctx)],
        }
    }
}

impl<'a> ParseError<&'a str> for EqlParsingError<'a> {
    fn from_error_kind(input: &'a str, _kind: nom::error::ErrorKind) -> Self {
        EqlParsingError {
            errors: vec![(input, "unexpected input")],
        }
    }

    fn append(input: &'a str, _kind: nom::error::ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, "while parsing"));
        other
    }
}

impl<'a> ContextError<&'a str> for EqlParsingError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx));
        other
    }
}

impl fmt::Display for EqlParsingError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (input, ctx) in &self.errors {
            let fragment: String = input.chars().take(40).collect();
            writeln!(f, "{}: {}", ctx, fragment)?;
        }
        Ok(())
    }
}

impl<'a> From<nom::error::Error<&'a str>> for EqlParsingError<'a> {
    fn from(err: nom::error::Error<&'a str>) -> Self {
        EqlParsingError {
            errors: vec![(err.input, "unable to parse")],
        }
    }
}
