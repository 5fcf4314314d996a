use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until},
    character::complete::{alpha1, alphanumeric1, multispace0},
    combinator::{not, peek, recognize},
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair, terminated},
    IResult, Parser,
};

use super::errors::EqlParsingError;

pub fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

/// An identifier: a letter followed by alphanumerics/underscores. Leading
/// digits and underscores are rejected.
pub fn identifier(input: &str) -> IResult<&str, &str, EqlParsingError<'_>> {
    recognize(pair(
        alpha1,
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// A case-insensitive keyword with a word boundary, so `FROM` does not match
/// the prefix of `fromage`.
pub fn keyword<'a>(
    kw: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = EqlParsingError<'a>> {
    terminated(
        tag_no_case(kw),
        not(peek(alt((alphanumeric1::<&str, EqlParsingError<'a>>, tag("_"))))),
    )
}

/// Strip `--` line comments and `/* */` block comments before parsing.
/// Comment markers inside single-quoted string literals are preserved.
pub fn strip_comments(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.char_indices().peekable();
    let mut in_string = false;
    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '-' if query[i..].starts_with("--") => {
                for (_, c2) in chars.by_ref() {
                    if c2 == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if query[i..].starts_with("/*") => {
                chars.next();
                let mut prev = ' ';
                for (_, c2) in chars.by_ref() {
                    if prev == '*' && c2 == '/' {
                        break;
                    }
                    prev = c2;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// A single-quoted string literal with `''` as the quote escape. Returns the
/// unescaped content.
pub fn quoted_string(input: &str) -> IResult<&str, String, EqlParsingError<'_>> {
    let (mut rest, _) = tag::<_, _, EqlParsingError>("'").parse(input)?;
    let mut content = String::new();
    loop {
        let (r, chunk) = take_until::<_, _, EqlParsingError>("'").parse(rest)?;
        content.push_str(chunk);
        // Consume the quote; a doubled quote means an escaped quote.
        let r = &r[1..];
        if let Some(stripped) = r.strip_prefix('\'') {
            content.push('\'');
            rest = stripped;
        } else {
            return Ok((r, content));
        }
    }
}

/// Case-insensitive match helper used by statement dispatch.
pub fn starts_with_keyword(input: &str, kw: &str) -> bool {
    let trimmed = input.trim_start();
    trimmed.len() >= kw.len() && trimmed[..kw.len()].eq_ignore_ascii_case(kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("employee rest"), Ok((" rest", "employee")));
        assert_eq!(identifier("emp_1x,"), Ok((",", "emp_1x")));
        assert!(identifier("_emp").is_err());
        assert!(identifier("1emp").is_err());
    }

    #[test]
    fn test_keyword_respects_word_boundary() {
        assert!(keyword("FROM").parse("FROM Employee").is_ok());
        assert!(keyword("FROM").parse("from Employee").is_ok());
        assert!(keyword("FROM").parse("fromage").is_err());
    }

    #[test]
    fn test_quoted_string_with_escape() {
        assert_eq!(
            quoted_string("'it''s' rest"),
            Ok((" rest", "it's".to_string()))
        );
        assert_eq!(quoted_string("''"), Ok(("", String::new())));
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(
            strip_comments("select e -- trailing\nfrom Employee e"),
            "select e \nfrom Employee e"
        );
        assert_eq!(
            strip_comments("select /* inline */ e from Employee e"),
            "select   e from Employee e"
        );
        // Markers inside string literals survive.
        assert_eq!(strip_comments("where x = '--'"), "where x = '--'");
    }
}
