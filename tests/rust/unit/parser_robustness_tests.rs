//! Parser edge cases and error conditions: malformed statements must fail
//! with an error, never a panic.

use relmap::eql_parser::{parse_statement, strip_comments};

#[test]
fn test_malformed_statements_do_not_panic() {
    let malformed = vec![
        "",
        "SELECT",
        "SELECT FROM",
        "SELECT e FROM",
        "SELECT e FROM Employee e WHERE",
        "SELECT e FROM Employee e ORDER",
        "SELECT e FROM Employee e ORDER BY",
        "SELECT e FROM Employee e JOIN",
        "UPDATE",
        "UPDATE Employee SET",
        "INSERT INTO Employee",
        "INSERT INTO Employee (name) VALUES",
        "DELETE",
        "SELECT e FROM Employee e UNION",
        "SELECT e, FROM Employee e",
        "SELECT e FROM Employee e WHERE e.name = ",
        "SELECT e FROM Employee e LIMIT abc",
    ];
    for query in malformed {
        // No panics; every one must come back as Err.
        assert!(
            parse_statement(query).is_err(),
            "expected parse failure for: {:?}",
            query
        );
    }
}

#[test]
fn test_malformed_temporal_literals_fail_at_parse_time() {
    for query in [
        "SELECT e FROM Employee e WHERE e.hired = DATE '2024-13-40'",
        "SELECT e FROM Employee e WHERE e.hired = DATE 'not-a-date'",
        "SELECT e FROM Employee e WHERE e.at = TIME '25:00:00'",
        "SELECT e FROM Employee e WHERE e.at = TIMESTAMP '2024-01-01'",
    ] {
        assert!(parse_statement(query).is_err(), "query: {}", query);
    }
}

#[test]
fn test_case_insensitive_keywords() {
    assert!(parse_statement("select e from Employee e where e.salary > 1").is_ok());
    assert!(parse_statement("SeLeCt e FrOm Employee e").is_ok());
}

#[test]
fn test_whitespace_and_comment_tolerance() {
    let stripped = strip_comments(
        "select   e\n\t from  Employee   e -- tail comment\n where /* block */ e.salary > 1",
    );
    assert!(parse_statement(&stripped).is_ok());
}

#[test]
fn test_keywords_do_not_match_identifier_prefixes() {
    // `selection` starts with `select` but is an ordinary identifier.
    let parsed = parse_statement("SELECT e.selection FROM Employee e");
    assert!(parsed.is_ok());
}
