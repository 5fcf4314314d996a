//! Argument-validator behavior across the declared arity/type variants.

use relmap::sqm::function::{ArgumentTypeConstraint, ArgumentsValidator};
use relmap::sqm::nodes::SqmExpression;
use relmap::type_registry::{BasicTypeId, DomainValue};
use test_case::test_case;

fn int_arg(i: i64) -> SqmExpression {
    SqmExpression::Literal {
        value: DomainValue::Integer(i),
        type_id: BasicTypeId::Integer,
    }
}

fn args(n: usize) -> Vec<SqmExpression> {
    (0..n).map(|i| int_arg(i as i64)).collect()
}

#[test]
fn test_exactly_two_reports_expected_and_found() {
    let validator = ArgumentsValidator::Exactly(2);
    let err = validator.validate("nullif", &args(1)).unwrap_err().to_string();
    assert!(err.contains("expects 2"), "got: {}", err);
    assert!(err.contains("found 1"), "got: {}", err);
    assert!(validator.validate("nullif", &args(2)).is_ok());
    assert_eq!(validator.signature(), "(arg0, arg1)");
}

#[test_case(0, false; "zero fails")]
#[test_case(1, true; "one passes")]
#[test_case(2, true; "two passes")]
#[test_case(3, true; "three passes")]
#[test_case(4, false; "four fails")]
fn test_between_one_and_three(count: usize, passes: bool) {
    let validator = ArgumentsValidator::Between(1, 3);
    assert_eq!(validator.validate("substring", &args(count)).is_ok(), passes);
}

#[test]
fn test_no_args_and_min_and_max() {
    assert!(ArgumentsValidator::NoArgs.validate("current_date", &args(0)).is_ok());
    assert!(ArgumentsValidator::NoArgs.validate("current_date", &args(1)).is_err());

    let min = ArgumentsValidator::Min(2);
    assert!(min.validate("concat", &args(1)).is_err());
    assert!(min.validate("concat", &args(5)).is_ok());
    assert_eq!(min.signature(), "(arg0, arg1[, ...])");

    let max = ArgumentsValidator::Max(2);
    assert!(max.validate("f", &args(2)).is_ok());
    assert!(max.validate("f", &args(3)).is_err());
}

#[test]
fn test_composite_checks_arity_then_types() {
    let validator = ArgumentsValidator::Composite(vec![
        ArgumentsValidator::Exactly(1),
        ArgumentsValidator::TypesMatch(vec![ArgumentTypeConstraint::Character]),
    ]);
    // Wrong arity fails on the first aggregated validator.
    assert!(validator.validate("upper", &args(2)).is_err());
    // Right arity but wrong type fails on the second.
    assert!(validator.validate("upper", &args(1)).is_err());
    let string_arg = vec![SqmExpression::Literal {
        value: DomainValue::String("x".to_string()),
        type_id: BasicTypeId::String,
    }];
    assert!(validator.validate("upper", &string_arg).is_ok());
}

#[test]
fn test_between_signature_brackets_optional_tail() {
    assert_eq!(
        ArgumentsValidator::Between(1, 3).signature(),
        "(arg0[, arg1[, arg2]])"
    );
}
