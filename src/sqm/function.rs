//! Function registry and call-site argument validation.
//!
//! Each registered function declares an [`ArgumentsValidator`]; argument
//! lists are checked at tree-construction time, so a bad call never reaches
//! SQL generation. Validators are stateless policies shared process-wide.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::errors::SemanticError;
use super::nodes::{SqmDomainType, SqmExpression};
use crate::type_registry::BasicTypeId;

/// Per-argument type requirement, checked by assignability of the argument's
/// resolved type. Parameters have no resolved type yet and always pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentTypeConstraint {
    Any,
    Numeric,
    Character,
    Temporal,
    Exact(BasicTypeId),
}

impl ArgumentTypeConstraint {
    fn admits(&self, node_type: &SqmDomainType) -> bool {
        let basic = match node_type {
            SqmDomainType::Basic(t) => t,
            _ => return matches!(self, ArgumentTypeConstraint::Any),
        };
        match self {
            ArgumentTypeConstraint::Any => true,
            ArgumentTypeConstraint::Numeric => basic.is_numeric(),
            ArgumentTypeConstraint::Character => *basic == BasicTypeId::String,
            ArgumentTypeConstraint::Temporal => basic.is_temporal(),
            ArgumentTypeConstraint::Exact(expected) => basic == expected,
        }
    }

    fn describe(&self) -> String {
        match self {
            ArgumentTypeConstraint::Any => "any type".to_string(),
            ArgumentTypeConstraint::Numeric => "a numeric type".to_string(),
            ArgumentTypeConstraint::Character => "a character type".to_string(),
            ArgumentTypeConstraint::Temporal => "a temporal type".to_string(),
            ArgumentTypeConstraint::Exact(t) => format!("type '{}'", t.name()),
        }
    }
}

/// Stateless arity/type policy for one function's argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentsValidator {
    /// The function takes no arguments.
    NoArgs,
    /// Exactly N arguments.
    Exactly(usize),
    /// Between min and max arguments, inclusive.
    Between(usize, usize),
    /// At least N arguments.
    Min(usize),
    /// At most N arguments.
    Max(usize),
    /// Per-position type constraints; arity is not checked here - compose
    /// with an arity validator.
    TypesMatch(Vec<ArgumentTypeConstraint>),
    /// Every aggregated validator must pass.
    Composite(Vec<ArgumentsValidator>),
}

impl ArgumentsValidator {
    pub fn validate(
        &self,
        function: &str,
        args: &[SqmExpression],
    ) -> Result<(), SemanticError> {
        let found = args.len();
        match self {
            ArgumentsValidator::NoArgs => {
                if found != 0 {
                    return Err(count_mismatch(function, "no".to_string(), found));
                }
            }
            ArgumentsValidator::Exactly(n) => {
                if found != *n {
                    return Err(count_mismatch(function, n.to_string(), found));
                }
            }
            ArgumentsValidator::Between(min, max) => {
                if found < *min || found > *max {
                    return Err(count_mismatch(
                        function,
                        format!("between {} and {}", min, max),
                        found,
                    ));
                }
            }
            ArgumentsValidator::Min(n) => {
                if found < *n {
                    return Err(count_mismatch(function, format!("at least {}", n), found));
                }
            }
            ArgumentsValidator::Max(n) => {
                if found > *n {
                    return Err(count_mismatch(function, format!("at most {}", n), found));
                }
            }
            ArgumentsValidator::TypesMatch(constraints) => {
                for (position, (constraint, arg)) in
                    constraints.iter().zip(args.iter()).enumerate()
                {
                    // An unresolved parameter type is checked at bind time.
                    if matches!(arg, SqmExpression::Parameter(p) if p.inferred_type.is_none()) {
                        continue;
                    }
                    let node_type = arg.node_type();
                    if !constraint.admits(&node_type) {
                        return Err(SemanticError::ArgumentTypeMismatch {
                            function: function.to_string(),
                            position,
                            expected: constraint.describe(),
                            found: node_type.describe(),
                        });
                    }
                }
            }
            ArgumentsValidator::Composite(validators) => {
                for validator in validators {
                    validator.validate(function, args)?;
                }
            }
        }
        Ok(())
    }

    /// Human-readable signature derived purely from the declared arity
    /// bounds: `(arg0, arg1)` for exactly-2, `(arg0[, arg1[, arg2]])` for
    /// between-1-and-3, `(arg0, arg1[, ...])` for an open-ended min bound.
    pub fn signature(&self) -> String {
        match self {
            ArgumentsValidator::NoArgs => "()".to_string(),
            ArgumentsValidator::Exactly(n) => {
                let args: Vec<String> = (0..*n).map(|i| format!("arg{}", i)).collect();
                format!("({})", args.join(", "))
            }
            ArgumentsValidator::Between(min, max) => {
                let mut sig = String::from("(");
                for i in 0..*min {
                    if i > 0 {
                        sig.push_str(", ");
                    }
                    sig.push_str(&format!("arg{}", i));
                }
                for i in *min..*max {
                    sig.push_str(&format!("[, arg{}", i));
                }
                for _ in *min..*max {
                    sig.push(']');
                }
                sig.push(')');
                sig
            }
            ArgumentsValidator::Min(n) => {
                let mut sig = String::from("(");
                for i in 0..*n {
                    if i > 0 {
                        sig.push_str(", ");
                    }
                    sig.push_str(&format!("arg{}", i));
                }
                sig.push_str("[, ...])");
                sig
            }
            ArgumentsValidator::Max(n) => {
                let mut sig = String::from("(");
                for i in 0..*n {
                    sig.push_str(&format!("[arg{}", i));
                    if i + 1 < *n {
                        sig.push_str(", ");
                    }
                }
                for _ in 0..*n {
                    sig.push(']');
                }
                sig.push(')');
                sig
            }
            ArgumentsValidator::TypesMatch(constraints) => {
                let args: Vec<String> =
                    (0..constraints.len()).map(|i| format!("arg{}", i)).collect();
                format!("({})", args.join(", "))
            }
            ArgumentsValidator::Composite(validators) => validators
                .first()
                .map(|v| v.signature())
                .unwrap_or_else(|| "()".to_string()),
        }
    }
}

fn count_mismatch(function: &str, expected: String, found: usize) -> SemanticError {
    SemanticError::ArgumentCountMismatch {
        function: function.to_string(),
        expected,
        found,
    }
}

/// How a function's return type is derived from its call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnTypeRule {
    Fixed(BasicTypeId),
    /// Return type follows the first argument's basic type.
    FirstArgument,
}

#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub eql_name: &'static str,
    pub sql_name: &'static str,
    pub validator: ArgumentsValidator,
    pub return_type: ReturnTypeRule,
    pub aggregate: bool,
}

impl FunctionDescriptor {
    /// Resolve the call's return type once arguments validated.
    pub fn resolve_return_type(&self, args: &[SqmExpression]) -> BasicTypeId {
        match self.return_type {
            ReturnTypeRule::Fixed(t) => t,
            ReturnTypeRule::FirstArgument => match args.first().map(|a| a.node_type()) {
                Some(SqmDomainType::Basic(t)) => t,
                _ => BasicTypeId::String,
            },
        }
    }
}

/// Look up a function descriptor by its (case-insensitive) EQL name.
pub fn get_function(name: &str) -> Option<&'static FunctionDescriptor> {
    let lower = name.to_lowercase();
    FUNCTION_REGISTRY.get(lower.as_str())
}

lazy_static! {
    static ref FUNCTION_REGISTRY: HashMap<&'static str, FunctionDescriptor> = {
        use ArgumentTypeConstraint::*;
        use ArgumentsValidator::*;

        let mut m = HashMap::new();
        let mut register = |d: FunctionDescriptor| {
            m.insert(d.eql_name, d);
        };

        // ===== STRING FUNCTIONS =====

        register(FunctionDescriptor {
            eql_name: "upper",
            sql_name: "upper",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Character])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::String),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "lower",
            sql_name: "lower",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Character])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::String),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "length",
            sql_name: "character_length",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Character])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Integer),
            aggregate: false,
        });
        // substring(str, start [, length]) - 1-based start, per SQL
        register(FunctionDescriptor {
            eql_name: "substring",
            sql_name: "substring",
            validator: Composite(vec![
                Between(2, 3),
                TypesMatch(vec![Character, Numeric, Numeric]),
            ]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::String),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "trim",
            sql_name: "trim",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Character])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::String),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "concat",
            sql_name: "concat",
            validator: Min(2),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::String),
            aggregate: false,
        });

        // ===== NUMERIC FUNCTIONS =====

        register(FunctionDescriptor {
            eql_name: "abs",
            sql_name: "abs",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Numeric])]),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "sqrt",
            sql_name: "sqrt",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Numeric])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Float),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "mod",
            sql_name: "mod",
            validator: Composite(vec![Exactly(2), TypesMatch(vec![Numeric, Numeric])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Integer),
            aggregate: false,
        });

        // ===== NULL HANDLING =====

        register(FunctionDescriptor {
            eql_name: "coalesce",
            sql_name: "coalesce",
            validator: Min(1),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "nullif",
            sql_name: "nullif",
            validator: Exactly(2),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: false,
        });

        // ===== CURRENT DATE/TIME =====

        register(FunctionDescriptor {
            eql_name: "current_date",
            sql_name: "current_date",
            validator: NoArgs,
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Date),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "current_time",
            sql_name: "current_time",
            validator: NoArgs,
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Time),
            aggregate: false,
        });
        register(FunctionDescriptor {
            eql_name: "current_timestamp",
            sql_name: "current_timestamp",
            validator: NoArgs,
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Timestamp),
            aggregate: false,
        });

        // ===== AGGREGATES =====

        register(FunctionDescriptor {
            eql_name: "count",
            sql_name: "count",
            validator: Exactly(1),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Integer),
            aggregate: true,
        });
        register(FunctionDescriptor {
            eql_name: "sum",
            sql_name: "sum",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Numeric])]),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: true,
        });
        register(FunctionDescriptor {
            eql_name: "avg",
            sql_name: "avg",
            validator: Composite(vec![Exactly(1), TypesMatch(vec![Numeric])]),
            return_type: ReturnTypeRule::Fixed(BasicTypeId::Float),
            aggregate: true,
        });
        register(FunctionDescriptor {
            eql_name: "min",
            sql_name: "min",
            validator: Exactly(1),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: true,
        });
        register(FunctionDescriptor {
            eql_name: "max",
            sql_name: "max",
            validator: Exactly(1),
            return_type: ReturnTypeRule::FirstArgument,
            aggregate: true,
        });

        m
    };
}
