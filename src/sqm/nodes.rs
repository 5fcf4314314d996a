//! Typed semantic query model. Every node carries a resolved domain type at
//! construction time; an unresolvable node is a front-end error, never a
//! deferred one.

use std::fmt;

use crate::domain_model::NavigablePath;
use crate::type_registry::{BasicTypeId, DomainValue};

/// The resolved domain type of a semantic node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqmDomainType {
    Basic(BasicTypeId),
    Entity(String),
    Embeddable(String),
    /// Type of a `TYPE(alias)` literal. Terminal: never navigable.
    EntityTypeLiteral(String),
}

impl SqmDomainType {
    pub fn describe(&self) -> String {
        match self {
            SqmDomainType::Basic(t) => t.name().to_string(),
            SqmDomainType::Entity(name) => format!("entity {}", name),
            SqmDomainType::Embeddable(name) => format!("embeddable {}", name),
            SqmDomainType::EntityTypeLiteral(name) => format!("entity-type literal {}", name),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SqmDomainType::Basic(t) if t.is_numeric())
    }
}

/// How a limit expression counts rows. The kind always travels with the
/// expression; a limit without a kind cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchClauseKind {
    RowsOnly,
    RowsWithTies,
    PercentOnly,
    PercentWithTies,
}

impl FetchClauseKind {
    pub fn from_flags(percent: bool, with_ties: bool) -> Self {
        match (percent, with_ties) {
            (false, false) => FetchClauseKind::RowsOnly,
            (false, true) => FetchClauseKind::RowsWithTies,
            (true, false) => FetchClauseKind::PercentOnly,
            (true, true) => FetchClauseKind::PercentWithTies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmStatement {
    Select(SqmSelectStatement),
    Update(SqmUpdateStatement),
    Insert(SqmInsertStatement),
    Delete(SqmDeleteStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelectStatement {
    pub query_part: SqmQueryPart,
    pub sorts: Vec<SqmSortSpecification>,
    pub offset: Option<u64>,
    pub fetch: Option<(u64, FetchClauseKind)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmQueryPart {
    Spec(SqmQuerySpec),
    Group(SqmQueryGroup),
}

/// Union-family combination of sub-parts, in textual operand order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmQueryGroup {
    pub operator: SetOperator,
    pub parts: Vec<SqmQueryPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmQuerySpec {
    pub distinct: bool,
    pub root: SqmRoot,
    pub joins: Vec<SqmJoin>,
    pub selections: Vec<SqmSelection>,
    pub predicate: Option<SqmPredicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmRoot {
    pub entity_name: String,
    pub alias: String,
    pub navigable_path: NavigablePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmJoin {
    /// Association path being joined (terminal type is the target entity).
    pub path: SqmPath,
    pub alias: String,
    pub kind: JoinKind,
    /// `JOIN FETCH` - the joined association is materialized into the
    /// owning result rather than merely being navigable.
    pub fetched: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelection {
    pub expression: SqmExpression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmSortKey {
    Expression(SqmExpression),
    /// 1-based position into the root query part's select list. Resolved at
    /// SQL AST build time, against the root part only.
    Position(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmSortSpecification {
    pub key: SqmSortKey,
    pub descending: bool,
}

/// A dotted path resolved left-to-right against the domain model. The
/// attribute chain is kept by name; later stages re-resolve mappings against
/// the immutable model.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmPath {
    pub navigable_path: NavigablePath,
    pub root_alias: String,
    pub attribute_names: Vec<String>,
    pub terminal_type: SqmDomainType,
    /// Terminal attribute is a to-many association.
    pub terminal_is_plural: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmExpression {
    Literal {
        value: DomainValue,
        type_id: BasicTypeId,
    },
    Parameter(SqmParameter),
    Path(SqmPath),
    Function(SqmFunctionCall),
    Binary {
        op: SqmBinaryOp,
        lhs: Box<SqmExpression>,
        rhs: Box<SqmExpression>,
        result_type: BasicTypeId,
    },
    Negation {
        operand: Box<SqmExpression>,
        result_type: BasicTypeId,
    },
    /// `TYPE(alias)` - terminal entity-type literal.
    EntityType { alias: String, entity_name: String },
}

impl SqmExpression {
    pub fn node_type(&self) -> SqmDomainType {
        match self {
            SqmExpression::Literal { type_id, .. } => SqmDomainType::Basic(*type_id),
            SqmExpression::Parameter(p) => SqmDomainType::Basic(
                p.inferred_type.unwrap_or(BasicTypeId::String),
            ),
            SqmExpression::Path(path) => path.terminal_type.clone(),
            SqmExpression::Function(f) => SqmDomainType::Basic(f.return_type),
            SqmExpression::Binary { result_type, .. } => SqmDomainType::Basic(*result_type),
            SqmExpression::Negation { result_type, .. } => SqmDomainType::Basic(*result_type),
            SqmExpression::EntityType { entity_name, .. } => {
                SqmDomainType::EntityTypeLiteral(entity_name.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmParameter {
    pub label: ParameterLabel,
    /// Type inferred from the parameter's context (comparison counterpart,
    /// assignment target), when one was available.
    pub inferred_type: Option<BasicTypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterLabel {
    Named(String),
    Positional(u32),
}

impl fmt::Display for ParameterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLabel::Named(name) => write!(f, ":{}", name),
            ParameterLabel::Positional(n) => write!(f, "?{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmFunctionCall {
    pub function_name: String,
    pub sql_name: String,
    pub args: Vec<SqmExpression>,
    pub return_type: BasicTypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqmBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl SqmBinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            SqmBinaryOp::Add => "+",
            SqmBinaryOp::Sub => "-",
            SqmBinaryOp::Mul => "*",
            SqmBinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqmPredicate {
    Comparison {
        op: ComparisonOp,
        lhs: SqmExpression,
        rhs: SqmExpression,
    },
    Between {
        operand: SqmExpression,
        low: SqmExpression,
        high: SqmExpression,
        negated: bool,
    },
    InList {
        operand: SqmExpression,
        items: Vec<SqmExpression>,
        negated: bool,
    },
    Like {
        operand: SqmExpression,
        pattern: SqmExpression,
        negated: bool,
    },
    NullCheck {
        operand: SqmExpression,
        negated: bool,
    },
    Junction {
        conjunction: bool,
        predicates: Vec<SqmPredicate>,
    },
    Negated(Box<SqmPredicate>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmAssignment {
    pub target: SqmPath,
    pub value: SqmExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmUpdateStatement {
    pub entity_name: String,
    pub alias: String,
    pub assignments: Vec<SqmAssignment>,
    pub predicate: Option<SqmPredicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmInsertStatement {
    pub entity_name: String,
    pub target_paths: Vec<SqmPath>,
    pub value_tuples: Vec<Vec<SqmExpression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmDeleteStatement {
    pub entity_name: String,
    pub alias: String,
    pub predicate: Option<SqmPredicate>,
}

// --- Diagnostic rendering ---------------------------------------------------
//
// DML statements regenerate their clause text for logging: elements appear in
// insertion order, the first unseparated, later ones prefixed with ", ".

impl fmt::Display for SqmExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqmExpression::Literal { value, type_id } => {
                if value.is_null() {
                    f.write_str("null")
                } else {
                    match type_id {
                        BasicTypeId::String => write!(f, "'{}'", value),
                        _ => write!(f, "{}", value),
                    }
                }
            }
            SqmExpression::Parameter(p) => write!(f, "{}", p.label),
            SqmExpression::Path(path) => write!(f, "{}", path.navigable_path),
            SqmExpression::Function(call) => {
                write!(f, "{}(", call.function_name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            SqmExpression::Binary { op, lhs, rhs, .. } => {
                write!(f, "{} {} {}", lhs, op.symbol(), rhs)
            }
            SqmExpression::Negation { operand, .. } => write!(f, "-{}", operand),
            SqmExpression::EntityType { alias, .. } => write!(f, "type({})", alias),
        }
    }
}

impl fmt::Display for SqmUpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "update {} {} set ", self.entity_name, self.alias)?;
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{} = {}",
                assignment.target.navigable_path, assignment.value
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for SqmInsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert into {} (", self.entity_name)?;
        for (i, path) in self.target_paths.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&path.attribute_names.join("."))?;
        }
        f.write_str(") values ")?;
        for (i, tuple) in self.value_tuples.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("(")?;
            for (j, value) in tuple.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
