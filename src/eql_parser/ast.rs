use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A complete EQL statement.
#[derive(Debug, PartialEq, Clone)]
pub enum EqlStatement<'a> {
    Select(SelectStatement<'a>),
    Update(UpdateStatement<'a>),
    Insert(InsertStatement<'a>),
    Delete(DeleteStatement<'a>),
}

/// A select query: a body (single block or a set-operation tree over
/// blocks), plus the statement-level order-by and paging clauses.
#[derive(Debug, PartialEq, Clone)]
pub struct SelectStatement<'a> {
    pub body: QueryBody<'a>,
    pub order_by: Vec<SortItem<'a>>,
    pub offset: Option<u64>,
    pub fetch: Option<FetchSpec>,
}

/// Either a simple query block or a union-family combination. The tree shape
/// preserves the textual operand order.
#[derive(Debug, PartialEq, Clone)]
pub enum QueryBody<'a> {
    Block(Box<QueryBlock<'a>>),
    SetOperation {
        left: Box<QueryBody<'a>>,
        operator: SetOperatorToken,
        right: Box<QueryBody<'a>>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SetOperatorToken {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, PartialEq, Clone)]
pub struct QueryBlock<'a> {
    pub distinct: bool,
    pub selections: Vec<SelectionItem<'a>>,
    pub root: RootEntity<'a>,
    pub joins: Vec<JoinItem<'a>>,
    pub where_clause: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RootEntity<'a> {
    pub entity_name: &'a str,
    /// Identification variable; defaults to the entity name when absent.
    pub alias: Option<&'a str>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SelectionItem<'a> {
    pub expression: Expression<'a>,
    pub alias: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum JoinKindToken {
    Inner,
    Left,
}

/// `JOIN [FETCH] e.department d` - joins an association path, optionally
/// marking it as a fetch (materialized into the owning result).
#[derive(Debug, PartialEq, Clone)]
pub struct JoinItem<'a> {
    pub kind: JoinKindToken,
    pub fetch: bool,
    pub path: Vec<&'a str>,
    /// Defaults to the last path segment when absent.
    pub alias: Option<&'a str>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum SortKey<'a> {
    Expression(Expression<'a>),
    /// `ORDER BY 2` - 1-based position into the select list.
    Position(u64),
}

#[derive(Debug, PartialEq, Clone)]
pub struct SortItem<'a> {
    pub key: SortKey<'a>,
    pub descending: bool,
}

/// `FETCH FIRST n [PERCENT] ROWS (ONLY | WITH TIES)`; `LIMIT n` parses as
/// `{count: n, percent: false, with_ties: false}`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FetchSpec {
    pub count: u64,
    pub percent: bool,
    pub with_ties: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UpdateStatement<'a> {
    pub entity_name: &'a str,
    pub alias: Option<&'a str>,
    pub assignments: Vec<Assignment<'a>>,
    pub where_clause: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Assignment<'a> {
    pub target: Vec<&'a str>,
    pub value: Expression<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct InsertStatement<'a> {
    pub entity_name: &'a str,
    pub target_paths: Vec<Vec<&'a str>>,
    pub value_tuples: Vec<Vec<Expression<'a>>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeleteStatement<'a> {
    pub entity_name: &'a str,
    pub alias: Option<&'a str>,
    pub where_clause: Option<Expression<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression<'a> {
    Literal(Literal),
    Parameter(ParameterRef<'a>),
    /// Dotted navigation starting at an identification variable.
    Path(Vec<&'a str>),
    FunctionCall {
        name: &'a str,
        args: Vec<Expression<'a>>,
    },
    /// `TYPE(alias)` - the entity-type literal of an identification
    /// variable. Terminal: it cannot be navigated further.
    EntityType(&'a str),
    Unary {
        op: UnaryOp,
        operand: Box<Expression<'a>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
    },
    Between {
        operand: Box<Expression<'a>>,
        low: Box<Expression<'a>>,
        high: Box<Expression<'a>>,
        negated: bool,
    },
    InList {
        operand: Box<Expression<'a>>,
        items: Vec<Expression<'a>>,
        negated: bool,
    },
    Like {
        operand: Box<Expression<'a>>,
        pattern: Box<Expression<'a>>,
        negated: bool,
    },
    IsNull {
        operand: Box<Expression<'a>>,
        negated: bool,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Owned because quote escapes (`''`) are resolved during parsing.
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParameterRef<'a> {
    Named(&'a str),
    Positional(u32),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}
