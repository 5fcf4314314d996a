//! SQL text rendering.
//!
//! The renderer is a strategy: the core treats it as a pure function from a
//! SQL AST to text plus an ordered parameter-binding list. The bundled
//! [`AnsiSqlRenderer`] emits ANSI-flavored SQL; a dialect supplies its own
//! implementation for target-specific syntax (limit/offset shape,
//! identifier quoting).

use crate::sql_ast::{
    DeleteStatement, InsertStatement, QueryPart, QueryPartKind, SelectStatement, SortKey,
    SqlExpression, SqlJoinKind, SqlStatement, TableGroup, UpdateStatement,
};
use crate::sqm::nodes::{FetchClauseKind, ParameterLabel, SetOperator};
use crate::type_registry::SqlValue;

pub(crate) mod errors;

pub use errors::SqlRenderError;

/// Literal SQL text plus the parameter labels in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub parameters: Vec<ParameterLabel>,
}

pub trait SqlRenderer {
    fn render(&self, statement: &SqlStatement) -> Result<RenderedSql, SqlRenderError>;
}

/// Default dialect-neutral renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiSqlRenderer;

impl SqlRenderer for AnsiSqlRenderer {
    fn render(&self, statement: &SqlStatement) -> Result<RenderedSql, SqlRenderError> {
        let mut state = RenderingState::default();
        match statement {
            SqlStatement::Select(select) => state.render_select(select)?,
            SqlStatement::Update(update) => state.render_update(update)?,
            SqlStatement::Insert(insert) => state.render_insert(insert)?,
            SqlStatement::Delete(delete) => state.render_delete(delete)?,
        }
        Ok(RenderedSql {
            sql: state.sql,
            parameters: state.parameters,
        })
    }
}

#[derive(Default)]
struct RenderingState {
    sql: String,
    parameters: Vec<ParameterLabel>,
}

impl RenderingState {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn render_select(&mut self, select: &SelectStatement) -> Result<(), SqlRenderError> {
        self.render_query_part(&select.query_part)
    }

    fn render_query_part(&mut self, part: &QueryPart) -> Result<(), SqlRenderError> {
        match &part.kind {
            QueryPartKind::Spec(spec) => {
                self.push("select ");
                if spec.distinct {
                    self.push("distinct ");
                }
                for (i, selection) in spec.selections.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.render_expression(&selection.expression)?;
                }
                self.push(" from ");
                self.render_table_group(&spec.from)?;
                if let Some(predicate) = &spec.predicate {
                    self.push(" where ");
                    self.render_expression(predicate)?;
                }
            }
            QueryPartKind::Group(group) => {
                if group.parts.is_empty() {
                    return Err(SqlRenderError::Unrenderable(
                        "set operation with no operands".to_string(),
                    ));
                }
                for (i, member) in group.parts.iter().enumerate() {
                    if i > 0 {
                        self.push(match group.operator {
                            SetOperator::Union => " union ",
                            SetOperator::UnionAll => " union all ",
                            SetOperator::Intersect => " intersect ",
                            SetOperator::Except => " except ",
                        });
                    }
                    let nested = matches!(member.kind, QueryPartKind::Group(_));
                    if nested {
                        self.push("(");
                    }
                    self.render_query_part(member)?;
                    if nested {
                        self.push(")");
                    }
                }
            }
        }

        if !part.sorts.is_empty() {
            self.push(" order by ");
            for (i, sort) in part.sorts.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                match &sort.key {
                    SortKey::Expression(expr) => self.render_expression(expr)?,
                    SortKey::SelectedPosition(n) => self.push(&n.to_string()),
                }
                if sort.descending {
                    self.push(" desc");
                }
            }
        }

        if let Some(offset) = part.offset() {
            self.push(" offset ");
            self.render_expression(offset)?;
            self.push(" rows");
        }
        if let Some(fetch) = part.fetch() {
            self.push(" fetch first ");
            self.render_expression(&fetch.expression)?;
            match fetch.kind {
                FetchClauseKind::RowsOnly => self.push(" rows only"),
                FetchClauseKind::RowsWithTies => self.push(" rows with ties"),
                FetchClauseKind::PercentOnly => self.push(" percent rows only"),
                FetchClauseKind::PercentWithTies => self.push(" percent rows with ties"),
            }
        }
        Ok(())
    }

    fn render_table_group(&mut self, group: &TableGroup) -> Result<(), SqlRenderError> {
        self.push(&group.primary.table_name);
        self.push(" ");
        self.push(&group.primary.identification_variable);
        self.render_joins(group)
    }

    fn render_joins(&mut self, group: &TableGroup) -> Result<(), SqlRenderError> {
        for join in &group.joins {
            self.push(match join.kind {
                SqlJoinKind::Inner => " join ",
                SqlJoinKind::Left => " left join ",
            });
            self.push(&join.joined.primary.table_name);
            self.push(" ");
            self.push(&join.joined.primary.identification_variable);
            if let Some(predicate) = &join.predicate {
                self.push(" on ");
                self.render_expression(predicate)?;
            }
            // A joined group's own partners render after it, flattened into
            // the same from-clause.
            self.render_joins(&join.joined)?;
        }
        Ok(())
    }

    fn render_update(&mut self, update: &UpdateStatement) -> Result<(), SqlRenderError> {
        self.push("update ");
        self.push(&update.table.table_name);
        self.push(" set ");
        for (i, (column, value)) in update.assignments.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(column);
            self.push(" = ");
            self.render_expression(value)?;
        }
        if let Some(predicate) = &update.predicate {
            self.push(" where ");
            self.render_expression(predicate)?;
        }
        Ok(())
    }

    fn render_insert(&mut self, insert: &InsertStatement) -> Result<(), SqlRenderError> {
        self.push("insert into ");
        self.push(&insert.table.table_name);
        self.push(" (");
        self.push(&insert.columns.join(", "));
        self.push(") values ");
        for (i, tuple) in insert.tuples.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push("(");
            for (j, value) in tuple.iter().enumerate() {
                if j > 0 {
                    self.push(", ");
                }
                self.render_expression(value)?;
            }
            self.push(")");
        }
        Ok(())
    }

    fn render_delete(&mut self, delete: &DeleteStatement) -> Result<(), SqlRenderError> {
        self.push("delete from ");
        self.push(&delete.table.table_name);
        if let Some(predicate) = &delete.predicate {
            self.push(" where ");
            self.render_expression(predicate)?;
        }
        Ok(())
    }

    fn render_expression(&mut self, expr: &SqlExpression) -> Result<(), SqlRenderError> {
        match expr {
            SqlExpression::ColumnReference {
                table_alias,
                column_name,
            } => {
                self.push(table_alias);
                self.push(".");
                self.push(column_name);
            }
            SqlExpression::Literal(value) => self.render_literal(value),
            SqlExpression::Parameter(label) => {
                // Binding order is the textual occurrence order.
                self.parameters.push(label.clone());
                self.push("?");
            }
            SqlExpression::Arithmetic { op, lhs, rhs } => {
                self.push("(");
                self.render_expression(lhs)?;
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.render_expression(rhs)?;
                self.push(")");
            }
            SqlExpression::Negation(operand) => {
                self.push("-");
                self.render_expression(operand)?;
            }
            SqlExpression::Function { name, args } => {
                self.push(name);
                self.push("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.render_expression(arg)?;
                }
                self.push(")");
            }
            SqlExpression::Comparison { op, lhs, rhs } => {
                self.render_expression(lhs)?;
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.render_expression(rhs)?;
            }
            SqlExpression::Junction { conjunction, parts } => {
                self.push("(");
                for (i, member) in parts.iter().enumerate() {
                    if i > 0 {
                        self.push(if *conjunction { " and " } else { " or " });
                    }
                    self.render_expression(member)?;
                }
                self.push(")");
            }
            SqlExpression::Negated(inner) => {
                self.push("not (");
                self.render_expression(inner)?;
                self.push(")");
            }
            SqlExpression::Between {
                operand,
                low,
                high,
                negated,
            } => {
                self.render_expression(operand)?;
                if *negated {
                    self.push(" not");
                }
                self.push(" between ");
                self.render_expression(low)?;
                self.push(" and ");
                self.render_expression(high)?;
            }
            SqlExpression::InList {
                operand,
                items,
                negated,
            } => {
                self.render_expression(operand)?;
                if *negated {
                    self.push(" not");
                }
                self.push(" in (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.render_expression(item)?;
                }
                self.push(")");
            }
            SqlExpression::Like {
                operand,
                pattern,
                negated,
            } => {
                self.render_expression(operand)?;
                if *negated {
                    self.push(" not");
                }
                self.push(" like ");
                self.render_expression(pattern)?;
            }
            SqlExpression::NullCheck { operand, negated } => {
                self.render_expression(operand)?;
                self.push(if *negated {
                    " is not null"
                } else {
                    " is null"
                });
            }
        }
        Ok(())
    }

    fn render_literal(&mut self, value: &SqlValue) {
        match value {
            SqlValue::Null => self.push("null"),
            SqlValue::Boolean(b) => self.push(if *b { "true" } else { "false" }),
            SqlValue::BigInt(i) => self.push(&i.to_string()),
            SqlValue::Double(x) => self.push(&x.to_string()),
            SqlValue::Varchar(s) => {
                self.push("'");
                self.push(&s.replace('\'', "''"));
                self.push("'");
            }
            SqlValue::Date(d) => self.push(&format!("date '{}'", d.format("%Y-%m-%d"))),
            SqlValue::Time(t) => self.push(&format!("time '{}'", t.format("%H:%M:%S"))),
            SqlValue::Timestamp(ts) => {
                self.push(&format!("timestamp '{}'", ts.format("%Y-%m-%d %H:%M:%S")))
            }
            SqlValue::Uuid(u) => {
                self.push("'");
                self.push(&u.to_string());
                self.push("'");
            }
        }
    }
}
