//! Semantic query model construction: resolves the parsed (or
//! criteria-built) statement against the domain model into a fully-typed
//! tree. All identifier, type, and arity failures surface here, at
//! tree-construction time.

use crate::config::EngineConfig;
use crate::domain_model::{AttributeKind, DomainModel};
use crate::eql_parser::ast;
use crate::type_registry::{BasicTypeId, DomainValue};

pub mod creation_context;
pub mod criteria;
pub(crate) mod errors;
pub mod function;
pub mod nodes;
pub mod path;

pub use creation_context::SqmCreationContext;
pub use errors::SemanticError;
pub use nodes::*;

use function::get_function;
use path::resolve_path;

/// Interpret a parsed statement into a typed SQM tree.
pub fn interpret_statement(
    statement: &ast::EqlStatement<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmStatement, SemanticError> {
    match statement {
        ast::EqlStatement::Select(select) => {
            Ok(SqmStatement::Select(interpret_select(select, model, config)?))
        }
        ast::EqlStatement::Update(update) => {
            Ok(SqmStatement::Update(interpret_update(update, model, config)?))
        }
        ast::EqlStatement::Insert(insert) => {
            Ok(SqmStatement::Insert(interpret_insert(insert, model, config)?))
        }
        ast::EqlStatement::Delete(delete) => {
            Ok(SqmStatement::Delete(interpret_delete(delete, model, config)?))
        }
    }
}

pub fn interpret_select(
    select: &ast::SelectStatement<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmSelectStatement, SemanticError> {
    let query_part = interpret_query_body(&select.body, model, config)?;

    // Sort expressions resolve against the leftmost block's identification
    // variables; positional items stay positional until SQL AST build, where
    // they bind to the root part's select list.
    let mut sorts = Vec::with_capacity(select.order_by.len());
    if !select.order_by.is_empty() {
        let block = leftmost_block(&select.body);
        let mut ctx = SqmCreationContext::new(model, config);
        register_block_aliases(&mut ctx, block)?;
        for item in &select.order_by {
            let key = match &item.key {
                ast::SortKey::Position(n) => SqmSortKey::Position(*n),
                ast::SortKey::Expression(expr) => {
                    SqmSortKey::Expression(interpret_expression(&ctx, expr)?)
                }
            };
            sorts.push(SqmSortSpecification {
                key,
                descending: item.descending,
            });
        }
    }

    let fetch = select
        .fetch
        .map(|spec| (spec.count, FetchClauseKind::from_flags(spec.percent, spec.with_ties)));

    Ok(SqmSelectStatement {
        query_part,
        sorts,
        offset: select.offset,
        fetch,
    })
}

fn interpret_query_body(
    body: &ast::QueryBody<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmQueryPart, SemanticError> {
    match body {
        ast::QueryBody::Block(block) => {
            let mut ctx = SqmCreationContext::new(model, config);
            Ok(SqmQueryPart::Spec(interpret_query_block(&mut ctx, block)?))
        }
        ast::QueryBody::SetOperation {
            left,
            operator,
            right,
        } => {
            let operator = match operator {
                ast::SetOperatorToken::Union => SetOperator::Union,
                ast::SetOperatorToken::UnionAll => SetOperator::UnionAll,
                ast::SetOperatorToken::Intersect => SetOperator::Intersect,
                ast::SetOperatorToken::Except => SetOperator::Except,
            };
            let left_part = interpret_query_body(left, model, config)?;
            let right_part = interpret_query_body(right, model, config)?;
            // Flatten same-operator chains so `a UNION b UNION c` is one
            // group with three parts, in textual order.
            let mut parts = Vec::new();
            match left_part {
                SqmQueryPart::Group(group) if group.operator == operator => {
                    parts.extend(group.parts);
                }
                other => parts.push(other),
            }
            parts.push(right_part);
            Ok(SqmQueryPart::Group(SqmQueryGroup { operator, parts }))
        }
    }
}

fn leftmost_block<'b, 'a>(body: &'b ast::QueryBody<'a>) -> &'b ast::QueryBlock<'a> {
    match body {
        ast::QueryBody::Block(block) => block,
        ast::QueryBody::SetOperation { left, .. } => leftmost_block(left),
    }
}

fn register_block_aliases(
    ctx: &mut SqmCreationContext<'_>,
    block: &ast::QueryBlock<'_>,
) -> Result<(), SemanticError> {
    let root_alias = block.root.alias.unwrap_or(block.root.entity_name);
    ctx.register_root(root_alias, block.root.entity_name)?;
    for join in &block.joins {
        let join_path = resolve_path(ctx, &join.path)?;
        let target_entity = match &join_path.terminal_type {
            SqmDomainType::Entity(name) if !join_path.attribute_names.is_empty() => name.clone(),
            _ => {
                return Err(SemanticError::JoinPathNotAnAssociation {
                    path: join_path.navigable_path.full_path().to_string(),
                })
            }
        };
        let alias = join
            .alias
            .unwrap_or_else(|| join.path.last().copied().unwrap_or_default());
        ctx.register_join(alias, join_path.navigable_path.clone(), &target_entity)?;
    }
    Ok(())
}

fn interpret_query_block(
    ctx: &mut SqmCreationContext<'_>,
    block: &ast::QueryBlock<'_>,
) -> Result<SqmQuerySpec, SemanticError> {
    let root_alias = block.root.alias.unwrap_or(block.root.entity_name);
    let root_path = ctx.register_root(root_alias, block.root.entity_name)?;
    let root = SqmRoot {
        entity_name: block.root.entity_name.to_string(),
        alias: root_alias.to_string(),
        navigable_path: root_path,
    };

    let mut joins = Vec::with_capacity(block.joins.len());
    for join in &block.joins {
        let join_path = resolve_path(ctx, &join.path)?;
        let target_entity = match &join_path.terminal_type {
            SqmDomainType::Entity(name) if !join_path.attribute_names.is_empty() => name.clone(),
            _ => {
                return Err(SemanticError::JoinPathNotAnAssociation {
                    path: join_path.navigable_path.full_path().to_string(),
                })
            }
        };
        let alias = join
            .alias
            .unwrap_or_else(|| join.path.last().copied().unwrap_or_default());
        ctx.register_join(alias, join_path.navigable_path.clone(), &target_entity)?;
        joins.push(SqmJoin {
            path: join_path,
            alias: alias.to_string(),
            kind: match join.kind {
                ast::JoinKindToken::Inner => JoinKind::Inner,
                ast::JoinKindToken::Left => JoinKind::Left,
            },
            fetched: join.fetch,
        });
    }

    let mut selections = Vec::with_capacity(block.selections.len());
    for item in &block.selections {
        selections.push(SqmSelection {
            expression: interpret_expression(ctx, &item.expression)?,
            alias: item.alias.map(str::to_string),
        });
    }

    let predicate = block
        .where_clause
        .as_ref()
        .map(|p| interpret_predicate(ctx, p))
        .transpose()?;

    Ok(SqmQuerySpec {
        distinct: block.distinct,
        root,
        joins,
        selections,
        predicate,
    })
}

// --- Expressions ------------------------------------------------------------

pub fn interpret_expression(
    ctx: &SqmCreationContext<'_>,
    expr: &ast::Expression<'_>,
) -> Result<SqmExpression, SemanticError> {
    interpret_expression_expecting(ctx, expr, None)
}

fn interpret_expression_expecting(
    ctx: &SqmCreationContext<'_>,
    expr: &ast::Expression<'_>,
    expected: Option<BasicTypeId>,
) -> Result<SqmExpression, SemanticError> {
    match expr {
        ast::Expression::Literal(literal) => interpret_literal(literal, expected),
        ast::Expression::Parameter(p) => Ok(SqmExpression::Parameter(SqmParameter {
            label: match p {
                ast::ParameterRef::Named(name) => ParameterLabel::Named(name.to_string()),
                ast::ParameterRef::Positional(n) => ParameterLabel::Positional(*n),
            },
            inferred_type: expected,
        })),
        ast::Expression::Path(segments) => {
            let path = resolve_path(ctx, segments)?;
            if path.terminal_is_plural {
                return Err(SemanticError::PluralPathNotAllowed {
                    path: path.navigable_path.full_path().to_string(),
                });
            }
            Ok(SqmExpression::Path(path))
        }
        ast::Expression::EntityType(alias) => {
            let binding = ctx.resolve_alias(alias)?;
            Ok(SqmExpression::EntityType {
                alias: alias.to_string(),
                entity_name: binding.entity_name.clone(),
            })
        }
        ast::Expression::FunctionCall { name, args } => {
            let descriptor = get_function(name).ok_or_else(|| SemanticError::UnknownFunction {
                name: name.to_string(),
            })?;
            let mut sqm_args = Vec::with_capacity(args.len());
            for arg in args {
                sqm_args.push(interpret_expression(ctx, arg)?);
            }
            descriptor.validator.validate(descriptor.eql_name, &sqm_args)?;
            let return_type = descriptor.resolve_return_type(&sqm_args);
            Ok(SqmExpression::Function(SqmFunctionCall {
                function_name: descriptor.eql_name.to_string(),
                sql_name: descriptor.sql_name.to_string(),
                args: sqm_args,
                return_type,
            }))
        }
        ast::Expression::Unary {
            op: ast::UnaryOp::Neg,
            operand,
        } => {
            let operand = interpret_expression_expecting(ctx, operand, expected)?;
            let node_type = operand.node_type();
            let result_type = match node_type {
                SqmDomainType::Basic(t) if t.is_numeric() => t,
                other => {
                    return Err(SemanticError::NonNumericOperand {
                        operator: "-".to_string(),
                        found: other.describe(),
                    })
                }
            };
            Ok(SqmExpression::Negation {
                operand: Box::new(operand),
                result_type,
            })
        }
        ast::Expression::Binary { op, lhs, rhs }
            if matches!(
                op,
                ast::BinaryOp::Add | ast::BinaryOp::Sub | ast::BinaryOp::Mul | ast::BinaryOp::Div
            ) =>
        {
            let (lhs, rhs) = interpret_pair(ctx, lhs, rhs)?;
            let op = match op {
                ast::BinaryOp::Add => SqmBinaryOp::Add,
                ast::BinaryOp::Sub => SqmBinaryOp::Sub,
                ast::BinaryOp::Mul => SqmBinaryOp::Mul,
                ast::BinaryOp::Div => SqmBinaryOp::Div,
                _ => unreachable!(),
            };
            let result_type = arithmetic_result_type(op, &lhs, &rhs)?;
            Ok(SqmExpression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                result_type,
            })
        }
        // Predicate-shaped constructs are not value expressions.
        _ => Err(SemanticError::NotAValueExpression),
    }
}

fn interpret_literal(
    literal: &ast::Literal,
    expected: Option<BasicTypeId>,
) -> Result<SqmExpression, SemanticError> {
    let (value, type_id) = match literal {
        ast::Literal::Null => {
            let type_id = expected.ok_or(SemanticError::UntypableNullLiteral)?;
            (DomainValue::Null, type_id)
        }
        ast::Literal::Boolean(b) => (DomainValue::Boolean(*b), BasicTypeId::Boolean),
        ast::Literal::Integer(i) => (DomainValue::Integer(*i), BasicTypeId::Integer),
        ast::Literal::Float(x) => (DomainValue::Float(*x), BasicTypeId::Float),
        ast::Literal::String(s) => (DomainValue::String(s.clone()), BasicTypeId::String),
        ast::Literal::Date(d) => (DomainValue::Date(*d), BasicTypeId::Date),
        ast::Literal::Time(t) => (DomainValue::Time(*t), BasicTypeId::Time),
        ast::Literal::Timestamp(ts) => (DomainValue::Timestamp(*ts), BasicTypeId::Timestamp),
    };
    Ok(SqmExpression::Literal { value, type_id })
}

/// Interpret two sibling operands, propagating a type from whichever side
/// resolves first into the other side's NULL literals and parameters.
fn interpret_pair(
    ctx: &SqmCreationContext<'_>,
    lhs: &ast::Expression<'_>,
    rhs: &ast::Expression<'_>,
) -> Result<(SqmExpression, SqmExpression), SemanticError> {
    match interpret_expression(ctx, lhs) {
        Ok(left) => {
            let expected = basic_type_of(&left);
            let right = interpret_expression_expecting(ctx, rhs, expected)?;
            Ok((left, right))
        }
        Err(SemanticError::UntypableNullLiteral) => {
            let right = interpret_expression(ctx, rhs)?;
            let expected = basic_type_of(&right);
            let left = interpret_expression_expecting(ctx, lhs, expected)?;
            Ok((left, right))
        }
        Err(other) => Err(other),
    }
}

fn basic_type_of(expr: &SqmExpression) -> Option<BasicTypeId> {
    match expr.node_type() {
        SqmDomainType::Basic(t) => Some(t),
        _ => None,
    }
}

fn arithmetic_result_type(
    op: SqmBinaryOp,
    lhs: &SqmExpression,
    rhs: &SqmExpression,
) -> Result<BasicTypeId, SemanticError> {
    let mut result = BasicTypeId::Integer;
    for operand in [lhs, rhs] {
        // Untyped parameters are checked at bind time.
        if matches!(operand, SqmExpression::Parameter(p) if p.inferred_type.is_none()) {
            continue;
        }
        match operand.node_type() {
            SqmDomainType::Basic(t) if t.is_numeric() => {
                if t == BasicTypeId::Float {
                    result = BasicTypeId::Float;
                }
            }
            other => {
                return Err(SemanticError::NonNumericOperand {
                    operator: op.symbol().to_string(),
                    found: other.describe(),
                })
            }
        }
    }
    Ok(result)
}

// --- Predicates -------------------------------------------------------------

pub fn interpret_predicate(
    ctx: &SqmCreationContext<'_>,
    expr: &ast::Expression<'_>,
) -> Result<SqmPredicate, SemanticError> {
    match expr {
        ast::Expression::Binary { op, lhs, rhs } => match op {
            ast::BinaryOp::And | ast::BinaryOp::Or => {
                let conjunction = matches!(op, ast::BinaryOp::And);
                let mut predicates = Vec::new();
                flatten_junction(ctx, conjunction, lhs, &mut predicates)?;
                flatten_junction(ctx, conjunction, rhs, &mut predicates)?;
                Ok(SqmPredicate::Junction {
                    conjunction,
                    predicates,
                })
            }
            ast::BinaryOp::Eq
            | ast::BinaryOp::Ne
            | ast::BinaryOp::Lt
            | ast::BinaryOp::Le
            | ast::BinaryOp::Gt
            | ast::BinaryOp::Ge => {
                let (left, right) = interpret_pair(ctx, lhs, rhs)?;
                check_comparable(&left, &right)?;
                let op = match op {
                    ast::BinaryOp::Eq => ComparisonOp::Eq,
                    ast::BinaryOp::Ne => ComparisonOp::Ne,
                    ast::BinaryOp::Lt => ComparisonOp::Lt,
                    ast::BinaryOp::Le => ComparisonOp::Le,
                    ast::BinaryOp::Gt => ComparisonOp::Gt,
                    ast::BinaryOp::Ge => ComparisonOp::Ge,
                    _ => unreachable!(),
                };
                Ok(SqmPredicate::Comparison {
                    op,
                    lhs: left,
                    rhs: right,
                })
            }
            _ => Err(SemanticError::NotAPredicate {
                found: format!("{:?}", op),
            }),
        },
        ast::Expression::Unary {
            op: ast::UnaryOp::Not,
            operand,
        } => Ok(SqmPredicate::Negated(Box::new(interpret_predicate(
            ctx, operand,
        )?))),
        ast::Expression::Between {
            operand,
            low,
            high,
            negated,
        } => {
            let operand = interpret_expression(ctx, operand)?;
            let expected = basic_type_of(&operand);
            let low = interpret_expression_expecting(ctx, low, expected)?;
            let high = interpret_expression_expecting(ctx, high, expected)?;
            check_comparable(&operand, &low)?;
            check_comparable(&operand, &high)?;
            Ok(SqmPredicate::Between {
                operand,
                low,
                high,
                negated: *negated,
            })
        }
        ast::Expression::InList {
            operand,
            items,
            negated,
        } => {
            let operand = interpret_expression(ctx, operand)?;
            let expected = basic_type_of(&operand);
            let mut sqm_items = Vec::with_capacity(items.len());
            for item in items {
                let item = interpret_expression_expecting(ctx, item, expected)?;
                check_comparable(&operand, &item)?;
                sqm_items.push(item);
            }
            Ok(SqmPredicate::InList {
                operand,
                items: sqm_items,
                negated: *negated,
            })
        }
        ast::Expression::Like {
            operand,
            pattern,
            negated,
        } => {
            let operand = interpret_expression(ctx, operand)?;
            let pattern =
                interpret_expression_expecting(ctx, pattern, Some(BasicTypeId::String))?;
            Ok(SqmPredicate::Like {
                operand,
                pattern,
                negated: *negated,
            })
        }
        ast::Expression::IsNull { operand, negated } => Ok(SqmPredicate::NullCheck {
            operand: interpret_expression(ctx, operand)?,
            negated: *negated,
        }),
        other => Err(SemanticError::NotAPredicate {
            found: format!("{:?}", other),
        }),
    }
}

fn flatten_junction(
    ctx: &SqmCreationContext<'_>,
    conjunction: bool,
    expr: &ast::Expression<'_>,
    into: &mut Vec<SqmPredicate>,
) -> Result<(), SemanticError> {
    match expr {
        ast::Expression::Binary { op, lhs, rhs }
            if (conjunction && matches!(op, ast::BinaryOp::And))
                || (!conjunction && matches!(op, ast::BinaryOp::Or)) =>
        {
            flatten_junction(ctx, conjunction, lhs, into)?;
            flatten_junction(ctx, conjunction, rhs, into)?;
            Ok(())
        }
        other => {
            into.push(interpret_predicate(ctx, other)?);
            Ok(())
        }
    }
}

fn check_comparable(lhs: &SqmExpression, rhs: &SqmExpression) -> Result<(), SemanticError> {
    // Untyped parameters are checked at bind time.
    for side in [lhs, rhs] {
        if matches!(side, SqmExpression::Parameter(p) if p.inferred_type.is_none()) {
            return Ok(());
        }
    }
    let left = lhs.node_type();
    let right = rhs.node_type();
    let compatible = match (&left, &right) {
        (SqmDomainType::Basic(a), SqmDomainType::Basic(b)) => {
            a == b
                || (a.is_numeric() && b.is_numeric())
                || (a.is_temporal() && b.is_temporal())
        }
        (SqmDomainType::Entity(a), SqmDomainType::Entity(b)) => a == b,
        (SqmDomainType::EntityTypeLiteral(_), SqmDomainType::EntityTypeLiteral(_)) => true,
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(SemanticError::IncomparableTypes {
            lhs: left.describe(),
            rhs: right.describe(),
        })
    }
}

// --- DML --------------------------------------------------------------------

pub fn interpret_update(
    update: &ast::UpdateStatement<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmUpdateStatement, SemanticError> {
    let mut ctx = SqmCreationContext::new(model, config);
    let alias = update.alias.unwrap_or(update.entity_name);
    ctx.register_root(alias, update.entity_name)?;

    let mut assignments = Vec::with_capacity(update.assignments.len());
    for assignment in &update.assignments {
        let target = resolve_path(&ctx, &assignment.target)?;
        let target_type = match &target.terminal_type {
            SqmDomainType::Basic(t) if !target.attribute_names.is_empty() => *t,
            SqmDomainType::Entity(_) if is_to_one_target(&ctx, &target) => {
                // Assigning an association rewrites the foreign key; the
                // value must be the target's identifier.
                target_entity_id_type(&ctx, &target)?
            }
            _ => {
                return Err(SemanticError::InvalidAssignmentTarget {
                    path: target.navigable_path.full_path().to_string(),
                })
            }
        };
        let value = interpret_expression_expecting(&ctx, &assignment.value, Some(target_type))?;
        assignments.push(SqmAssignment { target, value });
    }

    let predicate = update
        .where_clause
        .as_ref()
        .map(|p| interpret_predicate(&ctx, p))
        .transpose()?;

    Ok(SqmUpdateStatement {
        entity_name: update.entity_name.to_string(),
        alias: alias.to_string(),
        assignments,
        predicate,
    })
}

fn is_to_one_target(ctx: &SqmCreationContext<'_>, path: &SqmPath) -> bool {
    !path.terminal_is_plural
        && last_attribute_kind(ctx, path)
            .map(|kind| matches!(kind, AttributeKind::ToOne { .. }))
            .unwrap_or(false)
}

fn last_attribute_kind(
    ctx: &SqmCreationContext<'_>,
    path: &SqmPath,
) -> Option<AttributeKind> {
    let binding = ctx.resolve_alias(&path.root_alias).ok()?;
    let mut owner = SqmDomainType::Entity(binding.entity_name.clone());
    let mut kind = None;
    for name in &path.attribute_names {
        let attribute = match &owner {
            SqmDomainType::Entity(entity) => {
                ctx.model.entity(entity).ok()?.attribute(name).cloned()?
            }
            SqmDomainType::Embeddable(embeddable) => {
                ctx.model.embeddable(embeddable).ok()?.attribute(name).cloned()?
            }
            _ => return None,
        };
        owner = match &attribute.kind {
            AttributeKind::Basic { type_id, .. } => SqmDomainType::Basic(*type_id),
            AttributeKind::Embedded { embeddable } => SqmDomainType::Embeddable(embeddable.clone()),
            AttributeKind::ToOne { target_entity, .. }
            | AttributeKind::ToMany { target_entity, .. } => {
                SqmDomainType::Entity(target_entity.clone())
            }
        };
        kind = Some(attribute.kind);
    }
    kind
}

fn target_entity_id_type(
    ctx: &SqmCreationContext<'_>,
    path: &SqmPath,
) -> Result<BasicTypeId, SemanticError> {
    match &path.terminal_type {
        SqmDomainType::Entity(name) => Ok(ctx.model.entity(name)?.id.type_id),
        other => Err(SemanticError::InvalidAssignmentTarget {
            path: other.describe(),
        }),
    }
}

pub fn interpret_insert(
    insert: &ast::InsertStatement<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmInsertStatement, SemanticError> {
    let mut ctx = SqmCreationContext::new(model, config);
    // Insert targets are unqualified attribute paths; resolve them as if
    // rooted at an implicit variable named after the entity.
    ctx.register_root(insert.entity_name, insert.entity_name)?;

    let mut target_paths = Vec::with_capacity(insert.target_paths.len());
    let mut target_types = Vec::with_capacity(insert.target_paths.len());
    for raw_path in &insert.target_paths {
        let mut segments: Vec<&str> = Vec::with_capacity(raw_path.len() + 1);
        segments.push(insert.entity_name);
        segments.extend(raw_path.iter().copied());
        let path = resolve_path(&ctx, &segments)?;
        let target_type = match &path.terminal_type {
            SqmDomainType::Basic(t) => *t,
            SqmDomainType::Entity(_) if is_to_one_target(&ctx, &path) => {
                target_entity_id_type(&ctx, &path)?
            }
            _ => {
                return Err(SemanticError::InvalidInsertTarget {
                    entity: insert.entity_name.to_string(),
                    path: raw_path.join("."),
                })
            }
        };
        target_types.push(target_type);
        target_paths.push(path);
    }

    let mut value_tuples = Vec::with_capacity(insert.value_tuples.len());
    for tuple in &insert.value_tuples {
        if tuple.len() != target_paths.len() {
            return Err(SemanticError::InsertTupleArityMismatch {
                expected: target_paths.len(),
                found: tuple.len(),
            });
        }
        let mut values = Vec::with_capacity(tuple.len());
        for (value, target_type) in tuple.iter().zip(target_types.iter()) {
            values.push(interpret_expression_expecting(&ctx, value, Some(*target_type))?);
        }
        value_tuples.push(values);
    }

    Ok(SqmInsertStatement {
        entity_name: insert.entity_name.to_string(),
        target_paths,
        value_tuples,
    })
}

pub fn interpret_delete(
    delete: &ast::DeleteStatement<'_>,
    model: &DomainModel,
    config: &EngineConfig,
) -> Result<SqmDeleteStatement, SemanticError> {
    let mut ctx = SqmCreationContext::new(model, config);
    let alias = delete.alias.unwrap_or(delete.entity_name);
    ctx.register_root(alias, delete.entity_name)?;
    let predicate = delete
        .where_clause
        .as_ref()
        .map(|p| interpret_predicate(&ctx, p))
        .transpose()?;
    Ok(SqmDeleteStatement {
        entity_name: delete.entity_name.to_string(),
        alias: alias.to_string(),
        predicate,
    })
}

/// Navigate one step further from an already-built expression (used by the
/// criteria builder). Terminal expressions - scalars, entity-type literals,
/// functions - cannot be navigated.
pub fn navigate(
    ctx: &SqmCreationContext<'_>,
    expression: &SqmExpression,
    attribute: &str,
) -> Result<SqmExpression, SemanticError> {
    match expression {
        SqmExpression::Path(path) => {
            let mut segments: Vec<&str> = Vec::with_capacity(path.attribute_names.len() + 2);
            segments.push(&path.root_alias);
            segments.extend(path.attribute_names.iter().map(String::as_str));
            segments.push(attribute);
            Ok(SqmExpression::Path(resolve_path(ctx, &segments)?))
        }
        SqmExpression::EntityType { alias, .. } => {
            Err(SemanticError::EntityTypeLiteralDereference {
                path: format!("type({}).{}", alias, attribute),
            })
        }
        other => Err(SemanticError::IllegalPathDereference {
            path: attribute.to_string(),
            through: format!("{}", other),
            kind: other.node_type().describe(),
        }),
    }
}
