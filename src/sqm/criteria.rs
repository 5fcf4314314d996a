//! Programmatic criteria builder: constructs the same typed SQM trees as the
//! EQL front-end, without going through query text. Resolution and
//! validation rules are identical - both front-ends share the creation
//! context and path resolver.

use crate::config::EngineConfig;
use crate::domain_model::DomainModel;
use crate::type_registry::{BasicTypeId, DomainValue};

use super::creation_context::SqmCreationContext;
use super::errors::SemanticError;
use super::nodes::*;
use super::path::resolve_path;

/// Builder for a select statement over one root entity.
pub struct CriteriaQuery<'a> {
    ctx: SqmCreationContext<'a>,
    distinct: bool,
    root: SqmRoot,
    joins: Vec<SqmJoin>,
    selections: Vec<SqmSelection>,
    predicate: Option<SqmPredicate>,
    sorts: Vec<SqmSortSpecification>,
    offset: Option<u64>,
    fetch: Option<(u64, FetchClauseKind)>,
}

impl<'a> CriteriaQuery<'a> {
    pub fn from_root(
        model: &'a DomainModel,
        config: &'a EngineConfig,
        entity_name: &str,
        alias: &str,
    ) -> Result<Self, SemanticError> {
        let mut ctx = SqmCreationContext::new(model, config);
        let navigable_path = ctx.register_root(alias, entity_name)?;
        Ok(CriteriaQuery {
            ctx,
            distinct: false,
            root: SqmRoot {
                entity_name: entity_name.to_string(),
                alias: alias.to_string(),
                navigable_path,
            },
            joins: Vec::new(),
            selections: Vec::new(),
            predicate: None,
            sorts: Vec::new(),
            offset: None,
            fetch: None,
        })
    }

    /// Resolve a dotted path (e.g. `"e.department.name"`) into a typed
    /// expression.
    pub fn path(&self, dotted: &str) -> Result<SqmExpression, SemanticError> {
        let segments: Vec<&str> = dotted.split('.').collect();
        let path = resolve_path(&self.ctx, &segments)?;
        if path.terminal_is_plural {
            return Err(SemanticError::PluralPathNotAllowed {
                path: path.navigable_path.full_path().to_string(),
            });
        }
        Ok(SqmExpression::Path(path))
    }

    /// A typed literal; the type is carried by the value itself. A bare
    /// NULL cannot be typed here.
    pub fn literal(value: DomainValue) -> Result<SqmExpression, SemanticError> {
        let type_id = match &value {
            DomainValue::Null => return Err(SemanticError::UntypableNullLiteral),
            DomainValue::Boolean(_) => BasicTypeId::Boolean,
            DomainValue::Integer(_) => BasicTypeId::Integer,
            DomainValue::Float(_) => BasicTypeId::Float,
            DomainValue::String(_) => BasicTypeId::String,
            DomainValue::Date(_) => BasicTypeId::Date,
            DomainValue::Time(_) => BasicTypeId::Time,
            DomainValue::Timestamp(_) => BasicTypeId::Timestamp,
            DomainValue::Uuid(_) => BasicTypeId::Uuid,
        };
        Ok(SqmExpression::Literal { value, type_id })
    }

    pub fn parameter(name: &str) -> SqmExpression {
        SqmExpression::Parameter(SqmParameter {
            label: ParameterLabel::Named(name.to_string()),
            inferred_type: None,
        })
    }

    pub fn select(mut self, dotted: &str) -> Result<Self, SemanticError> {
        let expression = self.path(dotted)?;
        self.selections.push(SqmSelection {
            expression,
            alias: None,
        });
        Ok(self)
    }

    pub fn select_expression(mut self, expression: SqmExpression, alias: Option<&str>) -> Self {
        self.selections.push(SqmSelection {
            expression,
            alias: alias.map(str::to_string),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(
        mut self,
        dotted: &str,
        alias: &str,
        kind: JoinKind,
        fetched: bool,
    ) -> Result<Self, SemanticError> {
        let segments: Vec<&str> = dotted.split('.').collect();
        let path = resolve_path(&self.ctx, &segments)?;
        let target_entity = match &path.terminal_type {
            SqmDomainType::Entity(name) if !path.attribute_names.is_empty() => name.clone(),
            _ => {
                return Err(SemanticError::JoinPathNotAnAssociation {
                    path: path.navigable_path.full_path().to_string(),
                })
            }
        };
        self.ctx
            .register_join(alias, path.navigable_path.clone(), &target_entity)?;
        self.joins.push(SqmJoin {
            path,
            alias: alias.to_string(),
            kind,
            fetched,
        });
        Ok(self)
    }

    /// Build a comparison predicate, with the same comparability rules as
    /// the textual front-end.
    pub fn compare(
        op: ComparisonOp,
        lhs: SqmExpression,
        rhs: SqmExpression,
    ) -> Result<SqmPredicate, SemanticError> {
        let rhs = coerce_untyped(rhs, &lhs);
        super::check_comparable(&lhs, &rhs)?;
        Ok(SqmPredicate::Comparison { op, lhs, rhs })
    }

    /// AND-combine a predicate into the restriction.
    pub fn restrict(mut self, predicate: SqmPredicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            None => predicate,
            Some(SqmPredicate::Junction {
                conjunction: true,
                mut predicates,
            }) => {
                predicates.push(predicate);
                SqmPredicate::Junction {
                    conjunction: true,
                    predicates,
                }
            }
            Some(existing) => SqmPredicate::Junction {
                conjunction: true,
                predicates: vec![existing, predicate],
            },
        });
        self
    }

    pub fn order_by(mut self, expression: SqmExpression, descending: bool) -> Self {
        self.sorts.push(SqmSortSpecification {
            key: SqmSortKey::Expression(expression),
            descending,
        });
        self
    }

    pub fn order_by_position(mut self, position: u64, descending: bool) -> Self {
        self.sorts.push(SqmSortSpecification {
            key: SqmSortKey::Position(position),
            descending,
        });
        self
    }

    pub fn offset(mut self, rows: u64) -> Self {
        self.offset = Some(rows);
        self
    }

    /// Limit expression and its kind are set together; there is no way to
    /// state a limit without a kind.
    pub fn fetch_first(mut self, count: u64, kind: FetchClauseKind) -> Self {
        self.fetch = Some((count, kind));
        self
    }

    /// Navigate one step further from an expression; terminal expressions
    /// are rejected exactly like in the textual front-end.
    pub fn navigate(
        &self,
        expression: &SqmExpression,
        attribute: &str,
    ) -> Result<SqmExpression, SemanticError> {
        super::navigate(&self.ctx, expression, attribute)
    }

    pub fn build(mut self) -> SqmSelectStatement {
        if self.selections.is_empty() {
            // Default selection: the root entity itself.
            self.selections.push(SqmSelection {
                expression: SqmExpression::Path(SqmPath {
                    navigable_path: self.root.navigable_path.clone(),
                    root_alias: self.root.alias.clone(),
                    attribute_names: Vec::new(),
                    terminal_type: SqmDomainType::Entity(self.root.entity_name.clone()),
                    terminal_is_plural: false,
                }),
                alias: None,
            });
        }
        SqmSelectStatement {
            query_part: SqmQueryPart::Spec(SqmQuerySpec {
                distinct: self.distinct,
                root: self.root,
                joins: self.joins,
                selections: self.selections,
                predicate: self.predicate,
            }),
            sorts: self.sorts,
            offset: self.offset,
            fetch: self.fetch,
        }
    }
}

fn coerce_untyped(expr: SqmExpression, counterpart: &SqmExpression) -> SqmExpression {
    match expr {
        SqmExpression::Parameter(p) if p.inferred_type.is_none() => {
            let inferred = match counterpart.node_type() {
                SqmDomainType::Basic(t) => Some(t),
                _ => None,
            };
            SqmExpression::Parameter(SqmParameter {
                label: p.label,
                inferred_type: inferred,
            })
        }
        other => other,
    }
}
