//! Lowering from the typed SQM tree into the dialect-neutral SQL AST plus
//! the result-mapping plan.
//!
//! Alias assignment, join derivation for association navigation and
//! fetches, and dense row-buffer slot allocation all happen here. The alias
//! manager and selection registry are owned by one translation and
//! discarded with it.

use std::collections::HashMap;

use log::debug;

use crate::domain_model::{
    AttributeKind, ColumnMapping, DomainModel, EntityMapping, NavigablePath,
};
use crate::sql_ast::{
    self, FetchExpression, QueryGroup, QueryPart, QueryPartKind, QuerySpec, SelectStatement,
    SortKey, SortSpecification, SqlExpression, SqlJoinKind, SqlSelection, SqlStatement,
    TableGroup, TableGroupJoin, TableReference,
};
use crate::sqm::nodes::*;
use crate::type_registry::{self, BasicTypeId, SqlValue};
use crate::utils::row_position;

pub(crate) mod errors;
pub mod result_plan;

pub use errors::TranslationError;
pub use result_plan::*;

/// Output of one statement translation: the SQL AST and, for selects, the
/// result-mapping plan (empty for DML).
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub statement: SqlStatement,
    pub result_plan: Vec<DomainResult>,
}

pub fn translate_statement(
    statement: &SqmStatement,
    model: &DomainModel,
) -> Result<Translation, TranslationError> {
    match statement {
        SqmStatement::Select(select) => translate_select(select, model),
        SqmStatement::Update(update) => translate_update(update, model),
        SqmStatement::Insert(insert) => translate_insert(insert, model),
        SqmStatement::Delete(delete) => translate_delete(delete, model),
    }
}

pub fn translate_select(
    select: &SqmSelectStatement,
    model: &DomainModel,
) -> Result<Translation, TranslationError> {
    let mut manager = sql_ast::SqlAliasBaseManager::new();

    let (mut root_part, result_plan, leftmost) = match &select.query_part {
        SqmQueryPart::Spec(spec) => {
            let mut translator = SpecTranslator::new(model, &mut manager, spec)?;
            let (results, lowered_sorts) =
                translator.translate_body(spec, &select.sorts)?;
            let query_spec = translator.finish(spec)?;
            let mut part = QueryPart::new(QueryPartKind::Spec(query_spec), true);
            // Positional items validate against the finished root part.
            for sort in &lowered_sorts {
                if let SortKey::SelectedPosition(n) = &sort.key {
                    sql_ast::resolve_positional_sort(&part, *n)?;
                }
            }
            part.sorts = lowered_sorts;
            (part, results, None)
        }
        SqmQueryPart::Group(group) => {
            let (part, results) = translate_group(group, model, &mut manager, true)?;
            (part, results, Some(leftmost_spec(&select.query_part)))
        }
    };

    // For a set-operation root, sort expressions must match a selected item
    // of the first branch; they become positional references.
    if let Some(Some(first_spec)) = leftmost {
        let mut sorts = Vec::with_capacity(select.sorts.len());
        for sort in &select.sorts {
            let key = match &sort.key {
                SqmSortKey::Position(n) => {
                    sql_ast::resolve_positional_sort(&root_part, *n)?;
                    SortKey::SelectedPosition(*n)
                }
                SqmSortKey::Expression(expr) => {
                    let position = first_spec
                        .selections
                        .iter()
                        .position(|s| &s.expression == expr)
                        .ok_or(TranslationError::SortNotInSelectList)?;
                    SortKey::SelectedPosition(position as u64 + 1)
                }
            };
            sorts.push(SortSpecification {
                key,
                descending: sort.descending,
            });
        }
        root_part.sorts = sorts;
    }

    let offset = select.offset.map(|n| sql_ast::integer_literal(n as i64));
    let fetch = select.fetch.map(|(count, kind)| FetchExpression {
        expression: sql_ast::integer_literal(count as i64),
        kind,
    });
    root_part.set_offset_fetch(offset, fetch);

    debug!(
        "translated select statement: {} top-level result(s)",
        result_plan.len()
    );
    Ok(Translation {
        statement: SqlStatement::Select(SelectStatement {
            query_part: root_part,
        }),
        result_plan,
    })
}

fn leftmost_spec(part: &SqmQueryPart) -> Option<&SqmQuerySpec> {
    match part {
        SqmQueryPart::Spec(spec) => Some(spec),
        SqmQueryPart::Group(group) => group.parts.first().and_then(leftmost_spec),
    }
}

fn translate_group(
    group: &SqmQueryGroup,
    model: &DomainModel,
    manager: &mut sql_ast::SqlAliasBaseManager,
    root: bool,
) -> Result<(QueryPart, Vec<DomainResult>), TranslationError> {
    let mut parts = Vec::with_capacity(group.parts.len());
    let mut first_results = Vec::new();
    for (index, part) in group.parts.iter().enumerate() {
        let (translated, results) = match part {
            SqmQueryPart::Spec(spec) => {
                let mut translator = SpecTranslator::new(model, manager, spec)?;
                let (results, _) = translator.translate_body(spec, &[])?;
                let query_spec = translator.finish(spec)?;
                (
                    QueryPart::new(QueryPartKind::Spec(query_spec), false),
                    results,
                )
            }
            SqmQueryPart::Group(nested) => translate_group(nested, model, manager, false)?,
        };
        if index == 0 {
            // The leftmost branch defines the result shape of the group.
            first_results = results;
        }
        parts.push(translated);
    }
    Ok((
        QueryPart::new(
            QueryPartKind::Group(QueryGroup {
                operator: group.operator,
                parts,
            }),
            root,
        ),
        first_results,
    ))
}

// --- Per-query-spec translation --------------------------------------------

#[derive(Debug, Clone)]
struct AliasEntry {
    navigable_path: NavigablePath,
    entity_name: String,
}

/// What a lowered path terminates in.
enum PathTerminal {
    Basic {
        table_alias: String,
        column: ColumnMapping,
        type_id: BasicTypeId,
    },
    Entity {
        navigable_path: NavigablePath,
        entity_name: String,
    },
    /// Entity-valued path without its own table group; only the foreign key
    /// on the owner's table is available.
    EntityByKey {
        owner_alias: String,
        fk_column: ColumnMapping,
        target_entity: String,
    },
    Embedded {
        navigable_path: NavigablePath,
        owner_alias: String,
        embeddable_name: String,
        attribute_name: String,
    },
}

struct SpecTranslator<'a, 'm> {
    model: &'a DomainModel,
    manager: &'m mut sql_ast::SqlAliasBaseManager,
    aliases: HashMap<String, AliasEntry>,
    root_group: TableGroup,
    selections: Vec<SqlSelection>,
    /// Navigable paths of `JOIN FETCH`ed associations.
    fetched_paths: Vec<NavigablePath>,
}

impl<'a, 'm> SpecTranslator<'a, 'm> {
    fn new(
        model: &'a DomainModel,
        manager: &'m mut sql_ast::SqlAliasBaseManager,
        spec: &SqmQuerySpec,
    ) -> Result<Self, TranslationError> {
        let entity = model.entity(&spec.root.entity_name)?;
        let alias_base = manager.create_alias_base(&entity.table.alias_stem);
        let root_group = TableGroup::new(
            spec.root.navigable_path.clone(),
            TableReference {
                table_name: entity.table.table_name.clone(),
                identification_variable: alias_base.alias(),
            },
        );
        let mut aliases = HashMap::new();
        aliases.insert(
            spec.root.alias.clone(),
            AliasEntry {
                navigable_path: spec.root.navigable_path.clone(),
                entity_name: spec.root.entity_name.clone(),
            },
        );

        let mut translator = SpecTranslator {
            model,
            manager,
            aliases,
            root_group,
            selections: Vec::new(),
            fetched_paths: Vec::new(),
        };

        // Wire explicit joins before anything resolves columns; fetch
        // building relies on the joined groups already being registered in
        // the from-clause.
        for join in &spec.joins {
            let kind = match join.kind {
                JoinKind::Inner => SqlJoinKind::Inner,
                JoinKind::Left => SqlJoinKind::Left,
            };
            let terminal =
                translator.walk_attributes(&join.path, kind, true)?;
            let target_entity = match terminal {
                PathTerminal::Entity { entity_name, .. } => entity_name,
                _ => {
                    return Err(TranslationError::UnknownAlias(
                        join.path.navigable_path.full_path().to_string(),
                    ))
                }
            };
            translator.aliases.insert(
                join.alias.clone(),
                AliasEntry {
                    navigable_path: join.path.navigable_path.clone(),
                    entity_name: target_entity,
                },
            );
            if join.fetched {
                translator
                    .fetched_paths
                    .push(join.path.navigable_path.clone());
            }
        }
        Ok(translator)
    }

    fn translate_body(
        &mut self,
        spec: &SqmQuerySpec,
        sorts: &[SqmSortSpecification],
    ) -> Result<(Vec<DomainResult>, Vec<SortSpecification>), TranslationError> {
        let mut results = Vec::with_capacity(spec.selections.len());
        for selection in &spec.selections {
            results.push(self.translate_selection(selection)?);
        }

        let mut lowered_sorts = Vec::with_capacity(sorts.len());
        for sort in sorts {
            let key = match &sort.key {
                SqmSortKey::Position(n) => SortKey::SelectedPosition(*n),
                SqmSortKey::Expression(expr) => {
                    SortKey::Expression(self.lower_expression(expr)?)
                }
            };
            lowered_sorts.push(SortSpecification {
                key,
                descending: sort.descending,
            });
        }
        Ok((results, lowered_sorts))
    }

    fn finish(mut self, spec: &SqmQuerySpec) -> Result<QuerySpec, TranslationError> {
        let predicate = spec
            .predicate
            .as_ref()
            .map(|p| self.lower_predicate(p))
            .transpose()?;
        Ok(QuerySpec {
            distinct: spec.distinct,
            selections: self.selections,
            from: self.root_group,
            predicate,
        })
    }

    // --- selection / result plan -------------------------------------------

    fn translate_selection(
        &mut self,
        selection: &SqmSelection,
    ) -> Result<DomainResult, TranslationError> {
        match &selection.expression {
            SqmExpression::Path(path) => {
                let terminal = self.walk_attributes(path, SqlJoinKind::Inner, true)?;
                match terminal {
                    PathTerminal::Basic {
                        table_alias,
                        column,
                        type_id,
                    } => {
                        let slot = self.register_selection(SqlExpression::ColumnReference {
                            table_alias,
                            column_name: column.column_name,
                        });
                        Ok(DomainResult::Scalar(ScalarResult {
                            navigable_path: path.navigable_path.clone(),
                            value_slot: slot,
                            type_id,
                        }))
                    }
                    PathTerminal::Entity {
                        navigable_path,
                        entity_name,
                    } => Ok(DomainResult::Entity(self.build_entity_result(
                        navigable_path,
                        &entity_name,
                    )?)),
                    PathTerminal::EntityByKey { .. } => {
                        // walk_attributes with materialize=true always joins
                        // terminal to-one steps.
                        Err(TranslationError::UnknownAlias(
                            path.navigable_path.full_path().to_string(),
                        ))
                    }
                    PathTerminal::Embedded {
                        navigable_path,
                        owner_alias,
                        embeddable_name,
                        attribute_name,
                        ..
                    } => {
                        let fetch = self.build_embedded_fetch(
                            navigable_path,
                            &embeddable_name,
                            &attribute_name,
                            &owner_alias,
                            None,
                        )?;
                        Ok(DomainResult::Embedded(fetch))
                    }
                }
            }
            other => {
                let node_type = other.node_type();
                let type_id = match node_type {
                    SqmDomainType::Basic(t) => t,
                    _ => BasicTypeId::String,
                };
                let lowered = self.lower_expression(other)?;
                let slot = self.register_selection(lowered);
                Ok(DomainResult::Scalar(ScalarResult {
                    navigable_path: NavigablePath::root(format!("<scalar:{}>", slot)),
                    value_slot: slot,
                    type_id,
                }))
            }
        }
    }

    /// Build the full result for an entity whose table group is registered.
    fn build_entity_result(
        &mut self,
        navigable_path: NavigablePath,
        entity_name: &str,
    ) -> Result<EntityResult, TranslationError> {
        let entity = self.model.entity(entity_name)?.clone();
        let table_alias = self
            .root_group
            .find(&navigable_path)
            .ok_or_else(|| {
                TranslationError::SqlAst(sql_ast::SqlAstError::NoTableGroup(
                    navigable_path.full_path().to_string(),
                ))
            })?
            .alias()
            .to_string();

        let id_slot = self.register_selection(SqlExpression::ColumnReference {
            table_alias: table_alias.clone(),
            column_name: entity.id.column.column_name.clone(),
        });

        let mut attributes = Vec::new();
        let mut fetches = Vec::new();
        for attribute in &entity.attributes {
            match &attribute.kind {
                AttributeKind::Basic { column, type_id } => {
                    let slot = self.register_selection(SqlExpression::ColumnReference {
                        table_alias: table_alias.clone(),
                        column_name: column.column_name.clone(),
                    });
                    attributes.push(BasicAttributeResult {
                        attribute_name: attribute.attribute_name.clone(),
                        value_slot: slot,
                        type_id: *type_id,
                    });
                }
                AttributeKind::Embedded { embeddable } => {
                    let fetch = self.build_embedded_fetch(
                        navigable_path.append(&attribute.attribute_name),
                        embeddable,
                        &attribute.attribute_name,
                        &table_alias,
                        Some(id_slot),
                    )?;
                    fetches.push(Fetch::Embedded(fetch));
                }
                AttributeKind::ToOne {
                    target_entity,
                    fk_column,
                    fetch,
                } => {
                    let child_path = navigable_path.append(&attribute.attribute_name);
                    let key_type = self.model.entity(target_entity)?.id.type_id;
                    let key_slot = self.register_selection(SqlExpression::ColumnReference {
                        table_alias: table_alias.clone(),
                        column_name: fk_column.column_name.clone(),
                    });
                    let full = if self.is_fetched(&child_path) {
                        Some(Box::new(
                            self.build_entity_result(child_path.clone(), target_entity)?,
                        ))
                    } else {
                        None
                    };
                    fetches.push(Fetch::Entity(EntityFetch {
                        navigable_path: child_path,
                        attribute_name: attribute.attribute_name.clone(),
                        target_entity: target_entity.clone(),
                        timing: *fetch,
                        key_slot,
                        key_type,
                        full,
                    }));
                }
                AttributeKind::ToMany {
                    target_entity,
                    fetch,
                    ..
                } => {
                    let child_path = navigable_path.append(&attribute.attribute_name);
                    let element = if self.is_fetched(&child_path) {
                        Some(Box::new(
                            self.build_entity_result(child_path.clone(), target_entity)?,
                        ))
                    } else {
                        None
                    };
                    fetches.push(Fetch::Collection(CollectionFetch {
                        navigable_path: child_path,
                        attribute_name: attribute.attribute_name.clone(),
                        target_entity: target_entity.clone(),
                        timing: *fetch,
                        owner_key_slot: id_slot,
                        element,
                    }));
                }
            }
        }

        Ok(EntityResult {
            navigable_path,
            entity_name: entity_name.to_string(),
            id_attribute: entity.id.attribute_name.clone(),
            id_slot,
            id_type: entity.id.type_id,
            attributes,
            fetches,
        })
    }

    /// Build an embedded (composite) fetch. The owning table group is
    /// resolved before any child fetch is built - child-fetch construction
    /// needs the join already registered in the from-clause - and the
    /// non-scalar flag is recorded afterwards.
    fn build_embedded_fetch(
        &mut self,
        navigable_path: NavigablePath,
        embeddable_name: &str,
        attribute_name: &str,
        owner_table_alias: &str,
        owner_id_slot: Option<usize>,
    ) -> Result<EmbeddedFetch, TranslationError> {
        let embeddable = self.model.embeddable(embeddable_name)?.clone();

        let mut attributes = Vec::new();
        let mut fetches = Vec::new();
        for attribute in &embeddable.attributes {
            match &attribute.kind {
                AttributeKind::Basic { column, type_id } => {
                    let slot = self.register_selection(SqlExpression::ColumnReference {
                        table_alias: owner_table_alias.to_string(),
                        column_name: column.column_name.clone(),
                    });
                    attributes.push(BasicAttributeResult {
                        attribute_name: attribute.attribute_name.clone(),
                        value_slot: slot,
                        type_id: *type_id,
                    });
                }
                AttributeKind::Embedded { embeddable } => {
                    let nested = self.build_embedded_fetch(
                        navigable_path.append(&attribute.attribute_name),
                        embeddable,
                        &attribute.attribute_name,
                        owner_table_alias,
                        owner_id_slot,
                    )?;
                    fetches.push(Fetch::Embedded(nested));
                }
                AttributeKind::ToOne {
                    target_entity,
                    fk_column,
                    fetch,
                } => {
                    let child_path = navigable_path.append(&attribute.attribute_name);
                    let key_type = self.model.entity(target_entity)?.id.type_id;
                    let key_slot = self.register_selection(SqlExpression::ColumnReference {
                        table_alias: owner_table_alias.to_string(),
                        column_name: fk_column.column_name.clone(),
                    });
                    let full = if self.is_fetched(&child_path) {
                        Some(Box::new(
                            self.build_entity_result(child_path.clone(), target_entity)?,
                        ))
                    } else {
                        None
                    };
                    fetches.push(Fetch::Entity(EntityFetch {
                        navigable_path: child_path,
                        attribute_name: attribute.attribute_name.clone(),
                        target_entity: target_entity.clone(),
                        timing: *fetch,
                        key_slot,
                        key_type,
                        full,
                    }));
                }
                AttributeKind::ToMany {
                    target_entity,
                    fetch,
                    ..
                } => {
                    // Without the owning entity's key there is nothing to
                    // load the collection by; a standalone embedded
                    // selection leaves it out.
                    let Some(owner_key_slot) = owner_id_slot else {
                        continue;
                    };
                    let child_path = navigable_path.append(&attribute.attribute_name);
                    fetches.push(Fetch::Collection(CollectionFetch {
                        navigable_path: child_path,
                        attribute_name: attribute.attribute_name.clone(),
                        target_entity: target_entity.clone(),
                        timing: *fetch,
                        owner_key_slot,
                        element: None,
                    }));
                }
            }
        }

        // Recorded after the children exist: the initializer strategy for
        // this composite depends on whether anything below it is an object.
        let contains_any_non_scalar_fetch = fetches.iter().any(Fetch::is_non_scalar);

        Ok(EmbeddedFetch {
            navigable_path,
            embeddable_name: embeddable_name.to_string(),
            attribute_name: attribute_name.to_string(),
            attributes,
            fetches,
            contains_any_non_scalar_fetch,
        })
    }

    fn is_fetched(&self, path: &NavigablePath) -> bool {
        self.fetched_paths.contains(path)
    }

    // --- path / join machinery ---------------------------------------------

    /// Walk a path's attribute chain, creating table-group joins for every
    /// association step. With `materialize_terminal`, a terminal to-one
    /// step also gets a join; otherwise only its foreign key is resolved.
    fn walk_attributes(
        &mut self,
        path: &SqmPath,
        final_kind: SqlJoinKind,
        materialize_terminal: bool,
    ) -> Result<PathTerminal, TranslationError> {
        let entry = self
            .aliases
            .get(&path.root_alias)
            .ok_or_else(|| TranslationError::UnknownAlias(path.root_alias.clone()))?
            .clone();

        let mut nav = entry.navigable_path.clone();
        // The table group owning the current columns (embedded steps do not
        // advance it).
        let mut owner_nav = nav.clone();
        let mut current = SqmDomainType::Entity(entry.entity_name.clone());

        let count = path.attribute_names.len();
        for (index, attribute_name) in path.attribute_names.iter().enumerate() {
            let last = index + 1 == count;
            let attribute = self.attribute_of(&current, attribute_name, &nav)?;
            nav = nav.append(attribute_name);
            match attribute.kind {
                AttributeKind::Basic { column, type_id } => {
                    let owner_alias = self.group_alias(&owner_nav)?;
                    return Ok(PathTerminal::Basic {
                        table_alias: owner_alias,
                        column,
                        type_id,
                    });
                }
                AttributeKind::Embedded { embeddable } => {
                    if last {
                        let owner_alias = self.group_alias(&owner_nav)?;
                        return Ok(PathTerminal::Embedded {
                            navigable_path: nav,
                            owner_alias,
                            embeddable_name: embeddable,
                            attribute_name: attribute_name.clone(),
                        });
                    }
                    current = SqmDomainType::Embeddable(embeddable);
                }
                AttributeKind::ToOne {
                    target_entity,
                    fk_column,
                    ..
                } => {
                    if last && !materialize_terminal {
                        // Expression position: the association compares by
                        // its foreign key on the owner's table, joined or
                        // not.
                        let owner_alias = self.group_alias(&owner_nav)?;
                        return Ok(PathTerminal::EntityByKey {
                            owner_alias,
                            fk_column,
                            target_entity,
                        });
                    }
                    let exists = self.root_group.find(&nav).is_some();
                    if !exists {
                        let kind = if last { final_kind } else { SqlJoinKind::Inner };
                        self.create_to_one_join(
                            &owner_nav,
                            nav.clone(),
                            &target_entity,
                            &fk_column,
                            kind,
                        )?;
                    }
                    owner_nav = nav.clone();
                    current = SqmDomainType::Entity(target_entity);
                }
                AttributeKind::ToMany {
                    target_entity,
                    target_fk_column,
                    ..
                } => {
                    if self.root_group.find(&nav).is_none() {
                        let kind = if last { final_kind } else { SqlJoinKind::Inner };
                        self.create_to_many_join(
                            &owner_nav,
                            nav.clone(),
                            &target_entity,
                            &target_fk_column,
                            kind,
                        )?;
                    }
                    owner_nav = nav.clone();
                    current = SqmDomainType::Entity(target_entity);
                }
            }
        }

        // Empty attribute chain, or a chain ending on an association that
        // created/found its group above.
        match current {
            SqmDomainType::Entity(entity_name) => Ok(PathTerminal::Entity {
                navigable_path: nav,
                entity_name,
            }),
            _ => Err(TranslationError::UnknownAlias(
                path.navigable_path.full_path().to_string(),
            )),
        }
    }

    fn attribute_of(
        &self,
        owner: &SqmDomainType,
        attribute_name: &str,
        nav: &NavigablePath,
    ) -> Result<crate::domain_model::AttributeMapping, TranslationError> {
        use crate::domain_model::AttributeMapping;
        match owner {
            SqmDomainType::Entity(entity_name) => {
                let entity = self.model.entity(entity_name)?;
                if entity.id.attribute_name == attribute_name {
                    return Ok(AttributeMapping::basic(
                        entity.id.attribute_name.clone(),
                        entity.id.column.column_name.clone(),
                        entity.id.column.column_type,
                        entity.id.type_id,
                    ));
                }
                entity.attribute(attribute_name).cloned().ok_or_else(|| {
                    crate::domain_model::DomainModelError::AttributeNotFound {
                        owner: entity_name.clone(),
                        attribute: attribute_name.to_string(),
                    }
                    .into()
                })
            }
            SqmDomainType::Embeddable(embeddable_name) => {
                let embeddable = self.model.embeddable(embeddable_name)?;
                embeddable.attribute(attribute_name).cloned().ok_or_else(|| {
                    crate::domain_model::DomainModelError::AttributeNotFound {
                        owner: embeddable_name.clone(),
                        attribute: attribute_name.to_string(),
                    }
                    .into()
                })
            }
            _ => Err(TranslationError::UnknownAlias(nav.full_path().to_string())),
        }
    }

    fn group_alias(&self, nav: &NavigablePath) -> Result<String, TranslationError> {
        self.root_group
            .find(nav)
            .map(|g| g.alias().to_string())
            .ok_or_else(|| {
                TranslationError::SqlAst(sql_ast::SqlAstError::NoTableGroup(
                    nav.full_path().to_string(),
                ))
            })
    }

    fn create_to_one_join(
        &mut self,
        owner_nav: &NavigablePath,
        nav: NavigablePath,
        target_entity: &str,
        fk_column: &ColumnMapping,
        kind: SqlJoinKind,
    ) -> Result<(), TranslationError> {
        let target: EntityMapping = (**self.model.entity(target_entity)?).clone();
        let alias_base = self.manager.create_alias_base(&target.table.alias_stem);
        let target_alias = alias_base.alias();
        let owner_alias = self.group_alias(owner_nav)?;

        let predicate = SqlExpression::Comparison {
            op: ComparisonOp::Eq,
            lhs: Box::new(SqlExpression::ColumnReference {
                table_alias: owner_alias,
                column_name: fk_column.column_name.clone(),
            }),
            rhs: Box::new(SqlExpression::ColumnReference {
                table_alias: target_alias.clone(),
                column_name: target.id.column.column_name.clone(),
            }),
        };
        let joined = TableGroup::new(
            nav,
            TableReference {
                table_name: target.table.table_name.clone(),
                identification_variable: target_alias,
            },
        );
        let owner = self.root_group.find_mut(owner_nav).ok_or_else(|| {
            TranslationError::SqlAst(sql_ast::SqlAstError::NoTableGroup(
                owner_nav.full_path().to_string(),
            ))
        })?;
        owner.add_join(TableGroupJoin {
            kind,
            predicate: Some(predicate),
            joined,
        });
        Ok(())
    }

    fn create_to_many_join(
        &mut self,
        owner_nav: &NavigablePath,
        nav: NavigablePath,
        target_entity: &str,
        target_fk_column: &str,
        kind: SqlJoinKind,
    ) -> Result<(), TranslationError> {
        let target: EntityMapping = (**self.model.entity(target_entity)?).clone();
        let alias_base = self.manager.create_alias_base(&target.table.alias_stem);
        let target_alias = alias_base.alias();
        let owner_alias = self.group_alias(owner_nav)?;

        // The owner's identifier column drives the join; the foreign key
        // lives on the target side.
        let owner_entity_name = self
            .aliases
            .values()
            .find(|entry| &entry.navigable_path == owner_nav)
            .map(|entry| entry.entity_name.clone());
        let owner_id_column = match owner_entity_name {
            Some(name) => self.model.entity(&name)?.id.column.column_name.clone(),
            None => self.owner_id_column_by_nav(owner_nav)?,
        };

        let predicate = SqlExpression::Comparison {
            op: ComparisonOp::Eq,
            lhs: Box::new(SqlExpression::ColumnReference {
                table_alias: owner_alias,
                column_name: owner_id_column,
            }),
            rhs: Box::new(SqlExpression::ColumnReference {
                table_alias: target_alias.clone(),
                column_name: target_fk_column.to_string(),
            }),
        };
        let joined = TableGroup::new(
            nav,
            TableReference {
                table_name: target.table.table_name.clone(),
                identification_variable: target_alias,
            },
        );
        let owner = self.root_group.find_mut(owner_nav).ok_or_else(|| {
            TranslationError::SqlAst(sql_ast::SqlAstError::NoTableGroup(
                owner_nav.full_path().to_string(),
            ))
        })?;
        owner.add_join(TableGroupJoin {
            kind,
            predicate: Some(predicate),
            joined,
        });
        Ok(())
    }

    /// Fallback identifier-column lookup for intermediate association
    /// groups that have no user alias: re-walk the path from a known alias.
    fn owner_id_column_by_nav(&self, nav: &NavigablePath) -> Result<String, TranslationError> {
        // All aliases hold entity bindings; find the deepest alias that
        // prefixes this nav and walk the rest of the chain.
        let mut best: Option<(&AliasEntry, usize)> = None;
        for entry in self.aliases.values() {
            let prefix = entry.navigable_path.full_path();
            if nav.full_path() == prefix || nav.full_path().starts_with(&format!("{}.", prefix)) {
                let depth = entry.navigable_path.depth();
                if best.map(|(_, d)| depth > d).unwrap_or(true) {
                    best = Some((entry, depth));
                }
            }
        }
        let (entry, _) =
            best.ok_or_else(|| TranslationError::UnknownAlias(nav.full_path().to_string()))?;
        let remainder = nav
            .full_path()
            .strip_prefix(entry.navigable_path.full_path())
            .unwrap_or("")
            .trim_start_matches('.');

        let mut current = SqmDomainType::Entity(entry.entity_name.clone());
        if !remainder.is_empty() {
            for segment in remainder.split('.') {
                let attribute = self.attribute_of(&current, segment, nav)?;
                current = match attribute.kind {
                    AttributeKind::Embedded { embeddable } => {
                        SqmDomainType::Embeddable(embeddable)
                    }
                    AttributeKind::ToOne { target_entity, .. }
                    | AttributeKind::ToMany { target_entity, .. } => {
                        SqmDomainType::Entity(target_entity)
                    }
                    AttributeKind::Basic { .. } => {
                        return Err(TranslationError::UnknownAlias(
                            nav.full_path().to_string(),
                        ))
                    }
                };
            }
        }
        match current {
            SqmDomainType::Entity(name) => {
                Ok(self.model.entity(&name)?.id.column.column_name.clone())
            }
            _ => Err(TranslationError::UnknownAlias(nav.full_path().to_string())),
        }
    }

    // --- selections --------------------------------------------------------

    /// Register a selected expression, reusing an existing selection when
    /// the same expression is already selected. Slots are dense and unique;
    /// the 1-based result-set position is derived through the shared
    /// translation helper so every boundary crossing agrees.
    fn register_selection(&mut self, expression: SqlExpression) -> usize {
        if let Some(existing) = self
            .selections
            .iter()
            .find(|s| s.expression == expression)
        {
            return existing.values_array_position;
        }
        let values_array_position = self.selections.len();
        self.selections.push(SqlSelection {
            jdbc_position: row_position::jdbc_position(values_array_position),
            values_array_position,
            expression,
        });
        values_array_position
    }

    // --- expressions / predicates ------------------------------------------

    fn lower_expression(
        &mut self,
        expr: &SqmExpression,
    ) -> Result<SqlExpression, TranslationError> {
        match expr {
            SqmExpression::Literal { value, type_id } => {
                let sql_value = type_registry::descriptor(*type_id).unwrap(value)?;
                Ok(SqlExpression::Literal(sql_value))
            }
            SqmExpression::Parameter(p) => Ok(SqlExpression::Parameter(p.label.clone())),
            SqmExpression::Path(path) => {
                if path.terminal_is_plural {
                    return Err(TranslationError::PluralValuePath(
                        path.navigable_path.full_path().to_string(),
                    ));
                }
                let terminal = self.walk_attributes(path, SqlJoinKind::Inner, false)?;
                match terminal {
                    PathTerminal::Basic {
                        table_alias,
                        column,
                        ..
                    } => Ok(SqlExpression::ColumnReference {
                        table_alias,
                        column_name: column.column_name,
                    }),
                    // An entity in expression position compares by its
                    // identifier.
                    PathTerminal::Entity {
                        navigable_path,
                        entity_name,
                    } => {
                        let alias = self.group_alias(&navigable_path)?;
                        let id_column =
                            self.model.entity(&entity_name)?.id.column.column_name.clone();
                        Ok(SqlExpression::ColumnReference {
                            table_alias: alias,
                            column_name: id_column,
                        })
                    }
                    PathTerminal::EntityByKey {
                        owner_alias,
                        fk_column,
                        ..
                    } => Ok(SqlExpression::ColumnReference {
                        table_alias: owner_alias,
                        column_name: fk_column.column_name,
                    }),
                    PathTerminal::Embedded { navigable_path, .. } => {
                        Err(TranslationError::EmbeddedValueExpression {
                            path: navigable_path.full_path().to_string(),
                        })
                    }
                }
            }
            SqmExpression::Function(call) => {
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.lower_expression(arg)?);
                }
                Ok(SqlExpression::Function {
                    name: call.sql_name.clone(),
                    args,
                })
            }
            SqmExpression::Binary { op, lhs, rhs, .. } => Ok(SqlExpression::Arithmetic {
                op: *op,
                lhs: Box::new(self.lower_expression(lhs)?),
                rhs: Box::new(self.lower_expression(rhs)?),
            }),
            SqmExpression::Negation { operand, .. } => Ok(SqlExpression::Negation(Box::new(
                self.lower_expression(operand)?,
            ))),
            SqmExpression::EntityType { entity_name, .. } => Ok(SqlExpression::Literal(
                SqlValue::Varchar(entity_name.clone()),
            )),
        }
    }

    fn lower_predicate(
        &mut self,
        predicate: &SqmPredicate,
    ) -> Result<SqlExpression, TranslationError> {
        match predicate {
            SqmPredicate::Comparison { op, lhs, rhs } => Ok(SqlExpression::Comparison {
                op: *op,
                lhs: Box::new(self.lower_expression(lhs)?),
                rhs: Box::new(self.lower_expression(rhs)?),
            }),
            SqmPredicate::Between {
                operand,
                low,
                high,
                negated,
            } => Ok(SqlExpression::Between {
                operand: Box::new(self.lower_expression(operand)?),
                low: Box::new(self.lower_expression(low)?),
                high: Box::new(self.lower_expression(high)?),
                negated: *negated,
            }),
            SqmPredicate::InList {
                operand,
                items,
                negated,
            } => {
                let mut lowered = Vec::with_capacity(items.len());
                for item in items {
                    lowered.push(self.lower_expression(item)?);
                }
                Ok(SqlExpression::InList {
                    operand: Box::new(self.lower_expression(operand)?),
                    items: lowered,
                    negated: *negated,
                })
            }
            SqmPredicate::Like {
                operand,
                pattern,
                negated,
            } => Ok(SqlExpression::Like {
                operand: Box::new(self.lower_expression(operand)?),
                pattern: Box::new(self.lower_expression(pattern)?),
                negated: *negated,
            }),
            SqmPredicate::NullCheck { operand, negated } => Ok(SqlExpression::NullCheck {
                operand: Box::new(self.lower_expression(operand)?),
                negated: *negated,
            }),
            SqmPredicate::Junction {
                conjunction,
                predicates,
            } => {
                let mut parts = Vec::with_capacity(predicates.len());
                for p in predicates {
                    parts.push(self.lower_predicate(p)?);
                }
                Ok(SqlExpression::Junction {
                    conjunction: *conjunction,
                    parts,
                })
            }
            SqmPredicate::Negated(inner) => Ok(SqlExpression::Negated(Box::new(
                self.lower_predicate(inner)?,
            ))),
        }
    }
}

// --- DML -------------------------------------------------------------------

/// DML statements target a single table without aliases; paths resolve to
/// that table's columns only.
struct DmlTranslator<'a> {
    model: &'a DomainModel,
    entity: EntityMapping,
}

impl<'a> DmlTranslator<'a> {
    fn new(model: &'a DomainModel, entity_name: &str) -> Result<Self, TranslationError> {
        let entity = (**model.entity(entity_name)?).clone();
        Ok(DmlTranslator { model, entity })
    }

    fn table(&self) -> TableReference {
        TableReference {
            table_name: self.entity.table.table_name.clone(),
            identification_variable: self.entity.table.table_name.clone(),
        }
    }

    /// Resolve a path's attribute chain to a single column on the target
    /// table (basic, embedded chain, or a to-one foreign key).
    fn column_of(&self, path: &SqmPath) -> Result<ColumnMapping, TranslationError> {
        let mut current = SqmDomainType::Entity(self.entity.entity_name.clone());
        let mut column = None;
        let count = path.attribute_names.len();
        for (index, attribute_name) in path.attribute_names.iter().enumerate() {
            let last = index + 1 == count;
            let attribute = match &current {
                SqmDomainType::Entity(entity_name) => {
                    let entity = self.model.entity(entity_name)?;
                    if &entity.id.attribute_name == attribute_name {
                        column = Some(entity.id.column.clone());
                        if !last {
                            return Err(self.unsupported(path));
                        }
                        break;
                    }
                    entity
                        .attribute(attribute_name)
                        .cloned()
                        .ok_or_else(|| self.unsupported(path))?
                }
                SqmDomainType::Embeddable(embeddable_name) => self
                    .model
                    .embeddable(embeddable_name)?
                    .attribute(attribute_name)
                    .cloned()
                    .ok_or_else(|| self.unsupported(path))?,
                _ => return Err(self.unsupported(path)),
            };
            match attribute.kind {
                AttributeKind::Basic { column: c, .. } => {
                    if !last {
                        return Err(self.unsupported(path));
                    }
                    column = Some(c);
                }
                AttributeKind::Embedded { embeddable } => {
                    if last {
                        return Err(self.unsupported(path));
                    }
                    current = SqmDomainType::Embeddable(embeddable);
                }
                AttributeKind::ToOne { fk_column, .. } => {
                    if !last {
                        return Err(self.unsupported(path));
                    }
                    column = Some(fk_column);
                }
                AttributeKind::ToMany { .. } => return Err(self.unsupported(path)),
            }
        }
        column.ok_or_else(|| self.unsupported(path))
    }

    fn unsupported(&self, path: &SqmPath) -> TranslationError {
        TranslationError::UnsupportedDmlPath {
            path: path.navigable_path.full_path().to_string(),
        }
    }

    fn lower_expression(
        &self,
        expr: &SqmExpression,
    ) -> Result<SqlExpression, TranslationError> {
        match expr {
            SqmExpression::Literal { value, type_id } => {
                let sql_value = type_registry::descriptor(*type_id).unwrap(value)?;
                Ok(SqlExpression::Literal(sql_value))
            }
            SqmExpression::Parameter(p) => Ok(SqlExpression::Parameter(p.label.clone())),
            SqmExpression::Path(path) => {
                let column = self.column_of(path)?;
                Ok(SqlExpression::ColumnReference {
                    table_alias: self.entity.table.table_name.clone(),
                    column_name: column.column_name,
                })
            }
            SqmExpression::Function(call) => {
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.lower_expression(arg)?);
                }
                Ok(SqlExpression::Function {
                    name: call.sql_name.clone(),
                    args,
                })
            }
            SqmExpression::Binary { op, lhs, rhs, .. } => Ok(SqlExpression::Arithmetic {
                op: *op,
                lhs: Box::new(self.lower_expression(lhs)?),
                rhs: Box::new(self.lower_expression(rhs)?),
            }),
            SqmExpression::Negation { operand, .. } => Ok(SqlExpression::Negation(Box::new(
                self.lower_expression(operand)?,
            ))),
            SqmExpression::EntityType { entity_name, .. } => Ok(SqlExpression::Literal(
                SqlValue::Varchar(entity_name.clone()),
            )),
        }
    }

    fn lower_predicate(
        &self,
        predicate: &SqmPredicate,
    ) -> Result<SqlExpression, TranslationError> {
        match predicate {
            SqmPredicate::Comparison { op, lhs, rhs } => Ok(SqlExpression::Comparison {
                op: *op,
                lhs: Box::new(self.lower_expression(lhs)?),
                rhs: Box::new(self.lower_expression(rhs)?),
            }),
            SqmPredicate::Between {
                operand,
                low,
                high,
                negated,
            } => Ok(SqlExpression::Between {
                operand: Box::new(self.lower_expression(operand)?),
                low: Box::new(self.lower_expression(low)?),
                high: Box::new(self.lower_expression(high)?),
                negated: *negated,
            }),
            SqmPredicate::InList {
                operand,
                items,
                negated,
            } => {
                let mut lowered = Vec::with_capacity(items.len());
                for item in items {
                    lowered.push(self.lower_expression(item)?);
                }
                Ok(SqlExpression::InList {
                    operand: Box::new(self.lower_expression(operand)?),
                    items: lowered,
                    negated: *negated,
                })
            }
            SqmPredicate::Like {
                operand,
                pattern,
                negated,
            } => Ok(SqlExpression::Like {
                operand: Box::new(self.lower_expression(operand)?),
                pattern: Box::new(self.lower_expression(pattern)?),
                negated: *negated,
            }),
            SqmPredicate::NullCheck { operand, negated } => Ok(SqlExpression::NullCheck {
                operand: Box::new(self.lower_expression(operand)?),
                negated: *negated,
            }),
            SqmPredicate::Junction {
                conjunction,
                predicates,
            } => {
                let mut parts = Vec::with_capacity(predicates.len());
                for p in predicates {
                    parts.push(self.lower_predicate(p)?);
                }
                Ok(SqlExpression::Junction {
                    conjunction: *conjunction,
                    parts,
                })
            }
            SqmPredicate::Negated(inner) => Ok(SqlExpression::Negated(Box::new(
                self.lower_predicate(inner)?,
            ))),
        }
    }
}

pub fn translate_update(
    update: &SqmUpdateStatement,
    model: &DomainModel,
) -> Result<Translation, TranslationError> {
    let translator = DmlTranslator::new(model, &update.entity_name)?;
    let mut assignments = Vec::with_capacity(update.assignments.len());
    for assignment in &update.assignments {
        let column = translator.column_of(&assignment.target)?;
        let value = translator.lower_expression(&assignment.value)?;
        assignments.push((column.column_name, value));
    }
    let predicate = update
        .predicate
        .as_ref()
        .map(|p| translator.lower_predicate(p))
        .transpose()?;
    debug!("translated update statement: {}", update);
    Ok(Translation {
        statement: SqlStatement::Update(sql_ast::UpdateStatement {
            table: translator.table(),
            assignments,
            predicate,
        }),
        result_plan: Vec::new(),
    })
}

pub fn translate_insert(
    insert: &SqmInsertStatement,
    model: &DomainModel,
) -> Result<Translation, TranslationError> {
    let translator = DmlTranslator::new(model, &insert.entity_name)?;
    let mut columns = Vec::with_capacity(insert.target_paths.len());
    for path in &insert.target_paths {
        columns.push(translator.column_of(path)?.column_name);
    }
    let mut tuples = Vec::with_capacity(insert.value_tuples.len());
    for tuple in &insert.value_tuples {
        let mut lowered = Vec::with_capacity(tuple.len());
        for value in tuple {
            lowered.push(translator.lower_expression(value)?);
        }
        tuples.push(lowered);
    }
    debug!("translated insert statement: {}", insert);
    Ok(Translation {
        statement: SqlStatement::Insert(sql_ast::InsertStatement {
            table: translator.table(),
            columns,
            tuples,
        }),
        result_plan: Vec::new(),
    })
}

pub fn translate_delete(
    delete: &SqmDeleteStatement,
    model: &DomainModel,
) -> Result<Translation, TranslationError> {
    let translator = DmlTranslator::new(model, &delete.entity_name)?;
    let predicate = delete
        .predicate
        .as_ref()
        .map(|p| translator.lower_predicate(p))
        .transpose()?;
    Ok(Translation {
        statement: SqlStatement::Delete(sql_ast::DeleteStatement {
            table: translator.table(),
            predicate,
        }),
        result_plan: Vec::new(),
    })
}
