//! Static, immutable description of the mapped domain: entities, attributes,
//! associations, embeddables, and their relational table/column bindings.
//!
//! The model is produced once by [`DomainModelBuilder`] at bootstrap and is
//! consumed read-only by every later pipeline stage, so unsynchronized
//! concurrent reads are safe.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::type_registry::{BasicTypeId, SqlColumnType};

pub mod errors;
pub mod navigable_path;

pub use errors::DomainModelError;
pub use navigable_path::NavigablePath;

/// When an association's value is materialized relative to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchTiming {
    Eager,
    Lazy,
}

/// Relational binding of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column_name: String,
    pub column_type: SqlColumnType,
}

impl ColumnMapping {
    pub fn new(column_name: impl Into<String>, column_type: SqlColumnType) -> Self {
        ColumnMapping {
            column_name: column_name.into(),
            column_type,
        }
    }
}

/// Primary-table binding of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    pub table_name: String,
    /// Stem used for SQL alias generation (`emp` -> `emp1`, `emp2`, ...).
    pub alias_stem: String,
}

impl TableMapping {
    /// Create a table mapping with a stem derived from the table name: the
    /// first letter of each `_`-separated word, lowercased
    /// (`employee_roles` -> `er`).
    pub fn new(table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let alias_stem = derive_alias_stem(&table_name);
        TableMapping {
            table_name,
            alias_stem,
        }
    }

    pub fn with_alias_stem(table_name: impl Into<String>, stem: impl Into<String>) -> Self {
        TableMapping {
            table_name: table_name.into(),
            alias_stem: stem.into(),
        }
    }
}

fn derive_alias_stem(table_name: &str) -> String {
    let stem: String = table_name
        .split('_')
        .filter_map(|word| word.chars().next())
        .collect();
    if stem.is_empty() {
        "t".to_string()
    } else {
        stem.to_lowercase()
    }
}

/// Identifier attribute of an entity. Composite identifiers are not modeled;
/// composite *natural* ids are (see [`NaturalIdMapping`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdMapping {
    pub attribute_name: String,
    pub column: ColumnMapping,
    pub type_id: BasicTypeId,
}

/// How one attribute of an entity or embeddable is mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Scalar value in a single column.
    Basic {
        column: ColumnMapping,
        type_id: BasicTypeId,
    },
    /// Composite value whose columns live on the owner's table.
    Embedded { embeddable: String },
    /// Many-to-one / one-to-one association; the foreign key column lives on
    /// the owner's table and references the target entity's identifier.
    ToOne {
        target_entity: String,
        fk_column: ColumnMapping,
        fetch: FetchTiming,
    },
    /// One-to-many association; the foreign key column lives on the target
    /// entity's table and references the owner's identifier.
    ToMany {
        target_entity: String,
        target_fk_column: String,
        fetch: FetchTiming,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub attribute_name: String,
    pub kind: AttributeKind,
}

impl AttributeMapping {
    pub fn basic(
        name: impl Into<String>,
        column: impl Into<String>,
        column_type: SqlColumnType,
        type_id: BasicTypeId,
    ) -> Self {
        AttributeMapping {
            attribute_name: name.into(),
            kind: AttributeKind::Basic {
                column: ColumnMapping::new(column, column_type),
                type_id,
            },
        }
    }

    pub fn embedded(name: impl Into<String>, embeddable: impl Into<String>) -> Self {
        AttributeMapping {
            attribute_name: name.into(),
            kind: AttributeKind::Embedded {
                embeddable: embeddable.into(),
            },
        }
    }

    pub fn to_one(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        fk_column: impl Into<String>,
        fk_type: SqlColumnType,
        fetch: FetchTiming,
    ) -> Self {
        AttributeMapping {
            attribute_name: name.into(),
            kind: AttributeKind::ToOne {
                target_entity: target_entity.into(),
                fk_column: ColumnMapping::new(fk_column, fk_type),
                fetch,
            },
        }
    }

    pub fn to_many(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        target_fk_column: impl Into<String>,
        fetch: FetchTiming,
    ) -> Self {
        AttributeMapping {
            attribute_name: name.into(),
            kind: AttributeKind::ToMany {
                target_entity: target_entity.into(),
                target_fk_column: target_fk_column.into(),
                fetch,
            },
        }
    }
}

/// Business-meaningful alternate key, used for second-level cache lookups.
/// May span several attributes (a composite natural id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalIdMapping {
    pub attribute_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub entity_name: String,
    pub table: TableMapping,
    pub id: IdMapping,
    pub attributes: Vec<AttributeMapping>,
    pub natural_id: Option<NaturalIdMapping>,
}

impl EntityMapping {
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping> {
        self.attributes.iter().find(|a| a.attribute_name == name)
    }
}

/// Composite value type without its own table or identity. Its columns are
/// written to whichever table owns the embedding attribute. May itself
/// contain to-one associations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddableMapping {
    pub embeddable_name: String,
    pub attributes: Vec<AttributeMapping>,
}

impl EmbeddableMapping {
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping> {
        self.attributes.iter().find(|a| a.attribute_name == name)
    }
}

/// The frozen domain model. Built once, immutable for the process lifetime
/// of one configured persistence unit.
#[derive(Debug)]
pub struct DomainModel {
    entities: HashMap<String, Arc<EntityMapping>>,
    embeddables: HashMap<String, Arc<EmbeddableMapping>>,
}

impl DomainModel {
    pub fn builder() -> DomainModelBuilder {
        DomainModelBuilder::default()
    }

    pub fn entity(&self, name: &str) -> Result<&Arc<EntityMapping>, DomainModelError> {
        self.entities
            .get(name)
            .ok_or_else(|| DomainModelError::EntityNotFound(name.to_string()))
    }

    pub fn embeddable(&self, name: &str) -> Result<&Arc<EmbeddableMapping>, DomainModelError> {
        self.embeddables
            .get(name)
            .ok_or_else(|| DomainModelError::EmbeddableNotFound(name.to_string()))
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(|s| s.as_str())
    }

    /// Number of underlying column slots one attribute value occupies: 1 for
    /// a scalar or to-one key, the sum of contained spans for an embedded
    /// value, 0 for a to-many (its columns live on the target table).
    pub fn column_span(&self, attribute: &AttributeMapping) -> Result<usize, DomainModelError> {
        let mut count = 0;
        self.for_each_column(attribute, &mut |_| count += 1)?;
        Ok(count)
    }

    /// Visit every column slot of an attribute, in mapping order. The number
    /// of visits always equals [`Self::column_span`] - callers bind or read
    /// exactly that many columns.
    pub fn for_each_column(
        &self,
        attribute: &AttributeMapping,
        f: &mut dyn FnMut(&ColumnMapping),
    ) -> Result<(), DomainModelError> {
        match &attribute.kind {
            AttributeKind::Basic { column, .. } => f(column),
            AttributeKind::ToOne { fk_column, .. } => f(fk_column),
            AttributeKind::ToMany { .. } => {}
            AttributeKind::Embedded { embeddable } => {
                let embeddable = self.embeddable(embeddable)?.clone();
                for attr in &embeddable.attributes {
                    self.for_each_column(attr, f)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct DomainModelBuilder {
    entities: Vec<EntityMapping>,
    embeddables: Vec<EmbeddableMapping>,
}

impl DomainModelBuilder {
    pub fn entity(mut self, entity: EntityMapping) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn embeddable(mut self, embeddable: EmbeddableMapping) -> Self {
        self.embeddables.push(embeddable);
        self
    }

    /// Validate cross-references and freeze the model.
    pub fn build(self) -> Result<Arc<DomainModel>, DomainModelError> {
        let mut embeddables = HashMap::new();
        for embeddable in self.embeddables {
            if embeddables.contains_key(&embeddable.embeddable_name) {
                return Err(DomainModelError::DuplicateEmbeddable(
                    embeddable.embeddable_name,
                ));
            }
            embeddables.insert(embeddable.embeddable_name.clone(), Arc::new(embeddable));
        }

        let mut entities: HashMap<String, Arc<EntityMapping>> = HashMap::new();
        for entity in self.entities {
            if entities.contains_key(&entity.entity_name) {
                return Err(DomainModelError::DuplicateEntity(entity.entity_name));
            }
            entities.insert(entity.entity_name.clone(), Arc::new(entity));
        }

        let model = DomainModel {
            entities,
            embeddables,
        };

        // Cross-reference validation: association targets, embeddables,
        // natural-id attributes must all resolve.
        for entity in model.entities.values() {
            for attr in &entity.attributes {
                validate_attribute(&model, &entity.entity_name, attr)?;
            }
            if let Some(natural_id) = &entity.natural_id {
                for attr_name in &natural_id.attribute_names {
                    if entity.attribute(attr_name).is_none() && entity.id.attribute_name != *attr_name
                    {
                        return Err(DomainModelError::UnknownNaturalIdAttribute {
                            entity: entity.entity_name.clone(),
                            attribute: attr_name.clone(),
                        });
                    }
                }
            }
        }
        for embeddable in model.embeddables.values() {
            for attr in &embeddable.attributes {
                validate_attribute(&model, &embeddable.embeddable_name, attr)?;
            }
        }

        Ok(Arc::new(model))
    }
}

fn validate_attribute(
    model: &DomainModel,
    owner: &str,
    attr: &AttributeMapping,
) -> Result<(), DomainModelError> {
    match &attr.kind {
        AttributeKind::Basic { .. } => Ok(()),
        AttributeKind::Embedded { embeddable } => {
            if model.embeddables.contains_key(embeddable) {
                Ok(())
            } else {
                Err(DomainModelError::UnknownEmbeddable {
                    owner: owner.to_string(),
                    attribute: attr.attribute_name.clone(),
                    embeddable: embeddable.clone(),
                })
            }
        }
        AttributeKind::ToOne { target_entity, .. }
        | AttributeKind::ToMany { target_entity, .. } => {
            if model.entities.contains_key(target_entity) {
                Ok(())
            } else {
                Err(DomainModelError::UnknownAssociationTarget {
                    owner: owner.to_string(),
                    attribute: attr.attribute_name.clone(),
                    target: target_entity.clone(),
                })
            }
        }
    }
}
