//! Left-to-right resolution of dotted paths against the domain model.

use crate::domain_model::{AttributeKind, AttributeMapping};

use super::creation_context::SqmCreationContext;
use super::errors::SemanticError;
use super::nodes::{SqmDomainType, SqmPath};

/// Resolve a dotted path. The head segment must be a registered
/// identification variable; each later segment navigates an attribute of the
/// type reached so far. Navigating through a terminal (scalar) node is an
/// interpretation error.
pub fn resolve_path(
    ctx: &SqmCreationContext<'_>,
    segments: &[&str],
) -> Result<SqmPath, SemanticError> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(SemanticError::UnknownAlias {
            alias: String::new(),
        });
    };
    let binding = ctx.resolve_alias(head)?;

    let mut navigable_path = binding.navigable_path.clone();
    let mut current = SqmDomainType::Entity(binding.entity_name.clone());
    let mut attribute_names = Vec::with_capacity(rest.len());
    let mut is_plural = false;

    for segment in rest {
        // A plural step is only valid as the final segment of a join path.
        if is_plural {
            return Err(SemanticError::PluralPathNotAllowed {
                path: format!("{}.{}", navigable_path, segment),
            });
        }
        let full = format!("{}.{}", navigable_path, segment);
        let attribute = resolve_attribute(ctx, &current, segment, &full)?;
        current = match &attribute.kind {
            AttributeKind::Basic { type_id, .. } => SqmDomainType::Basic(*type_id),
            AttributeKind::Embedded { embeddable } => {
                SqmDomainType::Embeddable(embeddable.clone())
            }
            AttributeKind::ToOne { target_entity, .. } => {
                SqmDomainType::Entity(target_entity.clone())
            }
            AttributeKind::ToMany { target_entity, .. } => {
                is_plural = true;
                SqmDomainType::Entity(target_entity.clone())
            }
        };
        attribute_names.push(segment.to_string());
        navigable_path = navigable_path.append(segment);
    }

    Ok(SqmPath {
        navigable_path,
        root_alias: head.to_string(),
        attribute_names,
        terminal_type: current,
        terminal_is_plural: is_plural,
    })
}

fn resolve_attribute(
    ctx: &SqmCreationContext<'_>,
    owner: &SqmDomainType,
    segment: &str,
    full_path: &str,
) -> Result<AttributeMapping, SemanticError> {
    match owner {
        SqmDomainType::Entity(entity_name) => {
            let entity = ctx.model.entity(entity_name)?;
            if entity.id.attribute_name == segment {
                return Ok(AttributeMapping::basic(
                    entity.id.attribute_name.clone(),
                    entity.id.column.column_name.clone(),
                    entity.id.column.column_type,
                    entity.id.type_id,
                ));
            }
            entity
                .attribute(segment)
                .cloned()
                .ok_or_else(|| SemanticError::UnknownAttribute {
                    owner: entity_name.clone(),
                    attribute: segment.to_string(),
                    path: full_path.to_string(),
                })
        }
        SqmDomainType::Embeddable(embeddable_name) => {
            let embeddable = ctx.model.embeddable(embeddable_name)?;
            embeddable
                .attribute(segment)
                .cloned()
                .ok_or_else(|| SemanticError::UnknownAttribute {
                    owner: embeddable_name.clone(),
                    attribute: segment.to_string(),
                    path: full_path.to_string(),
                })
        }
        SqmDomainType::EntityTypeLiteral(_) => {
            Err(SemanticError::EntityTypeLiteralDereference {
                path: full_path.to_string(),
            })
        }
        SqmDomainType::Basic(type_id) => Err(SemanticError::IllegalPathDereference {
            path: full_path.to_string(),
            through: full_path
                .rsplit_once('.')
                .map(|(owner, _)| owner.to_string())
                .unwrap_or_else(|| full_path.to_string()),
            kind: type_id.name().to_string(),
        }),
    }
}
