use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::domain_model::{DomainModel, NavigablePath};

use super::errors::SemanticError;

/// What an identification variable is bound to.
#[derive(Debug, Clone)]
pub struct AliasBinding {
    pub navigable_path: NavigablePath,
    pub entity_name: String,
}

/// Per-statement creation context: access to the immutable domain model and
/// engine configuration, plus the alias registrations accumulated while one
/// statement's tree is built. Owned by a single compilation, never shared.
pub struct SqmCreationContext<'a> {
    pub model: &'a DomainModel,
    pub config: &'a EngineConfig,
    aliases: HashMap<String, AliasBinding>,
}

impl<'a> SqmCreationContext<'a> {
    pub fn new(model: &'a DomainModel, config: &'a EngineConfig) -> Self {
        SqmCreationContext {
            model,
            config,
            aliases: HashMap::new(),
        }
    }

    /// Register the root entity's identification variable.
    pub fn register_root(
        &mut self,
        alias: &str,
        entity_name: &str,
    ) -> Result<NavigablePath, SemanticError> {
        self.model.entity(entity_name)?;
        let path = NavigablePath::root(alias);
        self.insert_alias(alias, path.clone(), entity_name)?;
        Ok(path)
    }

    /// Register a join's identification variable for an association target.
    pub fn register_join(
        &mut self,
        alias: &str,
        navigable_path: NavigablePath,
        target_entity: &str,
    ) -> Result<(), SemanticError> {
        let depth = navigable_path.depth();
        let max = self.config.max_join_depth;
        if depth > max {
            return Err(SemanticError::JoinDepthExceeded { depth, max });
        }
        self.insert_alias(alias, navigable_path, target_entity)
    }

    fn insert_alias(
        &mut self,
        alias: &str,
        navigable_path: NavigablePath,
        entity_name: &str,
    ) -> Result<(), SemanticError> {
        if self.aliases.contains_key(alias) {
            return Err(SemanticError::DuplicateAlias {
                alias: alias.to_string(),
            });
        }
        self.aliases.insert(
            alias.to_string(),
            AliasBinding {
                navigable_path,
                entity_name: entity_name.to_string(),
            },
        );
        Ok(())
    }

    pub fn resolve_alias(&self, alias: &str) -> Result<&AliasBinding, SemanticError> {
        self.aliases.get(alias).ok_or_else(|| SemanticError::UnknownAlias {
            alias: alias.to_string(),
        })
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }
}
