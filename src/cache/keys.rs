//! Second-level cache keys: stable, serializable, hash-precomputed.
//!
//! Keys are immutable after construction, including across a
//! serialize/deserialize boundary. The combined digest over entity name,
//! tenant, and the disassembled value(s) is computed once in the
//! constructor and reused by every `eq`/`hash` call; the display string is
//! a derived transient, rebuilt lazily after deserialization and never
//! serialized.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain_model::DomainModel;
use crate::type_registry::DomainValue;

/// Cache-key construction defects: configuration problems surfaced
/// immediately, never deferred.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheKeyError {
    #[error("Entity '{0}' is not mapped")]
    UnknownEntity(String),
    #[error("Entity '{0}' declares no natural-id mapping")]
    MissingNaturalIdMapping(String),
    #[error("Natural id of '{entity}' has {expected} attribute(s), but {found} value(s) were given")]
    NaturalIdArityMismatch {
        entity: String,
        expected: usize,
        found: usize,
    },
}

fn combined_digest(discriminator: &str, entity_name: &str, tenant: Option<&str>, values: &[DomainValue]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(discriminator.as_bytes());
    hasher.update([0u8]);
    hasher.update(entity_name.as_bytes());
    hasher.update([0u8]);
    if let Some(tenant) = tenant {
        hasher.update(tenant.as_bytes());
    }
    hasher.update([0u8]);
    // serde_json gives a stable, cache-portable byte form for the
    // disassembled values.
    let serialized = serde_json::to_vec(values).unwrap_or_default();
    hasher.update(&serialized);
    let digest = hasher.finalize();
    let mut first_eight = [0u8; 8];
    first_eight.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(first_eight)
}

/// Deep, element-wise equality; floats compare by bits so the relation
/// stays reflexive in hashed containers.
fn values_equal(a: &[DomainValue], b: &[DomainValue]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
            (DomainValue::Float(p), DomainValue::Float(q)) => p.to_bits() == q.to_bits(),
            _ => x == y,
        })
}

/// Key for a natural-id-to-identifier resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalIdCacheKey {
    entity_name: String,
    tenant: Option<String>,
    values: Vec<DomainValue>,
    hash_code: u64,
    #[serde(skip)]
    display: OnceLock<String>,
}

impl NaturalIdCacheKey {
    /// Disassemble the natural-id value(s) through the owning entity's
    /// natural-id mapping. A missing mapping is a configuration defect.
    pub fn new(
        model: &DomainModel,
        entity_name: &str,
        tenant: Option<&str>,
        values: &[DomainValue],
    ) -> Result<Self, CacheKeyError> {
        let entity = model
            .entity(entity_name)
            .map_err(|_| CacheKeyError::UnknownEntity(entity_name.to_string()))?;
        let natural_id = entity
            .natural_id
            .as_ref()
            .ok_or_else(|| CacheKeyError::MissingNaturalIdMapping(entity_name.to_string()))?;
        if natural_id.attribute_names.len() != values.len() {
            return Err(CacheKeyError::NaturalIdArityMismatch {
                entity: entity_name.to_string(),
                expected: natural_id.attribute_names.len(),
                found: values.len(),
            });
        }
        let values = values.to_vec();
        let hash_code = combined_digest("natural-id", entity_name, tenant, &values);
        Ok(NaturalIdCacheKey {
            entity_name: entity_name.to_string(),
            tenant: tenant.map(str::to_string),
            values,
            hash_code,
            display: OnceLock::new(),
        })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn values(&self) -> &[DomainValue] {
        &self.values
    }

    pub fn hash_code(&self) -> u64 {
        self.hash_code
    }
}

impl PartialEq for NaturalIdCacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Cheap short-circuit; never a replacement for the full comparison.
        if self.hash_code != other.hash_code {
            return false;
        }
        self.entity_name == other.entity_name
            && self.tenant == other.tenant
            && values_equal(&self.values, &other.values)
    }
}

impl Eq for NaturalIdCacheKey {}

impl Hash for NaturalIdCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for NaturalIdCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.display.get_or_init(|| {
            let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
            format!(
                "{}##NaturalId[{}]{}",
                self.entity_name,
                values.join(", "),
                match &self.tenant {
                    Some(tenant) => format!(" (tenant={})", tenant),
                    None => String::new(),
                }
            )
        });
        f.write_str(rendered)
    }
}

/// Key for a cached entity by primary identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCacheKey {
    entity_name: String,
    tenant: Option<String>,
    id: DomainValue,
    hash_code: u64,
    #[serde(skip)]
    display: OnceLock<String>,
}

impl EntityCacheKey {
    pub fn new(entity_name: &str, tenant: Option<&str>, id: DomainValue) -> Self {
        let hash_code =
            combined_digest("entity", entity_name, tenant, std::slice::from_ref(&id));
        EntityCacheKey {
            entity_name: entity_name.to_string(),
            tenant: tenant.map(str::to_string),
            id,
            hash_code,
            display: OnceLock::new(),
        }
    }

    pub fn hash_code(&self) -> u64 {
        self.hash_code
    }
}

impl PartialEq for EntityCacheKey {
    fn eq(&self, other: &Self) -> bool {
        if self.hash_code != other.hash_code {
            return false;
        }
        self.entity_name == other.entity_name
            && self.tenant == other.tenant
            && values_equal(
                std::slice::from_ref(&self.id),
                std::slice::from_ref(&other.id),
            )
    }
}

impl Eq for EntityCacheKey {}

impl Hash for EntityCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for EntityCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.display.get_or_init(|| {
            format!("{}#{}", self.entity_name, self.id)
        });
        f.write_str(rendered)
    }
}

/// Key for a cached collection, identified by its role (owning entity and
/// attribute) plus the owner's identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCacheKey {
    role: String,
    tenant: Option<String>,
    owner_id: DomainValue,
    hash_code: u64,
    #[serde(skip)]
    display: OnceLock<String>,
}

impl CollectionCacheKey {
    pub fn new(role: &str, tenant: Option<&str>, owner_id: DomainValue) -> Self {
        let hash_code =
            combined_digest("collection", role, tenant, std::slice::from_ref(&owner_id));
        CollectionCacheKey {
            role: role.to_string(),
            tenant: tenant.map(str::to_string),
            owner_id,
            hash_code,
            display: OnceLock::new(),
        }
    }

    pub fn hash_code(&self) -> u64 {
        self.hash_code
    }
}

impl PartialEq for CollectionCacheKey {
    fn eq(&self, other: &Self) -> bool {
        if self.hash_code != other.hash_code {
            return false;
        }
        self.role == other.role
            && self.tenant == other.tenant
            && values_equal(
                std::slice::from_ref(&self.owner_id),
                std::slice::from_ref(&other.owner_id),
            )
    }
}

impl Eq for CollectionCacheKey {}

impl Hash for CollectionCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for CollectionCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.display.get_or_init(|| {
            format!("{}#{}", self.role, self.owner_id)
        });
        f.write_str(rendered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondLevelCacheKey {
    Entity(EntityCacheKey),
    NaturalId(NaturalIdCacheKey),
    Collection(CollectionCacheKey),
}

/// Region-scoped get/put collaborator. The core treats a miss as "fall
/// through to the database" and does not manage eviction or expiry.
pub trait CacheRegionProvider {
    fn get(&self, region: &str, key: &SecondLevelCacheKey) -> Option<serde_json::Value>;
    fn put(&self, region: &str, key: SecondLevelCacheKey, value: serde_json::Value);
}
