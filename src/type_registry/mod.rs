//! Bidirectional bridge between domain-side value types and relational
//! column types: per-type descriptors supplying wrap/unwrap conversions,
//! comparison semantics, and mutability plans.
//!
//! Descriptors are stateless policies, so they live as process-wide
//! singletons built once at startup and shared by reference.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub mod errors;
pub mod value;

pub use errors::TypeRegistryError;
pub use value::{DomainValue, SqlValue};

/// Identifier of a basic (scalar) domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicTypeId {
    Boolean,
    Integer,
    Float,
    String,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl BasicTypeId {
    pub fn name(&self) -> &'static str {
        match self {
            BasicTypeId::Boolean => "boolean",
            BasicTypeId::Integer => "integer",
            BasicTypeId::Float => "float",
            BasicTypeId::String => "string",
            BasicTypeId::Date => "date",
            BasicTypeId::Time => "time",
            BasicTypeId::Timestamp => "timestamp",
            BasicTypeId::Uuid => "uuid",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, BasicTypeId::Integer | BasicTypeId::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            BasicTypeId::Date | BasicTypeId::Time | BasicTypeId::Timestamp
        )
    }
}

/// Relational column type a basic domain type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlColumnType {
    Boolean,
    BigInt,
    Double,
    Varchar,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl SqlColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            SqlColumnType::Boolean => "boolean",
            SqlColumnType::BigInt => "bigint",
            SqlColumnType::Double => "double",
            SqlColumnType::Varchar => "varchar",
            SqlColumnType::Date => "date",
            SqlColumnType::Time => "time",
            SqlColumnType::Timestamp => "timestamp",
            SqlColumnType::Uuid => "uuid",
        }
    }
}

/// Whether assembled values of a type can be mutated in place (and so must
/// participate in dirty-checking) or are shared freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutabilityPlan {
    Immutable,
    Mutable,
}

/// Conversion and comparison policy for one basic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_id: BasicTypeId,
    pub sql_type: SqlColumnType,
    pub mutability: MutabilityPlan,
}

impl TypeDescriptor {
    /// Adapt a domain value to this descriptor's relational representation.
    /// A value of the wrong kind is an unknown-unwrap mapping defect.
    pub fn unwrap(&self, value: &DomainValue) -> Result<SqlValue, TypeRegistryError> {
        let unwrapped = match (self.type_id, value) {
            (_, DomainValue::Null) => Some(SqlValue::Null),
            (BasicTypeId::Boolean, DomainValue::Boolean(b)) => Some(SqlValue::Boolean(*b)),
            (BasicTypeId::Integer, DomainValue::Integer(i)) => Some(SqlValue::BigInt(*i)),
            (BasicTypeId::Float, DomainValue::Float(x)) => Some(SqlValue::Double(*x)),
            (BasicTypeId::Float, DomainValue::Integer(i)) => Some(SqlValue::Double(*i as f64)),
            (BasicTypeId::String, DomainValue::String(s)) => Some(SqlValue::Varchar(s.clone())),
            (BasicTypeId::Date, DomainValue::Date(d)) => Some(SqlValue::Date(*d)),
            (BasicTypeId::Time, DomainValue::Time(t)) => Some(SqlValue::Time(*t)),
            (BasicTypeId::Timestamp, DomainValue::Timestamp(ts)) => Some(SqlValue::Timestamp(*ts)),
            (BasicTypeId::Uuid, DomainValue::Uuid(u)) => Some(SqlValue::Uuid(*u)),
            _ => None,
        };
        unwrapped.ok_or_else(|| TypeRegistryError::UnknownUnwrap {
            actual: value.kind().to_string(),
            requested: self.sql_type.name().to_string(),
        })
    }

    /// Adapt a relational value back to this descriptor's domain
    /// representation. A value of the wrong kind is an unknown-wrap defect.
    pub fn wrap(&self, value: &SqlValue) -> Result<DomainValue, TypeRegistryError> {
        let wrapped = match (self.type_id, value) {
            (_, SqlValue::Null) => Some(DomainValue::Null),
            (BasicTypeId::Boolean, SqlValue::Boolean(b)) => Some(DomainValue::Boolean(*b)),
            (BasicTypeId::Integer, SqlValue::BigInt(i)) => Some(DomainValue::Integer(*i)),
            (BasicTypeId::Float, SqlValue::Double(x)) => Some(DomainValue::Float(*x)),
            (BasicTypeId::Float, SqlValue::BigInt(i)) => Some(DomainValue::Float(*i as f64)),
            (BasicTypeId::String, SqlValue::Varchar(s)) => Some(DomainValue::String(s.clone())),
            (BasicTypeId::Date, SqlValue::Date(d)) => Some(DomainValue::Date(*d)),
            (BasicTypeId::Time, SqlValue::Time(t)) => Some(DomainValue::Time(*t)),
            (BasicTypeId::Timestamp, SqlValue::Timestamp(ts)) => Some(DomainValue::Timestamp(*ts)),
            (BasicTypeId::Uuid, SqlValue::Uuid(u)) => Some(DomainValue::Uuid(*u)),
            _ => None,
        };
        wrapped.ok_or_else(|| TypeRegistryError::UnknownWrap {
            actual: value.kind().to_string(),
            requested: self.type_id.name().to_string(),
        })
    }

    /// Deep value equality under this descriptor. Floats compare by bits so
    /// the relation stays reflexive for cache keys.
    pub fn are_equal(&self, a: &DomainValue, b: &DomainValue) -> bool {
        match (a, b) {
            (DomainValue::Float(x), DomainValue::Float(y)) => x.to_bits() == y.to_bits(),
            _ => a == b,
        }
    }
}

lazy_static! {
    static ref DESCRIPTORS: HashMap<BasicTypeId, TypeDescriptor> = {
        let mut m = HashMap::new();
        let mut register = |type_id, sql_type| {
            m.insert(
                type_id,
                TypeDescriptor {
                    type_id,
                    sql_type,
                    mutability: MutabilityPlan::Immutable,
                },
            );
        };
        register(BasicTypeId::Boolean, SqlColumnType::Boolean);
        register(BasicTypeId::Integer, SqlColumnType::BigInt);
        register(BasicTypeId::Float, SqlColumnType::Double);
        register(BasicTypeId::String, SqlColumnType::Varchar);
        register(BasicTypeId::Date, SqlColumnType::Date);
        register(BasicTypeId::Time, SqlColumnType::Time);
        register(BasicTypeId::Timestamp, SqlColumnType::Timestamp);
        register(BasicTypeId::Uuid, SqlColumnType::Uuid);
        m
    };
}

/// Look up the process-wide descriptor for a basic type.
pub fn descriptor(type_id: BasicTypeId) -> &'static TypeDescriptor {
    // Every BasicTypeId variant is registered above.
    DESCRIPTORS
        .get(&type_id)
        .unwrap_or_else(|| panic!("no descriptor for {}", type_id.name()))
}

/// Disassemble a domain value into its natural relational representation,
/// without a declared target type (used for parameter binding where the
/// value itself carries the type).
pub fn disassemble(value: &DomainValue) -> SqlValue {
    match value {
        DomainValue::Null => SqlValue::Null,
        DomainValue::Boolean(b) => SqlValue::Boolean(*b),
        DomainValue::Integer(i) => SqlValue::BigInt(*i),
        DomainValue::Float(x) => SqlValue::Double(*x),
        DomainValue::String(s) => SqlValue::Varchar(s.clone()),
        DomainValue::Date(d) => SqlValue::Date(*d),
        DomainValue::Time(t) => SqlValue::Time(*t),
        DomainValue::Timestamp(ts) => SqlValue::Timestamp(*ts),
        DomainValue::Uuid(u) => SqlValue::Uuid(*u),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_and_wrap_round_trip() {
        let d = descriptor(BasicTypeId::String);
        let sql = d.unwrap(&DomainValue::String("alice".into())).unwrap();
        assert_eq!(sql, SqlValue::Varchar("alice".into()));
        assert_eq!(d.wrap(&sql).unwrap(), DomainValue::String("alice".into()));
    }

    #[test]
    fn test_unknown_unwrap_is_a_mapping_defect() {
        let d = descriptor(BasicTypeId::Integer);
        let err = d.unwrap(&DomainValue::String("oops".into())).unwrap_err();
        assert_eq!(
            err,
            TypeRegistryError::UnknownUnwrap {
                actual: "string".to_string(),
                requested: "bigint".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_wrap_is_a_mapping_defect() {
        let d = descriptor(BasicTypeId::Date);
        let err = d.wrap(&SqlValue::BigInt(42)).unwrap_err();
        assert!(matches!(err, TypeRegistryError::UnknownWrap { .. }));
    }

    #[test]
    fn test_null_passes_through_every_descriptor() {
        for type_id in [
            BasicTypeId::Boolean,
            BasicTypeId::Integer,
            BasicTypeId::Float,
            BasicTypeId::String,
            BasicTypeId::Date,
            BasicTypeId::Time,
            BasicTypeId::Timestamp,
            BasicTypeId::Uuid,
        ] {
            let d = descriptor(type_id);
            assert_eq!(d.unwrap(&DomainValue::Null).unwrap(), SqlValue::Null);
            assert_eq!(d.wrap(&SqlValue::Null).unwrap(), DomainValue::Null);
        }
    }

    #[test]
    fn test_integer_widens_to_float() {
        let d = descriptor(BasicTypeId::Float);
        assert_eq!(
            d.unwrap(&DomainValue::Integer(3)).unwrap(),
            SqlValue::Double(3.0)
        );
    }
}
