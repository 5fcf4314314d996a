use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A domain-side value, as seen by queries and assembled object graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl DomainValue {
    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainValue::Null => "null",
            DomainValue::Boolean(_) => "boolean",
            DomainValue::Integer(_) => "integer",
            DomainValue::Float(_) => "float",
            DomainValue::String(_) => "string",
            DomainValue::Date(_) => "date",
            DomainValue::Time(_) => "time",
            DomainValue::Timestamp(_) => "timestamp",
            DomainValue::Uuid(_) => "uuid",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DomainValue::Null)
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainValue::Null => f.write_str("null"),
            DomainValue::Boolean(b) => write!(f, "{}", b),
            DomainValue::Integer(i) => write!(f, "{}", i),
            DomainValue::Float(x) => write!(f, "{}", x),
            DomainValue::String(s) => write!(f, "{}", s),
            DomainValue::Date(d) => write!(f, "{}", d),
            DomainValue::Time(t) => write!(f, "{}", t),
            DomainValue::Timestamp(ts) => write!(f, "{}", ts),
            DomainValue::Uuid(u) => write!(f, "{}", u),
        }
    }
}

/// A relational-side value, as bound to statements and read from cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    BigInt(i64),
    Double(f64),
    Varchar(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl SqlValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::BigInt(_) => "bigint",
            SqlValue::Double(_) => "double",
            SqlValue::Varchar(_) => "varchar",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Uuid(_) => "uuid",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}
