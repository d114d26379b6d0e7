//! The base contract shared by every persisted record, and the value maps used to query and
//! write them.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder, postgres::PgRow};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::EntityId;

/// Identity column, assigned by the database on insert
pub const ID_COLUMN: &str = "id";
/// Insert timestamp column, set by the database
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Last-modified timestamp column, set by the database on insert and by every update
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Columns every entity table carries and the database owns.
pub const BASE_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

/// A record type stored in its own table.
///
/// Implementors declare their table and the columns callers may write; the identity and
/// timestamp columns in [`BASE_COLUMNS`] are implied and must not be listed in [`Entity::FIELDS`].
/// Rows are decoded with the type's [`FromRow`] implementation, so `RETURNING *` and
/// `SELECT *` must produce every field.
pub trait Entity: for<'r> FromRow<'r, PgRow> + fmt::Debug + Send + Sync + Unpin + 'static {
    /// Human-readable name used in logs and errors, e.g. `User`
    const NAME: &'static str;
    /// Table the entity lives in
    const TABLE: &'static str;
    /// Writable columns, excluding the base columns
    const FIELDS: &'static [&'static str];

    fn id(&self) -> EntityId;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// A single column value, as used in criteria and change sets.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Append this value to `builder` as a bind parameter (or a literal `NULL`).
    pub(crate) fn push_bind(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            FieldValue::Null => {
                builder.push("NULL");
            }
            FieldValue::Bool(value) => {
                builder.push_bind(*value);
            }
            FieldValue::Int(value) => {
                builder.push_bind(*value);
            }
            FieldValue::Text(value) => {
                builder.push_bind(value.clone());
            }
            FieldValue::Timestamp(value) => {
                builder.push_bind(*value);
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Text(value) => write!(f, "{value:?}"),
            FieldValue::Timestamp(value) => write!(f, "{}", value.to_rfc3339()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Ordered column -> value map shared by [`Criteria`] and [`Changes`].
///
/// A `BTreeMap` keeps generated SQL and log output stable regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Exact-match filter: every entry must equal the row's column value (`Null` matches `IS NULL`).
/// Empty criteria match every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(FieldMap);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an exact-match condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field, value);
        self
    }

    /// Add a condition only when a value is supplied.
    pub fn eq_opt<V: Into<FieldValue>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unset-aware change set: only fields explicitly set are written.
///
/// A field that was never [`set`](Changes::set) is left alone (database default on insert,
/// untouched on update); a field set to [`FieldValue::Null`] is written as `NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes(FieldMap);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field, value);
        self
    }

    /// `None` = leave unset, `Some(v)` = write `v`
    pub fn set_opt<V: Into<FieldValue>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(field, value),
            None => self,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether `name` can be spliced into SQL as a quoted identifier.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
