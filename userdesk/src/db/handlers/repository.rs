//! Generic repository over any [`Entity`].
//!
//! A repository is the data access layer for one postgres table. It is stateless: every operation
//! borrows the caller's [`Session`] and runs on that session's transaction. Writes (`create`,
//! `update`, `delete`) commit the session's transaction before returning, so their effects are
//! durable as soon as the call succeeds.
//!
//! Queries are assembled at runtime from the entity's declared table and columns. Column names
//! are validated once, when the repository is constructed, and every value is sent as a bind
//! parameter.

use sqlx::{FromRow, Postgres, QueryBuilder, Row, postgres::PgRow};
use std::{collections::HashSet, fmt, marker::PhantomData};
use tracing::{debug, instrument};

use crate::{
    db::{
        errors::{DbError, Result},
        models::entity::{
            BASE_COLUMNS, Changes, Criteria, Entity, FieldMap, ID_COLUMN, UPDATED_AT_COLUMN, is_valid_identifier,
        },
        session::Session,
    },
    types::{EntityId, abbrev_uuid},
};

/// CRUD access to the table behind `E`.
pub struct Repository<E: Entity> {
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Entity> Copy for Repository<E> {}

impl<E: Entity> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository").field("entity", &E::NAME).field("table", &E::TABLE).finish()
    }
}

impl<E: Entity> Repository<E> {
    /// Bind a repository to `E`, checking the entity's table and column declarations.
    pub fn new() -> Result<Self> {
        validate_binding::<E>()?;
        Ok(Self { _entity: PhantomData })
    }

    /// Fetch one entity by identity. Absence is `Ok(None)`.
    #[instrument(skip(self, session), fields(table = E::TABLE, session = %abbrev_uuid(&session.id())), err)]
    pub async fn get_by_id(&self, session: &mut Session, id: EntityId) -> Result<Option<E>> {
        let criteria = Criteria::new().eq(ID_COLUMN, id);
        let mut query = select_query::<E>(&criteria, true);

        let rows = query
            .build()
            .fetch_all(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "get", format!("id={id}"), e))?;

        let entity = decode_rows::<E>(rows, "get", || format!("id={id}"))?.into_iter().next();
        debug!(found = entity.is_some(), "Looked up by id");
        Ok(entity)
    }

    /// First entity matching `criteria`, lowest identity first.
    #[instrument(skip(self, session, criteria), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), criteria = %criteria), err)]
    pub async fn find_one(&self, session: &mut Session, criteria: &Criteria) -> Result<Option<E>> {
        check_criteria::<E>(criteria)?;
        let mut query = select_query::<E>(criteria, true);

        let rows = query
            .build()
            .fetch_all(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "find", criteria.to_string(), e))?;

        Ok(decode_rows::<E>(rows, "find", || criteria.to_string())?.into_iter().next())
    }

    /// All entities matching `criteria`, ordered by identity. `Ok(None)` when nothing matches.
    #[instrument(skip(self, session, criteria), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), criteria = %criteria), err)]
    pub async fn find_all(&self, session: &mut Session, criteria: &Criteria) -> Result<Option<Vec<E>>> {
        check_criteria::<E>(criteria)?;
        let mut query = select_query::<E>(criteria, false);

        let rows = query
            .build()
            .fetch_all(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "list", criteria.to_string(), e))?;

        let entities = decode_rows::<E>(rows, "list", || criteria.to_string())?;
        debug!(count = entities.len(), "Listed");
        Ok((!entities.is_empty()).then_some(entities))
    }

    /// Number of entities matching `criteria`.
    #[instrument(skip(self, session, criteria), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), criteria = %criteria), err)]
    pub async fn count(&self, session: &mut Session, criteria: &Criteria) -> Result<i64> {
        check_criteria::<E>(criteria)?;
        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", quote(E::TABLE)));
        push_where(&mut query, criteria);

        let row = query
            .build()
            .fetch_one(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "count", criteria.to_string(), e))?;

        row.try_get::<i64, _>(0)
            .map_err(|e| DbError::query(E::NAME, "count", criteria.to_string(), e))
    }

    /// Insert a new entity from the provided fields and commit.
    ///
    /// Fields left out of `changes` take their database defaults.
    #[instrument(skip(self, session, changes), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), changes = %changes), err)]
    pub async fn create(&self, session: &mut Session, changes: &Changes) -> Result<E> {
        check_changes::<E>(changes)?;
        let mut query = insert_query::<E>(changes);

        let row = query
            .build()
            .fetch_one(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "create", changes.to_string(), e))?;
        let entity = decode_row::<E>(&row, "create", || changes.to_string())?;

        session.commit().await?;
        debug!(id = entity.id(), "Created");
        Ok(entity)
    }

    /// Apply the fields present in `changes` to `entity`'s row, commit, and return the stored row.
    ///
    /// An empty change set writes nothing and returns the current row. A row that no longer
    /// exists fails with the driver's `RowNotFound` as source.
    #[instrument(skip(self, session, entity, changes), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), id = entity.id(), changes = %changes), err)]
    pub async fn update(&self, session: &mut Session, entity: &E, changes: &Changes) -> Result<E> {
        check_changes::<E>(changes)?;
        let id = entity.id();

        if changes.is_empty() {
            debug!("No changes to apply, re-reading current row");
            return self
                .get_by_id(session, id)
                .await?
                .ok_or_else(|| DbError::query(E::NAME, "update", format!("id={id}"), sqlx::Error::RowNotFound));
        }

        let mut query = update_query::<E>(id, changes);
        let row = query
            .build()
            .fetch_one(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "update", format!("id={id}"), e))?;
        let updated = decode_row::<E>(&row, "update", || format!("id={id}"))?;

        session.commit().await?;
        debug!("Updated");
        Ok(updated)
    }

    /// Delete `entity`'s row and commit. Returns whether a row was removed.
    #[instrument(skip(self, session, entity), fields(table = E::TABLE, session = %abbrev_uuid(&session.id()), id = entity.id()), err)]
    pub async fn delete(&self, session: &mut Session, entity: &E) -> Result<bool> {
        let id = entity.id();
        let mut query = QueryBuilder::new(format!("DELETE FROM {} WHERE {} = ", quote(E::TABLE), quote(ID_COLUMN)));
        query.push_bind(id);

        let result = query
            .build()
            .execute(session.connection().await?)
            .await
            .map_err(|e| DbError::query(E::NAME, "delete", format!("id={id}"), e))?;

        session.commit().await?;
        let deleted = result.rows_affected() > 0;
        debug!(deleted, "Deleted");
        Ok(deleted)
    }
}

fn validate_binding<E: Entity>() -> Result<()> {
    let invalid = |reason: String| DbError::Configuration {
        entity: E::NAME.to_string(),
        reason,
    };

    if E::TABLE.is_empty() {
        return Err(invalid("table name is empty".to_string()));
    }
    if !is_valid_identifier(E::TABLE) {
        return Err(invalid(format!("'{}' is not a valid table name", E::TABLE)));
    }

    let mut seen = HashSet::new();
    for field in E::FIELDS {
        if !is_valid_identifier(field) {
            return Err(invalid(format!("'{field}' is not a valid column name")));
        }
        if BASE_COLUMNS.contains(field) {
            return Err(invalid(format!("'{field}' is a base column and must not be declared")));
        }
        if !seen.insert(*field) {
            return Err(invalid(format!("column '{field}' is declared twice")));
        }
    }
    Ok(())
}

fn check_criteria<E: Entity>(criteria: &Criteria) -> Result<()> {
    for (field, _) in criteria.fields().iter() {
        if !BASE_COLUMNS.contains(&field) && !E::FIELDS.contains(&field) {
            return Err(DbError::UnknownField {
                entity: E::NAME,
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

fn check_changes<E: Entity>(changes: &Changes) -> Result<()> {
    for (field, _) in changes.fields().iter() {
        if BASE_COLUMNS.contains(&field) {
            return Err(DbError::ReadOnlyField {
                entity: E::NAME,
                field: field.to_string(),
            });
        }
        if !E::FIELDS.contains(&field) {
            return Err(DbError::UnknownField {
                entity: E::NAME,
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn push_where(query: &mut QueryBuilder<'_, Postgres>, criteria: &Criteria) {
    for (i, (field, value)) in criteria.fields().iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        query.push(quote(field));
        if value.is_null() {
            query.push(" IS NULL");
        } else {
            query.push(" = ");
            value.push_bind(query);
        }
    }
}

fn push_assignments(query: &mut QueryBuilder<'_, Postgres>, fields: &FieldMap) {
    for (i, (field, value)) in fields.iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push(quote(field));
        query.push(" = ");
        value.push_bind(query);
    }
}

fn select_query<E: Entity>(criteria: &Criteria, first_only: bool) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT * FROM {}", quote(E::TABLE)));
    push_where(&mut query, criteria);
    query.push(format!(" ORDER BY {}", quote(ID_COLUMN)));
    if first_only {
        query.push(" LIMIT 1");
    }
    query
}

fn insert_query<E: Entity>(changes: &Changes) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("INSERT INTO {}", quote(E::TABLE)));
    if changes.is_empty() {
        query.push(" DEFAULT VALUES");
    } else {
        let columns: Vec<String> = changes.fields().iter().map(|(field, _)| quote(field)).collect();
        query.push(format!(" ({}) VALUES (", columns.join(", ")));
        for (i, (_, value)) in changes.fields().iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            value.push_bind(&mut query);
        }
        query.push(")");
    }
    query.push(" RETURNING *");
    query
}

fn update_query<E: Entity>(id: EntityId, changes: &Changes) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("UPDATE {} SET ", quote(E::TABLE)));
    push_assignments(&mut query, changes.fields());
    // now() is frozen at transaction start, so use wall-clock time
    query.push(format!(", {} = clock_timestamp()", quote(UPDATED_AT_COLUMN)));
    query.push(format!(" WHERE {} = ", quote(ID_COLUMN)));
    query.push_bind(id);
    query.push(" RETURNING *");
    query
}

fn decode_row<E: Entity>(row: &PgRow, operation: &'static str, key: impl Fn() -> String) -> Result<E> {
    E::from_row(row).map_err(|e| DbError::query(E::NAME, operation, key(), e))
}

fn decode_rows<E: Entity>(rows: Vec<PgRow>, operation: &'static str, key: impl Fn() -> String) -> Result<Vec<E>> {
    rows.iter().map(|row| decode_row::<E>(row, operation, &key)).collect()
}
