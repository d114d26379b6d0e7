//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::models::entity::Entity;
use crate::types::UserId;

/// Longest name the `users.name` column accepts
pub const NAME_MAX_LEN: usize = 100;

/// A row of the `users` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["name", "full_name"];

    fn id(&self) -> UserId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
