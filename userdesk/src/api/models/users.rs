//! API request/response models for users.

use crate::db::models::entity::{Changes, Criteria};
use crate::db::models::users::{NAME_MAX_LEN, User};
use crate::errors::Error;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    /// Short user name, 1 to 100 characters
    #[schema(min_length = 1, max_length = 100, example = "alice")]
    pub name: String,
    #[schema(example = "Alice Liddell")]
    pub full_name: String,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)
    }

    pub fn into_changes(self) -> Changes {
        Changes::new().set("name", self.name).set("full_name", self.full_name)
    }
}

/// Partial update. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    /// New name (None = no change). Cannot be cleared.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>, min_length = 1, max_length = 100)]
    pub name: Option<Option<String>>,
    /// Full name (None = no change, Some(None) = clear, Some(text) = set)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub full_name: Option<Option<String>>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        match &self.name {
            None => Ok(()),
            Some(None) => Err(Error::BadRequest {
                message: "name cannot be null".to_string(),
            }),
            Some(Some(name)) => validate_name(name),
        }
    }

    /// Only the fields present in the request end up in the change set.
    pub fn into_changes(self) -> Changes {
        Changes::new()
            .set_opt("name", self.name)
            .set_opt("full_name", self.full_name)
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    let len = name.chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(Error::BadRequest {
            message: format!("name must be between 1 and {NAME_MAX_LEN} characters"),
        });
    }
    Ok(())
}

// User response models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            full_name: user.full_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Only users with exactly this name
    pub name: Option<String>,
    /// Only users with exactly this full name
    pub full_name: Option<String>,
}

impl ListUsersQuery {
    pub fn criteria(&self) -> Criteria {
        Criteria::new()
            .eq_opt("name", self.name.clone())
            .eq_opt("full_name", self.full_name.clone())
    }
}
