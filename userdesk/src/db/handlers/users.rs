//! Database repository for users.

use crate::db::{handlers::repository::Repository, models::users::User};

/// Repository for the `users` table
pub type Users = Repository<User>;
