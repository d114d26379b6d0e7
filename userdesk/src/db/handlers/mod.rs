//! Repository implementations for database access.
//!
//! [`Repository`] is generic over any [`Entity`](crate::db::models::entity::Entity); each table
//! gets a type alias here rather than a hand-written repository.
//!
//! # Available Repositories
//!
//! - [`Users`]: user records
//!
//! # Common Pattern
//!
//! Repositories never own a connection. Every operation borrows a
//! [`Session`](crate::db::session::Session) from the session manager:
//!
//! ```ignore
//! use futures::FutureExt;
//! use userdesk::db::{handlers::Users, models::entity::Changes};
//!
//! let users = Users::new()?;
//! let user = sessions
//!     .session_with_commit(|session| {
//!         async move { users.create(session, &Changes::new().set("name", "alice")).await }.boxed()
//!     })
//!     .await?;
//! ```

pub mod repository;
pub mod users;

pub use repository::Repository;
pub use users::Users;
