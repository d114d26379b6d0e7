//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │  session_with_commit / session_without_commit
//!        ↓
//! ┌─────────────┐
//! │  Sessions   │  (db::session - pool ownership, scoped transactions)
//! └──────┬──────┘
//!        │  &mut Session
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - generic CRUD over any entity)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`session`]: the [`SessionManager`](session::SessionManager) owning the pool, and
//!   [`Session`](session::Session)
//! - [`handlers`]: the generic [`Repository`](handlers::Repository) and per-table aliases
//! - [`models`]: the entity contract and database record structures
//! - [`errors`]: database-specific error types
//!
//! # Transactions
//!
//! A session begins a transaction on its first statement. Repository writes commit that
//! transaction before returning; reads leave it open, and the session manager commits or rolls
//! it back when the scoped closure finishes.
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! userdesk::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod session;
