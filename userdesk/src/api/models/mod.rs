//! API request and response data models.
//!
//! These models define the public API contract and are kept separate from the database
//! models in [`crate::db::models`]. Request models turn themselves into repository
//! [`Changes`](crate::db::models::entity::Changes) or
//! [`Criteria`](crate::db::models::entity::Criteria); response models are built from entities.
//!
//! - [`common`]: Service status
//! - [`users`]: User creation/update requests, listing filters and responses

pub mod common;
pub mod users;
