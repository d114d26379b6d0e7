//! Database record models matching table schemas.
//!
//! - [`entity`]: the [`Entity`](entity::Entity) contract every table model implements (identity,
//!   creation and modification timestamps), plus the [`Criteria`](entity::Criteria) and
//!   [`Changes`](entity::Changes) maps repositories accept
//! - [`users`]: user records
//!
//! Database models are kept apart from the API models in [`crate::api::models`] so storage and
//! wire representations can evolve independently; conversions live on the API side.

pub mod entity;
pub mod users;
