//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Status** (`/`, `/healthz`): Liveness, no database access
//! - **Users** (`/api_v1/users/*`): User listing, creation, retrieval, partial update and deletion
//!
//! # OpenAPI Documentation
//!
//! Endpoints are documented with `utoipa` annotations. The rendered documentation is served at
//! `/docs` and the raw document at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
