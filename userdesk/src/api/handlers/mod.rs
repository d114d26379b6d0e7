//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Running its database work inside one session from [`crate::db::session::SessionManager`]
//! - Response serialization
//!
//! Errors are returned as [`crate::errors::Error`], which maps them to status codes.
//!
//! # Handler Modules
//!
//! - [`common`]: Service status at `/`
//! - [`users`]: User CRUD operations under `/api_v1/users`

pub mod common;
pub mod users;
