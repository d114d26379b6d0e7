//! OpenAPI documentation for the HTTP API.
//!
//! The document is served as JSON at `/api-docs/openapi.json` and rendered with RapiDoc at
//! `/docs`. Title, description and version come from the `app` section of the configuration,
//! see [`api_doc`].

use utoipa::OpenApi;

use crate::api;
use crate::config::AppInfo;

/// User resource endpoints, mounted under `/api_v1`.
#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::create_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
    ),
    components(schemas(
        api::models::users::UserCreate,
        api::models::users::UserUpdate,
        api::models::users::UserResponse,
    ))
)]
struct UsersApi;

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::common::root),
    components(schemas(api::models::common::StatusResponse)),
    nest((path = "/api_v1", api = UsersApi)),
    tags(
        (name = "users", description = "User management"),
        (name = "health", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// The generated document with its `info` block taken from configuration.
pub fn api_doc(app: &AppInfo) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = app.title.clone();
    doc.info.version = app.version.clone();
    doc.info.description = (!app.description.is_empty()).then(|| app.description.clone());
    doc
}
