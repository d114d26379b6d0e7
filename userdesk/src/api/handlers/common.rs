use axum::response::Json;

use crate::api::models::common::StatusResponse;

// GET / - Service status
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service status",
    description = "Reports that the service is up. Does not touch the database.",
    responses(
        (status = 200, description = "Service is running", body = StatusResponse),
    )
)]
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
