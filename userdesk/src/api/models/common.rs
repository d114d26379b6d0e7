use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the service status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "OK")]
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "OK".to_string() }
    }
}
