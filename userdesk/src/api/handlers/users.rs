use crate::{
    AppState,
    api::models::users::{ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    errors::Error,
    types::UserId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use futures::FutureExt;

fn user_not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

// GET /api_v1/users - List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    description = "List all users, optionally filtered by exact name or full name. Ordered by id.",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users (empty when nothing matches)", body = [UserResponse]),
        (status = 503, description = "Database not available"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    let users = state.users;
    let criteria = query.criteria();

    let found = state
        .sessions
        .session_without_commit(|session| async move { users.find_all(session, &criteria).await }.boxed())
        .await?;

    Ok(Json(found.unwrap_or_default().into_iter().map(UserResponse::from).collect()))
}

// GET /api_v1/users/{user_id} - Get specific user
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Get user",
    description = "Get a specific user by ID",
    params(
        ("user_id" = i64, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<Json<UserResponse>, Error> {
    let users = state.users;

    let user = state
        .sessions
        .session_without_commit(|session| async move { users.get_by_id(session, user_id).await }.boxed())
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    Ok(Json(UserResponse::from(user)))
}

// POST /api_v1/users - Create user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Create a new user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Bad request - invalid user data"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(user_data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    user_data.validate()?;
    let users = state.users;
    let changes = user_data.into_changes();

    let user = state
        .sessions
        .session_with_commit(|session| async move { users.create(session, &changes).await }.boxed())
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// PATCH /api_v1/users/{user_id} - Update user
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Update user",
    description = "Update the fields present in the request body. `full_name: null` clears the full name.",
    params(
        ("user_id" = i64, Path, description = "User ID to update"),
    ),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Bad request - invalid user data"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(user_data): Json<UserUpdate>,
) -> Result<Json<UserResponse>, Error> {
    user_data.validate()?;
    let users = state.users;
    let changes = user_data.into_changes();

    let user = state
        .sessions
        .session_with_commit(|session| {
            async move {
                let current = users.get_by_id(session, user_id).await?.ok_or_else(|| user_not_found(user_id))?;
                Ok::<_, Error>(users.update(session, &current, &changes).await?)
            }
            .boxed()
        })
        .await?;

    Ok(Json(UserResponse::from(user)))
}

// DELETE /api_v1/users/{user_id} - Delete user
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Delete user",
    description = "Delete a user",
    params(
        ("user_id" = i64, Path, description = "User ID to delete"),
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn delete_user(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<StatusCode, Error> {
    let users = state.users;

    state
        .sessions
        .session_with_commit(|session| {
            async move {
                let current = users.get_by_id(session, user_id).await?.ok_or_else(|| user_not_found(user_id))?;
                // A concurrent delete between the lookup and here still ends in "gone"
                users.delete(session, &current).await?;
                Ok::<_, Error>(())
            }
            .boxed()
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
