use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::{hash_password, AuthUser};
use crate::get_conn;
use crate::schema::users;
use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
struct ProfileChanges<'a> {
    name: Option<&'a str>,
    password_hash: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(ProfileResponse {
        id: user.id,
        email: user.email,
        name: user.name,
    })
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_me(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Json(request): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    if let Some(ref password) = request.password {
        if password.is_empty() {
            return FieldErrors::single("password", "This field may not be blank.")
                .into_response();
        }
    }

    let password_hash = match request.password.as_deref().map(hash_password) {
        None => None,
        Some(Ok(hash)) => Some(hash),
        Some(Err(_)) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to hash password".to_string(),
                }),
            )
                .into_response()
        }
    };

    let mut conn = get_conn!(state);

    let result: Result<(i32, String, String), _> = diesel::update(users::table.find(user.id))
        .set(&ProfileChanges {
            name: request.name.as_deref(),
            password_hash: password_hash.as_deref(),
            updated_at: Utc::now(),
        })
        .returning((users::id, users::email, users::name))
        .get_result(&mut conn);

    match result {
        Ok((id, email, name)) => {
            (StatusCode::OK, Json(ProfileResponse { id, email, name })).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to update profile: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update profile".to_string(),
                }),
            )
                .into_response()
        }
    }
}
