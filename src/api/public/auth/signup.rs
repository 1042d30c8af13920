use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::create_session;
use crate::get_conn;
use crate::users::{self, CreateUserError};
use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct SignupResponse {
    pub user_id: i32,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({"email": "user@example.com", "password": "password", "name": "User"})),
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = FieldErrors)
    )
)]
pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    if req.password.is_empty() {
        return FieldErrors::single("password", "This field may not be blank.").into_response();
    }

    let mut conn = get_conn!(state);

    let user = match users::create_user(&mut conn, &req.email, &req.password, &req.name) {
        Ok(u) => u,
        Err(CreateUserError::EmptyEmail) => {
            return FieldErrors::single("email", "This field may not be blank.").into_response()
        }
        Err(CreateUserError::DuplicateEmail) => {
            return FieldErrors::single("email", "A user with that email already exists.")
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create user: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let token = match create_session(&mut conn, user.id) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to create session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create session".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    )
        .into_response()
}
