use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::NewTag;
use crate::schema::tags;
use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use super::list::TagItem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created successfully", body = TagItem),
        (status = 400, description = "Invalid request (empty name)", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_tag(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Json(request): Json<CreateTagRequest>,
) -> impl IntoResponse {
    let name = request.name.trim();

    if name.is_empty() {
        return FieldErrors::single("name", "This field may not be blank.").into_response();
    }

    let mut conn = get_conn!(state);

    // The owner is always the authenticated caller; the payload carries no
    // owner field. Duplicate (owner, name) pairs are allowed.
    let result: Result<(i32, String), _> = diesel::insert_into(tags::table)
        .values(NewTag {
            user_id: user.id,
            name,
        })
        .returning((tags::id, tags::name))
        .get_result(&mut conn);

    match result {
        Ok((id, name)) => (StatusCode::CREATED, Json(TagItem { id, name })).into_response(),
        Err(e) => {
            tracing::error!("Failed to create tag: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create tag".to_string(),
                }),
            )
                .into_response()
        }
    }
}
