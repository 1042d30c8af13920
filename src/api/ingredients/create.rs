use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::NewIngredient;
use crate::schema::ingredients;
use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use super::list::IngredientItem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created successfully", body = IngredientItem),
        (status = 400, description = "Invalid request (empty name)", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_ingredient(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Json(request): Json<CreateIngredientRequest>,
) -> impl IntoResponse {
    let name = request.name.trim();

    if name.is_empty() {
        return FieldErrors::single("name", "This field may not be blank.").into_response();
    }

    let mut conn = get_conn!(state);

    let result: Result<(i32, String), _> = diesel::insert_into(ingredients::table)
        .values(NewIngredient {
            user_id: user.id,
            name,
        })
        .returning((ingredients::id, ingredients::name))
        .get_result(&mut conn);

    match result {
        Ok((id, name)) => (StatusCode::CREATED, Json(IngredientItem { id, name })).into_response(),
        Err(e) => {
            tracing::error!("Failed to create ingredient: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}
