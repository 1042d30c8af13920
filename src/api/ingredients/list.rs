use crate::api::{filters, ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients};
use crate::SharedState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// "1" restricts to ingredients used by at least one recipe; "0" returns all
    pub assigned_only: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListIngredientsResponse {
    pub ingredients: Vec<IngredientItem>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "The caller's ingredients, ordered by name descending", body = ListIngredientsResponse),
        (status = 400, description = "Invalid filter value", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_ingredients(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListIngredientsParams>,
) -> impl IntoResponse {
    let assigned_only = match params.assigned_only.as_deref() {
        None => false,
        Some(raw) => match filters::parse_assigned_only(raw) {
            Ok(v) => v,
            Err(e) => return FieldErrors::single("assigned_only", &e).into_response(),
        },
    };

    let mut conn = get_conn!(state);

    let mut query = ingredients::table
        .filter(ingredients::user_id.eq(user.id))
        .into_boxed();

    if assigned_only {
        query = query.filter(
            ingredients::id.eq_any(recipe_ingredients::table.select(recipe_ingredients::ingredient_id)),
        );
    }

    let rows: Vec<(i32, String)> = match query
        .order(ingredients::name.desc())
        .select((ingredients::id, ingredients::name))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredients".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = ListIngredientsResponse {
        ingredients: rows
            .into_iter()
            .map(|(id, name)| IngredientItem { id, name })
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
