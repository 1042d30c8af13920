use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::{NewRecipe, Recipe};
use crate::schema::recipes;
use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{check_ingredient_ids, check_tag_ids, insert_associations, validate_fields, RecipeSummary};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeSummary),
        (status = 400, description = "Invalid request", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let mut errors = FieldErrors::default();
    validate_fields(
        Some(&request.title),
        Some(request.time_minutes),
        Some(request.price),
        &mut errors,
    );
    if !errors.is_empty() {
        return errors.into_response();
    }

    let mut conn = get_conn!(state);

    // Submitted tag/ingredient ids must exist and belong to the caller
    let tags_checked = check_tag_ids(&mut conn, user.id, &request.tags, &mut errors);
    let ingredients_checked =
        check_ingredient_ids(&mut conn, user.id, &request.ingredients, &mut errors);
    if let Err(e) = tags_checked.and(ingredients_checked) {
        tracing::error!("Failed to validate recipe associations: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to create recipe".to_string(),
            }),
        )
            .into_response();
    }
    if !errors.is_empty() {
        return errors.into_response();
    }

    // Create recipe + association rows atomically. The owner is always the
    // authenticated caller.
    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                user_id: user.id,
                title: request.title.trim(),
                time_minutes: request.time_minutes,
                price: request.price,
                link: request.link.as_deref(),
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        insert_associations(conn, recipe.id, &request.tags, &request.ingredients)?;

        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match super::summarize(&mut conn, &recipe) {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load created recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
