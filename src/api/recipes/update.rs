use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::recipes;
use crate::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{
    check_ingredient_ids, check_tag_ids, replace_associations, validate_fields, RecipeSummary,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReplaceRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    /// Association sets are replaced wholesale; an absent field clears them
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PatchRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    /// When present, replaces the association set exactly; absent leaves it unchanged
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
struct RecipeChanges<'a> {
    title: Option<&'a str>,
    time_minutes: Option<i32>,
    price: Option<f64>,
    link: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

/// Fetch the recipe owner-scoped, or produce the 404/500 response.
fn fetch_owned_recipe(
    conn: &mut PgConnection,
    recipe_id: i32,
    owner_id: i32,
) -> Result<Recipe, axum::response::Response> {
    match recipes::table
        .filter(recipes::id.eq(recipe_id))
        .filter(recipes::user_id.eq(owner_id))
        .select(Recipe::as_select())
        .first(conn)
    {
        Ok(r) => Ok(r),
        Err(diesel::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response())
        }
    }
}

fn internal_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = ReplaceRecipeRequest,
    responses(
        (status = 200, description = "Recipe replaced", body = RecipeSummary),
        (status = 400, description = "Invalid request", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_recipe(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    Json(request): Json<ReplaceRecipeRequest>,
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

    let recipe = match fetch_owned_recipe(&mut conn, id, user.id) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let tags_checked = check_tag_ids(&mut conn, user.id, &request.tags, &mut errors);
    let ingredients_checked =
        check_ingredient_ids(&mut conn, user.id, &request.ingredients, &mut errors);
    if let Err(e) = tags_checked.and(ingredients_checked) {
        tracing::error!("Failed to validate recipe associations: {}", e);
        return internal_error("Failed to update recipe");
    }
    if !errors.is_empty() {
        return errors.into_response();
    }

    // Full replacement: every plain field is written, association sets are
    // replaced with exactly the submitted ids (absent fields were defaulted
    // to empty, clearing the links).
    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let updated: Recipe = diesel::update(recipes::table.find(recipe.id))
            .set((
                recipes::title.eq(request.title.trim()),
                recipes::time_minutes.eq(request.time_minutes),
                recipes::price.eq(request.price),
                recipes::link.eq(request.link.as_deref()),
                recipes::updated_at.eq(Utc::now()),
            ))
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        replace_associations(conn, updated.id, &request.tags, &request.ingredients)?;

        Ok(updated)
    });

    let updated = match result {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            return internal_error("Failed to update recipe");
        }
    };

    match super::summarize(&mut conn, &updated) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load updated recipe: {}", e);
            internal_error("Failed to update recipe")
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = PatchRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeSummary),
        (status = 400, description = "Invalid request", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_recipe(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    Json(request): Json<PatchRecipeRequest>,
) -> impl IntoResponse {
    let mut errors = FieldErrors::default();
    validate_fields(
        request.title.as_deref(),
        request.time_minutes,
        request.price,
        &mut errors,
    );
    if !errors.is_empty() {
        return errors.into_response();
    }

    let mut conn = get_conn!(state);

    let recipe = match fetch_owned_recipe(&mut conn, id, user.id) {
        Ok(r) => r,
        Err(response) => return response,
    };

    if let Some(ref tag_ids) = request.tags {
        if check_tag_ids(&mut conn, user.id, tag_ids, &mut errors).is_err() {
            return internal_error("Failed to update recipe");
        }
    }
    if let Some(ref ingredient_ids) = request.ingredients {
        if check_ingredient_ids(&mut conn, user.id, ingredient_ids, &mut errors).is_err() {
            return internal_error("Failed to update recipe");
        }
    }
    if !errors.is_empty() {
        return errors.into_response();
    }

    // Only submitted fields change; a submitted association set replaces the
    // previous one exactly, including removing links not resubmitted.
    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let updated: Recipe = diesel::update(recipes::table.find(recipe.id))
            .set(&RecipeChanges {
                title: request.title.as_deref().map(str::trim),
                time_minutes: request.time_minutes,
                price: request.price,
                link: request.link.as_deref(),
                updated_at: Utc::now(),
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        if let Some(ref tag_ids) = request.tags {
            let (_, current_ingredients) = super::load_association_ids(conn, updated.id)?;
            let ingredient_ids = request
                .ingredients
                .clone()
                .unwrap_or(current_ingredients);
            replace_associations(conn, updated.id, tag_ids, &ingredient_ids)?;
        } else if let Some(ref ingredient_ids) = request.ingredients {
            let (current_tags, _) = super::load_association_ids(conn, updated.id)?;
            replace_associations(conn, updated.id, &current_tags, ingredient_ids)?;
        }

        Ok(updated)
    });

    let updated = match result {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            return internal_error("Failed to update recipe");
        }
    };

    match super::summarize(&mut conn, &updated) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load updated recipe: {}", e);
            internal_error("Failed to update recipe")
        }
    }
}
