use crate::access::{self, Action, Resource};
use crate::api::ErrorResponse;
use crate::auth::OptionalAuthUser;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use crate::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::ingredients::list::IngredientItem;
use crate::api::tags::list::TagItem;

/// Detail wire shape: related tags and ingredients embedded as full objects.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<IngredientItem>,
    pub tags: Vec<TagItem>,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    pub image: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetail),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    OptionalAuthUser(caller): OptionalAuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    if let Err(e) = access::resolve_caller(Resource::Recipes, Action::Retrieve, caller) {
        return e.into_response();
    }

    let mut conn = get_conn!(state);

    let recipe: Recipe = match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    let tag_rows: Vec<(i32, String)> = match recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe.id))
        .order(tags::id.asc())
        .select((tags::id, tags::name))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipe tags: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    let ingredient_rows: Vec<(i32, String)> = match recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe.id))
        .order(ingredients::id.asc())
        .select((ingredients::id, ingredients::name))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipe ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = RecipeDetail {
        id: recipe.id,
        title: recipe.title,
        ingredients: ingredient_rows
            .into_iter()
            .map(|(id, name)| IngredientItem { id, name })
            .collect(),
        tags: tag_rows
            .into_iter()
            .map(|(id, name)| TagItem { id, name })
            .collect(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link,
        image: recipe.image_path,
    };

    (StatusCode::OK, Json(response)).into_response()
}
