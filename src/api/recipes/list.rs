use std::collections::HashMap;

use crate::access::{self, Action, Resource};
use crate::api::{filters, ErrorResponse, FieldErrors};
use crate::auth::OptionalAuthUser;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
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

use super::RecipeSummary;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Comma-separated tag ids; matches recipes linked to any listed tag
    pub tags: Option<String>,
    /// Comma-separated ingredient ids; matches recipes linked to any listed ingredient
    pub ingredients: Option<String>,
    /// Restrict to recipes owned by this user id
    pub user: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Recipes ordered by id descending", body = ListRecipesResponse),
        (status = 400, description = "Malformed filter ids", body = FieldErrors),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    OptionalAuthUser(caller): OptionalAuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let caller = match access::resolve_caller(Resource::Recipes, Action::List, caller) {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };

    let mut errors = FieldErrors::default();

    let tag_ids = match params.tags.as_deref().map(filters::parse_id_list) {
        None => None,
        Some(Ok(ids)) => Some(ids),
        Some(Err(e)) => {
            errors.add("tags", &e);
            None
        }
    };

    let ingredient_ids = match params.ingredients.as_deref().map(filters::parse_id_list) {
        None => None,
        Some(Ok(ids)) => Some(ids),
        Some(Err(e)) => {
            errors.add("ingredients", &e);
            None
        }
    };

    if !errors.is_empty() {
        return errors.into_response();
    }

    let mut conn = get_conn!(state);

    let mut query = recipes::table.into_boxed();

    // Membership filters are unions: a recipe linked to any listed id matches.
    if let Some(ids) = tag_ids {
        query = query.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .filter(recipe_tags::tag_id.eq_any(ids))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    if let Some(ids) = ingredient_ids {
        query = query.filter(
            recipes::id.eq_any(
                recipe_ingredients::table
                    .filter(recipe_ingredients::ingredient_id.eq_any(ids))
                    .select(recipe_ingredients::recipe_id),
            ),
        );
    }

    // An explicit owner filter wins; otherwise an authenticated caller sees
    // their own recipes and an anonymous caller sees the full public set.
    if let Some(owner) = params.user {
        query = query.filter(recipes::user_id.eq(owner));
    } else if let Some(ref user) = caller {
        query = query.filter(recipes::user_id.eq(user.id));
    }

    let rows: Vec<Recipe> = match query
        .order(recipes::id.desc())
        .select(Recipe::as_select())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    // Batch-load association ids for the whole page instead of per recipe
    let recipe_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let tag_links: Vec<(i32, i32)> = match recipe_tags::table
        .filter(recipe_tags::recipe_id.eq_any(recipe_ids.iter().copied()))
        .order((recipe_tags::recipe_id.asc(), recipe_tags::tag_id.asc()))
        .select((recipe_tags::recipe_id, recipe_tags::tag_id))
        .load(&mut conn)
    {
        Ok(links) => links,
        Err(e) => {
            tracing::error!("Failed to fetch recipe tags: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let ingredient_links: Vec<(i32, i32)> = match recipe_ingredients::table
        .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids.iter().copied()))
        .order((
            recipe_ingredients::recipe_id.asc(),
            recipe_ingredients::ingredient_id.asc(),
        ))
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::ingredient_id,
        ))
        .load(&mut conn)
    {
        Ok(links) => links,
        Err(e) => {
            tracing::error!("Failed to fetch recipe ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut tags_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for (recipe_id, tag_id) in tag_links {
        tags_by_recipe.entry(recipe_id).or_default().push(tag_id);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for (recipe_id, ingredient_id) in ingredient_links {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(ingredient_id);
    }

    let recipes = rows
        .into_iter()
        .map(|r| RecipeSummary {
            id: r.id,
            title: r.title,
            ingredients: ingredients_by_recipe.remove(&r.id).unwrap_or_default(),
            tags: tags_by_recipe.remove(&r.id).unwrap_or_default(),
            time_minutes: r.time_minutes,
            price: r.price,
            link: r.link,
        })
        .collect();

    (StatusCode::OK, Json(ListRecipesResponse { recipes })).into_response()
}
