pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;
pub mod upload_image;

use std::collections::BTreeSet;

use crate::api::FieldErrors;
use crate::models::{NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, tags};
use crate::SharedState;
use axum::routing::{get, post};
use axum::Router;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::replace_recipe)
                .patch(update::patch_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/{id}/upload-image", post(upload_image::upload_image))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::replace_recipe,
        update::patch_recipe,
        delete::delete_recipe,
        upload_image::upload_image,
    ),
    components(schemas(
        RecipeSummary,
        create::CreateRecipeRequest,
        list::ListRecipesResponse,
        get::RecipeDetail,
        update::ReplaceRecipeRequest,
        update::PatchRecipeRequest,
        upload_image::UploadImageRequest,
        upload_image::UploadImageResponse,
    ))
)]
pub struct ApiDoc;

/// Summary wire shape: related tags and ingredients referenced by id only.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub ingredients: Vec<i32>,
    pub tags: Vec<i32>,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
}

/// Load the associated tag and ingredient ids for one recipe.
pub(crate) fn load_association_ids(
    conn: &mut PgConnection,
    recipe_id: i32,
) -> QueryResult<(Vec<i32>, Vec<i32>)> {
    let tag_ids = recipe_tags::table
        .filter(recipe_tags::recipe_id.eq(recipe_id))
        .select(recipe_tags::tag_id)
        .order(recipe_tags::tag_id.asc())
        .load(conn)?;

    let ingredient_ids = recipe_ingredients::table
        .filter(recipe_ingredients::recipe_id.eq(recipe_id))
        .select(recipe_ingredients::ingredient_id)
        .order(recipe_ingredients::ingredient_id.asc())
        .load(conn)?;

    Ok((tag_ids, ingredient_ids))
}

pub(crate) fn summarize(conn: &mut PgConnection, recipe: &Recipe) -> QueryResult<RecipeSummary> {
    let (tag_ids, ingredient_ids) = load_association_ids(conn, recipe.id)?;

    Ok(RecipeSummary {
        id: recipe.id,
        title: recipe.title.clone(),
        ingredients: ingredient_ids,
        tags: tag_ids,
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link.clone(),
    })
}

/// Validate the plain recipe fields shared by create and update. `None`
/// means the field was not submitted.
pub(crate) fn validate_fields(
    title: Option<&str>,
    time_minutes: Option<i32>,
    price: Option<f64>,
    errors: &mut FieldErrors,
) {
    if let Some(title) = title {
        if title.trim().is_empty() {
            errors.add("title", "This field may not be blank.");
        }
    }
    if let Some(minutes) = time_minutes {
        if minutes < 0 {
            errors.add(
                "time_minutes",
                "Ensure this value is greater than or equal to 0.",
            );
        }
    }
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            errors.add("price", "Ensure this value is greater than or equal to 0.");
        }
    }
}

/// Check that every submitted tag id exists and belongs to the caller.
/// Unknown and foreign ids both fail validation without revealing which.
pub(crate) fn check_tag_ids(
    conn: &mut PgConnection,
    owner_id: i32,
    ids: &[i32],
    errors: &mut FieldErrors,
) -> QueryResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i32> = tags::table
        .filter(tags::user_id.eq(owner_id))
        .filter(tags::id.eq_any(ids.iter().copied()))
        .select(tags::id)
        .load(conn)?;

    for id in ids {
        if !found.contains(id) {
            errors.add(
                "tags",
                &format!("Invalid pk \"{}\" - object does not exist.", id),
            );
        }
    }

    Ok(())
}

pub(crate) fn check_ingredient_ids(
    conn: &mut PgConnection,
    owner_id: i32,
    ids: &[i32],
    errors: &mut FieldErrors,
) -> QueryResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i32> = ingredients::table
        .filter(ingredients::user_id.eq(owner_id))
        .filter(ingredients::id.eq_any(ids.iter().copied()))
        .select(ingredients::id)
        .load(conn)?;

    for id in ids {
        if !found.contains(id) {
            errors.add(
                "ingredients",
                &format!("Invalid pk \"{}\" - object does not exist.", id),
            );
        }
    }

    Ok(())
}

/// Insert association rows for a recipe. Submitted ids are de-duplicated.
pub(crate) fn insert_associations(
    conn: &mut PgConnection,
    recipe_id: i32,
    tag_ids: &[i32],
    ingredient_ids: &[i32],
) -> QueryResult<()> {
    let tag_rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .copied()
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .map(|tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();

    let ingredient_rows: Vec<NewRecipeIngredient> = ingredient_ids
        .iter()
        .copied()
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .map(|ingredient_id| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
        })
        .collect();

    if !tag_rows.is_empty() {
        diesel::insert_into(recipe_tags::table)
            .values(&tag_rows)
            .execute(conn)?;
    }
    if !ingredient_rows.is_empty() {
        diesel::insert_into(recipe_ingredients::table)
            .values(&ingredient_rows)
            .execute(conn)?;
    }

    Ok(())
}

/// Replace a recipe's association rows with exactly the submitted sets.
pub(crate) fn replace_associations(
    conn: &mut PgConnection,
    recipe_id: i32,
    tag_ids: &[i32],
    ingredient_ids: &[i32],
) -> QueryResult<()> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;

    insert_associations(conn, recipe_id, tag_ids, ingredient_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fields_accepts_valid_input() {
        let mut errors = FieldErrors::default();
        validate_fields(Some("Porridge"), Some(5), Some(2.0), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_fields_rejects_blank_title() {
        let mut errors = FieldErrors::default();
        validate_fields(Some("   "), None, None, &mut errors);
        assert!(errors.0.contains_key("title"));
    }

    #[test]
    fn test_validate_fields_rejects_negative_numbers() {
        let mut errors = FieldErrors::default();
        validate_fields(None, Some(-1), Some(-0.5), &mut errors);
        assert!(errors.0.contains_key("time_minutes"));
        assert!(errors.0.contains_key("price"));
    }

    #[test]
    fn test_validate_fields_rejects_non_finite_price() {
        let mut errors = FieldErrors::default();
        validate_fields(None, None, Some(f64::NAN), &mut errors);
        assert!(errors.0.contains_key("price"));
    }

    #[test]
    fn test_validate_fields_skips_absent_fields() {
        let mut errors = FieldErrors::default();
        validate_fields(None, None, None, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_zero_values_are_valid() {
        let mut errors = FieldErrors::default();
        validate_fields(Some("Water"), Some(0), Some(0.0), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_summary_wire_shape() {
        let summary = RecipeSummary {
            id: 3,
            title: "Cherry Pancakes".to_string(),
            ingredients: vec![1, 4],
            tags: vec![2],
            time_minutes: 15,
            price: 5.0,
            link: None,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "title": "Cherry Pancakes",
                "ingredients": [1, 4],
                "tags": [2],
                "time_minutes": 15,
                "price": 5.0,
                "link": null,
            })
        );
    }
}
