use crate::api::{filters, ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::schema::{recipe_tags, tags};
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
pub struct ListTagsParams {
    /// "1" restricts to tags used by at least one recipe; "0" returns all
    pub assigned_only: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListTagsResponse {
    pub tags: Vec<TagItem>,
}

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    params(ListTagsParams),
    responses(
        (status = 200, description = "The caller's tags, ordered by name descending", body = ListTagsResponse),
        (status = 400, description = "Invalid filter value", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_tags(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListTagsParams>,
) -> impl IntoResponse {
    let assigned_only = match params.assigned_only.as_deref() {
        None => false,
        Some(raw) => match filters::parse_assigned_only(raw) {
            Ok(v) => v,
            Err(e) => return FieldErrors::single("assigned_only", &e).into_response(),
        },
    };

    let mut conn = get_conn!(state);

    let mut query = tags::table
        .filter(tags::user_id.eq(user.id))
        .into_boxed();

    if assigned_only {
        // Semi-join against recipe associations. The IN form keeps set
        // semantics: a tag linked to several recipes still appears once.
        query = query.filter(tags::id.eq_any(recipe_tags::table.select(recipe_tags::tag_id)));
    }

    let rows: Vec<(i32, String)> = match query
        .order(tags::name.desc())
        .select((tags::id, tags::name))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch tags: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch tags".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = ListTagsResponse {
        tags: rows
            .into_iter()
            .map(|(id, name)| TagItem { id, name })
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
