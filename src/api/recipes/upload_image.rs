use crate::api::{ErrorResponse, FieldErrors};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::media;
use crate::schema::recipes;
use crate::SharedState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadImageResponse {
    pub id: i32,
    pub image: String,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageRequest {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/upload-image",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content_type = "multipart/form-data", content = UploadImageRequest),
    responses(
        (status = 200, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Payload is not a decodable image", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_image(
    AuthUser(user): AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut conn = get_conn!(state);

    let previous_image: Option<String> = match recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::user_id.eq(user.id))
        .select(recipes::image_path)
        .first(&mut conn)
    {
        Ok(path) => path,
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

    // Get the file from multipart
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            return FieldErrors::single("image", "No file provided.").into_response();
        }
        Err(e) => {
            tracing::warn!("Multipart read error: {}", e);
            let error_msg = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                format!("File too large. Maximum size is {} bytes.", media::MAX_FILE_SIZE)
            } else {
                format!("Failed to read multipart data: {}", e.body_text())
            };
            return (e.status(), Json(ErrorResponse { error: error_msg })).into_response();
        }
    };

    let data = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Field read error: {}", e);
            let error_msg = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                format!("File too large. Maximum size is {} bytes.", media::MAX_FILE_SIZE)
            } else {
                format!("Failed to read file data: {}", e.body_text())
            };
            return (e.status(), Json(ErrorResponse { error: error_msg })).into_response();
        }
    };

    if data.len() > media::MAX_FILE_SIZE {
        return FieldErrors::single(
            "image",
            &format!("File too large. Maximum size is {} bytes.", media::MAX_FILE_SIZE),
        )
        .into_response();
    }

    // Validate before anything touches disk or the database: a rejected
    // payload leaves the stored reference unchanged.
    let format = match media::validate_image(&data) {
        Ok(format) => format,
        Err(e) => return FieldErrors::single("image", &e).into_response(),
    };

    let stored_path = match media::store_image(&state.media_root, &data, format) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("Failed to store image: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to store image".to_string(),
                }),
            )
                .into_response();
        }
    };

    let updated = diesel::update(recipes::table.find(id))
        .set((
            recipes::image_path.eq(Some(stored_path.as_str())),
            recipes::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn);

    if let Err(e) = updated {
        tracing::error!("Failed to update recipe image: {}", e);
        // The row was not updated; don't leave the new file orphaned
        media::remove_image(&state.media_root, &stored_path);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to store image".to_string(),
            }),
        )
            .into_response();
    }

    // Release the replaced file only after the new reference is persisted
    if let Some(ref old) = previous_image {
        media::remove_image(&state.media_root, old);
    }

    (
        StatusCode::OK,
        Json(UploadImageResponse {
            id,
            image: stored_path,
        }),
    )
        .into_response()
}
