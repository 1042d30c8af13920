pub mod me;

use crate::SharedState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<SharedState> {
    Router::new().route("/me", get(me::get_me).patch(me::patch_me))
}

#[derive(OpenApi)]
#[openapi(
    paths(me::get_me, me::patch_me),
    components(schemas(me::ProfileResponse, me::UpdateProfileRequest))
)]
pub struct ApiDoc;
