//! Route table and shared handler plumbing

pub mod admin;
pub mod appointments;
pub mod groups;
pub mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use mawid_domain::{MawidError, Role};
use serde_json::json;

use crate::context::AppContext;
use crate::extract::Identity;
use crate::response::{ApiError, ApiResult};

/// Build the full application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/appointments", appointments::routes())
        .nest("/api/v1/groups", groups::routes())
        .nest("/api/v1/users", users::routes())
        .nest("/api/v1/admin", admin::routes())
        .with_state(ctx)
}

/// Coarse role gate for admin surfaces; finer ownership checks live in
/// the core policy module.
pub(crate) fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&identity.actor().role) {
        Ok(())
    } else {
        Err(ApiError::Domain(MawidError::Forbidden(
            "you are not allowed to access this route".into(),
        )))
    }
}

async fn health(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<serde_json::Value>> {
    ctx.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}
