//! User registry routes
//!
//! Registration only covers the registry record; credentials and token
//! issuance are the identity collaborator's concern.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mawid_core::CreateUser;
use mawid_domain::{Role, User};
use serde::Deserialize;

use crate::context::AppContext;
use crate::extract::Identity;
use crate::response::{ApiResponse, ApiResult};

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", post(create))
        .route("/me", get(me))
        .route("/{id}", get(get_one).patch(update).delete(delete_one))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

async fn create(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = CreateUser {
        email: body.email,
        name: body.name,
        role: body.role.unwrap_or(Role::User),
    };
    let user = ctx.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success("User created successfully", user))))
}

async fn me(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx.users.get(&identity.actor().id).await?;
    Ok(Json(ApiResponse::success("User profile", user)))
}

async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx.users.get(&id).await?;
    Ok(Json(ApiResponse::success("", user)))
}

async fn update(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx.users.update(&id, body.name, body.email).await?;
    Ok(Json(ApiResponse::success("User updated successfully", user)))
}

async fn delete_one(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    ctx.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
