//! Group routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mawid_core::CreateGroup;
use mawid_domain::{Group, Role};
use serde::Deserialize;

use super::require_role;
use crate::context::AppContext;
use crate::extract::Identity;
use crate::response::{ApiResponse, ApiResult};

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", post(create).get(list_mine))
        .route("/{id}", get(get_one).patch(update).delete(delete_one))
        .route("/{id}/admin", get(get_admin).patch(reassign_admin))
        .route("/{id}/members", get(members).post(add_members).delete(remove_members))
        .route("/{id}/appointments", get(appointments))
        .route("/{id}/appointments/{appointment_id}", delete(detach_appointment))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub admin_id: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MembersRequest {
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReassignAdminRequest {
    pub admin_id: String,
}

async fn create(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Json(body): Json<CreateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&identity, &[Role::SuperAdmin])?;

    let input = CreateGroup {
        name: body.name,
        description: body.description,
        // The creator administers the group unless another admin is named
        admin_id: body.admin_id.unwrap_or_else(|| identity.actor().id.clone()),
        members: body.members,
    };
    let group = ctx.groups.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success("Group created successfully", group))))
}

async fn list_mine(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
) -> ApiResult<Json<ApiResponse<Vec<Group>>>> {
    let groups = ctx.groups.list_for_user(&identity.actor().id).await?;
    Ok(Json(ApiResponse::success("Groups retrieved successfully", groups)))
}

async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group = ctx.groups.get(&id).await?;
    Ok(Json(ApiResponse::success("", group)))
}

async fn update(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateGroupRequest>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    require_role(&identity, &[Role::Admin, Role::SuperAdmin])?;
    let group = ctx.groups.update(&id, body.name, body.description).await?;
    Ok(Json(ApiResponse::success("Group updated successfully", group)))
}

async fn delete_one(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&identity, &[Role::SuperAdmin])?;
    ctx.groups.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_admin(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let group = ctx.groups.get(&id).await?;
    Ok(Json(ApiResponse::success("Admin retrieved successfully", group.admin_id)))
}

async fn reassign_admin(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<ReassignAdminRequest>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group = ctx.groups.reassign_admin(identity.actor(), &id, &body.admin_id).await?;
    Ok(Json(ApiResponse::success("Admin updated successfully", group)))
}

async fn members(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let group = ctx.groups.get(&id).await?;
    Ok(Json(ApiResponse::success("", group.members)))
}

async fn add_members(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<MembersRequest>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group = ctx.groups.add_members(identity.actor(), &id, &body.members).await?;
    Ok(Json(ApiResponse::success("Members added to group successfully", group)))
}

async fn remove_members(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<MembersRequest>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group = ctx.groups.remove_members(identity.actor(), &id, &body.members).await?;
    Ok(Json(ApiResponse::success("Specified members removed from group", group)))
}

async fn appointments(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let appointment_ids = ctx.groups.appointments(&id).await?;
    Ok(Json(ApiResponse::success("", appointment_ids)))
}

async fn detach_appointment(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path((id, appointment_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group =
        ctx.groups.detach_appointment(identity.actor(), &id, &appointment_id).await?;
    Ok(Json(ApiResponse::success("Appointment removed from group", group)))
}
