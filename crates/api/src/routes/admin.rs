//! Admin surface: appointment listing, date queries, status overrides

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use mawid_core::appointments::ports::AppointmentFilter;
use mawid_domain::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use mawid_domain::{Appointment, AppointmentStatus, MawidError, Role};
use serde::Deserialize;

use super::require_role;
use crate::context::AppContext;
use crate::extract::Identity;
use crate::response::{ApiResponse, ApiResult};

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/appointments", get(list))
        .route("/appointments/status/{status}", get(list_by_computed_status))
        .route("/appointments/{id}/status", patch(change_status))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
}

fn build_filter(query: ListQuery) -> ApiResult<AppointmentFilter> {
    let status = query
        .status
        .map(|raw| AppointmentStatus::from_str(&raw).map_err(MawidError::Validation))
        .transpose()?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    Ok(AppointmentFilter {
        status,
        date: query.date,
        from: query.from,
        to: query.to,
        limit: Some(limit),
        offset: Some((page - 1) * limit),
    })
}

async fn list(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    require_role(&identity, &[Role::Admin, Role::SuperAdmin])?;
    let appointments = ctx.appointments.list(build_filter(query)?).await?;
    Ok(Json(ApiResponse::success("Appointments retrieved successfully", appointments)))
}

/// Listing by the *derived* status: candidates are resolved on read and
/// matched, without persisting the projection.
async fn list_by_computed_status(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(status): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    require_role(&identity, &[Role::Admin, Role::SuperAdmin])?;
    let status = AppointmentStatus::from_str(&status).map_err(MawidError::Validation)?;

    let mut filter = build_filter(query)?;
    // The persisted-status filter would fight the derived one
    filter.status = None;
    let appointments = ctx.appointments.list_by_computed_status(status, filter).await?;
    Ok(Json(ApiResponse::success("Appointments retrieved successfully", appointments)))
}

async fn change_status(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    require_role(&identity, &[Role::Admin, Role::SuperAdmin])?;
    let appointment = ctx.appointments.change_status(&id, body.status).await?;
    Ok(Json(ApiResponse::success("Appointment status changed successfully", appointment)))
}
