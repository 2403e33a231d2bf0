//! Appointment routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mawid_core::appointments::ports::AppointmentChanges;
use mawid_core::{CreateAppointment, RatingSubmission};
use mawid_domain::{Appointment, Review};
use serde::Deserialize;

use crate::context::AppContext;
use crate::extract::Identity;
use crate::response::{ApiResponse, ApiResult};

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(list_mine))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
        .route("/{id}/accept", post(accept))
        .route("/{id}/ratings", post(submit_rating))
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub title: String,
    pub starting_date: String,
    pub ending_date: Option<String>,
    pub starting_time: Option<String>,
    pub ending_time: Option<String>,
    pub group_ids: Option<Vec<String>>,
    pub attendance: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateAppointmentRequest {
    pub title: Option<String>,
    pub starting_date: Option<String>,
    pub ending_date: Option<String>,
    pub starting_time: Option<String>,
    pub ending_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub reviews: Vec<Review>,
    pub comment: Option<String>,
}

async fn create(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Json(body): Json<CreateAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = CreateAppointment {
        title: body.title,
        starting_date: body.starting_date,
        ending_date: body.ending_date,
        starting_time: body.starting_time,
        ending_time: body.ending_time,
        group_ids: body.group_ids,
        attendance: body.attendance,
    };
    let appointment = ctx.appointments.create(identity.actor(), input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Appointment created successfully", appointment)),
    ))
}

async fn list_mine(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    let appointments = ctx.appointments.list_for_user(&identity.actor().id).await?;
    Ok(Json(ApiResponse::success("Appointments retrieved successfully", appointments)))
}

async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = ctx.appointments.get(&id).await?;
    Ok(Json(ApiResponse::success("", appointment)))
}

async fn update(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateAppointmentRequest>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let changes = AppointmentChanges {
        title: body.title,
        starting_date: body.starting_date,
        ending_date: body.ending_date,
        starting_time: body.starting_time,
        ending_time: body.ending_time,
    };
    let appointment = ctx.appointments.update(&id, changes).await?;
    Ok(Json(ApiResponse::success("Appointment updated successfully", appointment)))
}

async fn delete_one(
    State(ctx): State<Arc<AppContext>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    ctx.appointments.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn accept(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = ctx.appointments.accept(&id, &identity.actor().id).await?;
    Ok(Json(ApiResponse::success("Appointment accepted successfully", appointment)))
}

async fn submit_rating(
    State(ctx): State<Arc<AppContext>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<RatingRequest>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let submission = RatingSubmission { reviews: body.reviews, comment: body.comment };
    let appointment = ctx.ratings.submit(identity.actor(), &id, submission).await?;
    Ok(Json(ApiResponse::success("Rating submitted successfully", appointment)))
}
