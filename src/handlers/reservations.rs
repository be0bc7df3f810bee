use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::reservation::{Reservation, ReservationRequest};
use crate::errors::AppError;
use crate::state::AppState;

use super::{bearer_token, require_admin, OrderItemDto};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservationBody {
    /// Requested table. Left out, the smallest table that fits is chosen.
    pub table_number: Option<i32>,
    pub guest_count: i32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: Uuid,
    /// Optional pre-order placed on the reserved table.
    pub order_items: Option<Vec<OrderItemDto>>,
}

impl From<ReservationBody> for ReservationRequest {
    fn from(body: ReservationBody) -> Self {
        ReservationRequest {
            table_number: body.table_number,
            guest_count: body.guest_count,
            date: body.date,
            start: body.start_time,
            end: body.end_time,
            user_id: body.user_id,
            order_items: body
                .order_items
                .map(|items| items.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub guest_count: i32,
    pub confirmed_at: String,
    pub order_id: Option<Uuid>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            table_number: r.table_number,
            user_id: r.user_id,
            date: r.date,
            start_time: r.window.start(),
            end_time: r.window.end(),
            guest_count: r.guest_count,
            confirmed_at: r.confirmed_at.to_rfc3339(),
            order_id: r.order_id,
        }
    }
}

/// POST /reservations
///
/// Books a table for a time window. A table takes at most five reservations a day and
/// windows on the same table may not overlap.
#[utoipa::path(
    post,
    path = "/reservations",
    request_body = ReservationBody,
    responses(
        (status = 201, description = "Reservation confirmed", body = ReservationResponse),
        (status = 400, description = "Invalid window or guest count"),
        (status = 404, description = "No table fits the party"),
        (status = 409, description = "Daily cap reached or window overlaps"),
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    state: web::Data<AppState>,
    body: web::Json<ReservationBody>,
) -> Result<HttpResponse, AppError> {
    let request = ReservationRequest::from(body.into_inner());
    let reservation =
        web::block(move || state.reservations.create_reservation(request)).await??;
    Ok(HttpResponse::Created().json(ReservationResponse::from(reservation)))
}

/// PUT /reservations/{id}
///
/// Administrators only.
#[utoipa::path(
    put,
    path = "/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    request_body = ReservationBody,
    responses(
        (status = 200, description = "Reservation updated", body = ReservationResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Reservation or fitting table not found"),
        (status = 409, description = "Daily cap reached or window overlaps"),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
pub async fn edit_reservation(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ReservationBody>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&req, &state)?;
    let id = path.into_inner();
    log::info!("Administrator {} editing reservation {id}", admin.user_id);
    let request = ReservationRequest::from(body.into_inner());
    let reservation =
        web::block(move || state.reservations.edit_reservation(id, request)).await??;
    Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation)))
}

#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Reservation not found"),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
pub async fn delete_reservation(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&req, &state)?;
    let id = path.into_inner();
    log::info!("Administrator {} deleting reservation {id}", admin.user_id);
    web::block(move || state.reservations.delete_reservation(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/reservations",
    responses(
        (status = 200, description = "Visible reservations", body = [ReservationResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
pub async fn list_reservations(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req)?;
    let reservations =
        web::block(move || state.reservations.get_all_reservations(&token)).await??;
    let body: Vec<ReservationResponse> = reservations
        .into_iter()
        .map(ReservationResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(body))
}
