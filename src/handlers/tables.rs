use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::reservation::TableOverview;
use crate::errors::AppError;
use crate::state::AppState;

use super::reservations::ReservationResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub number: i32,
    pub capacity: i32,
}

#[derive(Debug, Deserialize)]
pub struct ListTablesParams {
    /// Day whose reservations are listed. Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableResponse {
    pub id: Uuid,
    pub number: i32,
    pub capacity: i32,
    pub reservations: Vec<ReservationResponse>,
}

impl From<TableOverview> for TableResponse {
    fn from(overview: TableOverview) -> Self {
        Self {
            id: overview.table.id,
            number: overview.table.number,
            capacity: overview.table.capacity,
            reservations: overview
                .reservations
                .into_iter()
                .map(ReservationResponse::from)
                .collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = TableResponse),
        (status = 400, description = "Invalid capacity or duplicate number"),
    ),
    tag = "tables"
)]
pub async fn create_table(
    state: web::Data<AppState>,
    body: web::Json<CreateTableRequest>,
) -> Result<HttpResponse, AppError> {
    let CreateTableRequest { number, capacity } = body.into_inner();
    let table = web::block(move || state.reservations.create_table(number, capacity)).await??;
    Ok(HttpResponse::Created().json(TableResponse::from(TableOverview {
        table,
        reservations: Vec::new(),
    })))
}

/// GET /tables?date=YYYY-MM-DD
///
/// Every table with the reservations it holds on the given day.
#[utoipa::path(
    get,
    path = "/tables",
    params(("date" = Option<NaiveDate>, Query, description = "Day to inspect, defaults to today")),
    responses((status = 200, description = "Tables with their reservations", body = [TableResponse])),
    tag = "tables"
)]
pub async fn list_tables(
    state: web::Data<AppState>,
    query: web::Query<ListTablesParams>,
) -> Result<HttpResponse, AppError> {
    let date = query
        .into_inner()
        .date
        .unwrap_or_else(|| Utc::now().date_naive());
    let tables = web::block(move || state.reservations.list_tables(date)).await??;
    let body: Vec<TableResponse> = tables.into_iter().map(TableResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
