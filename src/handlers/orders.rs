use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{CreateOrder, Order};
use crate::errors::AppError;
use crate::state::AppState;

use super::{bearer_token, require_admin, OrderItemDto};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub table_number: i32,
    pub user_id: Uuid,
    pub items: Vec<OrderItemDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditOrderRequest {
    pub table_number: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_number: i32,
    pub status: String,
    pub total_price: String,
    pub confirmed_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            table_number: order.table_number,
            status: order.status.to_string(),
            total_price: order.total_price.to_string(),
            confirmed_at: order.confirmed_at.to_rfc3339(),
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

fn responses(orders: Vec<Order>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Prices every line from the catalog and opens the order on its table. A table holds at
/// most one active order.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty order or invalid quantity"),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Table already has an active order"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = CreateOrder {
        table_number: body.table_number,
        user_id: body.user_id,
        items: body.items.into_iter().map(Into::into).collect(),
    };

    let order = web::block(move || state.orders.create_order(request)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Administrators see every order, everyone else only their own.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Visible orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req)?;
    let orders = web::block(move || state.orders.get_all_orders(&token)).await??;
    Ok(HttpResponse::Ok().json(responses(orders)))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || state.orders.get_order(id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}
///
/// Moves the order to another table. Administrators only.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = EditOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Target table already has an active order"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn edit_order(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<EditOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&req, &state)?;
    let id = path.into_inner();
    log::info!("Administrator {} editing order {id}", admin.user_id);
    let table_number = body.into_inner().table_number;
    let order = web::block(move || state.orders.edit_order(id, table_number)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Paid orders are kept"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&req, &state)?;
    let id = path.into_inner();
    log::info!("Administrator {} deleting order {id}", admin.user_id);
    web::block(move || state.orders.delete_order(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/orders/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    responses((status = 200, description = "Orders of the user", body = [OrderResponse])),
    tag = "orders"
)]
pub async fn get_user_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let orders = web::block(move || state.orders.get_user_orders(user_id)).await??;
    Ok(HttpResponse::Ok().json(responses(orders)))
}

/// GET /orders/user/{user_id}/active
///
/// The user's most recent order that still holds a table; 204 when there is none.
#[utoipa::path(
    get,
    path = "/orders/user/{user_id}/active",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Active order", body = OrderResponse),
        (status = 204, description = "No active order"),
    ),
    tag = "orders"
)]
pub async fn get_active_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let order = web::block(move || state.orders.get_active_order(user_id)).await??;
    Ok(match order {
        Some(order) => HttpResponse::Ok().json(OrderResponse::from(order)),
        None => HttpResponse::NoContent().finish(),
    })
}
