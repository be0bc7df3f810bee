use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

use super::{LanguageParams, ProductRefRequest, ProductResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<ProductResponse>,
    /// When the cart lapses unless touched again; absent for a cart never filled.
    pub expires_at: Option<String>,
}

#[utoipa::path(
    get,
    path = "/cart/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
        ("lang" = Option<String>, Query, description = "Display language, defaults to en"),
    ),
    responses((status = 200, description = "Cart contents", body = CartResponse)),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<LanguageParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let lang = query.into_inner().lang;
    let cart = web::block(move || state.carts.get_cart(user_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse {
        items: cart
            .items
            .iter()
            .map(|p| ProductResponse::new(p, &lang))
            .collect(),
        expires_at: cart.expires_at.map(|t| t.to_rfc3339()),
    }))
}

#[utoipa::path(
    post,
    path = "/cart/{user_id}",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    request_body = ProductRefRequest,
    responses(
        (status = 204, description = "Product added"),
        (status = 404, description = "Unknown product"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRefRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let product_id = body.into_inner().product_id;
    web::block(move || state.carts.add_product(user_id, product_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/cart/{user_id}/{product_id}",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 204, description = "One occurrence removed"),
        (status = 404, description = "Product not in the cart"),
    ),
    tag = "cart"
)]
pub async fn remove_from_cart(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, product_id) = path.into_inner();
    web::block(move || state.carts.remove_product(user_id, product_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/cart/{user_id}",
    params(("user_id" = Uuid, Path, description = "User UUID")),
    responses((status = 204, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    web::block(move || state.carts.clear(user_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
