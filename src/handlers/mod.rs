pub mod cart;
pub mod checkout;
pub mod events;
pub mod orders;
pub mod party;
pub mod reservations;
pub mod tables;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::identity::Identity;
use crate::domain::order::OrderItemRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// Extracts the raw token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::Unauthorized("missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or_else(|| {
            DomainError::Unauthorized("invalid Authorization format".to_string()).into()
        })
}

/// Resolves the caller's bearer token and lets only administrators through: 401 when the
/// token is missing or invalid, 403 for any other role.
pub(crate) fn require_admin(req: &HttpRequest, state: &AppState) -> Result<Identity, AppError> {
    let token = bearer_token(req)?;
    let identity = state.identity.resolve(&token)?.require_admin()?;
    Ok(identity)
}

// ── Shared DTOs ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemDto {
    pub product_name: String,
    pub quantity: i32,
}

impl From<OrderItemDto> for OrderItemRequest {
    fn from(dto: OrderItemDto) -> Self {
        OrderItemRequest {
            product_name: dto.product_name,
            quantity: dto.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LanguageParams {
    /// Display language of product names. Defaults to "en".
    #[serde(default = "default_language")]
    pub lang: String,
}

pub(crate) fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Decimal price as a string, e.g. "9.99"
    pub price: String,
    pub image_url: Option<String>,
}

impl ProductResponse {
    pub fn new(product: &Product, language_code: &str) -> Self {
        Self {
            id: product.id,
            name: product.display_name(language_code).to_string(),
            category: product.category.clone(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRefRequest {
    pub product_id: Uuid,
}
