use std::str::FromStr;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, Receipt};
use crate::errors::AppError;
use crate::state::AppState;

use super::default_language;
use super::orders::OrderResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(DomainError::InvalidInput(format!(
                "unsupported payment method '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayRequest {
    pub order_id: Uuid,
    /// "cash" or "card"
    pub payment_method: String,
    /// Language of product names on the receipt. Defaults to "en".
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CaptureRequest {
    pub order_id: Uuid,
    /// Order id the payment provider issued when the payer approved the payment.
    pub provider_order_id: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptItemResponse {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptResponse {
    pub order_id: Uuid,
    pub table_number: i32,
    pub confirmed_at: String,
    pub total_price: String,
    pub items: Vec<ReceiptItemResponse>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            order_id: receipt.order_id,
            table_number: receipt.table_number,
            confirmed_at: receipt.confirmed_at.to_rfc3339(),
            total_price: receipt.total_price.to_string(),
            items: receipt
                .items
                .into_iter()
                .map(|i| ReceiptItemResponse {
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price.to_string(),
                    line_total: i.line_total.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CaptureResponse {
    /// Absent when the order was already paid and nothing new was captured.
    pub capture_id: Option<String>,
    pub receipt: ReceiptResponse,
}

/// POST /checkout/pay
///
/// Settles the order and returns its receipt. Paying an already paid order returns the same
/// receipt again; losing a race against another writer answers 409 and the client may retry.
#[utoipa::path(
    post,
    path = "/checkout/pay",
    request_body = PayRequest,
    responses(
        (status = 200, description = "Order paid", body = ReceiptResponse),
        (status = 400, description = "Unsupported payment method"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order cancelled or modified concurrently"),
    ),
    tag = "checkout"
)]
pub async fn pay(
    state: web::Data<AppState>,
    body: web::Json<PayRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let method: PaymentMethod = body.payment_method.parse()?;
    log::info!("Paying order {} by {:?}", body.order_id, method);

    let receipt = web::block(move || {
        state
            .orders
            .try_lock_and_pay(body.order_id, OrderStatus::Paid, &body.language)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ReceiptResponse::from(receipt)))
}

/// POST /checkout/capture
///
/// Provider callback after the payer approved a card payment: captures the funds, then
/// settles the order. A repeated callback for a paid order captures nothing and returns the
/// same receipt.
#[utoipa::path(
    post,
    path = "/checkout/capture",
    request_body = CaptureRequest,
    responses(
        (status = 200, description = "Payment captured and order paid", body = CaptureResponse),
        (status = 400, description = "No provider configured or capture refused"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order cancelled or modified concurrently"),
    ),
    tag = "checkout"
)]
pub async fn capture(
    state: web::Data<AppState>,
    body: web::Json<CaptureRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let gateway = state.payments.clone().ok_or_else(|| {
        DomainError::InvalidInput("no payment provider is configured".to_string())
    })?;
    let order_id = body.order_id;

    let lookup = state.clone();
    let order = web::block(move || lookup.orders.get_order(order_id)).await??;
    if order.status.is_cancelled() {
        return Err(DomainError::OrderCancelled(order_id).into());
    }

    let capture_id = if order.status == OrderStatus::Paid {
        log::info!(
            "Order {order_id} already paid, not capturing {}",
            body.provider_order_id
        );
        None
    } else {
        let id = gateway.capture(&body.provider_order_id).await?;
        log::info!(
            "Captured provider order {} for order {order_id} as {id}",
            body.provider_order_id
        );
        Some(id)
    };

    let language = body.language;
    let settled = web::block(move || {
        state
            .orders
            .try_lock_and_pay(order_id, OrderStatus::Paid, &language)
    })
    .await?;
    let receipt = settled.inspect_err(|e| {
        if let Some(id) = &capture_id {
            log::error!("Capture {id} succeeded but order {order_id} could not be paid: {e}");
        }
    })?;

    Ok(HttpResponse::Ok().json(CaptureResponse {
        capture_id,
        receipt: ReceiptResponse::from(receipt),
    }))
}

#[utoipa::path(
    post,
    path = "/checkout/cancel",
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Payment cancelled", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid"),
    ),
    tag = "checkout"
)]
pub async fn cancel(
    state: web::Data<AppState>,
    body: web::Json<CancelRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = body.into_inner().order_id;
    let order = web::block(move || state.orders.cancel_order(order_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_is_case_insensitive() {
        assert_eq!("CASH".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert_eq!(" Card ".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        assert!(matches!(
            "crypto".parse::<PaymentMethod>(),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
