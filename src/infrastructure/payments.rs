use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::config::PayPalConfig;
use crate::domain::errors::DomainError;
use crate::domain::ports::PaymentGateway;

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::Internal(format!("payment provider unreachable: {e}"))
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CaptureBody {
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    payments: Payments,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
}

impl CaptureBody {
    fn capture_id(self) -> Option<String> {
        let unit = self.purchase_units.into_iter().next()?;
        unit.payments.captures.into_iter().next().map(|c| c.id)
    }
}

/// Captures approved PayPal orders through the v2 checkout API.
pub struct PayPalGateway {
    http: Client,
    cfg: PayPalConfig,
}

impl PayPalGateway {
    pub fn new(cfg: PayPalConfig) -> Result<Self, DomainError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, cfg })
    }

    async fn access_token(&self) -> Result<String, DomainError> {
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.cfg.url))
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: AccessToken = ensure_success(resp, "token request").await?.json().await?;
        Ok(token.access_token)
    }

    async fn capture_order(&self, provider_order_id: &str) -> Result<String, DomainError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{provider_order_id}/capture",
                self.cfg.url
            ))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let body: CaptureBody = ensure_success(resp, "capture").await?.json().await?;

        body.capture_id().ok_or_else(|| {
            DomainError::Internal(format!(
                "capture of PayPal order {provider_order_id} returned no capture id"
            ))
        })
    }
}

/// A 4xx means the provider refused this payment (declined, already captured, unknown
/// order); anything else is an infrastructure failure.
async fn ensure_success(resp: Response, step: &str) -> Result<Response, DomainError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp.text().await.unwrap_or_default();
    log::warn!("PayPal {step} failed with {status}: {detail}");
    if status.is_client_error() {
        Err(DomainError::InvalidInput(format!(
            "payment provider rejected the {step} ({status})"
        )))
    } else {
        Err(DomainError::Internal(format!(
            "PayPal {step} failed with {status}"
        )))
    }
}

impl PaymentGateway for PayPalGateway {
    fn capture<'a>(
        &'a self,
        provider_order_id: &'a str,
    ) -> BoxFuture<'a, Result<String, DomainError>> {
        Box::pin(self.capture_order(provider_order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_id_comes_from_the_first_purchase_unit() {
        let body: CaptureBody = serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "reference_id": "default",
                "payments": { "captures": [{ "id": "3C679366HH908993F", "status": "COMPLETED" }] }
            }]
        }))
        .unwrap();

        assert_eq!(body.capture_id().as_deref(), Some("3C679366HH908993F"));
    }

    #[test]
    fn capture_without_captures_yields_nothing() {
        let body: CaptureBody =
            serde_json::from_value(serde_json::json!({ "purchase_units": [] })).unwrap();
        assert_eq!(body.capture_id(), None);
    }
}
