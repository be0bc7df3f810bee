//! HTTP-level tests against the in-memory backend.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use uuid::Uuid;

use restaurant_service::config::AppConfig;
use restaurant_service::domain::catalog::{Product, ProductTranslation};
use restaurant_service::domain::errors::DomainError;
use restaurant_service::domain::identity::ADMIN_ROLE;
use restaurant_service::domain::ports::PaymentGateway;
use restaurant_service::infrastructure::identity::JwtIdentityProvider;
use restaurant_service::infrastructure::memory::InMemoryCatalog;
use restaurant_service::{routes, AppState};

const SECRET: &str = "api-test-secret";

struct Fixture {
    state: AppState,
    tokens: JwtIdentityProvider,
    burger: Uuid,
}

fn add_product(catalog: &Arc<InMemoryCatalog>, en: &str, ru: &str, price: &str) -> Uuid {
    let id = Uuid::new_v4();
    catalog.insert(Product {
        id,
        price: BigDecimal::from_str(price).unwrap(),
        category: "Mains".to_string(),
        image_url: None,
        translations: vec![
            ProductTranslation {
                language_code: "en".to_string(),
                name: en.to_string(),
                description: String::new(),
            },
            ProductTranslation {
                language_code: "ru".to_string(),
                name: ru.to_string(),
                description: String::new(),
            },
        ],
    });
    id
}

fn fixture() -> Fixture {
    let config = AppConfig::in_memory(SECRET);
    let (state, catalog) = AppState::in_memory(&config);
    let burger = add_product(&catalog, "Burger", "Бургер", "9.50");
    add_product(&catalog, "Lemonade", "Лимонад", "3.25");
    Fixture {
        state,
        tokens: JwtIdentityProvider::new(config.jwt),
        burger,
    }
}

macro_rules! service {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fixture.state.clone()))
                .configure(routes),
        )
        .await
    };
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

fn order_body(table: i32, user: Uuid) -> Value {
    json!({
        "table_number": table,
        "user_id": user,
        "items": [
            { "product_name": "Burger", "quantity": 2 },
            { "product_name": "Lemonade", "quantity": 1 }
        ]
    })
}

#[actix_web::test]
async fn order_is_paid_once_and_then_protected() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(3, Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = test::read_body_json(resp).await;
    assert_eq!(order["status"], "Created");
    assert_eq!(order["total_price"], "22.25");
    let order_id = order["id"].as_str().unwrap().to_string();

    let pay = json!({ "order_id": order_id, "payment_method": "Card", "language": "ru" });
    let req = test::TestRequest::post()
        .uri("/checkout/pay")
        .set_json(&pay)
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["items"][0]["product_name"], "Бургер");
    assert_eq!(first["items"][0]["line_total"], "19.00");

    let req = test::TestRequest::post()
        .uri("/checkout/pay")
        .set_json(&pay)
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first, second);

    let req = test::TestRequest::post()
        .uri("/checkout/cancel")
        .set_json(json!({ "order_id": order_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "AlreadyPaid");
}

#[actix_web::test]
async fn unsupported_payment_method_is_rejected() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/checkout/pay")
        .set_json(json!({ "order_id": Uuid::new_v4(), "payment_method": "barter" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn table_holds_one_active_order_until_cancelled() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(5, Uuid::new_v4()))
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(5, Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "DuplicateActiveOrder");

    let req = test::TestRequest::post()
        .uri("/checkout/cancel")
        .set_json(json!({ "order_id": first["id"] }))
        .to_request();
    let cancelled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancelled["status"], "PaymentCancelled");

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(5, Uuid::new_v4()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );
}

#[actix_web::test]
async fn unknown_product_names_are_not_found() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "table_number": 1,
            "user_id": Uuid::new_v4(),
            "items": [{ "product_name": "Unicorn steak", "quantity": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ProductNotFound");
}

#[actix_web::test]
async fn order_listing_depends_on_the_caller() {
    let f = fixture();
    let app = service!(f);
    let alice = Uuid::new_v4();

    for (table, user) in [(1, alice), (2, Uuid::new_v4())] {
        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(table, user))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get().uri("/orders").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let token = f.tokens.issue(alice, None, 600).unwrap();
    let req = test::TestRequest::get()
        .uri("/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let own: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["user_id"], alice.to_string());

    let admin = f
        .tokens
        .issue(Uuid::new_v4(), Some(ADMIN_ROLE), 600)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {admin}")))
        .to_request();
    let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/orders/user/{alice}/active"))
        .to_request();
    let active: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(active["table_number"], 1);
}

#[actix_web::test]
async fn reservation_with_pre_order_and_overlap() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/tables")
        .set_json(json!({ "number": 4, "capacity": 4 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let user = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(json!({
            "guest_count": 3,
            "date": "2024-06-01",
            "start_time": "18:00:00",
            "end_time": "20:00:00",
            "user_id": user,
            "order_items": [
                { "product_name": "Burger", "quantity": 3 },
                { "product_name": "string", "quantity": 0 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let reservation: Value = test::read_body_json(resp).await;
    assert_eq!(reservation["table_number"], 4);
    assert!(reservation["order_id"].is_string());

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{}", reservation["order_id"].as_str().unwrap()))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(order["user_id"], user.to_string());
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(json!({
            "table_number": 4,
            "guest_count": 2,
            "date": "2024-06-01",
            "start_time": "19:30:00",
            "end_time": "21:00:00",
            "user_id": Uuid::new_v4()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TimeConflict");

    let req = test::TestRequest::get()
        .uri("/tables?date=2024-06-01")
        .to_request();
    let tables: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["reservations"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn party_shares_a_cart_until_dissolved() {
    let f = fixture();
    let app = service!(f);
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/party")
        .set_json(json!({ "owner_id": owner, "table_id": 8 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let party: Value = test::read_body_json(resp).await;
    let party_id = party["party_id"].as_str().unwrap().to_string();
    let code = party["code"].as_str().unwrap().to_lowercase();

    let req = test::TestRequest::post()
        .uri("/party")
        .set_json(json!({ "owner_id": guest, "table_id": 8 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = test::TestRequest::post()
        .uri("/party/join")
        .set_json(json!({ "code": code, "user_id": guest }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/party/{party_id}/cart"))
        .set_json(json!({ "product_id": f.burger }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&format!("/party/{party_id}/cart?lang=ru"))
        .to_request();
    let cart: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["name"], "Бургер");

    for user in [owner, guest] {
        let req = test::TestRequest::post()
            .uri(&format!("/party/{party_id}/leave"))
            .set_json(json!({ "user_id": user }))
            .to_request();
        let left: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(left["left"], true);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/party/{party_id}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn personal_cart_roundtrip() {
    let f = fixture();
    let app = service!(f);
    let user = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri(&format!("/cart/{user}"))
        .set_json(json!({ "product_id": f.burger }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&format!("/cart/{user}"))
        .to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"][0]["name"], "Burger");
    assert_eq!(cart["items"][0]["price"], "9.50");
    assert!(cart["expires_at"].is_string());

    let req = test::TestRequest::delete()
        .uri(&format!("/cart/{user}/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CartItemNotFound");

    let req = test::TestRequest::delete()
        .uri(&format!("/cart/{user}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[actix_web::test]
async fn only_administrators_edit_or_delete_orders() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(6, Uuid::new_v4()))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/orders/{}", order["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .set_json(json!({ "table_number": 7 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let diner = f.tokens.issue(Uuid::new_v4(), None, 600).unwrap();
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&diner))
        .set_json(json!({ "table_number": 7 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Forbidden");
    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&diner))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get().uri(&uri).to_request();
    let untouched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(untouched["table_number"], 6);

    let admin = f
        .tokens
        .issue(Uuid::new_v4(), Some(ADMIN_ROLE), 600)
        .unwrap();
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(json!({ "table_number": 7 }))
        .to_request();
    let moved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(moved["table_number"], 7);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[actix_web::test]
async fn only_administrators_edit_or_delete_reservations() {
    let f = fixture();
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/tables")
        .set_json(json!({ "number": 2, "capacity": 4 }))
        .to_request();
    test::call_service(&app, req).await;

    let user = Uuid::new_v4();
    let booking = json!({
        "guest_count": 2,
        "date": "2024-06-02",
        "start_time": "12:00:00",
        "end_time": "13:00:00",
        "user_id": user
    });
    let req = test::TestRequest::post()
        .uri("/reservations")
        .set_json(&booking)
        .to_request();
    let reservation: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/reservations/{}", reservation["id"].as_str().unwrap());

    let mut later = booking.clone();
    later["start_time"] = json!("14:00:00");
    later["end_time"] = json!("15:00:00");

    let req = test::TestRequest::put()
        .uri(&uri)
        .set_json(&later)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let owner = f.tokens.issue(user, None, 600).unwrap();
    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&owner))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let admin = f
        .tokens
        .issue(Uuid::new_v4(), Some(ADMIN_ROLE), 600)
        .unwrap();
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(&later)
        .to_request();
    let edited: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(edited["start_time"], "14:00:00");
    assert_eq!(edited["user_id"], user.to_string());

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
}

/// Approves every capture and counts how often the provider was asked.
#[derive(Default)]
struct CountingGateway {
    captures: AtomicUsize,
}

impl PaymentGateway for CountingGateway {
    fn capture<'a>(
        &'a self,
        provider_order_id: &'a str,
    ) -> BoxFuture<'a, Result<String, DomainError>> {
        Box::pin(async move {
            self.captures.fetch_add(1, Ordering::SeqCst);
            Ok(format!("CAP-{provider_order_id}"))
        })
    }
}

#[actix_web::test]
async fn repeated_capture_callback_pays_once() {
    let f = fixture();
    let gateway = Arc::new(CountingGateway::default());
    let f = Fixture {
        state: f.state.with_payments(gateway.clone()),
        ..f
    };
    let app = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(9, Uuid::new_v4()))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;

    let callback = json!({
        "order_id": order["id"],
        "provider_order_id": "5O190127TN364715T",
        "language": "en"
    });
    let req = test::TestRequest::post()
        .uri("/checkout/capture")
        .set_json(&callback)
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["capture_id"], "CAP-5O190127TN364715T");
    assert_eq!(first["receipt"]["total_price"], "22.25");

    let req = test::TestRequest::post()
        .uri("/checkout/capture")
        .set_json(&callback)
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert!(second["capture_id"].is_null());
    assert_eq!(second["receipt"], first["receipt"]);
    assert_eq!(gateway.captures.load(Ordering::SeqCst), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{}", order["id"].as_str().unwrap()))
        .to_request();
    let paid: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(paid["status"], "Paid");
}

#[actix_web::test]
async fn capture_is_refused_for_cancelled_orders_and_without_a_provider() {
    let f = fixture();
    let gateway = Arc::new(CountingGateway::default());
    let plain = service!(f);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(order_body(10, Uuid::new_v4()))
        .to_request();
    let order: Value = test::call_and_read_body_json(&plain, req).await;
    let callback = json!({ "order_id": order["id"], "provider_order_id": "X1" });

    let req = test::TestRequest::post()
        .uri("/checkout/capture")
        .set_json(&callback)
        .to_request();
    assert_eq!(
        test::call_service(&plain, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/checkout/cancel")
        .set_json(json!({ "order_id": order["id"] }))
        .to_request();
    test::call_service(&plain, req).await;

    let f = Fixture {
        state: f.state.clone().with_payments(gateway.clone()),
        ..f
    };
    let app = service!(f);
    let req = test::TestRequest::post()
        .uri("/checkout/capture")
        .set_json(&callback)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "OrderCancelled");
    assert_eq!(gateway.captures.load(Ordering::SeqCst), 0);
}
