pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use state::AppState;

use handlers::{cart, checkout, events, orders, party, reservations, tables};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migrations", applied.len());
    Ok(())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::edit_order,
        orders::delete_order,
        orders::get_user_orders,
        orders::get_active_order,
        checkout::pay,
        checkout::capture,
        checkout::cancel,
        reservations::create_reservation,
        reservations::edit_reservation,
        reservations::delete_reservation,
        reservations::list_reservations,
        tables::create_table,
        tables::list_tables,
        party::create_party,
        party::join_party,
        party::leave_party,
        party::get_party,
        party::get_party_cart,
        party::add_to_party_cart,
        party::remove_from_party_cart,
        party::clear_party_cart,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        events::stream_events,
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers every route on an actix `App` or test service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/user/{user_id}", web::get().to(orders::get_user_orders))
            .route(
                "/user/{user_id}/active",
                web::get().to(orders::get_active_order),
            )
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::put().to(orders::edit_order))
            .route("/{id}", web::delete().to(orders::delete_order)),
    )
    .service(
        web::scope("/checkout")
            .route("/pay", web::post().to(checkout::pay))
            .route("/capture", web::post().to(checkout::capture))
            .route("/cancel", web::post().to(checkout::cancel)),
    )
    .service(
        web::scope("/reservations")
            .route("", web::post().to(reservations::create_reservation))
            .route("", web::get().to(reservations::list_reservations))
            .route("/{id}", web::put().to(reservations::edit_reservation))
            .route("/{id}", web::delete().to(reservations::delete_reservation)),
    )
    .service(
        web::scope("/tables")
            .route("", web::post().to(tables::create_table))
            .route("", web::get().to(tables::list_tables)),
    )
    .service(
        web::scope("/party")
            .route("", web::post().to(party::create_party))
            .route("/join", web::post().to(party::join_party))
            .route("/{party_id}", web::get().to(party::get_party))
            .route("/{party_id}/leave", web::post().to(party::leave_party))
            .route("/{party_id}/cart", web::get().to(party::get_party_cart))
            .route("/{party_id}/cart", web::post().to(party::add_to_party_cart))
            .route("/{party_id}/cart", web::delete().to(party::clear_party_cart))
            .route(
                "/{party_id}/cart/{product_id}",
                web::delete().to(party::remove_from_party_cart),
            ),
    )
    .service(
        web::scope("/cart")
            .route("/{user_id}", web::get().to(cart::get_cart))
            .route("/{user_id}", web::post().to(cart::add_to_cart))
            .route("/{user_id}", web::delete().to(cart::clear_cart))
            .route(
                "/{user_id}/{product_id}",
                web::delete().to(cart::remove_from_cart),
            ),
    )
    .route("/events", web::get().to(events::stream_events));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
