use std::sync::Arc;

use crate::application::cart_service::CartService;
use crate::application::order_service::OrderService;
use crate::application::party_service::PartyService;
use crate::application::reservation_service::ReservationService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::domain::ports::{
    CatalogRepository, Clock, EphemeralStore, IdentityProvider, OrderRepository,
    PaymentGateway, ReservationRepository, TableRepository,
};
use crate::infrastructure::catalog_repo::DieselCatalogRepository;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::ephemeral::InMemoryEphemeralStore;
use crate::infrastructure::identity::JwtIdentityProvider;
use crate::infrastructure::memory::{
    InMemoryCatalog, InMemoryOrderRepository, InMemoryReservationRepository,
};
use crate::infrastructure::notifier::BroadcastNotifier;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::reservation_repo::DieselReservationRepository;

/// Services shared by every worker of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub reservations: Arc<ReservationService>,
    pub parties: Arc<PartyService>,
    pub carts: Arc<CartService>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Card payments captured through an external provider; `None` when none is configured.
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub notifier: Arc<BroadcastNotifier>,
}

struct Stores {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    tables: Arc<dyn TableRepository>,
    reservations: Arc<dyn ReservationRepository>,
    ephemeral: Arc<dyn EphemeralStore>,
}

impl AppState {
    /// Durable data in Postgres; parties and carts in `ephemeral`, normally Redis.
    pub fn postgres(pool: DbPool, ephemeral: Arc<dyn EphemeralStore>, config: &AppConfig) -> Self {
        let reservations = Arc::new(DieselReservationRepository::new(pool.clone()));
        Self::assemble(
            Stores {
                orders: Arc::new(DieselOrderRepository::new(pool.clone())),
                catalog: Arc::new(DieselCatalogRepository::new(pool)),
                tables: reservations.clone(),
                reservations,
                ephemeral,
            },
            config,
        )
    }

    /// Everything in process memory. The catalog is returned so callers can seed the menu.
    pub fn in_memory(config: &AppConfig) -> (Self, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let reservations = Arc::new(InMemoryReservationRepository::new());
        let state = Self::assemble(
            Stores {
                orders: Arc::new(InMemoryOrderRepository::new()),
                catalog: catalog.clone(),
                tables: reservations.clone(),
                reservations,
                ephemeral: Arc::new(InMemoryEphemeralStore::new()),
            },
            config,
        );
        (state, catalog)
    }

    pub fn with_payments(self, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            payments: Some(gateway),
            ..self
        }
    }

    fn assemble(stores: Stores, config: &AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(JwtIdentityProvider::new(config.jwt.clone()));
        let store = stores.ephemeral;
        let notifier = Arc::new(BroadcastNotifier::new(config.event_channel_capacity));

        let orders = Arc::new(OrderService::new(
            stores.orders,
            stores.catalog.clone(),
            identity.clone(),
            clock.clone(),
        ));
        let reservations = Arc::new(ReservationService::new(
            stores.tables,
            stores.reservations,
            orders.clone(),
            identity.clone(),
            clock.clone(),
        ));
        let parties = Arc::new(PartyService::new(
            store.clone(),
            stores.catalog.clone(),
            notifier.clone(),
            config.cart_ttl,
        ));
        let carts = Arc::new(CartService::new(
            store,
            stores.catalog,
            notifier.clone(),
            clock,
            config.cart_ttl,
        ));

        Self {
            orders,
            reservations,
            parties,
            carts,
            identity,
            payments: None,
            notifier,
        }
    }
}
