use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::events::CartEvent;
use crate::domain::party::keys;
use crate::domain::ports::{CatalogRepository, Clock, EphemeralStore, Notifier};

use super::party_service::{parse_ids, resolve_in_order};

#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub items: Vec<Product>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Per-user carts with the same inactivity window as party carts.
pub struct CartService {
    store: Arc<dyn EphemeralStore>,
    catalog: Arc<dyn CatalogRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cart_ttl: Duration,
}

impl CartService {
    pub fn new(
        store: Arc<dyn EphemeralStore>,
        catalog: Arc<dyn CatalogRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        cart_ttl: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            notifier,
            clock,
            cart_ttl,
        }
    }

    pub fn add_product(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        if self.catalog.find_by_ids(&[product_id])?.is_empty() {
            return Err(DomainError::ProductNotFound(product_id.to_string()));
        }

        self.store
            .list_push(&keys::user_cart(user_id), product_id.to_string())?;
        self.touch(user_id)?;

        self.notifier.publish(CartEvent::CartUpdated { user_id });
        Ok(())
    }

    pub fn get_cart(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let ids = parse_ids(self.store.list_range(&keys::user_cart(user_id))?);
        let items = resolve_in_order(self.catalog.as_ref(), &ids)?;
        let expires_at = self
            .store
            .get(&keys::user_cart_expiration(user_id))?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));
        Ok(CartView { items, expires_at })
    }

    /// Removes one occurrence. The window restarts only while the cart still holds items.
    pub fn remove_product(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let key = keys::user_cart(user_id);
        let removed = self.store.list_remove(&key, &product_id.to_string(), 1)?;
        if removed == 0 {
            return Err(DomainError::CartItemNotFound(product_id));
        }
        if self.store.list_len(&key)? > 0 {
            self.touch(user_id)?;
        }
        self.notifier.publish(CartEvent::CartUpdated { user_id });
        Ok(())
    }

    pub fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.store.delete(&keys::user_cart(user_id))?;
        self.store.delete(&keys::user_cart_expiration(user_id))?;
        self.notifier.publish(CartEvent::CartUpdated { user_id });
        Ok(())
    }

    /// Restarts the inactivity window of the cart and records when it will lapse.
    fn touch(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.store.expire(&keys::user_cart(user_id), self.cart_ttl)?;

        let ttl = chrono::Duration::from_std(self.cart_ttl)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let expires_at = self.clock.now() + ttl;
        // The marker outlives the cart so clients can tell "expired" from "never filled".
        self.store.set(
            &keys::user_cart_expiration(user_id),
            expires_at.to_rfc3339(),
            Some(self.cart_ttl * 2),
        )
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use parking_lot::Mutex;

    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::ephemeral::InMemoryEphemeralStore;
    use crate::infrastructure::memory::InMemoryCatalog;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<CartEvent>>,
    }

    impl Notifier for RecordingNotifier {
        fn publish(&self, event: CartEvent) {
            self.events.lock().push(event);
        }
    }

    struct Fixture {
        service: CartService,
        store: Arc<InMemoryEphemeralStore>,
        catalog: Arc<InMemoryCatalog>,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(InMemoryEphemeralStore::with_clock(clock.clone()));
        let catalog = Arc::new(InMemoryCatalog::new());
        let notifier = Arc::new(RecordingNotifier::default());
        Fixture {
            service: CartService::new(
                store.clone(),
                catalog.clone(),
                notifier.clone(),
                clock.clone(),
                Duration::from_secs(15 * 60),
            ),
            store,
            catalog,
            clock,
            notifier,
        }
    }

    fn product(catalog: &InMemoryCatalog) -> Uuid {
        let id = Uuid::new_v4();
        catalog.insert(Product {
            id,
            price: BigDecimal::from(7),
            category: "Desserts".to_string(),
            image_url: None,
            translations: Vec::new(),
        });
        id
    }

    #[test]
    fn add_records_expiration_and_notifies() {
        let f = fixture();
        let user = Uuid::new_v4();
        let cake = product(&f.catalog);

        f.service.add_product(user, cake).unwrap();

        let cart = f.service.get_cart(user).unwrap();
        assert_eq!(cart.items.len(), 1);
        let expected = f.clock.now() + chrono::Duration::minutes(15);
        assert_eq!(
            cart.expires_at.map(|t| t.timestamp()),
            Some(expected.timestamp())
        );
        assert_eq!(
            f.store.ttl(&keys::user_cart(user)).unwrap(),
            Some(Duration::from_secs(900))
        );
        assert_eq!(
            *f.notifier.events.lock(),
            vec![CartEvent::CartUpdated { user_id: user }]
        );
    }

    #[test]
    fn adding_unknown_product_fails() {
        let f = fixture();
        let missing = Uuid::new_v4();
        assert_eq!(
            f.service.add_product(Uuid::new_v4(), missing),
            Err(DomainError::ProductNotFound(missing.to_string()))
        );
    }

    #[test]
    fn cart_contents_expire_after_the_window() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.service.add_product(user, product(&f.catalog)).unwrap();

        f.clock.advance(chrono::Duration::minutes(16));

        let cart = f.service.get_cart(user).unwrap();
        assert!(cart.items.is_empty());
        assert!(cart.expires_at.is_some());
    }

    #[test]
    fn removing_absent_product_fails() {
        let f = fixture();
        let user = Uuid::new_v4();
        let cake = product(&f.catalog);
        f.service.add_product(user, cake).unwrap();

        let other = Uuid::new_v4();
        assert_eq!(
            f.service.remove_product(user, other),
            Err(DomainError::CartItemNotFound(other))
        );
        f.service.remove_product(user, cake).unwrap();
        assert!(f.service.get_cart(user).unwrap().items.is_empty());
    }

    #[test]
    fn removing_one_of_several_items_restarts_the_window() {
        let f = fixture();
        let user = Uuid::new_v4();
        let cake = product(&f.catalog);
        let tea = product(&f.catalog);
        f.service.add_product(user, cake).unwrap();
        f.service.add_product(user, tea).unwrap();

        f.clock.advance(chrono::Duration::minutes(10));
        f.service.remove_product(user, cake).unwrap();

        assert_eq!(
            f.store.ttl(&keys::user_cart(user)).unwrap(),
            Some(Duration::from_secs(900))
        );
        let cart = f.service.get_cart(user).unwrap();
        assert_eq!(cart.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![tea]);
        assert_eq!(
            cart.expires_at.map(|t| t.timestamp()),
            Some((f.clock.now() + chrono::Duration::minutes(15)).timestamp())
        );

        f.clock.advance(chrono::Duration::minutes(10));
        assert_eq!(f.service.get_cart(user).unwrap().items.len(), 1);
    }

    #[test]
    fn clear_drops_cart_and_marker() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.service.add_product(user, product(&f.catalog)).unwrap();

        f.service.clear(user).unwrap();

        assert_eq!(
            f.service.get_cart(user).unwrap(),
            CartView {
                items: Vec::new(),
                expires_at: None
            }
        );
    }
}
