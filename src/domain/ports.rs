use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::catalog::Product;
use super::errors::DomainError;
use super::events::CartEvent;
use super::identity::Identity;
use super::order::{NewOrder, Order, OrderStatus, VersionToken, Versioned};
use super::reservation::{Reservation, Table};

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a new order with its items. Fails with `DuplicateActiveOrder` when the
    /// table already holds an active order.
    fn insert(&self, order: NewOrder) -> Result<Order, DomainError>;

    fn load(&self, id: Uuid) -> Result<Option<Versioned<Order>>, DomainError>;

    /// Writes `status` only if the stored version still equals `expected`. Returns the new
    /// version on success and `None` when another writer got there first.
    fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: &VersionToken,
        status: OrderStatus,
    ) -> Result<Option<VersionToken>, DomainError>;

    /// Unconditional status write that still refuses to overwrite `protected`. Returns false
    /// when the order is missing or already in `protected`.
    fn set_status_unless(
        &self,
        id: Uuid,
        status: OrderStatus,
        protected: OrderStatus,
    ) -> Result<bool, DomainError>;

    fn update_table_number(&self, id: Uuid, table_number: i32)
        -> Result<Option<Order>, DomainError>;

    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    fn find_active_by_table(&self, table_number: i32) -> Result<Option<Order>, DomainError>;

    /// Most recent active order of a user.
    fn find_active_by_user(&self, user_id: Uuid) -> Result<Option<Order>, DomainError>;

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;

    fn list_all(&self) -> Result<Vec<Order>, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    /// Every product carrying a translation whose name is one of `names`.
    fn find_by_names(&self, names: &[String]) -> Result<Vec<Product>, DomainError>;

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
}

pub trait TableRepository: Send + Sync + 'static {
    fn create(&self, number: i32, capacity: i32) -> Result<Table, DomainError>;

    /// Lowest-numbered table seating at least `guest_count`, optionally restricted to the
    /// table with `number`.
    fn find_seating(
        &self,
        guest_count: i32,
        number: Option<i32>,
    ) -> Result<Option<Table>, DomainError>;

    fn list(&self) -> Result<Vec<Table>, DomainError>;
}

pub trait ReservationRepository: Send + Sync + 'static {
    fn insert(&self, reservation: Reservation) -> Result<Reservation, DomainError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError>;

    fn for_table_on(&self, table_id: Uuid, date: NaiveDate)
        -> Result<Vec<Reservation>, DomainError>;

    fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, DomainError>;

    fn update(&self, reservation: &Reservation) -> Result<bool, DomainError>;

    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, DomainError>;

    fn list_all(&self) -> Result<Vec<Reservation>, DomainError>;
}

/// TTL-capable key-value store holding string blobs and string lists. Writes are
/// last-writer-wins; only `set_if_absent` is conditional.
pub trait EphemeralStore: Send + Sync + 'static {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DomainError>;

    /// Returns false, writing nothing, when `key` already exists.
    fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, DomainError>;

    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    fn delete(&self, key: &str) -> Result<bool, DomainError>;

    fn exists(&self, key: &str) -> Result<bool, DomainError>;

    /// Sets the remaining lifetime of an existing key; false when the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Remaining lifetime, `None` for a missing or persistent key.
    fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Appends to the tail, creating the list when needed. Returns the new length.
    fn list_push(&self, key: &str, value: String) -> Result<usize, DomainError>;

    fn list_range(&self, key: &str) -> Result<Vec<String>, DomainError>;

    /// Removes up to `count` occurrences of `value` from the head side. A list emptied this
    /// way disappears. Returns the number removed.
    fn list_remove(&self, key: &str, value: &str, count: usize) -> Result<usize, DomainError>;

    fn list_len(&self, key: &str) -> Result<usize, DomainError>;
}

pub trait IdentityProvider: Send + Sync + 'static {
    fn resolve(&self, token: &str) -> Result<Identity, DomainError>;
}

/// External payment provider. Capturing settles a payment the payer already approved at the
/// provider and yields the provider's capture id.
pub trait PaymentGateway: Send + Sync + 'static {
    fn capture<'a>(&'a self, provider_order_id: &'a str)
        -> BoxFuture<'a, Result<String, DomainError>>;
}

/// Fire-and-forget fan-out; implementations swallow delivery failures.
pub trait Notifier: Send + Sync + 'static {
    fn publish(&self, event: CartEvent);
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
