//! Process-local adapters for the persistent ports, selected with `APP_STORAGE=memory` and
//! used throughout the test suite. They honour the same contracts as the Diesel adapters.

use chrono::NaiveDate;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderStatus, VersionToken, Versioned};
use crate::domain::ports::{
    CatalogRepository, OrderRepository, ReservationRepository, TableRepository,
};
use crate::domain::reservation::{Reservation, Table};

#[derive(Debug, Clone)]
struct StoredOrder {
    order: Order,
    version: VersionToken,
}

/// Orders kept in insertion order; "most recent" means last inserted.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<StoredOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn table_taken(orders: &[StoredOrder], table_number: i32, except: Option<Uuid>) -> bool {
    orders.iter().any(|s| {
        s.order.table_number == table_number
            && s.order.status.is_active()
            && Some(s.order.id) != except
    })
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, new: NewOrder) -> Result<Order, DomainError> {
        let mut orders = self.orders.lock();
        if new.order.status.is_active() && table_taken(&orders, new.order.table_number, None) {
            return Err(DomainError::DuplicateActiveOrder(new.order.table_number));
        }
        orders.push(StoredOrder {
            order: new.order.clone(),
            version: new.version,
        });
        Ok(new.order)
    }

    fn load(&self, id: Uuid) -> Result<Option<Versioned<Order>>, DomainError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .find(|s| s.order.id == id)
            .map(|s| Versioned {
                value: s.order.clone(),
                version: s.version.clone(),
            }))
    }

    fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: &VersionToken,
        status: OrderStatus,
    ) -> Result<Option<VersionToken>, DomainError> {
        let mut orders = self.orders.lock();
        let Some(stored) = orders.iter_mut().find(|s| s.order.id == id) else {
            return Ok(None);
        };
        if &stored.version != expected {
            return Ok(None);
        }
        stored.order.status = status;
        stored.version = VersionToken::fresh();
        Ok(Some(stored.version.clone()))
    }

    fn set_status_unless(
        &self,
        id: Uuid,
        status: OrderStatus,
        protected: OrderStatus,
    ) -> Result<bool, DomainError> {
        let mut orders = self.orders.lock();
        match orders.iter_mut().find(|s| s.order.id == id) {
            Some(stored) if stored.order.status != protected => {
                stored.order.status = status;
                stored.version = VersionToken::fresh();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update_table_number(
        &self,
        id: Uuid,
        table_number: i32,
    ) -> Result<Option<Order>, DomainError> {
        let mut orders = self.orders.lock();
        let Some(index) = orders.iter().position(|s| s.order.id == id) else {
            return Ok(None);
        };
        if orders[index].order.status.is_active() && table_taken(&orders, table_number, Some(id))
        {
            return Err(DomainError::DuplicateActiveOrder(table_number));
        }
        let stored = &mut orders[index];
        stored.order.table_number = table_number;
        stored.version = VersionToken::fresh();
        Ok(Some(stored.order.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut orders = self.orders.lock();
        let before = orders.len();
        orders.retain(|s| s.order.id != id);
        Ok(orders.len() != before)
    }

    fn find_active_by_table(&self, table_number: i32) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .find(|s| s.order.table_number == table_number && s.order.status.is_active())
            .map(|s| s.order.clone()))
    }

    fn find_active_by_user(&self, user_id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .rev()
            .find(|s| s.order.user_id == user_id && s.order.status.is_active())
            .map(|s| s.order.clone()))
    }

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .rev()
            .filter(|s| s.order.user_id == user_id)
            .map(|s| s.order.clone())
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .rev()
            .map(|s| s.order.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<Vec<Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().push(product);
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut products = self.products.lock();
        let before = products.len();
        products.retain(|p| p.id != id);
        products.len() != before
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn find_by_names(&self, names: &[String]) -> Result<Vec<Product>, DomainError> {
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| names.iter().any(|n| p.has_name(n)))
            .cloned()
            .collect())
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

/// Tables and their reservations, kept together the way the relational schema cascades them.
#[derive(Default)]
pub struct InMemoryReservationRepository {
    tables: Mutex<Vec<Table>>,
    reservations: Mutex<Vec<Reservation>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableRepository for InMemoryReservationRepository {
    fn create(&self, number: i32, capacity: i32) -> Result<Table, DomainError> {
        let mut tables = self.tables.lock();
        if tables.iter().any(|t| t.number == number) {
            return Err(DomainError::InvalidInput(format!(
                "table {number} already exists"
            )));
        }
        let table = Table {
            id: Uuid::new_v4(),
            number,
            capacity,
        };
        tables.push(table.clone());
        Ok(table)
    }

    fn find_seating(
        &self,
        guest_count: i32,
        number: Option<i32>,
    ) -> Result<Option<Table>, DomainError> {
        Ok(self
            .tables
            .lock()
            .iter()
            .filter(|t| t.capacity >= guest_count)
            .filter(|t| number.map_or(true, |n| t.number == n))
            .min_by_key(|t| t.number)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Table>, DomainError> {
        let mut tables = self.tables.lock().clone();
        tables.sort_by_key(|t| t.number);
        Ok(tables)
    }
}

impl ReservationRepository for InMemoryReservationRepository {
    fn insert(&self, reservation: Reservation) -> Result<Reservation, DomainError> {
        self.reservations.lock().push(reservation.clone());
        Ok(reservation)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        Ok(self
            .reservations
            .lock()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn for_table_on(
        &self,
        table_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, DomainError> {
        Ok(self
            .reservations
            .lock()
            .iter()
            .filter(|r| r.table_id == table_id && r.date == date)
            .cloned()
            .collect())
    }

    fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, DomainError> {
        Ok(self
            .reservations
            .lock()
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    fn update(&self, reservation: &Reservation) -> Result<bool, DomainError> {
        let mut reservations = self.reservations.lock();
        match reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(existing) => {
                *existing = reservation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut reservations = self.reservations.lock();
        let before = reservations.len();
        reservations.retain(|r| r.id != id);
        Ok(reservations.len() != before)
    }

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, DomainError> {
        Ok(self
            .reservations
            .lock()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Reservation>, DomainError> {
        Ok(self.reservations.lock().clone())
    }
}
