use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::identity::Visibility;
use crate::domain::order::{CreateOrder, OrderItemRequest};
use crate::domain::ports::{Clock, IdentityProvider, ReservationRepository, TableRepository};
use crate::domain::reservation::{
    check_availability, Reservation, ReservationRequest, Table, TableOverview, TimeWindow,
};

use super::order_service::OrderService;

pub struct ReservationService {
    tables: Arc<dyn TableRepository>,
    reservations: Arc<dyn ReservationRepository>,
    orders: Arc<OrderService>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    pub fn new(
        tables: Arc<dyn TableRepository>,
        reservations: Arc<dyn ReservationRepository>,
        orders: Arc<OrderService>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tables,
            reservations,
            orders,
            identity,
            clock,
        }
    }

    pub fn create_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<Reservation, DomainError> {
        let window = TimeWindow::new(request.start, request.end)?;
        let table = self.select_table(request.guest_count, request.table_number)?;

        let existing = self.reservations.for_table_on(table.id, request.date)?;
        if let Err(e) = check_availability(&table, request.date, &window, &existing) {
            log::warn!(
                "Reservation on table {} for {} rejected: {e}",
                table.number,
                request.date
            );
            return Err(e);
        }

        let order_id = match real_items(request.order_items) {
            Some(items) => {
                let order = self.orders.create_order(CreateOrder {
                    table_number: table.number,
                    user_id: request.user_id,
                    items,
                })?;
                Some(order.id)
            }
            None => None,
        };

        let inserted = self.reservations.insert(Reservation {
            id: Uuid::new_v4(),
            table_id: table.id,
            table_number: table.number,
            user_id: request.user_id,
            date: request.date,
            window,
            guest_count: request.guest_count,
            confirmed_at: self.clock.now(),
            order_id,
        });
        let reservation = match inserted {
            Ok(reservation) => reservation,
            Err(e) => {
                if let Some(order_id) = order_id {
                    self.discard_pre_order(order_id);
                }
                return Err(e);
            }
        };

        log::info!(
            "Reserved table {} on {} {}-{} for {}",
            table.number,
            reservation.date,
            window.start(),
            window.end(),
            reservation.user_id
        );
        Ok(reservation)
    }

    /// Re-seats and re-times a reservation. The same cap and overlap rules apply, judged
    /// against every other reservation of the chosen table that day.
    pub fn edit_reservation(
        &self,
        id: Uuid,
        request: ReservationRequest,
    ) -> Result<Reservation, DomainError> {
        let current = self
            .reservations
            .find_by_id(id)?
            .ok_or(DomainError::ReservationNotFound(id))?;
        let window = TimeWindow::new(request.start, request.end)?;
        let table = self.select_table(request.guest_count, request.table_number)?;

        let others: Vec<Reservation> = self
            .reservations
            .for_table_on(table.id, request.date)?
            .into_iter()
            .filter(|r| r.id != id)
            .collect();
        check_availability(&table, request.date, &window, &others)?;

        let updated = Reservation {
            table_id: table.id,
            table_number: table.number,
            date: request.date,
            window,
            guest_count: request.guest_count,
            ..current
        };
        if !self.reservations.update(&updated)? {
            return Err(DomainError::ReservationNotFound(id));
        }
        log::info!("Updated reservation {id}");
        Ok(updated)
    }

    pub fn delete_reservation(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.reservations.delete(id)? {
            return Err(DomainError::ReservationNotFound(id));
        }
        log::info!("Deleted reservation {id}");
        Ok(())
    }

    pub fn get_all_reservations(&self, token: &str) -> Result<Vec<Reservation>, DomainError> {
        let identity = self.identity.resolve(token)?;
        match Visibility::for_identity(&identity) {
            Visibility::All => self.reservations.list_all(),
            Visibility::OwnedBy(user_id) => self.reservations.list_by_user(user_id),
        }
    }

    pub fn create_table(&self, number: i32, capacity: i32) -> Result<Table, DomainError> {
        if capacity <= 0 {
            return Err(DomainError::InvalidInput(
                "table capacity must be positive".to_string(),
            ));
        }
        self.tables.create(number, capacity)
    }

    pub fn list_tables(&self, date: NaiveDate) -> Result<Vec<TableOverview>, DomainError> {
        let reservations = self.reservations.on_date(date)?;
        Ok(self
            .tables
            .list()?
            .into_iter()
            .map(|table| TableOverview {
                reservations: reservations
                    .iter()
                    .filter(|r| r.table_id == table.id)
                    .cloned()
                    .collect(),
                table,
            })
            .collect())
    }

    /// A pre-order whose reservation was never stored would hold its table forever.
    fn discard_pre_order(&self, order_id: Uuid) {
        match self.orders.delete_order(order_id) {
            Ok(()) => log::warn!("Discarded pre-order {order_id} of a failed reservation"),
            Err(e) => log::error!("Pre-order {order_id} left behind by a failed reservation: {e}"),
        }
    }

    fn select_table(
        &self,
        guest_count: i32,
        table_number: Option<i32>,
    ) -> Result<Table, DomainError> {
        if guest_count <= 0 {
            return Err(DomainError::InvalidInput(
                "guest count must be positive".to_string(),
            ));
        }
        self.tables
            .find_seating(guest_count, table_number)?
            .ok_or(DomainError::TableNotFound)
    }
}

/// Pre-orders attached to a reservation count only if at least one row is real.
fn real_items(items: Option<Vec<OrderItemRequest>>) -> Option<Vec<OrderItemRequest>> {
    let items: Vec<_> = items?
        .into_iter()
        .filter(|i| !i.is_placeholder())
        .collect();
    (!items.is_empty()).then_some(items)
}
