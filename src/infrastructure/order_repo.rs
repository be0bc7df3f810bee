use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderStatus, VersionToken, Versioned};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// The partial unique index on `orders.table_number` is the last line of defence against
/// two active orders on one table.
fn table_conflict(table_number: i32) -> impl Fn(DieselError) -> DomainError {
    move |e| match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::DuplicateActiveOrder(table_number)
        }
        other => other.into(),
    }
}

fn settled_statuses() -> Vec<&'static str> {
    OrderStatus::SETTLED.iter().map(|s| s.as_str()).collect()
}

fn items_of(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItemRow>, DomainError> {
    Ok(order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::position.asc())
        .select(OrderItemRow::as_select())
        .load(conn)?)
}

fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let items = OrderItemRow::belonging_to(&rows)
        .order(order_items::position.asc())
        .select(OrderItemRow::as_select())
        .load::<OrderItemRow>(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(items)
        .map(|(row, items)| row.into_order(items))
        .collect()
}

fn load_versioned(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Versioned<Order>>, DomainError> {
    let row = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    let items = items_of(conn, row.id)?;
    row.into_versioned(items).map(Some)
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn insert(&self, new: NewOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let NewOrder { order, version } = new;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order.id,
                    user_id: order.user_id,
                    table_number: order.table_number,
                    total_price: order.total_price.clone(),
                    status: order.status.as_str().to_string(),
                    version: version.as_bytes().to_vec(),
                    confirmed_at: order.confirmed_at,
                })
                .execute(conn)
                .map_err(table_conflict(order.table_number))?;

            let rows: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .enumerate()
                .map(|(position, item)| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    product_id: item.product_id,
                    position: position as i32,
                    quantity: item.quantity,
                    unit_price: item.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&rows)
                .execute(conn)?;

            Ok(())
        })?;

        Ok(order)
    }

    fn load(&self, id: Uuid) -> Result<Option<Versioned<Order>>, DomainError> {
        let mut conn = self.pool.get()?;
        load_versioned(&mut conn, id)
    }

    fn compare_and_swap_status(
        &self,
        id: Uuid,
        expected: &VersionToken,
        status: OrderStatus,
    ) -> Result<Option<VersionToken>, DomainError> {
        let mut conn = self.pool.get()?;
        let next = VersionToken::fresh();

        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::version.eq(expected.as_bytes().to_vec())),
        )
        .set((
            orders::status.eq(status.as_str()),
            orders::version.eq(next.as_bytes().to_vec()),
            orders::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok((updated == 1).then_some(next))
    }

    fn set_status_unless(
        &self,
        id: Uuid,
        status: OrderStatus,
        protected: OrderStatus,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::status.ne(protected.as_str())),
        )
        .set((
            orders::status.eq(status.as_str()),
            orders::version.eq(VersionToken::fresh().as_bytes().to_vec()),
            orders::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(updated == 1)
    }

    fn update_table_number(
        &self,
        id: Uuid,
        table_number: i32,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::table_number.eq(table_number),
                    orders::version.eq(VersionToken::fresh().as_bytes().to_vec()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(table_conflict(table_number))?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(load_versioned(conn, id)?.map(|v| v.value))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(orders::table.filter(orders::id.eq(id))).execute(&mut conn)?;
        Ok(deleted == 1)
    }

    fn find_active_by_table(&self, table_number: i32) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::table_number.eq(table_number))
            .filter(orders::status.ne_all(settled_statuses()))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => {
                let items = items_of(&mut conn, row.id)?;
                row.into_order(items).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_active_by_user(&self, user_id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.ne_all(settled_statuses()))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => {
                let items = items_of(&mut conn, row.id)?;
                row.into_order(items).map(Some)
            }
            None => Ok(None),
        }
    }

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        with_items(&mut conn, rows)
    }

    fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        with_items(&mut conn, rows)
    }
}
