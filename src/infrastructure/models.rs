use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{Product, ProductTranslation};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderStatus, VersionToken, Versioned};
use crate::domain::reservation::{Reservation, Table, TimeWindow};
use crate::schema::{
    dining_tables, order_items, orders, product_translations, products, reservations,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = dining_tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TableRow {
    pub id: Uuid,
    pub number: i32,
    pub capacity: i32,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        Table {
            id: row.id,
            number: row.number,
            capacity: row.capacity,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(table_name = product_translations)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductTranslationRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub language_code: String,
    pub name: String,
    pub description: String,
}

impl ProductRow {
    pub fn into_product(self, translations: Vec<ProductTranslationRow>) -> Product {
        Product {
            id: self.id,
            price: self.price,
            category: self.category,
            image_url: self.image_url,
            translations: translations
                .into_iter()
                .map(|t| ProductTranslation {
                    language_code: t.language_code,
                    name: t.name,
                    description: t.description,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_number: i32,
    pub total_price: BigDecimal,
    pub status: String,
    pub version: Vec<u8>,
    pub confirmed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_number: i32,
    pub total_price: BigDecimal,
    pub status: String,
    pub version: Vec<u8>,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderRow {
    pub fn into_versioned(
        self,
        items: Vec<OrderItemRow>,
    ) -> Result<Versioned<Order>, DomainError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e: DomainError| DomainError::Internal(e.to_string()))?;
        Ok(Versioned {
            value: Order {
                id: self.id,
                user_id: self.user_id,
                table_number: self.table_number,
                items: items
                    .into_iter()
                    .map(|i| OrderItem {
                        product_id: i.product_id,
                        quantity: i.quantity,
                        unit_price: i.unit_price,
                    })
                    .collect(),
                total_price: self.total_price,
                status,
                confirmed_at: self.confirmed_at,
            },
            version: VersionToken::from_bytes(self.version),
        })
    }

    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        Ok(self.into_versioned(items)?.value)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: Uuid,
    pub table_id: Uuid,
    pub user_id: Uuid,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub guest_count: i32,
    pub confirmed_at: DateTime<Utc>,
    pub order_id: Option<Uuid>,
}

impl ReservationRow {
    pub fn from_domain(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id,
            table_id: reservation.table_id,
            user_id: reservation.user_id,
            reservation_date: reservation.date,
            start_time: reservation.window.start(),
            end_time: reservation.window.end(),
            guest_count: reservation.guest_count,
            confirmed_at: reservation.confirmed_at,
            order_id: reservation.order_id,
        }
    }

    pub fn into_reservation(self, table_number: i32) -> Result<Reservation, DomainError> {
        let window = TimeWindow::new(self.start_time, self.end_time)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Reservation {
            id: self.id,
            table_id: self.table_id,
            table_number,
            user_id: self.user_id,
            date: self.reservation_date,
            window,
            guest_count: self.guest_count,
            confirmed_at: self.confirmed_at,
            order_id: self.order_id,
        })
    }
}
