use chrono::NaiveDate;
use diesel::dsl;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{ReservationRepository, TableRepository};
use crate::domain::reservation::{Reservation, Table};
use crate::schema::{dining_tables, reservations};

use super::models::{ReservationRow, TableRow};

type JoinedQuery =
    dsl::IntoBoxed<'static, dsl::InnerJoin<reservations::table, dining_tables::table>, Pg>;

/// Tables and their reservations share one Postgres-backed adapter.
pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load_joined<F>(&self, filter: F) -> Result<Vec<Reservation>, DomainError>
    where
        F: FnOnce(JoinedQuery) -> JoinedQuery,
    {
        let mut conn = self.pool.get()?;

        let rows: Vec<(ReservationRow, i32)> =
            filter(reservations::table.inner_join(dining_tables::table).into_boxed())
                .order((
                    reservations::reservation_date.asc(),
                    reservations::start_time.asc(),
                ))
                .select((ReservationRow::as_select(), dining_tables::number))
                .load(&mut conn)?;

        rows.into_iter()
            .map(|(row, number)| row.into_reservation(number))
            .collect()
    }
}

impl TableRepository for DieselReservationRepository {
    fn create(&self, number: i32, capacity: i32) -> Result<Table, DomainError> {
        let mut conn = self.pool.get()?;
        let row = TableRow {
            id: Uuid::new_v4(),
            number,
            capacity,
        };

        diesel::insert_into(dining_tables::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::InvalidInput(format!("table {number} already exists"))
                }
                other => other.into(),
            })?;

        Ok(row.into())
    }

    fn find_seating(
        &self,
        guest_count: i32,
        number: Option<i32>,
    ) -> Result<Option<Table>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = dining_tables::table
            .filter(dining_tables::capacity.ge(guest_count))
            .into_boxed();
        if let Some(number) = number {
            query = query.filter(dining_tables::number.eq(number));
        }

        let row = query
            .order(dining_tables::number.asc())
            .select(TableRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Table::from))
    }

    fn list(&self) -> Result<Vec<Table>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = dining_tables::table
            .order(dining_tables::number.asc())
            .select(TableRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Table::from).collect())
    }
}

impl ReservationRepository for DieselReservationRepository {
    fn insert(&self, reservation: Reservation) -> Result<Reservation, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(reservations::table)
            .values(&ReservationRow::from_domain(&reservation))
            .execute(&mut conn)?;
        Ok(reservation)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<(ReservationRow, i32)> = reservations::table
            .inner_join(dining_tables::table)
            .filter(reservations::id.eq(id))
            .select((ReservationRow::as_select(), dining_tables::number))
            .first(&mut conn)
            .optional()?;

        row.map(|(row, number)| row.into_reservation(number))
            .transpose()
    }

    fn for_table_on(
        &self,
        table_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, DomainError> {
        self.load_joined(|q| {
            q.filter(reservations::table_id.eq(table_id))
                .filter(reservations::reservation_date.eq(date))
        })
    }

    fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, DomainError> {
        self.load_joined(|q| q.filter(reservations::reservation_date.eq(date)))
    }

    fn update(&self, reservation: &Reservation) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(reservations::table.filter(reservations::id.eq(reservation.id)))
            .set((
                reservations::table_id.eq(reservation.table_id),
                reservations::reservation_date.eq(reservation.date),
                reservations::start_time.eq(reservation.window.start()),
                reservations::end_time.eq(reservation.window.end()),
                reservations::guest_count.eq(reservation.guest_count),
                reservations::order_id.eq(reservation.order_id),
            ))
            .execute(&mut conn)?;
        Ok(updated == 1)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(reservations::table.filter(reservations::id.eq(id)))
            .execute(&mut conn)?;
        Ok(deleted == 1)
    }

    fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, DomainError> {
        self.load_joined(|q| q.filter(reservations::user_id.eq(user_id)))
    }

    fn list_all(&self) -> Result<Vec<Reservation>, DomainError> {
        self.load_joined(|q| q)
    }
}
