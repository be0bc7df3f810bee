use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::OrderItemRequest;

/// A table accepts at most this many reservations per calendar date.
pub const MAX_RESERVATIONS_PER_DAY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: Uuid,
    pub number: i32,
    pub capacity: i32,
}

/// Half-open `[start, end)` interval within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::InvalidInput(format!(
                "reservation must end after it starts ({start} - {end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Back-to-back windows (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub table_id: Uuid,
    pub table_number: i32,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub guest_count: i32,
    pub confirmed_at: DateTime<Utc>,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub table_number: Option<i32>,
    pub guest_count: i32,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub user_id: Uuid,
    pub order_items: Option<Vec<OrderItemRequest>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOverview {
    pub table: Table,
    pub reservations: Vec<Reservation>,
}

/// Checks the per-day cap and interval overlap against the reservations already held by a
/// table on the requested date.
pub fn check_availability(
    table: &Table,
    date: NaiveDate,
    window: &TimeWindow,
    existing: &[Reservation],
) -> Result<(), DomainError> {
    if existing.len() >= MAX_RESERVATIONS_PER_DAY {
        return Err(DomainError::CapacityReached {
            table_number: table.number,
            date,
        });
    }
    if existing.iter().any(|r| r.window.overlaps(window)) {
        return Err(DomainError::TimeConflict(table.number));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: NaiveTime, end: NaiveTime) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    fn table() -> Table {
        Table {
            id: Uuid::new_v4(),
            number: 7,
            capacity: 4,
        }
    }

    fn reservation(table: &Table, date: NaiveDate, w: TimeWindow) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            table_id: table.id,
            table_number: table.number,
            user_id: Uuid::new_v4(),
            date,
            window: w,
            guest_count: 2,
            confirmed_at: Utc::now(),
            order_id: None,
        }
    }

    #[test]
    fn partial_overlap_is_detected() {
        let noon = window(t(12, 0), t(13, 0));
        assert!(noon.overlaps(&window(t(11, 30), t(12, 30))));
        assert!(noon.overlaps(&window(t(12, 30), t(13, 30))));
    }

    #[test]
    fn containment_is_an_overlap() {
        let noon = window(t(12, 0), t(13, 0));
        assert!(noon.overlaps(&window(t(11, 0), t(14, 0))));
        assert!(noon.overlaps(&window(t(12, 15), t(12, 45))));
    }

    #[test]
    fn back_to_back_windows_do_not_overlap() {
        let noon = window(t(12, 0), t(13, 0));
        assert!(!noon.overlaps(&window(t(13, 0), t(14, 0))));
        assert!(!noon.overlaps(&window(t(11, 0), t(12, 0))));
    }

    #[test]
    fn empty_or_inverted_window_is_rejected() {
        assert!(TimeWindow::new(t(12, 0), t(12, 0)).is_err());
        assert!(TimeWindow::new(t(13, 0), t(12, 0)).is_err());
    }

    #[test]
    fn sixth_reservation_of_the_day_hits_the_cap() {
        let table = table();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let existing: Vec<_> = (8..13)
            .map(|h| reservation(&table, date, window(t(h, 0), t(h, 30))))
            .collect();

        let err = check_availability(&table, date, &window(t(20, 0), t(21, 0)), &existing)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::CapacityReached {
                table_number: 7,
                date
            }
        );
    }

    #[test]
    fn overlap_with_existing_reservation_conflicts() {
        let table = table();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let existing = vec![reservation(&table, date, window(t(12, 0), t(13, 0)))];

        assert_eq!(
            check_availability(&table, date, &window(t(11, 30), t(12, 30)), &existing),
            Err(DomainError::TimeConflict(7))
        );
        assert!(check_availability(&table, date, &window(t(13, 0), t(14, 0)), &existing).is_ok());
    }
}
