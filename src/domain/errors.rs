use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Product '{0}' not found")]
    ProductNotFound(String),
    #[error("An order needs at least one item")]
    EmptyOrder,
    #[error("Table {0} already has an active order")]
    DuplicateActiveOrder(i32),
    #[error("Order {0} not found")]
    OrderNotFound(Uuid),
    #[error("Order {0} has been cancelled")]
    OrderCancelled(Uuid),
    #[error("Order {0} is already paid")]
    AlreadyPaid(Uuid),
    #[error("Order {0} was modified concurrently, re-read and retry")]
    ConcurrentModification(Uuid),
    #[error("No table found with enough capacity")]
    TableNotFound,
    #[error("Table {table_number} has reached maximum reservations for {date}")]
    CapacityReached { table_number: i32, date: NaiveDate },
    #[error("Table {0} is already reserved for this time period")]
    TimeConflict(i32),
    #[error("Reservation {0} not found")]
    ReservationNotFound(Uuid),
    #[error("Party not found")]
    PartyNotFound,
    #[error("Table {0} already has an active party")]
    TableAlreadyHasParty(i32),
    #[error("User {0} is already a member of this party")]
    AlreadyMember(Uuid),
    #[error("Cart of party {0} not found")]
    PartyCartNotFound(Uuid),
    #[error("Product {0} is not in the cart")]
    CartItemNotFound(Uuid),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable machine-readable identifier surfaced to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::ProductNotFound(_) => "ProductNotFound",
            DomainError::EmptyOrder => "EmptyOrder",
            DomainError::DuplicateActiveOrder(_) => "DuplicateActiveOrder",
            DomainError::OrderNotFound(_) => "OrderNotFound",
            DomainError::OrderCancelled(_) => "OrderCancelled",
            DomainError::AlreadyPaid(_) => "AlreadyPaid",
            DomainError::ConcurrentModification(_) => "ConcurrentModification",
            DomainError::TableNotFound => "TableNotFound",
            DomainError::CapacityReached { .. } => "CapacityReached",
            DomainError::TimeConflict(_) => "TimeConflict",
            DomainError::ReservationNotFound(_) => "ReservationNotFound",
            DomainError::PartyNotFound => "PartyNotFound",
            DomainError::TableAlreadyHasParty(_) => "TableAlreadyHasParty",
            DomainError::AlreadyMember(_) => "AlreadyMember",
            DomainError::PartyCartNotFound(_) => "PartyCartNotFound",
            DomainError::CartItemNotFound(_) => "CartItemNotFound",
            DomainError::InvalidInput(_) => "InvalidInput",
            DomainError::Unauthorized(_) => "Unauthorized",
            DomainError::Forbidden(_) => "Forbidden",
            DomainError::Internal(_) => "Internal",
        }
    }

    /// Only a lost compare-and-swap is worth retrying; every other failure is final
    /// for the current request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::ConcurrentModification(_))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("malformed ephemeral record: {e}"))
    }
}
