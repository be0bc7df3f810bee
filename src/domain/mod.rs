pub mod catalog;
pub mod errors;
pub mod events;
pub mod identity;
pub mod order;
pub mod party;
pub mod ports;
pub mod reservation;
