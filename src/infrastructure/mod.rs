pub mod catalog_repo;
pub mod clock;
pub mod ephemeral;
pub mod identity;
pub mod memory;
pub mod models;
pub mod notifier;
pub mod order_repo;
pub mod payments;
pub mod redis_store;
pub mod reservation_repo;

#[cfg(test)]
pub(crate) mod test_db;
