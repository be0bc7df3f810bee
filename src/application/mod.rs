pub mod cart_service;
pub mod order_service;
pub mod party_service;
pub mod reservation_service;
