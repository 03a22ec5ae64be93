pub mod blocking_store;
pub mod cart_client;
pub mod memory_repo;
pub mod models;
pub mod order_repo;
