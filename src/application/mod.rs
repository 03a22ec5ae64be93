pub mod cleanup;
pub mod order_service;
