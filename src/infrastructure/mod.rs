pub mod identity;
pub mod memory_store;
pub mod models;
pub mod order_store;
pub mod steadfast;
