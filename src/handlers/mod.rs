pub mod common;
pub mod inventory;
pub mod products;
pub mod transactions;
