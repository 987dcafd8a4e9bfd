pub mod inventory;
pub mod product;
pub mod stock_transaction;
