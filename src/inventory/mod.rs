//! Warehouse entities: categories, products, and the inbound and outbound
//! stock ledgers.

mod category;
mod product;
mod transaction;

pub use category::{Category, CategoryDraft};
pub use product::{Product, ProductDraft};
pub use transaction::{Dated, MovementDraft, StockIn, StockMovement, StockOut};
