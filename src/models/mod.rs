//! Entities read from the AdventureWorks database.

mod product;

pub use product::ProductCategoryPrice;
