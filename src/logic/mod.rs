//! Business rules over a loaded [`DbData`](crate::models::DbData) document.
//!
//! Everything here is pure: callers load the document, apply these functions
//! and persist the result.

mod cascade;
mod costing;
mod guards;
mod stock;

pub use cascade::recalculate_dependent_product_costs;
pub use costing::calculate_item_cost_price;
pub use guards::{
    has_associated_sales, has_drink_associated_sales, has_food_associated_sales,
    is_raw_material_in_use, is_raw_material_referenced,
};
pub use stock::{deduct_stock, restock, sale_requirements, StockShortage};
