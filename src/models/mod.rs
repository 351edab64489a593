mod db_data;
mod ingredient;
mod operational_cost;
mod product;
mod raw_material;
mod sale;

pub use db_data::DbData;
pub use ingredient::Ingredient;
pub use operational_cost::{OperationalCost, Recurrence};
pub use product::{Drink, Food, PackagingOption, Product, ProductType};
pub use raw_material::{MaterialCategory, RawMaterial};
pub use sale::Sale;
