use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::operational_cost::OperationalCost;
use super::product::{Drink, Food, Product, ProductType};
use super::raw_material::RawMaterial;
use super::sale::Sale;

/// The whole business document. Every backend reads and writes it as a unit.
///
/// Top-level keys this crate does not model (`user`, `username`, ...) are kept
/// in `extra` so a write-back does not drop them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DbData {
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,
    #[serde(default)]
    pub drinks: Vec<Drink>,
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub operational_costs: Vec<OperationalCost>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DbData {
    pub fn products(&self, product_type: ProductType) -> &Vec<Product> {
        match product_type {
            ProductType::Drink => &self.drinks,
            ProductType::Food => &self.foods,
        }
    }

    pub fn products_mut(&mut self, product_type: ProductType) -> &mut Vec<Product> {
        match product_type {
            ProductType::Drink => &mut self.drinks,
            ProductType::Food => &mut self.foods,
        }
    }

    pub fn product(&self, product_type: ProductType, id: &str) -> Option<&Product> {
        self.products(product_type).iter().find(|p| p.id == id)
    }

    pub fn raw_material(&self, id: &str) -> Option<&RawMaterial> {
        self.raw_materials.iter().find(|m| m.id == id)
    }

    pub fn raw_material_mut(&mut self, id: &str) -> Option<&mut RawMaterial> {
        self.raw_materials.iter_mut().find(|m| m.id == id)
    }

    /// Drinks followed by foods, tagged with their type.
    pub fn all_products(&self) -> impl Iterator<Item = (ProductType, &Product)> {
        self.drinks
            .iter()
            .map(|p| (ProductType::Drink, p))
            .chain(self.foods.iter().map(|p| (ProductType::Food, p)))
    }
}
