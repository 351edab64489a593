use serde::{Deserialize, Serialize};
use std::fmt;

/// A recipe line: how much of a raw material goes into one unit of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub raw_material_id: String,
    pub quantity: f64,
}

impl Ingredient {
    pub fn new(raw_material_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            raw_material_id: raw_material_id.into(),
            quantity,
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.quantity, self.raw_material_id)
    }
}
