use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ingredient::Ingredient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Drink,
    Food,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductType::Drink => write!(f, "drink"),
            ProductType::Food => write!(f, "food"),
        }
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drink" => Ok(ProductType::Drink),
            "food" => Ok(ProductType::Food),
            _ => Err(format!(
                "Invalid product type '{}'. Valid options: drink, food",
                s
            )),
        }
    }
}

/// A packaging choice offered with a product (cup, box, bag).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackagingOption {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub additional_price: f64,
}

impl PackagingOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ingredients: Vec::new(),
            additional_price: 0.0,
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_additional_price(mut self, price: f64) -> Self {
        self.additional_price = price;
        self
    }
}

/// A sellable item defined by its recipe.
///
/// `cost_price` (HPP) is a snapshot derived from `ingredients` and the current
/// raw material prices. It is rewritten whenever either side changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub cost_price: f64,
    pub selling_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_toppings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packaging_options: Vec<PackagingOption>,
}

pub type Drink = Product;
pub type Food = Product;

impl Product {
    pub fn new(name: impl Into<String>, selling_price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ingredients: Vec::new(),
            cost_price: 0.0,
            selling_price,
            image_uri: None,
            available_toppings: Vec::new(),
            packaging_options: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_toppings(mut self, toppings: Vec<String>) -> Self {
        self.available_toppings = toppings;
        self
    }

    pub fn with_packaging(mut self, options: Vec<PackagingOption>) -> Self {
        self.packaging_options = options;
        self
    }

    pub fn with_image_uri(mut self, uri: impl Into<String>) -> Self {
        self.image_uri = Some(uri.into());
        self
    }

    pub fn uses_material(&self, material_id: &str) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.raw_material_id == material_id)
    }

    pub fn packaging(&self, packaging_id: &str) -> Option<&PackagingOption> {
        self.packaging_options.iter().find(|p| p.id == packaging_id)
    }

    pub fn margin(&self) -> f64 {
        self.selling_price - self.cost_price
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Price: {}", self.selling_price)?;
        writeln!(f, "Cost (HPP): {}", self.cost_price)?;
        writeln!(f, "Margin: {}", self.margin())?;

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.available_toppings.is_empty() {
            writeln!(f, "\nToppings: {}", self.available_toppings.join(", "))?;
        }

        if !self.packaging_options.is_empty() {
            writeln!(f, "\nPackaging:")?;
            for option in &self.packaging_options {
                writeln!(f, "  - {} (+{})", option.name, option.additional_price)?;
            }
        }

        Ok(())
    }
}
