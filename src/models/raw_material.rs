use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Ingredient,
    Topping,
    Packaging,
    Other,
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialCategory::Ingredient => write!(f, "ingredient"),
            MaterialCategory::Topping => write!(f, "topping"),
            MaterialCategory::Packaging => write!(f, "packaging"),
            MaterialCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for MaterialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingredient" => Ok(MaterialCategory::Ingredient),
            "topping" => Ok(MaterialCategory::Topping),
            "packaging" => Ok(MaterialCategory::Packaging),
            "other" => Ok(MaterialCategory::Other),
            _ => Err(format!(
                "Invalid category '{}'. Valid options: ingredient, topping, packaging, other",
                s
            )),
        }
    }
}

/// An inventory item with a unit cost.
///
/// Stock is tracked only when `total_quantity` is set. `total_cost` follows
/// `total_quantity * cost_per_unit` after every stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub unit: String,
    pub cost_per_unit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MaterialCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<f64>,
}

impl RawMaterial {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, cost_per_unit: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            unit: unit.into(),
            cost_per_unit,
            total_quantity: None,
            total_cost: None,
            category: None,
            selling_price: None,
            low_stock_threshold: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_stock(mut self, quantity: f64) -> Self {
        self.total_quantity = Some(quantity);
        self.total_cost = Some(quantity * self.cost_per_unit);
        self
    }

    pub fn with_category(mut self, category: MaterialCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_selling_price(mut self, price: f64) -> Self {
        self.selling_price = Some(price);
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.total_quantity.is_some()
    }

    pub fn is_low_on_stock(&self) -> bool {
        match (self.total_quantity, self.low_stock_threshold) {
            (Some(quantity), Some(threshold)) => quantity <= threshold,
            _ => false,
        }
    }
}

impl fmt::Display for RawMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Cost: {} per {}", self.cost_per_unit, self.unit)?;

        if let Some(category) = self.category {
            writeln!(f, "Category: {}", category)?;
        }
        if let Some(quantity) = self.total_quantity {
            writeln!(f, "Stock: {} {}", quantity, self.unit)?;
        }
        if let Some(threshold) = self.low_stock_threshold {
            writeln!(f, "Low stock at: {} {}", threshold, self.unit)?;
        }
        if let Some(price) = self.selling_price {
            writeln!(f, "Selling price: {}", price)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_stock_sets_total_cost() {
        let milk = RawMaterial::new("Milk", "l", 1000.0).with_stock(12.0);
        assert_eq!(milk.total_quantity, Some(12.0));
        assert_eq!(milk.total_cost, Some(12000.0));
        assert!(milk.is_tracked());
    }

    #[test]
    fn test_is_low_on_stock() {
        let beans = RawMaterial::new("Beans", "kg", 150000.0)
            .with_stock(1.0)
            .with_low_stock_threshold(2.0);
        assert!(beans.is_low_on_stock());

        let untracked = RawMaterial::new("Ice", "kg", 0.0).with_low_stock_threshold(2.0);
        assert!(!untracked.is_low_on_stock());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(RawMaterial::new("Sugar", "g", 15.0)).unwrap();
        assert_eq!(json["costPerUnit"], 15.0);
        assert!(json.get("totalQuantity").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "Topping".parse::<MaterialCategory>().unwrap(),
            MaterialCategory::Topping
        );
        assert!("sauce".parse::<MaterialCategory>().is_err());
    }
}
