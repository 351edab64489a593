use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::product::ProductType;

/// A recorded sale. The price is frozen at the moment of sale and never
/// follows later product changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub product_type: ProductType,
    pub quantity: u32,
    #[serde(default)]
    pub discount: f64,
    pub total_sale_price: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_toppings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_packaging_id: Option<String>,
}

impl Sale {
    pub fn new(
        product_id: impl Into<String>,
        product_type: ProductType,
        quantity: u32,
        total_sale_price: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            product_type,
            quantity,
            discount: 0.0,
            total_sale_price,
            date: Utc::now(),
            selected_toppings: Vec::new(),
            selected_packaging_id: None,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} {} x{}  {}",
            self.date.format("%Y-%m-%d %H:%M"),
            self.product_type,
            self.product_id,
            self.quantity,
            self.total_sale_price
        )?;
        if self.discount > 0.0 {
            write!(f, " (discount {})", self.discount)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sale_json_shape() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let sale = Sale::new("latte", ProductType::Drink, 2, 50000.0).with_date(date);
        let json = serde_json::to_value(&sale).unwrap();

        assert_eq!(json["productId"], "latte");
        assert_eq!(json["productType"], "drink");
        assert_eq!(json["totalSalePrice"], 50000.0);
        assert_eq!(json["date"], "2024-05-01T09:30:00Z");
        assert!(json.get("selectedToppings").is_none());
    }

    #[test]
    fn test_sale_accepts_fractional_timestamps() {
        let json = r#"{
            "id": "s1",
            "productId": "latte",
            "productType": "drink",
            "quantity": 1,
            "discount": 0,
            "totalSalePrice": 25000,
            "date": "2024-05-01T09:30:00.123Z"
        }"#;
        let sale: Sale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.quantity, 1);
        assert_eq!(sale.date.format("%Y-%m-%d").to_string(), "2024-05-01");
    }
}
