use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_non_negative, CafeService, ServiceError, ServiceResult};
use crate::logic::{deduct_stock, sale_requirements};
use crate::models::{DbData, Product, ProductType, Sale};

const ENTITY: &str = "Sale";

/// A sale as entered at the till. The price is computed from current
/// product, topping and packaging prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub product_id: String,
    pub product_type: ProductType,
    pub quantity: u32,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub selected_toppings: Vec<String>,
    #[serde(default)]
    pub selected_packaging_id: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl NewSale {
    pub fn new(product_id: impl Into<String>, product_type: ProductType, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            product_type,
            quantity,
            discount: 0.0,
            selected_toppings: Vec::new(),
            selected_packaging_id: None,
            date: None,
        }
    }
}

/// Price of one unit: the product, each selected topping and the chosen
/// packaging.
fn unit_price(db: &DbData, product: &Product, sale: &NewSale) -> ServiceResult<f64> {
    let mut price = product.selling_price;

    for topping_id in &sale.selected_toppings {
        if !product.available_toppings.contains(topping_id) {
            return Err(ServiceError::validation(format!(
                "Topping '{}' is not available for '{}'",
                topping_id, product.name
            )));
        }
        let topping = db.raw_material(topping_id).ok_or_else(|| {
            ServiceError::validation(format!("Unknown raw material: {}", topping_id))
        })?;
        price += topping.selling_price.unwrap_or(0.0);
    }

    if let Some(packaging_id) = &sale.selected_packaging_id {
        let packaging = product.packaging(packaging_id).ok_or_else(|| {
            ServiceError::validation(format!(
                "Packaging '{}' is not offered for '{}'",
                packaging_id, product.name
            ))
        })?;
        price += packaging.additional_price;
    }

    Ok(price)
}

impl CafeService {
    pub async fn list_sales(&self) -> ServiceResult<Vec<Sale>> {
        self.read(|db| Ok(db.sales)).await
    }

    pub async fn get_sale(&self, id: &str) -> ServiceResult<Sale> {
        self.read(|db| {
            db.sales
                .into_iter()
                .find(|s| s.id == id)
                .ok_or_else(|| ServiceError::not_found(ENTITY, id))
        })
        .await
    }

    /// Records a sale and deducts the stock it consumes in the same write.
    /// If any tracked material runs short, nothing is written.
    pub async fn record_sale(&self, input: NewSale) -> ServiceResult<Sale> {
        if input.quantity == 0 {
            return Err(ServiceError::validation("Quantity must be at least 1"));
        }
        require_non_negative("discount", input.discount)?;

        let sale = self
            .mutate(move |db| {
                let product = db
                    .product(input.product_type, &input.product_id)
                    .cloned()
                    .ok_or_else(|| {
                        let entity = match input.product_type {
                            ProductType::Drink => "Drink",
                            ProductType::Food => "Food",
                        };
                        ServiceError::not_found(entity, &input.product_id)
                    })?;

                let unit = unit_price(db, &product, &input)?;
                let total = (unit * f64::from(input.quantity) - input.discount).max(0.0);

                let required = sale_requirements(
                    &product,
                    input.quantity,
                    &input.selected_toppings,
                    input.selected_packaging_id.as_deref(),
                );
                deduct_stock(db, &required).map_err(|shortage| {
                    ServiceError::InsufficientStock {
                        material: shortage.material_name,
                        required: shortage.required,
                        available: shortage.available,
                    }
                })?;

                let sale = Sale {
                    id: Uuid::new_v4().to_string(),
                    product_id: input.product_id,
                    product_type: input.product_type,
                    quantity: input.quantity,
                    discount: input.discount,
                    total_sale_price: total,
                    date: input.date.unwrap_or_else(Utc::now),
                    selected_toppings: input.selected_toppings,
                    selected_packaging_id: input.selected_packaging_id,
                };
                db.sales.push(sale.clone());
                Ok(sale)
            })
            .await?;

        tracing::info!(
            id = %sale.id,
            product_id = %sale.product_id,
            quantity = sale.quantity,
            total = sale.total_sale_price,
            "Recorded sale"
        );
        Ok(sale)
    }

    /// Removes a sale record. Stock consumed by the sale is not returned.
    pub async fn delete_sale(&self, id: &str) -> ServiceResult<()> {
        let id = id.to_string();
        let removed = self
            .mutate(move |db| {
                let before = db.sales.len();
                db.sales.retain(|s| s.id != id);
                if db.sales.len() == before {
                    return Err(ServiceError::not_found(ENTITY, &id));
                }
                Ok(id)
            })
            .await?;

        tracing::info!(id = %removed, "Deleted sale");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawMaterial;
    use crate::service::test_support::service;

    fn latte_with_extras(quantity: u32) -> NewSale {
        let mut sale = NewSale::new("latte", ProductType::Drink, quantity);
        sale.selected_toppings = vec!["boba".into()];
        sale.selected_packaging_id = Some("cup-option".into());
        sale
    }

    #[tokio::test]
    async fn test_total_includes_toppings_packaging_and_discount() {
        let svc = service();
        let mut input = latte_with_extras(2);
        input.discount = 2000.0;

        let sale = svc.record_sale(input).await.unwrap();

        // (25000 + 5000 boba + 1000 cup) * 2 - 2000
        assert_eq!(sale.total_sale_price, 60000.0);
        assert_eq!(svc.list_sales().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sale_deducts_stock() {
        let svc = service();
        svc.record_sale(latte_with_extras(2)).await.unwrap();

        let db = svc.snapshot().await.unwrap();
        let milk = db.raw_material("milk").unwrap();
        assert!((milk.total_quantity.unwrap() - 9.6).abs() < 1e-9);
        assert!((milk.total_cost.unwrap() - 9600.0).abs() < 1e-6);
        assert_eq!(db.raw_material("beans").unwrap().total_quantity, Some(964.0));
        assert_eq!(db.raw_material("cup").unwrap().total_quantity, Some(48.0));
        assert_eq!(db.raw_material("boba").unwrap().total_quantity, None);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let svc = service();
        let before = svc.snapshot().await.unwrap();

        let err = svc
            .record_sale(NewSale::new("latte", ProductType::Drink, 51))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InsufficientStock { .. }));
        assert!(err.to_string().contains("Not enough Milk"));
        assert_eq!(svc.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_discount_never_makes_total_negative() {
        let svc = service();
        let mut input = NewSale::new("pudding", ProductType::Food, 1);
        input.discount = 50000.0;

        let sale = svc.record_sale(input).await.unwrap();
        assert_eq!(sale.total_sale_price, 0.0);
    }

    #[tokio::test]
    async fn test_rejects_invalid_sales() {
        let svc = service();

        let err = svc
            .record_sale(NewSale::new("latte", ProductType::Food, 1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Food not found: latte");

        let err = svc
            .record_sale(NewSale::new("latte", ProductType::Drink, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut input = NewSale::new("pudding", ProductType::Food, 1);
        input.selected_toppings = vec!["boba".into()];
        let err = svc.record_sale(input).await.unwrap_err();
        assert!(err.to_string().contains("not available"));

        let mut input = NewSale::new("latte", ProductType::Drink, 1);
        input.selected_packaging_id = Some("bag".into());
        let err = svc.record_sale(input).await.unwrap_err();
        assert!(err.to_string().contains("not offered"));

        assert!(svc.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_keeps_price_after_material_change() {
        let svc = service();
        let sale = svc
            .record_sale(NewSale::new("latte", ProductType::Drink, 1))
            .await
            .unwrap();
        assert_eq!(sale.total_sale_price, 25000.0);

        let mut milk: RawMaterial = svc.get_raw_material("milk").await.unwrap();
        milk.cost_per_unit = 1500.0;
        svc.update_raw_material("milk", milk).await.unwrap();

        let latte = svc.get_product(ProductType::Drink, "latte").await.unwrap();
        assert!((latte.cost_price - (300.0 + 3600.0)).abs() < 1e-9);
        assert_eq!(
            svc.get_sale(&sale.id).await.unwrap().total_sale_price,
            25000.0
        );
    }

    #[tokio::test]
    async fn test_delete_sale_does_not_restock() {
        let svc = service();
        let sale = svc
            .record_sale(NewSale::new("pudding", ProductType::Food, 10))
            .await
            .unwrap();

        svc.delete_sale(&sale.id).await.unwrap();

        let db = svc.snapshot().await.unwrap();
        assert!(db.sales.is_empty());
        assert!((db.raw_material("milk").unwrap().total_quantity.unwrap() - 9.0).abs() < 1e-9);

        let err = svc.delete_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
