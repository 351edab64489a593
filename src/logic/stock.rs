use std::collections::BTreeMap;

use crate::models::{DbData, Product, RawMaterial};

/// A tracked material that cannot cover a requested deduction.
#[derive(Debug, Clone, PartialEq)]
pub struct StockShortage {
    pub material_id: String,
    pub material_name: String,
    pub required: f64,
    pub available: f64,
}

/// Raw material quantities consumed by selling `quantity` units of `product`.
///
/// Each unit consumes its recipe, the recipe of the chosen packaging, and one
/// unit of every selected topping.
pub fn sale_requirements(
    product: &Product,
    quantity: u32,
    toppings: &[String],
    packaging_id: Option<&str>,
) -> BTreeMap<String, f64> {
    let units = f64::from(quantity);
    let mut required: BTreeMap<String, f64> = BTreeMap::new();

    for ingredient in &product.ingredients {
        *required
            .entry(ingredient.raw_material_id.clone())
            .or_default() += ingredient.quantity * units;
    }

    if let Some(packaging) = packaging_id.and_then(|id| product.packaging(id)) {
        for ingredient in &packaging.ingredients {
            *required
                .entry(ingredient.raw_material_id.clone())
                .or_default() += ingredient.quantity * units;
        }
    }

    for topping in toppings {
        *required.entry(topping.clone()).or_default() += units;
    }

    required
}

/// Deducts every requirement from tracked materials, or nothing at all.
///
/// Untracked and unknown materials are skipped.
pub fn deduct_stock(
    db: &mut DbData,
    requirements: &BTreeMap<String, f64>,
) -> Result<(), StockShortage> {
    for (material_id, required) in requirements {
        if let Some(material) = db.raw_material(material_id) {
            if let Some(available) = material.total_quantity {
                if available + f64::EPSILON < *required {
                    return Err(StockShortage {
                        material_id: material_id.clone(),
                        material_name: material.name.clone(),
                        required: *required,
                        available,
                    });
                }
            }
        }
    }

    for (material_id, required) in requirements {
        if let Some(material) = db.raw_material_mut(material_id) {
            if let Some(available) = material.total_quantity {
                let remaining = (available - required).max(0.0);
                material.total_quantity = Some(remaining);
                material.total_cost = Some(remaining * material.cost_per_unit);
            }
        }
    }

    Ok(())
}

/// Adds a purchase to a material's stock and moves `cost_per_unit` to the
/// weighted average of old and new stock.
///
/// Returns true when the unit cost changed.
pub fn restock(material: &mut RawMaterial, quantity: f64, cost: f64) -> bool {
    let previous_quantity = material.total_quantity.unwrap_or(0.0);
    let previous_cost = material
        .total_cost
        .unwrap_or(previous_quantity * material.cost_per_unit);

    let total_quantity = previous_quantity + quantity;
    let total_cost = previous_cost + cost;

    let old_unit_cost = material.cost_per_unit;
    material.total_quantity = Some(total_quantity);
    material.total_cost = Some(total_cost);
    if total_quantity > 0.0 {
        material.cost_per_unit = total_cost / total_quantity;
    }

    material.cost_per_unit != old_unit_cost
}
