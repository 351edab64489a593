use crate::models::{DbData, ProductType};

/// True if any drink or food recipe lists the material.
pub fn is_raw_material_in_use(db: &DbData, material_id: &str) -> bool {
    db.all_products().any(|(_, p)| p.uses_material(material_id))
}

/// Wider check used before deleting a material: recipes, packaging recipes
/// and topping lists all count as references.
pub fn is_raw_material_referenced(db: &DbData, material_id: &str) -> bool {
    is_raw_material_in_use(db, material_id)
        || db.all_products().any(|(_, p)| {
            p.available_toppings.iter().any(|t| t == material_id)
                || p.packaging_options.iter().any(|o| {
                    o.ingredients
                        .iter()
                        .any(|i| i.raw_material_id == material_id)
                })
        })
}

pub fn has_associated_sales(db: &DbData, product_type: ProductType, product_id: &str) -> bool {
    db.sales
        .iter()
        .any(|s| s.product_type == product_type && s.product_id == product_id)
}

pub fn has_drink_associated_sales(db: &DbData, drink_id: &str) -> bool {
    has_associated_sales(db, ProductType::Drink, drink_id)
}

pub fn has_food_associated_sales(db: &DbData, food_id: &str) -> bool {
    has_associated_sales(db, ProductType::Food, food_id)
}
