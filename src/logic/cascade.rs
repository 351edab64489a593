use super::costing::calculate_item_cost_price;
use crate::models::DbData;

/// Rewrites the cost snapshot of every product whose recipe uses the material.
/// Returns how many products were touched.
pub fn recalculate_dependent_product_costs(db: &mut DbData, updated_material_id: &str) -> usize {
    let DbData {
        raw_materials,
        drinks,
        foods,
        ..
    } = db;

    let mut updated = 0;
    for product in drinks.iter_mut().chain(foods.iter_mut()) {
        if product.uses_material(updated_material_id) {
            product.cost_price = calculate_item_cost_price(&product.ingredients, raw_materials);
            updated += 1;
        }
    }

    tracing::debug!(
        material_id = updated_material_id,
        products = updated,
        "Recalculated dependent product costs"
    );
    updated
}
