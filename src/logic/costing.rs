use crate::models::{Ingredient, RawMaterial};

/// Cost of one unit of a product: the sum of `quantity * cost_per_unit` over
/// its recipe. Ingredients whose raw material no longer exists add nothing.
pub fn calculate_item_cost_price(ingredients: &[Ingredient], raw_materials: &[RawMaterial]) -> f64 {
    ingredients
        .iter()
        .filter_map(|ingredient| {
            raw_materials
                .iter()
                .find(|m| m.id == ingredient.raw_material_id)
                .map(|m| ingredient.quantity * m.cost_per_unit)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn materials() -> Vec<RawMaterial> {
        vec![
            RawMaterial::new("Milk", "l", 1000.0).with_id("milk"),
            RawMaterial::new("Beans", "g", 200.0).with_id("beans"),
            RawMaterial::new("Sugar", "g", 15.0).with_id("sugar"),
        ]
    }

    #[test]
    fn test_sums_quantity_times_unit_cost() {
        let recipe = vec![Ingredient::new("milk", 0.2), Ingredient::new("beans", 18.0)];
        let cost = calculate_item_cost_price(&recipe, &materials());
        assert!((cost - (0.2 * 1000.0 + 18.0 * 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_inputs_cost_nothing() {
        assert_eq!(calculate_item_cost_price(&[], &materials()), 0.0);
        assert_eq!(
            calculate_item_cost_price(&[Ingredient::new("milk", 1.0)], &[]),
            0.0
        );
    }

    #[test]
    fn test_missing_materials_contribute_zero() {
        let recipe = vec![
            Ingredient::new("ghost", 3.0),
            Ingredient::new("sugar", 10.0),
        ];
        assert_eq!(calculate_item_cost_price(&recipe, &materials()), 150.0);

        let all_missing = vec![Ingredient::new("ghost", 3.0)];
        assert_eq!(calculate_item_cost_price(&all_missing, &materials()), 0.0);
    }

    #[test]
    fn test_repeated_ingredient_counts_twice() {
        let recipe = vec![Ingredient::new("sugar", 10.0), Ingredient::new("sugar", 5.0)];
        assert_eq!(calculate_item_cost_price(&recipe, &materials()), 225.0);
    }
}
