use super::{ensure_id, require_name, require_non_negative, CafeService, ServiceError, ServiceResult};
use crate::logic::{calculate_item_cost_price, has_associated_sales};
use crate::models::{DbData, Ingredient, Product, ProductType};

fn entity(product_type: ProductType) -> &'static str {
    match product_type {
        ProductType::Drink => "Drink",
        ProductType::Food => "Food",
    }
}

fn validate_recipe(kind: &str, ingredients: &[Ingredient]) -> ServiceResult<()> {
    for ingredient in ingredients {
        if !ingredient.quantity.is_finite() || ingredient.quantity <= 0.0 {
            return Err(ServiceError::validation(format!(
                "{} ingredient '{}' must have a positive quantity",
                kind, ingredient.raw_material_id
            )));
        }
    }
    Ok(())
}

fn validate(product_type: ProductType, product: &Product) -> ServiceResult<()> {
    let kind = entity(product_type);
    require_name(kind, &product.name)?;
    require_non_negative("sellingPrice", product.selling_price)?;
    validate_recipe(kind, &product.ingredients)?;
    for option in &product.packaging_options {
        require_name("Packaging option", &option.name)?;
        require_non_negative("additionalPrice", option.additional_price)?;
        validate_recipe("Packaging", &option.ingredients)?;
    }
    Ok(())
}

/// Every raw material the product refers to must exist.
fn check_references(db: &DbData, product: &Product) -> ServiceResult<()> {
    let referenced = product
        .ingredients
        .iter()
        .chain(product.packaging_options.iter().flat_map(|o| o.ingredients.iter()))
        .map(|i| i.raw_material_id.as_str())
        .chain(product.available_toppings.iter().map(String::as_str));

    for material_id in referenced {
        if db.raw_material(material_id).is_none() {
            return Err(ServiceError::validation(format!(
                "Unknown raw material: {}",
                material_id
            )));
        }
    }
    Ok(())
}

fn prepare(product: &mut Product) {
    product.name = product.name.trim().to_string();
    ensure_id(&mut product.id);
    for option in &mut product.packaging_options {
        ensure_id(&mut option.id);
    }
}

fn price(db: &DbData, product: &mut Product) {
    product.cost_price = calculate_item_cost_price(&product.ingredients, &db.raw_materials);
}

impl CafeService {
    pub async fn list_products(&self, product_type: ProductType) -> ServiceResult<Vec<Product>> {
        self.read(|db| Ok(db.products(product_type).clone())).await
    }

    pub async fn get_product(&self, product_type: ProductType, id: &str) -> ServiceResult<Product> {
        self.read(|db| {
            db.product(product_type, id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found(entity(product_type), id))
        })
        .await
    }

    /// Adds a product. Its cost price is always computed from the recipe.
    pub async fn create_product(
        &self,
        product_type: ProductType,
        mut product: Product,
    ) -> ServiceResult<Product> {
        validate(product_type, &product)?;
        prepare(&mut product);

        let created = self
            .mutate(move |db| {
                if db.product(product_type, &product.id).is_some() {
                    return Err(ServiceError::validation(format!(
                        "{} with id '{}' already exists",
                        entity(product_type),
                        product.id
                    )));
                }
                check_references(db, &product)?;
                price(db, &mut product);
                db.products_mut(product_type).push(product.clone());
                Ok(product)
            })
            .await?;

        tracing::info!(
            id = %created.id,
            name = %created.name,
            cost_price = created.cost_price,
            "Created {}",
            product_type
        );
        Ok(created)
    }

    pub async fn update_product(
        &self,
        product_type: ProductType,
        id: &str,
        mut product: Product,
    ) -> ServiceResult<Product> {
        product.id = id.to_string();
        validate(product_type, &product)?;
        prepare(&mut product);

        let updated = self
            .mutate(move |db| {
                let position = db
                    .products(product_type)
                    .iter()
                    .position(|p| p.id == product.id)
                    .ok_or_else(|| ServiceError::not_found(entity(product_type), &product.id))?;
                check_references(db, &product)?;
                price(db, &mut product);
                db.products_mut(product_type)[position] = product.clone();
                Ok(product)
            })
            .await?;

        tracing::info!(id = %updated.id, cost_price = updated.cost_price, "Updated {}", product_type);
        Ok(updated)
    }

    /// Deletes a product that has never been sold.
    pub async fn delete_product(&self, product_type: ProductType, id: &str) -> ServiceResult<()> {
        let id = id.to_string();
        let removed = self
            .mutate(move |db| {
                let product = db
                    .product(product_type, &id)
                    .ok_or_else(|| ServiceError::not_found(entity(product_type), &id))?;
                if has_associated_sales(db, product_type, &id) {
                    return Err(ServiceError::InUse(format!(
                        "{} '{}' has sales history and cannot be deleted",
                        entity(product_type),
                        product.name
                    )));
                }
                db.products_mut(product_type).retain(|p| p.id != id);
                Ok(id)
            })
            .await?;

        tracing::info!(id = %removed, "Deleted {}", product_type);
        Ok(())
    }

    /// Upserts a batch by id. Unlike create/update, references to unknown
    /// raw materials are accepted; they cost nothing until the material
    /// exists.
    pub async fn import_products(
        &self,
        product_type: ProductType,
        products: Vec<Product>,
    ) -> ServiceResult<Vec<Product>> {
        let mut products = products;
        for product in &mut products {
            validate(product_type, product)?;
            prepare(product);
        }

        let imported = self
            .mutate(move |db| {
                for product in &mut products {
                    price(db, product);
                    let position = db
                        .products(product_type)
                        .iter()
                        .position(|p| p.id == product.id);
                    match position {
                        Some(index) => db.products_mut(product_type)[index] = product.clone(),
                        None => db.products_mut(product_type).push(product.clone()),
                    }
                }
                Ok(products)
            })
            .await?;

        tracing::info!(count = imported.len(), "Imported {}s", product_type);
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PackagingOption, Sale};
    use crate::service::test_support::{fixture, service, service_with};

    #[tokio::test]
    async fn test_create_computes_cost_price() {
        let svc = service();
        let mut cappuccino = Product::new("Cappuccino", 28000.0)
            .with_ingredients(vec![Ingredient::new("milk", 0.15), Ingredient::new("beans", 18.0)]);
        cappuccino.cost_price = 1.0;

        let created = svc
            .create_product(ProductType::Drink, cappuccino)
            .await
            .unwrap();

        assert!((created.cost_price - (0.15 * 1000.0 + 18.0 * 200.0)).abs() < 1e-9);
        assert_eq!(svc.list_products(ProductType::Drink).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_assigns_packaging_ids() {
        let svc = service();
        let mut option = PackagingOption::new("Box");
        option.id = String::new();
        let toast = Product::new("Toast", 15000.0).with_packaging(vec![option]);

        let created = svc.create_product(ProductType::Food, toast).await.unwrap();
        assert!(!created.packaging_options[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_materials() {
        let svc = service();
        let product =
            Product::new("Mystery", 10000.0).with_ingredients(vec![Ingredient::new("ghost", 1.0)]);

        let err = svc
            .create_product(ProductType::Food, product)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown raw material: ghost"));

        let product = Product::new("Mystery", 10000.0).with_toppings(vec!["ghost".into()]);
        assert!(svc.create_product(ProductType::Drink, product).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_quantities() {
        let svc = service();
        let product =
            Product::new("Zero", 10000.0).with_ingredients(vec![Ingredient::new("milk", 0.0)]);

        let err = svc
            .create_product(ProductType::Drink, product)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_recomputes_cost() {
        let svc = service();
        let mut latte = svc.get_product(ProductType::Drink, "latte").await.unwrap();
        latte.ingredients = vec![Ingredient::new("milk", 0.3)];

        let updated = svc
            .update_product(ProductType::Drink, "latte", latte)
            .await
            .unwrap();

        assert!((updated.cost_price - 300.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let svc = service();
        let err = svc
            .update_product(ProductType::Food, "latte", Product::new("Nope", 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Food not found: latte");
    }

    #[tokio::test]
    async fn test_update_missing_product_with_unknown_material() {
        let svc = service();
        let ghost = Product::new("Ghost", 1.0).with_ingredients(vec![Ingredient::new("nothing", 1.0)]);

        let err = svc
            .update_product(ProductType::Drink, "ghost", ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_drink_with_sales_is_rejected() {
        let mut db = fixture();
        db.sales
            .push(Sale::new("latte", ProductType::Drink, 1, 25000.0));
        let svc = service_with(&db);

        let err = svc
            .delete_product(ProductType::Drink, "latte")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InUse(_)));
        assert!(err.to_string().contains("sales history"));

        let drinks = svc.list_products(ProductType::Drink).await.unwrap();
        assert_eq!(drinks, db.drinks);
    }

    #[tokio::test]
    async fn test_delete_food_with_sales_is_rejected() {
        let mut db = fixture();
        db.sales
            .push(Sale::new("pudding", ProductType::Food, 2, 36000.0));
        let svc = service_with(&db);

        let err = svc
            .delete_product(ProductType::Food, "pudding")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InUse(_)));
    }

    #[tokio::test]
    async fn test_delete_unsold_product() {
        let svc = service();
        svc.delete_product(ProductType::Food, "pudding").await.unwrap();
        assert!(svc.list_products(ProductType::Food).await.unwrap().is_empty());

        let err = svc
            .delete_product(ProductType::Food, "pudding")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_import_accepts_unknown_materials() {
        let svc = service();
        let imported = svc
            .import_products(
                ProductType::Food,
                vec![
                    Product::new("Cake", 30000.0).with_ingredients(vec![
                        Ingredient::new("milk", 0.5),
                        Ingredient::new("ghost", 2.0),
                    ]),
                    Product::new("Milk Pudding v2", 20000.0).with_id("pudding"),
                ],
            )
            .await
            .unwrap();

        assert!((imported[0].cost_price - 500.0).abs() < 1e-9);

        let foods = svc.list_products(ProductType::Food).await.unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0].name, "Milk Pudding v2");
        assert_eq!(foods[0].cost_price, 0.0);
    }
}
