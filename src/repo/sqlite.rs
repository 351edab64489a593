use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::{RepoError, Repository};
use crate::models::{
    DbData, Ingredient, OperationalCost, PackagingOption, Product, ProductType, RawMaterial,
    Sale,
};

/// Open the SQLite database at `path` and run migrations.
pub async fn init_db(path: &Path) -> Result<SqlitePool, RepoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RepoError::Io(parent.to_path_buf(), e))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Stores the document in normalized tables. A write replaces every row
/// inside one transaction, so readers see either the old or the new document.
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RawMaterialRow {
    id: String,
    name: String,
    unit: String,
    cost_per_unit: f64,
    total_quantity: Option<f64>,
    total_cost: Option<f64>,
    category: Option<String>,
    selling_price: Option<f64>,
    low_stock_threshold: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_type: String,
    id: String,
    name: String,
    cost_price: f64,
    selling_price: f64,
    image_uri: Option<String>,
    available_toppings: String,
    packaging_options: String,
}

#[derive(sqlx::FromRow)]
struct IngredientRow {
    product_type: String,
    product_id: String,
    raw_material_id: String,
    quantity: f64,
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String,
    product_id: String,
    product_type: String,
    quantity: i64,
    discount: f64,
    total_sale_price: f64,
    date: String,
    selected_toppings: String,
    selected_packaging_id: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OperationalCostRow {
    id: String,
    description: String,
    amount: f64,
    date: String,
    recurrence: String,
}

#[derive(sqlx::FromRow)]
struct ExtraRow {
    key: String,
    value: String,
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Corrupt(format!("invalid date '{}': {}", value, e)))
}

fn parse_json<T: serde::de::DeserializeOwned>(column: &str, value: &str) -> Result<T, RepoError> {
    serde_json::from_str(value)
        .map_err(|e| RepoError::Corrupt(format!("invalid {} '{}': {}", column, value, e)))
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T, RepoError> {
    value.parse().map_err(RepoError::Corrupt)
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_raw_materials(&self) -> Result<Vec<RawMaterial>, RepoError> {
        let rows: Vec<RawMaterialRow> = sqlx::query_as(
            r#"
            SELECT id, name, unit, cost_per_unit, total_quantity, total_cost, category,
                   selling_price, low_stock_threshold
            FROM raw_materials ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RawMaterial {
                    id: row.id,
                    name: row.name,
                    unit: row.unit,
                    cost_per_unit: row.cost_per_unit,
                    total_quantity: row.total_quantity,
                    total_cost: row.total_cost,
                    category: row.category.as_deref().map(parse_enum).transpose()?,
                    selling_price: row.selling_price,
                    low_stock_threshold: row.low_stock_threshold,
                })
            })
            .collect()
    }

    async fn load_products(&self) -> Result<(Vec<Product>, Vec<Product>), RepoError> {
        let ingredient_rows: Vec<IngredientRow> = sqlx::query_as(
            "SELECT product_type, product_id, raw_material_id, quantity FROM product_ingredients ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut recipes: HashMap<(String, String), Vec<Ingredient>> = HashMap::new();
        for row in ingredient_rows {
            recipes
                .entry((row.product_type, row.product_id))
                .or_default()
                .push(Ingredient::new(row.raw_material_id, row.quantity));
        }

        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT product_type, id, name, cost_price, selling_price, image_uri,
                   available_toppings, packaging_options
            FROM products ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut drinks = Vec::new();
        let mut foods = Vec::new();
        for row in rows {
            let product_type: ProductType = parse_enum(&row.product_type)?;
            let ingredients = recipes
                .remove(&(row.product_type, row.id.clone()))
                .unwrap_or_default();
            let packaging_options: Vec<PackagingOption> =
                parse_json("packaging_options", &row.packaging_options)?;

            let product = Product {
                id: row.id,
                name: row.name,
                ingredients,
                cost_price: row.cost_price,
                selling_price: row.selling_price,
                image_uri: row.image_uri,
                available_toppings: parse_json("available_toppings", &row.available_toppings)?,
                packaging_options,
            };
            match product_type {
                ProductType::Drink => drinks.push(product),
                ProductType::Food => foods.push(product),
            }
        }

        Ok((drinks, foods))
    }

    async fn load_sales(&self) -> Result<Vec<Sale>, RepoError> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, product_type, quantity, discount, total_sale_price, date,
                   selected_toppings, selected_packaging_id
            FROM sales ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Sale {
                    quantity: u32::try_from(row.quantity).map_err(|_| {
                        RepoError::Corrupt(format!("invalid sale quantity {}", row.quantity))
                    })?,
                    product_type: parse_enum(&row.product_type)?,
                    date: parse_date(&row.date)?,
                    selected_toppings: parse_json("selected_toppings", &row.selected_toppings)?,
                    id: row.id,
                    product_id: row.product_id,
                    discount: row.discount,
                    total_sale_price: row.total_sale_price,
                    selected_packaging_id: row.selected_packaging_id,
                })
            })
            .collect()
    }

    async fn load_operational_costs(&self) -> Result<Vec<OperationalCost>, RepoError> {
        let rows: Vec<OperationalCostRow> = sqlx::query_as(
            "SELECT id, description, amount, date, recurrence FROM operational_costs ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OperationalCost {
                    date: parse_date(&row.date)?,
                    recurrence: parse_enum(&row.recurrence)?,
                    id: row.id,
                    description: row.description,
                    amount: row.amount,
                })
            })
            .collect()
    }

    async fn load_extra(&self) -> Result<serde_json::Map<String, serde_json::Value>, RepoError> {
        let rows: Vec<ExtraRow> = sqlx::query_as("SELECT key, value FROM document_extra")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let value: serde_json::Value = parse_json("document_extra", &row.value)?;
                Ok((row.key, value))
            })
            .collect()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn read(&self) -> Result<DbData, RepoError> {
        let raw_materials = self.load_raw_materials().await?;
        let (drinks, foods) = self.load_products().await?;
        let sales = self.load_sales().await?;
        let operational_costs = self.load_operational_costs().await?;
        let extra = self.load_extra().await?;

        Ok(DbData {
            raw_materials,
            drinks,
            foods,
            sales,
            operational_costs,
            extra,
        })
    }

    async fn write(&self, data: &DbData) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_ingredients")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM raw_materials")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM operational_costs")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM document_extra")
            .execute(&mut *tx)
            .await?;

        for (position, material) in data.raw_materials.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO raw_materials (id, position, name, unit, cost_per_unit, total_quantity,
                    total_cost, category, selling_price, low_stock_threshold)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&material.id)
            .bind(position as i64)
            .bind(&material.name)
            .bind(&material.unit)
            .bind(material.cost_per_unit)
            .bind(material.total_quantity)
            .bind(material.total_cost)
            .bind(material.category.map(|c| c.to_string()))
            .bind(material.selling_price)
            .bind(material.low_stock_threshold)
            .execute(&mut *tx)
            .await?;
        }

        for (position, (product_type, product)) in data.all_products().enumerate() {
            let product_type = product_type.to_string();
            let toppings = serde_json::to_string(&product.available_toppings)?;
            let packaging = serde_json::to_string(&product.packaging_options)?;

            sqlx::query(
                r#"
                INSERT INTO products (product_type, id, position, name, cost_price, selling_price,
                    image_uri, available_toppings, packaging_options)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&product_type)
            .bind(&product.id)
            .bind(position as i64)
            .bind(&product.name)
            .bind(product.cost_price)
            .bind(product.selling_price)
            .bind(&product.image_uri)
            .bind(&toppings)
            .bind(&packaging)
            .execute(&mut *tx)
            .await?;

            for (line, ingredient) in product.ingredients.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO product_ingredients (product_type, product_id, position,
                        raw_material_id, quantity)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&product_type)
                .bind(&product.id)
                .bind(line as i64)
                .bind(&ingredient.raw_material_id)
                .bind(ingredient.quantity)
                .execute(&mut *tx)
                .await?;
            }
        }

        for (position, sale) in data.sales.iter().enumerate() {
            let toppings = serde_json::to_string(&sale.selected_toppings)?;
            sqlx::query(
                r#"
                INSERT INTO sales (id, position, product_id, product_type, quantity, discount,
                    total_sale_price, date, selected_toppings, selected_packaging_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&sale.product_id)
            .bind(sale.product_type.to_string())
            .bind(i64::from(sale.quantity))
            .bind(sale.discount)
            .bind(sale.total_sale_price)
            .bind(sale.date.to_rfc3339())
            .bind(&toppings)
            .bind(&sale.selected_packaging_id)
            .execute(&mut *tx)
            .await?;
        }

        for (position, cost) in data.operational_costs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO operational_costs (id, position, description, amount, date, recurrence)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&cost.id)
            .bind(position as i64)
            .bind(&cost.description)
            .bind(cost.amount)
            .bind(cost.date.to_rfc3339())
            .bind(cost.recurrence.to_string())
            .execute(&mut *tx)
            .await?;
        }

        for (key, value) in &data.extra {
            sqlx::query("INSERT INTO document_extra (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(serde_json::to_string(value)?)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaterialCategory, Recurrence};
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct TestContext {
        repo: SqliteRepository,
        pool: SqlitePool,
        _temp_dir: TempDir,
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("cafe.db")).await.unwrap();
        TestContext {
            repo: SqliteRepository::new(pool.clone()),
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn sample() -> DbData {
        let mut data = DbData::default();
        data.raw_materials = vec![
            RawMaterial::new("Milk", "l", 1000.0)
                .with_id("milk")
                .with_stock(12.0)
                .with_low_stock_threshold(2.0),
            RawMaterial::new("Boba", "portion", 1500.0)
                .with_id("boba")
                .with_category(MaterialCategory::Topping)
                .with_selling_price(5000.0),
            RawMaterial::new("Cup", "pcs", 800.0).with_id("cup"),
        ];
        data.drinks.push(
            Product::new("Latte", 25000.0)
                .with_id("latte")
                .with_ingredients(vec![Ingredient::new("milk", 0.2)])
                .with_toppings(vec!["boba".into()])
                .with_packaging(vec![PackagingOption::new("Cup")
                    .with_ingredients(vec![Ingredient::new("cup", 1.0)])
                    .with_additional_price(1000.0)]),
        );
        data.foods.push(
            Product::new("Pudding", 18000.0)
                .with_id("pudding")
                .with_ingredients(vec![Ingredient::new("milk", 0.1)]),
        );
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        data.sales.push(
            Sale::new("latte", ProductType::Drink, 2, 50000.0)
                .with_date(date)
                .with_discount(1000.0),
        );
        data.operational_costs
            .push(OperationalCost::new("Rent", 3_000_000.0, Recurrence::Monthly).with_date(date));
        data.extra
            .insert("username".into(), serde_json::json!("owner"));
        data
    }

    #[tokio::test]
    async fn test_init_db_creates_tables() {
        let ctx = setup_repo().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%' ORDER BY name",
        )
        .fetch_all(&ctx.pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert!(table_names.contains(&"raw_materials"));
        assert!(table_names.contains(&"products"));
        assert!(table_names.contains(&"product_ingredients"));
        assert!(table_names.contains(&"sales"));
        assert!(table_names.contains(&"operational_costs"));
    }

    #[tokio::test]
    async fn test_empty_database_reads_default() {
        let ctx = setup_repo().await;
        assert_eq!(ctx.repo.read().await.unwrap(), DbData::default());
    }

    #[tokio::test]
    async fn test_write_and_read_document() {
        let ctx = setup_repo().await;
        let data = sample();

        ctx.repo.write(&data).await.unwrap();
        let loaded = ctx.repo.read().await.unwrap();

        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_document() {
        let ctx = setup_repo().await;
        ctx.repo.write(&sample()).await.unwrap();

        let mut smaller = sample();
        smaller.drinks.clear();
        smaller.sales.clear();
        ctx.repo.write(&smaller).await.unwrap();

        let loaded = ctx.repo.read().await.unwrap();
        assert!(loaded.drinks.is_empty());
        assert!(loaded.sales.is_empty());
        assert_eq!(loaded.foods.len(), 1);

        let (ingredient_rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_ingredients")
                .fetch_one(&ctx.pool)
                .await
                .unwrap();
        assert_eq!(ingredient_rows, 1);
    }

    #[tokio::test]
    async fn test_preserves_collection_order() {
        let ctx = setup_repo().await;
        let mut data = DbData::default();
        for name in ["Zucchini", "Apple", "Milk"] {
            data.raw_materials.push(RawMaterial::new(name, "g", 1.0));
        }

        ctx.repo.write(&data).await.unwrap();
        let names: Vec<String> = ctx
            .repo
            .read()
            .await
            .unwrap()
            .raw_materials
            .into_iter()
            .map(|m| m.name)
            .collect();

        assert_eq!(names, vec!["Zucchini", "Apple", "Milk"]);
    }
}
