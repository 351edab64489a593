use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{
    confirm, find, find_material, parse_ingredient_arg, read_json_file, resolve_ingredients,
    truncate, CommandResult, OutputFormat,
};
use cafebook::client::StateStore;
use cafebook::models::{Ingredient, PackagingOption, Product, ProductType};

/// Shared by `drink` and `food`.
#[derive(Args)]
pub struct ProductCommand {
    #[command(subcommand)]
    pub command: ProductSubcommand,
}

#[derive(Subcommand)]
pub enum ProductSubcommand {
    /// Create a new product; its cost is computed from the recipe
    Create {
        /// Name of the product
        name: String,

        /// Menu price
        #[arg(long)]
        selling_price: f64,

        /// Recipe line as MATERIAL=QUANTITY (can be repeated)
        #[arg(long = "ingredient", value_name = "MATERIAL=QTY", value_parser = parse_ingredient_arg)]
        ingredients: Vec<(String, f64)>,

        /// Raw material offered as a topping (can be repeated)
        #[arg(long = "topping", value_name = "MATERIAL")]
        toppings: Vec<String>,

        /// Image URI
        #[arg(long)]
        image_uri: Option<String>,
    },

    /// List all products
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a product's details
    Show {
        /// Product ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing product
    Update {
        /// Product ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New menu price
        #[arg(long)]
        selling_price: Option<f64>,

        /// Offer a topping (can be repeated)
        #[arg(long = "add-topping", value_name = "MATERIAL")]
        add_toppings: Vec<String>,

        /// Stop offering a topping (can be repeated)
        #[arg(long = "remove-topping", value_name = "MATERIAL")]
        remove_toppings: Vec<String>,

        /// Image URI
        #[arg(long)]
        image_uri: Option<String>,
    },

    /// Delete a product that has no sales
    Delete {
        /// Product ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Add an ingredient to a product's recipe
    AddIngredient {
        /// Product ID or name
        identifier: String,

        /// Raw material ID or name
        #[arg(long)]
        material: String,

        /// Quantity used per item
        #[arg(long)]
        quantity: f64,
    },

    /// Remove an ingredient from a product's recipe
    RemoveIngredient {
        /// Product ID or name
        identifier: String,

        /// Raw material ID or name
        #[arg(long)]
        material: String,
    },

    /// Add a packaging option
    AddPackaging {
        /// Product ID or name
        identifier: String,

        /// Packaging name
        #[arg(long)]
        name: String,

        /// Added to the price when chosen
        #[arg(long, default_value_t = 0.0)]
        additional_price: f64,

        /// Material consumed as MATERIAL=QUANTITY (can be repeated)
        #[arg(long = "ingredient", value_name = "MATERIAL=QTY", value_parser = parse_ingredient_arg)]
        ingredients: Vec<(String, f64)>,
    },

    /// Import products from a JSON array, replacing matching ids
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

fn label(product_type: ProductType) -> &'static str {
    match product_type {
        ProductType::Drink => "Drink",
        ProductType::Food => "Food",
    }
}

fn find_product(
    store: &StateStore,
    product_type: ProductType,
    identifier: &str,
) -> Result<Product, String> {
    find(
        store.products(product_type),
        identifier,
        |p| p.id.as_str(),
        |p| p.name.as_str(),
    )
    .cloned()
    .ok_or_else(|| format!("{} not found: {}", label(product_type), identifier))
}

fn topping_ids(store: &StateStore, toppings: &[String]) -> Result<Vec<String>, String> {
    toppings
        .iter()
        .map(|t| find_material(store.raw_materials(), t).map(|m| m.id.clone()))
        .collect()
}

impl ProductCommand {
    pub async fn run(&self, product_type: ProductType, store: &mut StateStore) -> CommandResult {
        let label = label(product_type);

        match &self.command {
            ProductSubcommand::Create {
                name,
                selling_price,
                ingredients,
                toppings,
                image_uri,
            } => {
                let ingredients = resolve_ingredients(store.raw_materials(), ingredients)?;
                let toppings = topping_ids(store, toppings)?;

                let mut product = Product::new(name.trim(), *selling_price)
                    .with_ingredients(ingredients)
                    .with_toppings(toppings);
                if let Some(uri) = image_uri {
                    product = product.with_image_uri(uri);
                }

                let created = store.create_product(product_type, product).await?;
                println!("Created {}:", label.to_lowercase());
                println!("{}", created);
                Ok(())
            }

            ProductSubcommand::List { format } => {
                let products = store.products(product_type);

                if products.is_empty() {
                    println!("No {}s found", label.to_lowercase());
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(products)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<24}  {:>10}  {:>10}  {:>10}",
                            "ID", "NAME", "PRICE", "COST", "MARGIN"
                        );
                        println!("{}", "-".repeat(100));
                        for product in products {
                            println!(
                                "{:<36}  {:<24}  {:>10}  {:>10}  {:>10}",
                                product.id,
                                truncate(&product.name, 24),
                                product.selling_price,
                                product.cost_price,
                                product.margin()
                            );
                        }
                        println!("\nTotal: {} {}(s)", products.len(), label.to_lowercase());
                    }
                }
                Ok(())
            }

            ProductSubcommand::Show { identifier, format } => {
                let product = find_product(store, product_type, identifier)?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&product)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", product);
                    }
                }
                Ok(())
            }

            ProductSubcommand::Update {
                identifier,
                name,
                selling_price,
                add_toppings,
                remove_toppings,
                image_uri,
            } => {
                let has_updates = name.is_some()
                    || selling_price.is_some()
                    || !add_toppings.is_empty()
                    || !remove_toppings.is_empty()
                    || image_uri.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut product = find_product(store, product_type, identifier)?;

                if let Some(new_name) = name {
                    product.name = new_name.clone();
                }
                if let Some(price) = selling_price {
                    product.selling_price = *price;
                }
                if let Some(uri) = image_uri {
                    product.image_uri = Some(uri.clone());
                }
                for id in topping_ids(store, add_toppings)? {
                    if !product.available_toppings.contains(&id) {
                        product.available_toppings.push(id);
                    }
                }
                for id in topping_ids(store, remove_toppings)? {
                    product.available_toppings.retain(|t| *t != id);
                }

                let id = product.id.clone();
                let updated = store.update_product(product_type, &id, product).await?;
                println!("Updated {}:", label.to_lowercase());
                println!("{}", updated);
                Ok(())
            }

            ProductSubcommand::Delete { identifier, force } => {
                let product = find_product(store, product_type, identifier)?;

                if !force
                    && !confirm(&format!("Delete {} '{}'?", label.to_lowercase(), product.name))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_product(product_type, &product.id).await?;
                println!("Deleted {}: {}", label.to_lowercase(), product.name);
                Ok(())
            }

            ProductSubcommand::AddIngredient {
                identifier,
                material,
                quantity,
            } => {
                if !quantity.is_finite() || *quantity <= 0.0 {
                    return Err("Quantity must be a positive number".into());
                }

                let mut product = find_product(store, product_type, identifier)?;
                let material = find_material(store.raw_materials(), material)?.clone();

                match product
                    .ingredients
                    .iter_mut()
                    .find(|i| i.raw_material_id == material.id)
                {
                    Some(existing) => existing.quantity = *quantity,
                    None => product
                        .ingredients
                        .push(Ingredient::new(material.id.clone(), *quantity)),
                }

                let id = product.id.clone();
                let updated = store.update_product(product_type, &id, product).await?;
                println!(
                    "Added {} {} {} to '{}' (cost now {})",
                    quantity, material.unit, material.name, updated.name, updated.cost_price
                );
                Ok(())
            }

            ProductSubcommand::RemoveIngredient {
                identifier,
                material,
            } => {
                let mut product = find_product(store, product_type, identifier)?;
                let material = find_material(store.raw_materials(), material)?.clone();

                let before = product.ingredients.len();
                product.ingredients.retain(|i| i.raw_material_id != material.id);
                if product.ingredients.len() == before {
                    return Err(format!("'{}' does not use {}", product.name, material.name).into());
                }

                let id = product.id.clone();
                let updated = store.update_product(product_type, &id, product).await?;
                println!(
                    "Removed {} from '{}' (cost now {})",
                    material.name, updated.name, updated.cost_price
                );
                Ok(())
            }

            ProductSubcommand::AddPackaging {
                identifier,
                name,
                additional_price,
                ingredients,
            } => {
                let mut product = find_product(store, product_type, identifier)?;
                let ingredients = resolve_ingredients(store.raw_materials(), ingredients)?;

                let option = PackagingOption::new(name.trim())
                    .with_ingredients(ingredients)
                    .with_additional_price(*additional_price);
                product.packaging_options.push(option);

                let id = product.id.clone();
                let updated = store.update_product(product_type, &id, product).await?;
                println!("Added packaging '{}' to '{}'", name.trim(), updated.name);
                Ok(())
            }

            ProductSubcommand::Import { file } => {
                let products: Vec<Product> = read_json_file(file)?;
                let imported = store.import_products(product_type, products).await?;
                println!("Imported {} {}(s)", imported.len(), label.to_lowercase());
                Ok(())
            }
        }
    }
}
