use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{confirm, find_material, read_json_file, truncate, CommandResult, OutputFormat};
use cafebook::client::StateStore;
use cafebook::models::{MaterialCategory, RawMaterial};
use cafebook::service::RestockInput;

#[derive(Args)]
pub struct MaterialCommand {
    #[command(subcommand)]
    pub command: MaterialSubcommand,
}

#[derive(Subcommand)]
pub enum MaterialSubcommand {
    /// Create a new raw material
    Create {
        /// Name of the material
        name: String,

        /// Unit of measurement (g, ml, pcs, ...)
        #[arg(long)]
        unit: String,

        /// Cost of one unit
        #[arg(long)]
        cost_per_unit: f64,

        /// Starting stock; leave out to not track stock
        #[arg(long)]
        quantity: Option<f64>,

        /// Category (ingredient, packaging, topping)
        #[arg(long)]
        category: Option<MaterialCategory>,

        /// Price charged when sold as a topping
        #[arg(long)]
        selling_price: Option<f64>,

        /// Warn when stock falls to this level
        #[arg(long)]
        low_stock_threshold: Option<f64>,
    },

    /// List all raw materials
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by category
        #[arg(long)]
        category: Option<MaterialCategory>,
    },

    /// Show a raw material's details
    Show {
        /// Material ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing raw material
    Update {
        /// Material ID or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New unit
        #[arg(long)]
        unit: Option<String>,

        /// New cost of one unit; products using it are repriced
        #[arg(long)]
        cost_per_unit: Option<f64>,

        /// New category
        #[arg(long)]
        category: Option<MaterialCategory>,

        /// New topping price
        #[arg(long)]
        selling_price: Option<f64>,

        /// New low stock threshold
        #[arg(long)]
        low_stock_threshold: Option<f64>,
    },

    /// Delete a raw material
    Delete {
        /// Material ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Add purchased stock; the unit cost becomes the weighted average
    Restock {
        /// Material ID or name
        identifier: String,

        /// Quantity bought
        #[arg(long)]
        quantity: f64,

        /// Total paid for the quantity
        #[arg(long)]
        cost: f64,
    },

    /// Import raw materials from a JSON array, replacing matching ids
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// List tracked materials at or below their low stock threshold
    LowStock {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn print_table(materials: &[RawMaterial]) {
    println!(
        "{:<36}  {:<24}  {:>12}  {:>12}  CATEGORY",
        "ID", "NAME", "COST/UNIT", "STOCK"
    );
    println!("{}", "-".repeat(100));
    for material in materials {
        let stock = match material.total_quantity {
            Some(quantity) => format!("{} {}", quantity, material.unit),
            None => "-".to_string(),
        };
        let category = material
            .category
            .map(|c| c.to_string())
            .unwrap_or_default();
        println!(
            "{:<36}  {:<24}  {:>12}  {:>12}  {}",
            material.id,
            truncate(&material.name, 24),
            material.cost_per_unit,
            stock,
            category
        );
    }
}

impl MaterialCommand {
    pub async fn run(&self, store: &mut StateStore) -> CommandResult {
        match &self.command {
            MaterialSubcommand::Create {
                name,
                unit,
                cost_per_unit,
                quantity,
                category,
                selling_price,
                low_stock_threshold,
            } => {
                let mut material = RawMaterial::new(name.trim(), unit.trim(), *cost_per_unit);
                if let Some(quantity) = quantity {
                    material = material.with_stock(*quantity);
                }
                if let Some(category) = category {
                    material = material.with_category(*category);
                }
                if let Some(price) = selling_price {
                    material = material.with_selling_price(*price);
                }
                if let Some(threshold) = low_stock_threshold {
                    material = material.with_low_stock_threshold(*threshold);
                }

                let created = store.create_raw_material(material).await?;
                println!("Created raw material:");
                println!("{}", created);
                Ok(())
            }

            MaterialSubcommand::List { format, category } => {
                let materials: Vec<_> = store
                    .raw_materials()
                    .iter()
                    .filter(|m| category.is_none() || m.category == *category)
                    .cloned()
                    .collect();

                if materials.is_empty() {
                    println!("No raw materials found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&materials)?);
                    }
                    OutputFormat::Text => {
                        print_table(&materials);
                        println!("\nTotal: {} material(s)", materials.len());
                    }
                }
                Ok(())
            }

            MaterialSubcommand::Show { identifier, format } => {
                let material = find_material(store.raw_materials(), identifier)?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(material)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", material);
                    }
                }
                Ok(())
            }

            MaterialSubcommand::Update {
                identifier,
                name,
                unit,
                cost_per_unit,
                category,
                selling_price,
                low_stock_threshold,
            } => {
                let has_updates = name.is_some()
                    || unit.is_some()
                    || cost_per_unit.is_some()
                    || category.is_some()
                    || selling_price.is_some()
                    || low_stock_threshold.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut material = find_material(store.raw_materials(), identifier)?.clone();

                if let Some(new_name) = name {
                    material.name = new_name.clone();
                }
                if let Some(new_unit) = unit {
                    material.unit = new_unit.clone();
                }
                if let Some(cost) = cost_per_unit {
                    material.cost_per_unit = *cost;
                    if let Some(quantity) = material.total_quantity {
                        material.total_cost = Some(quantity * cost);
                    }
                }
                if category.is_some() {
                    material.category = *category;
                }
                if selling_price.is_some() {
                    material.selling_price = *selling_price;
                }
                if low_stock_threshold.is_some() {
                    material.low_stock_threshold = *low_stock_threshold;
                }

                let id = material.id.clone();
                let updated = store.update_raw_material(&id, material).await?;
                println!("Updated raw material:");
                println!("{}", updated);
                Ok(())
            }

            MaterialSubcommand::Delete { identifier, force } => {
                let material = find_material(store.raw_materials(), identifier)?.clone();

                if !force && !confirm(&format!("Delete raw material '{}'?", material.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_raw_material(&material.id).await?;
                println!("Deleted raw material: {}", material.name);
                Ok(())
            }

            MaterialSubcommand::Restock {
                identifier,
                quantity,
                cost,
            } => {
                let id = find_material(store.raw_materials(), identifier)?.id.clone();
                let input = RestockInput {
                    quantity: *quantity,
                    cost: *cost,
                };
                let restocked = store.restock_raw_material(&id, input).await?;
                println!("Restocked raw material:");
                println!("{}", restocked);
                Ok(())
            }

            MaterialSubcommand::Import { file } => {
                let materials: Vec<RawMaterial> = read_json_file(file)?;
                let imported = store.import_raw_materials(materials).await?;
                println!("Imported {} raw material(s)", imported.len());
                Ok(())
            }

            MaterialSubcommand::LowStock { format } => {
                let low: Vec<_> = store
                    .raw_materials()
                    .iter()
                    .filter(|m| m.is_low_on_stock())
                    .cloned()
                    .collect();

                if low.is_empty() {
                    println!("All tracked materials are above their thresholds");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&low)?);
                    }
                    OutputFormat::Text => {
                        print_table(&low);
                        println!("\n{} material(s) low on stock", low.len());
                    }
                }
                Ok(())
            }
        }
    }
}
