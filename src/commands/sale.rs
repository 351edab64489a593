use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{confirm, find, find_material, CommandResult, OutputFormat};
use cafebook::client::StateStore;
use cafebook::models::ProductType;
use cafebook::service::NewSale;

#[derive(Args)]
pub struct SaleCommand {
    #[command(subcommand)]
    pub command: SaleSubcommand,
}

#[derive(Subcommand)]
pub enum SaleSubcommand {
    /// Record a sale and deduct its stock
    Record {
        /// Product ID or name
        product: String,

        /// Product type (drink, food)
        #[arg(long = "type", default_value = "drink")]
        product_type: ProductType,

        /// Number of items
        #[arg(long, short, default_value_t = 1)]
        quantity: u32,

        /// Amount taken off the total
        #[arg(long, default_value_t = 0.0)]
        discount: f64,

        /// Topping ID or name (can be repeated)
        #[arg(long = "topping", value_name = "MATERIAL")]
        toppings: Vec<String>,

        /// Packaging option ID or name
        #[arg(long)]
        packaging: Option<String>,
    },

    /// List sales, newest first
    List {
        /// Only sales on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only sales on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a sale record (stock is not returned)
    Delete {
        /// Sale ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl SaleCommand {
    pub async fn run(&self, store: &mut StateStore) -> CommandResult {
        match &self.command {
            SaleSubcommand::Record {
                product,
                product_type,
                quantity,
                discount,
                toppings,
                packaging,
            } => {
                let product = find(
                    store.products(*product_type),
                    product,
                    |p| p.id.as_str(),
                    |p| p.name.as_str(),
                )
                .cloned()
                .ok_or_else(|| format!("Product not found: {}", product))?;

                let mut sale = NewSale::new(product.id.clone(), *product_type, *quantity);
                sale.discount = *discount;
                for topping in toppings {
                    let material = find_material(store.raw_materials(), topping)?;
                    sale.selected_toppings.push(material.id.clone());
                }
                if let Some(packaging) = packaging {
                    let option = find(
                        &product.packaging_options,
                        packaging,
                        |o| o.id.as_str(),
                        |o| o.name.as_str(),
                    )
                    .ok_or_else(|| {
                        format!("Packaging '{}' is not offered for '{}'", packaging, product.name)
                    })?;
                    sale.selected_packaging_id = Some(option.id.clone());
                }

                let recorded = store.record_sale(sale).await?;
                println!("Recorded sale:");
                println!("  {} {}", recorded, product.name);
                Ok(())
            }

            SaleSubcommand::List { from, to, format } => {
                let mut sales: Vec<_> = store
                    .sales()
                    .iter()
                    .filter(|s| {
                        let day = s.date.date_naive();
                        from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
                    })
                    .cloned()
                    .collect();
                sales.sort_by(|a, b| b.date.cmp(&a.date));

                if sales.is_empty() {
                    println!("No sales found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&sales)?);
                    }
                    OutputFormat::Text => {
                        let data = store.data();
                        let mut total = 0.0;
                        for sale in &sales {
                            let name = data
                                .product(sale.product_type, &sale.product_id)
                                .map(|p| p.name.as_str())
                                .unwrap_or("(deleted)");
                            println!("{}  {}  {}", sale.id, sale, name);
                            total += sale.total_sale_price;
                        }
                        println!("\nTotal: {} sale(s), revenue {}", sales.len(), total);
                    }
                }
                Ok(())
            }

            SaleSubcommand::Delete { id, force } => {
                if !store.sales().iter().any(|s| s.id == *id) {
                    return Err(format!("Sale not found: {}", id).into());
                }

                if !force && !confirm(&format!("Delete sale {}?", id))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_sale(id).await?;
                println!("Deleted sale: {}", id);
                Ok(())
            }
        }
    }
}
