use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use super::{CommandResult, OutputFormat};
use cafebook::client::StateStore;
use cafebook::reports::DateRange;

#[derive(Args)]
pub struct ReportCommand {
    #[command(subcommand)]
    pub command: ReportSubcommand,
}

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Revenue, cost of goods and profit over a date range
    Summary {
        /// First day (YYYY-MM-DD, default 29 days before --to)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD, default today)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ReportCommand {
    pub async fn run(&self, store: &StateStore) -> CommandResult {
        match &self.command {
            ReportSubcommand::Summary { from, to, format } => {
                let range = DateRange::or_default(*from, *to, Utc::now().date_naive())?;
                let summary = store.sales_summary(range.from, range.to).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    }
                    OutputFormat::Text => {
                        println!("Summary {} to {}", range.from, range.to);
                        println!("{}", "=".repeat(32));
                        println!("Sales:              {}", summary.sale_count);
                        println!("Items sold:         {}", summary.items_sold);
                        println!("Revenue:            {}", summary.revenue);
                        println!("Cost of goods:      {}", summary.cost_of_goods);
                        println!("Gross profit:       {}", summary.gross_profit);
                        println!("Operational costs:  {}", summary.operational_costs);
                        println!("Net profit:         {}", summary.net_profit);

                        if !summary.top_products.is_empty() {
                            println!("\nTop products:");
                            for product in &summary.top_products {
                                println!(
                                    "  {:<24} x{:<5} {}",
                                    product.name, product.quantity, product.revenue
                                );
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
