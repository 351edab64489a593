use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Subcommand};

use super::{confirm, CommandResult, OutputFormat};
use cafebook::client::StateStore;
use cafebook::models::{OperationalCost, Recurrence};

#[derive(Args)]
pub struct CostCommand {
    #[command(subcommand)]
    pub command: CostSubcommand,
}

#[derive(Subcommand)]
pub enum CostSubcommand {
    /// Record an operational cost (rent, wages, utilities)
    Add {
        /// What the cost is for
        description: String,

        /// Amount paid
        #[arg(long)]
        amount: f64,

        /// Date paid or first due (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// one-time, daily, weekly, monthly, yearly
        #[arg(long, default_value = "one-time")]
        recurrence: Recurrence,
    },

    /// List operational costs
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an operational cost
    Update {
        /// Cost ID
        id: String,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New amount
        #[arg(long)]
        amount: Option<f64>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// New recurrence
        #[arg(long)]
        recurrence: Option<Recurrence>,
    },

    /// Delete an operational cost
    Delete {
        /// Cost ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

impl CostCommand {
    pub async fn run(&self, store: &mut StateStore) -> CommandResult {
        match &self.command {
            CostSubcommand::Add {
                description,
                amount,
                date,
                recurrence,
            } => {
                let mut cost = OperationalCost::new(description.trim(), *amount, *recurrence);
                if let Some(date) = date {
                    cost = cost.with_date(start_of_day(*date));
                }

                let created = store.create_operational_cost(cost).await?;
                println!("Recorded operational cost:");
                println!("  {}  {}", created.id, created);
                Ok(())
            }

            CostSubcommand::List { format } => {
                let costs = store.operational_costs();

                if costs.is_empty() {
                    println!("No operational costs found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(costs)?);
                    }
                    OutputFormat::Text => {
                        for cost in costs {
                            println!("{}  {}", cost.id, cost);
                        }
                        println!("\nTotal: {} cost(s)", costs.len());
                    }
                }
                Ok(())
            }

            CostSubcommand::Update {
                id,
                description,
                amount,
                date,
                recurrence,
            } => {
                let has_updates = description.is_some()
                    || amount.is_some()
                    || date.is_some()
                    || recurrence.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut cost = store
                    .operational_costs()
                    .iter()
                    .find(|c| c.id == *id)
                    .cloned()
                    .ok_or_else(|| format!("Operational cost not found: {}", id))?;

                if let Some(new_description) = description {
                    cost.description = new_description.clone();
                }
                if let Some(new_amount) = amount {
                    cost.amount = *new_amount;
                }
                if let Some(new_date) = date {
                    cost.date = start_of_day(*new_date);
                }
                if let Some(new_recurrence) = recurrence {
                    cost.recurrence = *new_recurrence;
                }

                let updated = store.update_operational_cost(id, cost).await?;
                println!("Updated operational cost:");
                println!("  {}  {}", updated.id, updated);
                Ok(())
            }

            CostSubcommand::Delete { id, force } => {
                let cost = store
                    .operational_costs()
                    .iter()
                    .find(|c| c.id == *id)
                    .cloned()
                    .ok_or_else(|| format!("Operational cost not found: {}", id))?;

                if !force && !confirm(&format!("Delete cost '{}'?", cost.description))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                store.delete_operational_cost(id).await?;
                println!("Deleted operational cost: {}", cost.description);
                Ok(())
            }
        }
    }
}
