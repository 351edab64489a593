//! Date-range analytics over the sales and cost history.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{DbData, OperationalCost, ProductType, RawMaterial, Recurrence};
use crate::service::{CafeService, ServiceError, ServiceResult};

const TOP_PRODUCTS: usize = 5;

pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, String> {
        if from > to {
            return Err(format!(
                "Invalid date range: {} is after {}",
                from, to
            ));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Fills a missing end with `today` and a missing start with the
    /// `DEFAULT_RANGE_DAYS` days ending at `to`.
    pub fn or_default(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, String> {
        let to = to.unwrap_or(today);
        let from = match from {
            Some(from) => from,
            None => to
                .checked_sub_signed(Duration::days(DEFAULT_RANGE_DAYS - 1))
                .ok_or_else(|| format!("No default start date before {}", to))?,
        };
        Self::new(from, to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub sale_count: usize,
    pub items_sold: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub product_type: ProductType,
    pub name: String,
    pub quantity: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub range: DateRange,
    pub sale_count: usize,
    pub items_sold: u64,
    pub revenue: f64,
    /// Current HPP of each product times quantity sold.
    pub cost_of_goods: f64,
    pub gross_profit: f64,
    pub operational_costs: f64,
    pub net_profit: f64,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<ProductSales>,
}

/// How many times a cost falls due within the range. Recurring costs are due
/// on their start date and every period after it.
fn occurrences(cost: &OperationalCost, range: &DateRange) -> u32 {
    let start = cost.date.date_naive();
    if cost.recurrence == Recurrence::OneTime {
        return u32::from(range.contains(start));
    }

    let nth = |k: u32| -> Option<NaiveDate> {
        match cost.recurrence {
            Recurrence::Daily => start.checked_add_signed(Duration::days(i64::from(k))),
            Recurrence::Weekly => start.checked_add_signed(Duration::weeks(i64::from(k))),
            Recurrence::Monthly => start.checked_add_months(Months::new(k)),
            Recurrence::Yearly => start.checked_add_months(Months::new(k.checked_mul(12)?)),
            Recurrence::OneTime => None,
        }
    };

    // Due dates increase with k until they overflow; bisect for both ends.
    let after = |bound: NaiveDate, strict: bool| {
        first_index(|k| match nth(k) {
            Some(due) if strict => due > bound,
            Some(due) => due >= bound,
            None => true,
        })
    };
    let first = after(range.from, false);
    let past_end = after(range.to, true);
    u32::try_from(past_end.saturating_sub(first)).unwrap_or(u32::MAX)
}

/// Smallest k in `0..=u32::MAX` for which `reached` holds, or `u32::MAX + 1`
/// if none does. `reached` must be monotone.
fn first_index(reached: impl Fn(u32) -> bool) -> u64 {
    let mut lo = 0u64;
    let mut hi = u64::from(u32::MAX) + 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let k = u32::try_from(mid).unwrap_or(u32::MAX);
        if reached(k) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

pub fn operational_costs_in_range(db: &DbData, range: &DateRange) -> f64 {
    db.operational_costs
        .iter()
        .map(|c| c.amount * f64::from(occurrences(c, range)))
        .sum()
}

pub fn summarize(db: &DbData, range: DateRange) -> SalesSummary {
    let mut sale_count = 0;
    let mut items_sold = 0u64;
    let mut revenue = 0.0;
    let mut cost_of_goods = 0.0;
    let mut daily: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
    let mut by_product: HashMap<(ProductType, &str), ProductSales> = HashMap::new();

    for sale in db
        .sales
        .iter()
        .filter(|s| range.contains(s.date.date_naive()))
    {
        let product = db.product(sale.product_type, &sale.product_id);
        let quantity = u64::from(sale.quantity);

        sale_count += 1;
        items_sold += quantity;
        revenue += sale.total_sale_price;
        cost_of_goods += product.map_or(0.0, |p| p.cost_price) * f64::from(sale.quantity);

        let day = sale.date.date_naive();
        let bucket = daily.entry(day).or_insert_with(|| DailySales {
            date: day,
            sale_count: 0,
            items_sold: 0,
            revenue: 0.0,
        });
        bucket.sale_count += 1;
        bucket.items_sold += quantity;
        bucket.revenue += sale.total_sale_price;

        let entry = by_product
            .entry((sale.product_type, sale.product_id.as_str()))
            .or_insert_with(|| ProductSales {
                product_id: sale.product_id.clone(),
                product_type: sale.product_type,
                name: product
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| sale.product_id.clone()),
                quantity: 0,
                revenue: 0.0,
            });
        entry.quantity += quantity;
        entry.revenue += sale.total_sale_price;
    }

    let mut top_products: Vec<ProductSales> = by_product.into_values().collect();
    top_products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue.total_cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    top_products.truncate(TOP_PRODUCTS);

    let operational_costs = operational_costs_in_range(db, &range);
    let gross_profit = revenue - cost_of_goods;

    SalesSummary {
        range,
        sale_count,
        items_sold,
        revenue,
        cost_of_goods,
        gross_profit,
        operational_costs,
        net_profit: gross_profit - operational_costs,
        daily: daily.into_values().collect(),
        top_products,
    }
}

/// Tracked materials at or below their restock threshold.
pub fn low_stock(db: &DbData) -> Vec<RawMaterial> {
    db.raw_materials
        .iter()
        .filter(|m| m.is_low_on_stock())
        .cloned()
        .collect()
}

impl CafeService {
    pub async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<SalesSummary> {
        let range = DateRange::new(from, to).map_err(ServiceError::Validation)?;
        self.summary_for(range).await
    }

    pub async fn summary_for(&self, range: DateRange) -> ServiceResult<SalesSummary> {
        let db = self.snapshot().await?;
        Ok(summarize(&db, range))
    }

    pub async fn low_stock_materials(&self) -> ServiceResult<Vec<RawMaterial>> {
        let db = self.snapshot().await?;
        Ok(low_stock(&db))
    }
}
