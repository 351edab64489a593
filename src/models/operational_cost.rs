use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Recurrence {
    #[default]
    OneTime,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::OneTime => write!(f, "one-time"),
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Monthly => write!(f, "monthly"),
            Recurrence::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one-time" | "once" => Ok(Recurrence::OneTime),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" => Ok(Recurrence::Yearly),
            _ => Err(format!(
                "Invalid recurrence '{}'. Valid options: one-time, daily, weekly, monthly, yearly",
                s
            )),
        }
    }
}

/// Rent, salaries, utilities and other costs not tied to a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationalCost {
    #[serde(default)]
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl OperationalCost {
    pub fn new(description: impl Into<String>, amount: f64, recurrence: Recurrence) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            amount,
            date: Utc::now(),
            recurrence,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

impl fmt::Display for OperationalCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {} ({})",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.amount,
            self.recurrence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurrence_serde() {
        assert_eq!(
            serde_json::to_string(&Recurrence::OneTime).unwrap(),
            "\"one-time\""
        );
        let parsed: Recurrence = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(parsed, Recurrence::Monthly);
    }

    #[test]
    fn test_recurrence_defaults_to_one_time() {
        let json = r#"{"id":"c1","description":"Gas","amount":50000,"date":"2024-05-01T00:00:00Z"}"#;
        let cost: OperationalCost = serde_json::from_str(json).unwrap();
        assert_eq!(cost.recurrence, Recurrence::OneTime);
    }

    #[test]
    fn test_recurrence_from_str() {
        assert_eq!("Weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert_eq!("once".parse::<Recurrence>().unwrap(), Recurrence::OneTime);
        assert!("hourly".parse::<Recurrence>().is_err());
    }
}
