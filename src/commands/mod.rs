mod config_cmd;
mod cost;
mod material;
mod product;
mod report;
mod sale;

pub use config_cmd::ConfigCommand;
pub use cost::CostCommand;
pub use material::MaterialCommand;
pub use product::ProductCommand;
pub use report::ReportCommand;
pub use sale::SaleCommand;

use clap::ValueEnum;
use std::io::{self, Write};

use cafebook::models::{Ingredient, RawMaterial};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Finds an item by exact id, falling back to a case-insensitive name match.
fn find<'a, T>(
    items: &'a [T],
    identifier: &str,
    id: impl Fn(&T) -> &str,
    name: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    items.iter().find(|item| id(item) == identifier).or_else(|| {
        items
            .iter()
            .find(|item| name(item).eq_ignore_ascii_case(identifier))
    })
}

fn find_material<'a>(materials: &'a [RawMaterial], identifier: &str) -> Result<&'a RawMaterial, String> {
    find(materials, identifier, |m| m.id.as_str(), |m| m.name.as_str())
        .ok_or_else(|| format!("Raw material not found: {}", identifier))
}

/// Parses `MATERIAL=QUANTITY`.
fn parse_ingredient_arg(s: &str) -> Result<(String, f64), String> {
    let (material, quantity) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("Invalid ingredient '{}'. Expected MATERIAL=QUANTITY", s))?;
    let quantity: f64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("Invalid quantity in '{}'", s))?;
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(format!("Quantity must be a positive number in '{}'", s));
    }
    let material = material.trim();
    if material.is_empty() {
        return Err(format!("Missing material in '{}'", s));
    }
    Ok((material.to_string(), quantity))
}

/// Turns `MATERIAL=QUANTITY` pairs into ingredients, resolving names to ids.
fn resolve_ingredients(
    materials: &[RawMaterial],
    pairs: &[(String, f64)],
) -> Result<Vec<Ingredient>, String> {
    pairs
        .iter()
        .map(|(material, quantity)| {
            let material = find_material(materials, material)?;
            Ok(Ingredient::new(material.id.clone(), *quantity))
        })
        .collect()
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() > width {
        let head: String = name.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let parsed = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn materials() -> Vec<RawMaterial> {
        vec![
            RawMaterial::new("Milk", "l", 1000.0).with_id("m1"),
            RawMaterial::new("Brown Sugar", "g", 20.0).with_id("m2"),
        ]
    }

    #[test]
    fn test_parse_ingredient_arg() {
        assert_eq!(
            parse_ingredient_arg("milk=0.2").unwrap(),
            ("milk".to_string(), 0.2)
        );
        assert_eq!(
            parse_ingredient_arg("Brown Sugar = 15").unwrap(),
            ("Brown Sugar".to_string(), 15.0)
        );
        assert!(parse_ingredient_arg("milk").is_err());
        assert!(parse_ingredient_arg("milk=abc").is_err());
        assert!(parse_ingredient_arg("milk=-1").is_err());
        assert!(parse_ingredient_arg("=2").is_err());
    }

    #[test]
    fn test_find_prefers_id_then_name() {
        let materials = materials();
        assert_eq!(find_material(&materials, "m2").unwrap().name, "Brown Sugar");
        assert_eq!(find_material(&materials, "brown sugar").unwrap().id, "m2");
        assert!(find_material(&materials, "salt").is_err());
    }

    #[test]
    fn test_resolve_ingredients_by_name() {
        let materials = materials();
        let pairs = vec![("Milk".to_string(), 0.2), ("m2".to_string(), 10.0)];
        let ingredients = resolve_ingredients(&materials, &pairs).unwrap();
        assert_eq!(ingredients[0].raw_material_id, "m1");
        assert_eq!(ingredients[1].raw_material_id, "m2");

        let missing = vec![("Salt".to_string(), 1.0)];
        assert!(resolve_ingredients(&materials, &missing).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Latte", 10), "Latte");
        assert_eq!(truncate("Iced Caramel Macchiato", 10), "Iced Ca...");
    }
}
