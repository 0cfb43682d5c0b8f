//! Menu configuration loading from menu.toml
//!
//! The menu file describes the ingredient catalog and the products sold, with the options
//! each product allows, their upcharges and the defaults. It is used to seed an empty
//! database on first start. Options are referenced by name throughout; the seeder resolves
//! them to ids.

use crate::core::product::Extra;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire menu.toml file
#[derive(Debug, Default, Deserialize)]
pub struct MenuConfig {
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub milks: Vec<String>,
    #[serde(default)]
    pub sweeteners: Vec<String>,
    #[serde(default)]
    pub espresso_shots: Vec<String>,
    #[serde(default)]
    pub juices: Vec<String>,
    #[serde(default)]
    pub teas: Vec<String>,
    #[serde(default)]
    pub choices: ChoiceConfig,
    #[serde(default)]
    pub flavor_categories: Vec<FlavorCategoryConfig>,
    #[serde(default)]
    pub topping_categories: Vec<ToppingCategoryConfig>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Named levels, one list per kind
#[derive(Debug, Default, Deserialize)]
pub struct ChoiceConfig {
    #[serde(default)]
    pub ice: Vec<String>,
    #[serde(default)]
    pub room: Vec<String>,
    #[serde(default)]
    pub milk_temp: Vec<String>,
    #[serde(default)]
    pub milk_foam: Vec<String>,
    #[serde(default)]
    pub topping_amount: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlavorCategoryConfig {
    pub name: String,
    #[serde(default)]
    pub flavors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToppingCategoryConfig {
    pub name: String,
    #[serde(default)]
    pub toppings: Vec<ToppingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ToppingConfig {
    pub name: String,
    /// Allowed topping amounts, by name
    #[serde(default)]
    pub amounts: Vec<String>,
    pub default_amount: Option<String>,
}

/// Configuration for a single product
#[derive(Debug, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    /// Base price, written as a string ("3.95") to keep it exact
    pub price: Decimal,
    pub default_size: Option<String>,
    pub default_milk: Option<String>,
    #[serde(default)]
    pub sizes: Vec<ProductSizeConfig>,
    #[serde(default)]
    pub milks: Vec<ProductMilkConfig>,
    #[serde(default)]
    pub ice: Vec<String>,
    pub default_ice: Option<String>,
    #[serde(default)]
    pub room: Vec<String>,
    pub default_room: Option<String>,
    #[serde(default)]
    pub milk_temps: Vec<String>,
    pub default_milk_temp: Option<String>,
    #[serde(default)]
    pub milk_foams: Vec<String>,
    pub default_milk_foam: Option<String>,
    #[serde(default)]
    pub extras: Vec<ExtraConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSizeConfig {
    pub size: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub flavor_pumps: i32,
    #[serde(default)]
    pub espresso_shots: i32,
    #[serde(default)]
    pub tea_quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct ProductMilkConfig {
    pub milk: String,
    #[serde(default)]
    pub price: Decimal,
}

/// A multi-select option (sweetener, espresso shot, flavor, juice, topping or tea)
#[derive(Debug, Deserialize)]
pub struct ExtraConfig {
    pub kind: Extra,
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    /// Added to new order items when the customer does not say otherwise
    #[serde(default)]
    pub default: bool,
}

/// Parses menu configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<MenuConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse menu config: {e}"),
    })
}

/// Loads menu configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or a price is malformed
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MenuConfig> {
    let path = path.as_ref();
    tracing::debug!("Loading menu configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read menu file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_menu_config() {
        let toml_str = r#"
            sizes = ["Tall", "Grande"]
            milks = ["Whole", "Oat"]
            espresso_shots = ["Signature"]

            [choices]
            ice = ["Light", "Regular"]
            topping_amount = ["Light", "Extra"]

            [[flavor_categories]]
            name = "Syrups"
            flavors = ["Vanilla"]

            [[topping_categories]]
            name = "Drizzles"

            [[topping_categories.toppings]]
            name = "Caramel Drizzle"
            amounts = ["Light", "Extra"]
            default_amount = "Light"

            [[products]]
            name = "Iced Latte"
            price = "4.45"
            default_size = "Tall"
            ice = ["Light", "Regular"]
            default_ice = "Regular"

            [[products.sizes]]
            size = "Tall"
            espresso_shots = 1

            [[products.sizes]]
            size = "Grande"
            price = "0.50"
            espresso_shots = 2

            [[products.milks]]
            milk = "Oat"
            price = "0.70"

            [[products.extras]]
            kind = "espresso_shot"
            name = "Signature"
            default = true

            [[products.extras]]
            kind = "flavor"
            name = "Vanilla"
            price = "0.50"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.sizes, ["Tall", "Grande"]);
        assert!(config.teas.is_empty());
        assert_eq!(config.choices.ice.len(), 2);
        assert!(config.choices.room.is_empty());
        assert_eq!(config.flavor_categories[0].flavors, ["Vanilla"]);
        let drizzle = &config.topping_categories[0].toppings[0];
        assert_eq!(drizzle.default_amount.as_deref(), Some("Light"));

        let latte = &config.products[0];
        assert_eq!(latte.price, Decimal::new(445, 2));
        assert_eq!(latte.sizes[0].price, Decimal::ZERO);
        assert_eq!(latte.sizes[1].price, Decimal::new(50, 2));
        assert_eq!(latte.milks[0].price, Decimal::new(70, 2));
        assert_eq!(latte.default_milk, None);
        assert_eq!(latte.extras[0].kind, Extra::EspressoShot);
        assert!(latte.extras[0].default);
        assert!(!latte.extras[1].default);
    }

    #[test]
    fn test_unknown_extra_kind_rejected() {
        let toml_str = r#"
            [[products]]
            name = "Latte"
            price = "3.95"

            [[products.extras]]
            kind = "sprinkles"
            name = "Rainbow"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("does/not/exist/menu.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
