//! Menu seeding - Populates an empty database from the menu configuration.

use crate::{
    config::menu::{MenuConfig, ProductConfig},
    core::{
        catalog::{self, Ingredient},
        product::{self, Extra, SizeTerms},
    },
    entities::{ChoiceKind, Product},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, TransactionTrait};
use std::{collections::HashMap, path::Path};
use tracing::{info, instrument, warn};

/// Name to id lookups for everything created from the catalog section.
#[derive(Default)]
struct CatalogIds {
    ingredients: HashMap<(Ingredient, String), i64>,
    choices: HashMap<(ChoiceKind, String), i64>,
    flavors: HashMap<String, i64>,
    toppings: HashMap<String, i64>,
}

fn lookup<K>(map: &HashMap<K, i64>, key: &K, what: &str, name: &str, product: &str) -> Result<i64>
where
    K: std::hash::Hash + Eq,
{
    map.get(key).copied().ok_or_else(|| Error::Config {
        message: format!("Unknown {what} '{name}' in product '{product}'"),
    })
}

impl CatalogIds {
    fn ingredient(&self, ingredient: Ingredient, name: &str, product: &str) -> Result<i64> {
        lookup(
            &self.ingredients,
            &(ingredient, name.to_string()),
            &format!("{ingredient:?}").to_lowercase(),
            name,
            product,
        )
    }

    fn choice(&self, kind: ChoiceKind, name: &str, product: &str) -> Result<i64> {
        lookup(
            &self.choices,
            &(kind, name.to_string()),
            &format!("{kind} level"),
            name,
            product,
        )
    }

    fn extra(&self, extra: Extra, name: &str, product: &str) -> Result<i64> {
        match extra {
            Extra::Sweetener => self.ingredient(Ingredient::Sweetener, name, product),
            Extra::EspressoShot => self.ingredient(Ingredient::EspressoShot, name, product),
            Extra::Juice => self.ingredient(Ingredient::Juice, name, product),
            Extra::Tea => self.ingredient(Ingredient::Tea, name, product),
            Extra::Flavor => lookup(&self.flavors, &name.to_string(), "flavor", name, product),
            Extra::Topping => lookup(&self.toppings, &name.to_string(), "topping", name, product),
        }
    }
}

async fn seed_catalog<C>(db: &C, menu: &MenuConfig) -> Result<CatalogIds>
where
    C: ConnectionTrait,
{
    let mut ids = CatalogIds::default();

    let ingredients = [
        (Ingredient::Size, &menu.sizes),
        (Ingredient::Milk, &menu.milks),
        (Ingredient::Sweetener, &menu.sweeteners),
        (Ingredient::EspressoShot, &menu.espresso_shots),
        (Ingredient::Juice, &menu.juices),
        (Ingredient::Tea, &menu.teas),
    ];
    for (ingredient, names) in ingredients {
        for name in names {
            let entry = catalog::create_ingredient(db, ingredient, name).await?;
            ids.ingredients.insert((ingredient, entry.name), entry.id);
        }
    }

    let choices = [
        (ChoiceKind::Ice, &menu.choices.ice),
        (ChoiceKind::Room, &menu.choices.room),
        (ChoiceKind::MilkTemp, &menu.choices.milk_temp),
        (ChoiceKind::MilkFoam, &menu.choices.milk_foam),
        (ChoiceKind::ToppingAmount, &menu.choices.topping_amount),
    ];
    for (kind, names) in choices {
        for name in names {
            let choice = catalog::create_choice(db, kind, name).await?;
            ids.choices.insert((kind, choice.name), choice.id);
        }
    }

    for category in &menu.flavor_categories {
        let created = catalog::create_flavor_category(db, &category.name).await?;
        for name in &category.flavors {
            let flavor = catalog::create_flavor(db, created.id, name).await?;
            ids.flavors.insert(flavor.name, flavor.id);
        }
    }

    for category in &menu.topping_categories {
        let created = catalog::create_topping_category(db, &category.name).await?;
        for topping in &category.toppings {
            let amounts = topping
                .amounts
                .iter()
                .map(|amount| ids.choice(ChoiceKind::ToppingAmount, amount, &topping.name))
                .collect::<Result<Vec<_>>>()?;
            let default_amount = topping
                .default_amount
                .as_deref()
                .map(|amount| ids.choice(ChoiceKind::ToppingAmount, amount, &topping.name))
                .transpose()?;
            let created =
                catalog::create_topping(db, created.id, &topping.name, &amounts, default_amount)
                    .await?;
            ids.toppings.insert(created.name, created.id);
        }
    }

    Ok(ids)
}

async fn seed_product<C>(db: &C, ids: &CatalogIds, config: &ProductConfig) -> Result<()>
where
    C: ConnectionTrait,
{
    let name = config.name.as_str();
    let created = product::create_product(db, name, config.price).await?;

    let mut sizes = HashMap::new();
    for size in &config.sizes {
        let size_id = ids.ingredient(Ingredient::Size, &size.size, name)?;
        let terms = SizeTerms {
            price: size.price,
            default_flavor_pumps: size.flavor_pumps,
            default_espresso_shots: size.espresso_shots,
            default_tea_quantity: size.tea_quantity,
        };
        let row = product::allow_size(db, created.id, size_id, terms).await?;
        sizes.insert(size.size.as_str(), row.id);
    }

    let mut milks = HashMap::new();
    for milk in &config.milks {
        let milk_id = ids.ingredient(Ingredient::Milk, &milk.milk, name)?;
        let row = product::allow_milk(db, created.id, milk_id, milk.price).await?;
        milks.insert(milk.milk.as_str(), row.id);
    }

    let levels = [
        (ChoiceKind::Ice, &config.ice, &config.default_ice),
        (ChoiceKind::Room, &config.room, &config.default_room),
        (ChoiceKind::MilkTemp, &config.milk_temps, &config.default_milk_temp),
        (ChoiceKind::MilkFoam, &config.milk_foams, &config.default_milk_foam),
    ];
    for (kind, allowed, default) in levels {
        for level in allowed {
            let choice_id = ids.choice(kind, level, name)?;
            product::allow_choice(db, created.id, choice_id).await?;
        }
        if let Some(level) = default {
            let choice_id = ids.choice(kind, level, name)?;
            product::set_default_choice(db, created.id, kind, Some(choice_id)).await?;
        }
    }

    for extra in &config.extras {
        let catalog_id = ids.extra(extra.kind, &extra.name, name)?;
        product::allow_extra(
            db,
            created.id,
            extra.kind,
            catalog_id,
            extra.price,
            extra.default,
        )
        .await?;
    }

    if let Some(size) = &config.default_size {
        let row_id = sizes.get(size.as_str()).ok_or_else(|| Error::Config {
            message: format!("Default size '{size}' is not offered by product '{name}'"),
        })?;
        product::set_default_size(db, created.id, Some(*row_id)).await?;
    }
    if let Some(milk) = &config.default_milk {
        let row_id = milks.get(milk.as_str()).ok_or_else(|| Error::Config {
            message: format!("Default milk '{milk}' is not offered by product '{name}'"),
        })?;
        product::set_default_milk(db, created.id, Some(*row_id)).await?;
    }
    Ok(())
}

/// Seeds the catalog and products when the database has no products yet.
///
/// Everything is written in one transaction. Returns whether anything was seeded.
#[instrument(skip_all)]
pub async fn seed_menu(db: &DatabaseConnection, menu: &MenuConfig) -> Result<bool> {
    let existing = Product::find().count(db).await?;
    if existing > 0 {
        info!(existing, "Products already present, skipping menu seed");
        return Ok(false);
    }

    let txn = db.begin().await?;
    let ids = seed_catalog(&txn, menu).await?;
    for product in &menu.products {
        seed_product(&txn, &ids, product).await?;
    }
    txn.commit().await?;

    info!(products = menu.products.len(), "Seeded menu");
    Ok(true)
}

/// Seeds from a menu file. A missing file is not an error; the server starts with an empty menu.
pub async fn seed_from_file<P: AsRef<Path>>(db: &DatabaseConnection, path: P) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Menu file {} not found, skipping seed", path.display());
        return Ok(false);
    }
    let menu = crate::config::menu::load_config(path)?;
    seed_menu(db, &menu).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::menu::parse_config;
    use crate::core::order::{self, ItemRequest};
    use crate::test_utils::*;

    const MENU: &str = r#"
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
        default_milk = "Whole"
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
        milk = "Whole"

        [[products.milks]]
        milk = "Oat"
        price = "0.70"

        [[products.extras]]
        kind = "espresso_shot"
        name = "Signature"
        default = true

        [[products.extras]]
        kind = "topping"
        name = "Caramel Drizzle"
        price = "0.25"
    "#;

    #[tokio::test]
    async fn test_seed_menu() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = parse_config(MENU)?;

        assert!(seed_menu(&db, &menu).await?);

        let products = product::get_all_active_products(&db).await?;
        let details = product::product_details(&db, products).await?;
        let latte = &details[0];
        assert_eq!(latte.name, "Iced Latte");
        assert_eq!(latte.default_size.as_ref().unwrap().size.name, "Tall");
        assert_eq!(latte.default_milk.as_ref().unwrap().milk.name, "Whole");
        assert_eq!(latte.default_ice.as_ref().unwrap().name, "Regular");
        assert_eq!(latte.allowed_toppings[0].ingredient.allowed_choices.len(), 2);

        // The seeded menu is orderable
        let placed = order::place_order(
            &db,
            order::OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items: vec![ItemRequest::new(latte.id)],
            },
        )
        .await?;
        assert_eq!(placed.order.total, price(445));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_skipped_when_products_exist() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = parse_config(MENU)?;

        assert!(seed_menu(&db, &menu).await?);
        assert!(!seed_menu(&db, &menu).await?);
        assert_eq!(product::get_all_active_products(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_rolls_back_on_unknown_reference() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = parse_config(
            r#"
            sizes = ["Tall"]

            [[products]]
            name = "Latte"
            price = "3.95"

            [[products.sizes]]
            size = "Venti"
            "#,
        )?;

        let result = seed_menu(&db, &menu).await;
        assert!(matches!(result, Err(Error::Config { ref message }) if message.contains("Venti")));
        assert!(catalog::list_ingredients(&db, Ingredient::Size).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_bundled_menu_seeds() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = parse_config(include_str!("../../menu.toml"))?;

        assert!(seed_menu(&db, &menu).await?);
        let products = product::get_all_active_products(&db).await?;
        assert_eq!(products.len(), menu.products.len());

        // Every product is orderable with its defaults
        for product in products {
            let placed = order::place_order(
                &db,
                order::OrderRequest {
                    customer_name: "Ada".to_string(),
                    special_instructions: String::new(),
                    items: vec![ItemRequest::new(product.id)],
                },
            )
            .await?;
            assert!(placed.order.total >= product.price);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_from_missing_file() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!seed_from_file(&db, "does/not/exist/menu.toml").await?);
        Ok(())
    }
}
