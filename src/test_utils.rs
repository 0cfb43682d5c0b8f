//! Shared test utilities for the coffee ordering API.
//!
//! This module provides common helper functions for setting up test databases
//! and a small menu with sensible defaults.

use crate::{
    config::database,
    core::{
        catalog::{self, Ingredient},
        product::{self, Extra, SizeTerms},
    },
    entities::{ChoiceKind, choice, product as product_entity, product_milk, product_size},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a price from a number of cents.
#[must_use]
pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// The rows created by [`seed_test_menu`].
pub struct TestMenu {
    /// Latte, 3.95: Tall (default) and Grande, Whole (default) and Oat, Light ice (default)
    pub latte: product_entity::Model,
    /// Free, 2 pumps, 1 shot
    pub latte_tall: product_size::Model,
    /// +0.50, 3 pumps, 2 shots
    pub latte_grande: product_size::Model,
    /// Free
    pub latte_whole: product_milk::Model,
    /// +0.70
    pub latte_oat: product_milk::Model,
    /// `product_flavors` row, +0.50, not a default
    pub latte_vanilla: i64,
    /// `product_espresso_shots` row, free, a default
    pub latte_signature_shot: i64,
    /// `product_toppings` row, +0.25, not a default
    pub latte_caramel_drizzle: i64,
    pub ice_light: choice::Model,
    pub drizzle_light: choice::Model,
    pub drizzle_extra: choice::Model,
    /// Mocha, 4.25: Tall (default) only
    pub mocha: product_entity::Model,
    pub mocha_tall: product_size::Model,
}

/// Creates a two-product menu covering sizes, milks, levels, flavors, shots and toppings.
pub async fn seed_test_menu(db: &DatabaseConnection) -> Result<TestMenu> {
    let tall = catalog::create_ingredient(db, Ingredient::Size, "Tall").await?;
    let grande = catalog::create_ingredient(db, Ingredient::Size, "Grande").await?;
    let whole = catalog::create_ingredient(db, Ingredient::Milk, "Whole").await?;
    let oat = catalog::create_ingredient(db, Ingredient::Milk, "Oat").await?;
    let signature = catalog::create_ingredient(db, Ingredient::EspressoShot, "Signature").await?;

    let ice_light = catalog::create_choice(db, ChoiceKind::Ice, "Light").await?;
    let drizzle_light = catalog::create_choice(db, ChoiceKind::ToppingAmount, "Light").await?;
    let drizzle_extra = catalog::create_choice(db, ChoiceKind::ToppingAmount, "Extra").await?;

    let syrups = catalog::create_flavor_category(db, "Syrups").await?;
    let vanilla = catalog::create_flavor(db, syrups.id, "Vanilla").await?;
    let drizzles = catalog::create_topping_category(db, "Drizzles").await?;
    let caramel_drizzle = catalog::create_topping(
        db,
        drizzles.id,
        "Caramel Drizzle",
        &[drizzle_light.id, drizzle_extra.id],
        Some(drizzle_light.id),
    )
    .await?;

    let latte = product::create_product(db, "Latte", price(395)).await?;
    let latte_tall = product::allow_size(
        db,
        latte.id,
        tall.id,
        SizeTerms {
            price: Decimal::ZERO,
            default_flavor_pumps: 2,
            default_espresso_shots: 1,
            default_tea_quantity: 0,
        },
    )
    .await?;
    let latte_grande = product::allow_size(
        db,
        latte.id,
        grande.id,
        SizeTerms {
            price: price(50),
            default_flavor_pumps: 3,
            default_espresso_shots: 2,
            default_tea_quantity: 0,
        },
    )
    .await?;
    let latte_whole = product::allow_milk(db, latte.id, whole.id, Decimal::ZERO).await?;
    let latte_oat = product::allow_milk(db, latte.id, oat.id, price(70)).await?;
    product::allow_choice(db, latte.id, ice_light.id).await?;
    let latte_vanilla =
        product::allow_extra(db, latte.id, Extra::Flavor, vanilla.id, price(50), false).await?;
    let latte_signature_shot = product::allow_extra(
        db,
        latte.id,
        Extra::EspressoShot,
        signature.id,
        Decimal::ZERO,
        true,
    )
    .await?;
    let latte_caramel_drizzle = product::allow_extra(
        db,
        latte.id,
        Extra::Topping,
        caramel_drizzle.id,
        price(25),
        false,
    )
    .await?;
    product::set_default_size(db, latte.id, Some(latte_tall.id)).await?;
    product::set_default_milk(db, latte.id, Some(latte_whole.id)).await?;
    let latte = product::set_default_choice(db, latte.id, ChoiceKind::Ice, Some(ice_light.id)).await?;

    let mocha = product::create_product(db, "Mocha", price(425)).await?;
    let mocha_tall = product::allow_size(db, mocha.id, tall.id, SizeTerms::default()).await?;
    let mocha = product::set_default_size(db, mocha.id, Some(mocha_tall.id)).await?;

    Ok(TestMenu {
        latte,
        latte_tall,
        latte_grande,
        latte_whole,
        latte_oat,
        latte_vanilla,
        latte_signature_shot,
        latte_caramel_drizzle,
        ice_light,
        drizzle_light,
        drizzle_extra,
        mocha,
        mocha_tall,
    })
}
