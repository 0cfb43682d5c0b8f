//! Product business logic - Menu products and their allowed customizations.
//!
//! This module creates products, attaches the options each product allows (with pricing and
//! defaults), and assembles the nested product representation served by the product list
//! endpoint. All functions are async and return Result types; most are generic over the
//! connection so they can run inside a transaction.

use crate::{
    entities::{
        Choice, ChoiceKind, EspressoShot, Flavor, FlavorCategory, Juice, Milk, Product,
        ProductChoice, ProductEspressoShot, ProductFlavor, ProductJuice, ProductMilk, ProductSize,
        ProductSweetener, ProductTea, ProductTopping, Size, Sweetener, Tea, Topping,
        ToppingCategory, ToppingChoice, choice, espresso_shot, flavor_category, juice, milk,
        product, product_choice, product_espresso_shot, product_flavor, product_juice,
        product_milk, product_size, product_sweetener, product_tea, product_topping, size,
        sweetener, tea, topping_category, topping_choice,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The multi-select ingredient categories. A product may allow several options of each and
/// flag some of them as defaults; an order item may select several with their own quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extra {
    Sweetener,
    EspressoShot,
    Flavor,
    Juice,
    Topping,
    Tea,
}

/// Pricing and default amounts of a size on a product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SizeTerms {
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub default_flavor_pumps: i32,
    #[serde(default)]
    pub default_espresso_shots: i32,
    #[serde(default)]
    pub default_tea_quantity: i32,
}

fn validate_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::validation(format!("Price cannot be negative: {price}")));
    }
    Ok(())
}

/// Retrieves all active products, ordered alphabetically by name.
pub async fn get_all_active_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by id, active or not.
///
/// # Errors
/// Returns an error if the query fails. A missing product is `Ok(None)`.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    get_product_by_id(db, product_id).await?.ok_or(Error::NotFound {
        entity: "Product",
        id: product_id,
    })
}

/// Creates a new active product with no allowed options yet.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative
/// - The database insert operation fails
pub async fn create_product<C>(db: &C, name: &str, price: Decimal) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = crate::core::catalog::normalize_name(name)?;
    validate_price(price)?;

    let product = product::ActiveModel {
        name: Set(name),
        price: Set(price),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(product_id = product.id, name = %product.name, "Created product");
    Ok(product)
}

/// Updates a product's name and base price.
///
/// # Errors
/// Returns `NotFound` for an unknown product, or a validation error if the name is blank or
/// the price is negative.
pub async fn update_product<C>(
    db: &C,
    product_id: i64,
    name: &str,
    price: Decimal,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = crate::core::catalog::normalize_name(name)?;
    validate_price(price)?;

    let mut product: product::ActiveModel = require_product(db, product_id).await?.into();
    product.name = Set(name);
    product.price = Set(price);
    product.update(db).await.map_err(Into::into)
}

/// Takes a product off the menu. Order history keeps referencing it.
pub async fn deactivate_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = require_product(db, product_id).await?.into();
    product.is_active = Set(false);
    product.update(db).await.map_err(Into::into)
}

/// Allows a size on a product.
pub async fn allow_size<C>(
    db: &C,
    product_id: i64,
    size_id: i64,
    terms: SizeTerms,
) -> Result<product_size::Model>
where
    C: ConnectionTrait,
{
    require_product(db, product_id).await?;
    validate_price(terms.price)?;
    product_size::ActiveModel {
        product_id: Set(product_id),
        size_id: Set(size_id),
        price: Set(terms.price),
        default_flavor_pumps: Set(terms.default_flavor_pumps),
        default_espresso_shots: Set(terms.default_espresso_shots),
        default_tea_quantity: Set(terms.default_tea_quantity),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Allows a milk on a product.
pub async fn allow_milk<C>(
    db: &C,
    product_id: i64,
    milk_id: i64,
    price: Decimal,
) -> Result<product_milk::Model>
where
    C: ConnectionTrait,
{
    require_product(db, product_id).await?;
    validate_price(price)?;
    product_milk::ActiveModel {
        product_id: Set(product_id),
        milk_id: Set(milk_id),
        price: Set(price),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Allows a multi-select option on a product and returns the new association row id.
///
/// `catalog_id` is the id of the sweetener, espresso shot, flavor, juice, topping or tea.
pub async fn allow_extra<C>(
    db: &C,
    product_id: i64,
    extra: Extra,
    catalog_id: i64,
    price: Decimal,
    is_default: bool,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    require_product(db, product_id).await?;
    validate_price(price)?;
    let id = match extra {
        Extra::Sweetener => {
            product_sweetener::ActiveModel {
                product_id: Set(product_id),
                sweetener_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::EspressoShot => {
            product_espresso_shot::ActiveModel {
                product_id: Set(product_id),
                espresso_shot_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Flavor => {
            product_flavor::ActiveModel {
                product_id: Set(product_id),
                flavor_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Juice => {
            product_juice::ActiveModel {
                product_id: Set(product_id),
                juice_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Topping => {
            product_topping::ActiveModel {
                product_id: Set(product_id),
                topping_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Tea => {
            product_tea::ActiveModel {
                product_id: Set(product_id),
                tea_id: Set(catalog_id),
                price: Set(price),
                is_active: Set(true),
                is_default: Set(is_default),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };
    Ok(id)
}

/// Allows an ice, room, milk temperature or milk foam level on a product.
pub async fn allow_choice<C>(db: &C, product_id: i64, choice_id: i64) -> Result<product_choice::Model>
where
    C: ConnectionTrait,
{
    require_product(db, product_id).await?;
    product_choice::ActiveModel {
        product_id: Set(product_id),
        choice_id: Set(choice_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets (or clears) the default size. The size row must belong to the product.
pub async fn set_default_size<C>(
    db: &C,
    product_id: i64,
    product_size_id: Option<i64>,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = require_product(db, product_id).await?.into();
    product.default_size_id = Set(product_size_id);
    product.update(db).await.map_err(Into::into)
}

/// Sets (or clears) the default milk. The milk row must belong to the product.
pub async fn set_default_milk<C>(
    db: &C,
    product_id: i64,
    product_milk_id: Option<i64>,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = require_product(db, product_id).await?.into();
    product.default_milk_id = Set(product_milk_id);
    product.update(db).await.map_err(Into::into)
}

/// Sets (or clears) the default level of one kind. The level must be allowed on the product.
pub async fn set_default_choice<C>(
    db: &C,
    product_id: i64,
    kind: ChoiceKind,
    choice_id: Option<i64>,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = require_product(db, product_id).await?.into();
    match kind {
        ChoiceKind::Ice => product.default_ice_id = Set(choice_id),
        ChoiceKind::Room => product.default_room_id = Set(choice_id),
        ChoiceKind::MilkTemp => product.default_milk_temp_id = Set(choice_id),
        ChoiceKind::MilkFoam => product.default_milk_foam_id = Set(choice_id),
        ChoiceKind::ToppingAmount => {
            return Err(Error::validation(
                "Topping amounts are set per topping, not per product",
            ));
        }
    }
    product.update(db).await.map_err(Into::into)
}

/// A product with every allowed option expanded, three levels deep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
    pub allowed_ice: Vec<choice::Model>,
    pub default_ice: Option<choice::Model>,
    pub allowed_room: Vec<choice::Model>,
    pub default_room: Option<choice::Model>,
    pub allowed_milk_temps: Vec<choice::Model>,
    pub default_milk_temp: Option<choice::Model>,
    pub allowed_milk_foams: Vec<choice::Model>,
    pub default_milk_foam: Option<choice::Model>,
    pub allowed_sizes: Vec<SizeOption>,
    pub default_size: Option<SizeOption>,
    pub allowed_milks: Vec<MilkOption>,
    pub default_milk: Option<MilkOption>,
    pub allowed_sweeteners: Vec<ExtraOption<sweetener::Model>>,
    pub allowed_espresso_shots: Vec<ExtraOption<espresso_shot::Model>>,
    pub allowed_flavors: Vec<ExtraOption<FlavorDetail>>,
    pub allowed_juices: Vec<ExtraOption<juice::Model>>,
    pub allowed_toppings: Vec<ExtraOption<ToppingDetail>>,
    pub allowed_teas: Vec<ExtraOption<tea::Model>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SizeOption {
    pub id: i64,
    pub price: Decimal,
    pub default_flavor_pumps: i32,
    pub default_espresso_shots: i32,
    pub default_tea_quantity: i32,
    pub size: size::Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MilkOption {
    pub id: i64,
    pub price: Decimal,
    pub milk: milk::Model,
}

/// An allowed multi-select option: the association row id, its pricing and the ingredient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtraOption<T> {
    pub id: i64,
    pub price: Decimal,
    pub is_default: bool,
    pub ingredient: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlavorDetail {
    pub id: i64,
    pub name: String,
    pub category: flavor_category::Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToppingDetail {
    pub id: i64,
    pub name: String,
    pub category: topping_category::Model,
    pub default_choice: Option<choice::Model>,
    pub allowed_choices: Vec<choice::Model>,
}

fn group_by_product<A, T, O>(
    rows: Vec<(A, Option<T>)>,
    build: impl Fn(A, T) -> Option<(i64, O)>,
) -> HashMap<i64, Vec<O>> {
    let mut grouped: HashMap<i64, Vec<O>> = HashMap::new();
    for (row, related) in rows {
        if let Some((product_id, option)) = related.and_then(|related| build(row, related)) {
            grouped.entry(product_id).or_default().push(option);
        }
    }
    grouped
}

/// Expands products into their nested representation.
///
/// Only active options are listed. Output order follows `products`; options are ordered by
/// association row id, which is the order they were added to the product.
pub async fn product_details<C>(db: &C, products: Vec<product::Model>) -> Result<Vec<ProductDetail>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

    let choices: HashMap<i64, choice::Model> = Choice::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut allowed_choices: HashMap<i64, Vec<choice::Model>> = HashMap::new();
    let product_choices = ProductChoice::find()
        .filter(product_choice::Column::ProductId.is_in(ids.clone()))
        .order_by_asc(product_choice::Column::ChoiceId)
        .all(db)
        .await?;
    for row in product_choices {
        if let Some(choice) = choices.get(&row.choice_id) {
            allowed_choices
                .entry(row.product_id)
                .or_default()
                .push(choice.clone());
        }
    }

    let mut sizes = group_by_product(
        ProductSize::find()
            .filter(product_size::Column::ProductId.is_in(ids.clone()))
            .filter(product_size::Column::IsActive.eq(true))
            .order_by_asc(product_size::Column::Id)
            .find_also_related(Size)
            .all(db)
            .await?,
        |row, size| {
            Some((
                row.product_id,
                SizeOption {
                    id: row.id,
                    price: row.price,
                    default_flavor_pumps: row.default_flavor_pumps,
                    default_espresso_shots: row.default_espresso_shots,
                    default_tea_quantity: row.default_tea_quantity,
                    size,
                },
            ))
        },
    );

    let mut milks = group_by_product(
        ProductMilk::find()
            .filter(product_milk::Column::ProductId.is_in(ids.clone()))
            .filter(product_milk::Column::IsActive.eq(true))
            .order_by_asc(product_milk::Column::Id)
            .find_also_related(Milk)
            .all(db)
            .await?,
        |row, milk| {
            Some((
                row.product_id,
                MilkOption {
                    id: row.id,
                    price: row.price,
                    milk,
                },
            ))
        },
    );

    let mut sweeteners = group_by_product(
        ProductSweetener::find()
            .filter(product_sweetener::Column::ProductId.is_in(ids.clone()))
            .filter(product_sweetener::Column::IsActive.eq(true))
            .order_by_asc(product_sweetener::Column::Id)
            .find_also_related(Sweetener)
            .all(db)
            .await?,
        |row, ingredient| {
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient,
                },
            ))
        },
    );

    let mut espresso_shots = group_by_product(
        ProductEspressoShot::find()
            .filter(product_espresso_shot::Column::ProductId.is_in(ids.clone()))
            .filter(product_espresso_shot::Column::IsActive.eq(true))
            .order_by_asc(product_espresso_shot::Column::Id)
            .find_also_related(EspressoShot)
            .all(db)
            .await?,
        |row, ingredient| {
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient,
                },
            ))
        },
    );

    let flavor_categories: HashMap<i64, flavor_category::Model> = FlavorCategory::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut flavors = group_by_product(
        ProductFlavor::find()
            .filter(product_flavor::Column::ProductId.is_in(ids.clone()))
            .filter(product_flavor::Column::IsActive.eq(true))
            .order_by_asc(product_flavor::Column::Id)
            .find_also_related(Flavor)
            .all(db)
            .await?,
        |row, flavor| {
            let category = flavor_categories.get(&flavor.category_id)?.clone();
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient: FlavorDetail {
                        id: flavor.id,
                        name: flavor.name,
                        category,
                    },
                },
            ))
        },
    );

    let mut juices = group_by_product(
        ProductJuice::find()
            .filter(product_juice::Column::ProductId.is_in(ids.clone()))
            .filter(product_juice::Column::IsActive.eq(true))
            .order_by_asc(product_juice::Column::Id)
            .find_also_related(Juice)
            .all(db)
            .await?,
        |row, ingredient| {
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient,
                },
            ))
        },
    );

    let topping_categories: HashMap<i64, topping_category::Model> = ToppingCategory::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut topping_amounts: HashMap<i64, Vec<choice::Model>> = HashMap::new();
    for row in ToppingChoice::find()
        .order_by_asc(topping_choice::Column::ChoiceId)
        .all(db)
        .await?
    {
        if let Some(choice) = choices.get(&row.choice_id) {
            topping_amounts
                .entry(row.topping_id)
                .or_default()
                .push(choice.clone());
        }
    }
    let mut toppings = group_by_product(
        ProductTopping::find()
            .filter(product_topping::Column::ProductId.is_in(ids.clone()))
            .filter(product_topping::Column::IsActive.eq(true))
            .order_by_asc(product_topping::Column::Id)
            .find_also_related(Topping)
            .all(db)
            .await?,
        |row, topping| {
            let category = topping_categories.get(&topping.category_id)?.clone();
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient: ToppingDetail {
                        id: topping.id,
                        name: topping.name,
                        category,
                        default_choice: topping
                            .default_choice_id
                            .and_then(|id| choices.get(&id).cloned()),
                        allowed_choices: topping_amounts
                            .get(&topping.id)
                            .cloned()
                            .unwrap_or_default(),
                    },
                },
            ))
        },
    );

    let mut teas = group_by_product(
        ProductTea::find()
            .filter(product_tea::Column::ProductId.is_in(ids))
            .filter(product_tea::Column::IsActive.eq(true))
            .order_by_asc(product_tea::Column::Id)
            .find_also_related(Tea)
            .all(db)
            .await?,
        |row, ingredient| {
            Some((
                row.product_id,
                ExtraOption {
                    id: row.id,
                    price: row.price,
                    is_default: row.is_default,
                    ingredient,
                },
            ))
        },
    );

    let details = products
        .into_iter()
        .map(|product| {
            let allowed = allowed_choices.remove(&product.id).unwrap_or_default();
            let of_kind = |kind: ChoiceKind| -> Vec<choice::Model> {
                allowed.iter().filter(|c| c.kind == kind).cloned().collect()
            };
            let default_of = |id: Option<i64>| id.and_then(|id| choices.get(&id).cloned());

            let allowed_sizes = sizes.remove(&product.id).unwrap_or_default();
            let default_size = product
                .default_size_id
                .and_then(|id| allowed_sizes.iter().find(|s| s.id == id).cloned());
            let allowed_milks = milks.remove(&product.id).unwrap_or_default();
            let default_milk = product
                .default_milk_id
                .and_then(|id| allowed_milks.iter().find(|m| m.id == id).cloned());

            ProductDetail {
                id: product.id,
                allowed_ice: of_kind(ChoiceKind::Ice),
                default_ice: default_of(product.default_ice_id),
                allowed_room: of_kind(ChoiceKind::Room),
                default_room: default_of(product.default_room_id),
                allowed_milk_temps: of_kind(ChoiceKind::MilkTemp),
                default_milk_temp: default_of(product.default_milk_temp_id),
                allowed_milk_foams: of_kind(ChoiceKind::MilkFoam),
                default_milk_foam: default_of(product.default_milk_foam_id),
                allowed_sizes,
                default_size,
                allowed_milks,
                default_milk,
                allowed_sweeteners: sweeteners.remove(&product.id).unwrap_or_default(),
                allowed_espresso_shots: espresso_shots.remove(&product.id).unwrap_or_default(),
                allowed_flavors: flavors.remove(&product.id).unwrap_or_default(),
                allowed_juices: juices.remove(&product.id).unwrap_or_default(),
                allowed_toppings: toppings.remove(&product.id).unwrap_or_default(),
                allowed_teas: teas.remove(&product.id).unwrap_or_default(),
                name: product.name,
                price: product.price,
                is_active: product.is_active,
            }
        })
        .collect();
    Ok(details)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{self, Ingredient};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_product(&db, "", price(300)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, "   ", price(300)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, "Latte", price(-100)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_active_products_sorted_and_filtered() -> Result<()> {
        let db = setup_test_db().await?;

        let mocha = create_product(&db, "Mocha", price(425)).await?;
        let americano = create_product(&db, "Americano", price(300)).await?;
        let retired = create_product(&db, "Breve", price(400)).await?;
        deactivate_product(&db, retired.id).await?;

        let products = get_all_active_products(&db).await?;
        assert_eq!(products, vec![americano, mocha]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, "Latte", price(395)).await?;

        let updated = update_product(&db, product.id, "Caffe Latte", price(425)).await?;
        assert_eq!(updated.name, "Caffe Latte");
        assert_eq!(updated.price, price(425));

        let missing = update_product(&db, 999, "Nothing", price(100)).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_default_size_must_belong_to_product() -> Result<()> {
        let db = setup_test_db().await?;
        let tall = catalog::create_ingredient(&db, Ingredient::Size, "Tall").await?;
        let latte = create_product(&db, "Latte", price(395)).await?;
        let mocha = create_product(&db, "Mocha", price(425)).await?;
        let mocha_tall = allow_size(&db, mocha.id, tall.id, SizeTerms::default()).await?;

        let result = set_default_size(&db, latte.id, Some(mocha_tall.id)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let updated = set_default_size(&db, mocha.id, Some(mocha_tall.id)).await?;
        assert_eq!(updated.default_size_id, Some(mocha_tall.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_default_choice_must_be_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let latte = create_product(&db, "Iced Latte", price(445)).await?;
        let light = catalog::create_choice(&db, ChoiceKind::Ice, "Light").await?;
        let extra_hot = catalog::create_choice(&db, ChoiceKind::MilkTemp, "Extra Hot").await?;

        let result = set_default_choice(&db, latte.id, ChoiceKind::Ice, Some(light.id)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        allow_choice(&db, latte.id, light.id).await?;
        allow_choice(&db, latte.id, extra_hot.id).await?;

        // Right level, wrong slot
        let result = set_default_choice(&db, latte.id, ChoiceKind::Ice, Some(extra_hot.id)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let updated = set_default_choice(&db, latte.id, ChoiceKind::Ice, Some(light.id)).await?;
        assert_eq!(updated.default_ice_id, Some(light.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_topping_amount_cannot_be_allowed_on_product() -> Result<()> {
        let db = setup_test_db().await?;
        let latte = create_product(&db, "Latte", price(395)).await?;
        let extra = catalog::create_choice(&db, ChoiceKind::ToppingAmount, "Extra").await?;

        let result = allow_choice(&db, latte.id, extra.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_details_nesting() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;

        let details = product_details(&db, vec![menu.latte.clone()]).await?;
        assert_eq!(details.len(), 1);
        let latte = &details[0];

        assert_eq!(latte.name, "Latte");
        assert_eq!(latte.allowed_sizes.len(), 2);
        assert_eq!(latte.default_size.as_ref().unwrap().id, menu.latte_tall.id);
        assert_eq!(latte.default_size.as_ref().unwrap().size.name, "Tall");
        assert_eq!(latte.default_milk.as_ref().unwrap().milk.name, "Whole");
        assert_eq!(latte.allowed_ice.len(), 1);
        assert!(latte.allowed_room.is_empty());

        let vanilla = &latte.allowed_flavors[0];
        assert_eq!(vanilla.ingredient.name, "Vanilla");
        assert_eq!(vanilla.ingredient.category.name, "Syrups");
        assert_eq!(vanilla.price, price(50));

        let drizzle = &latte.allowed_toppings[0];
        assert_eq!(drizzle.ingredient.category.name, "Drizzles");
        assert_eq!(drizzle.ingredient.allowed_choices.len(), 2);
        assert!(drizzle.ingredient.default_choice.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_product_details_hide_inactive_options() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;

        let mut oat: product_milk::ActiveModel = menu.latte_oat.clone().into();
        oat.is_active = Set(false);
        oat.update(&db).await?;

        let details = product_details(&db, vec![menu.latte.clone()]).await?;
        let milks: Vec<_> = details[0].allowed_milks.iter().map(|m| m.milk.name.as_str()).collect();
        assert_eq!(milks, ["Whole"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_allow_extra_requires_product() -> Result<()> {
        let db = setup_test_db().await?;
        let honey = catalog::create_ingredient(&db, Ingredient::Sweetener, "Honey").await?;
        let result = allow_extra(&db, 42, Extra::Sweetener, honey.id, Decimal::ZERO, false).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Product", id: 42 })));
        Ok(())
    }
}
