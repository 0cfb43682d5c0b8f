//! Catalog business logic - The ingredients the shop stocks.
//!
//! Catalog entries are plain named rows: milks, sizes, sweeteners, espresso shots, juices and
//! teas, plus the categorized flavors and toppings and the named customization levels
//! ([`ChoiceKind`]). Products reference them through their association rows.

use crate::{
    entities::{
        Choice, ChoiceKind, EspressoShot, Flavor, FlavorCategory, Juice, Milk, Size, Sweetener,
        Tea, Topping, ToppingCategory, ToppingChoice, choice, espresso_shot, flavor,
        flavor_category, juice, milk, size, sweetener, tea, topping, topping_category,
        topping_choice,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Longest accepted catalog name.
pub const MAX_NAME_LENGTH: usize = 200;

/// The catalog tables whose rows are just a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ingredient {
    EspressoShot,
    Sweetener,
    Size,
    Milk,
    Juice,
    Tea,
}

/// A named catalog row, regardless of which table it lives in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

/// Trims a catalog name and checks it is non-empty and not too long.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::validation(format!(
            "Name cannot be longer than {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Adds a name-only catalog entry.
pub async fn create_ingredient<C>(db: &C, ingredient: Ingredient, name: &str) -> Result<CatalogEntry>
where
    C: ConnectionTrait,
{
    let name = normalize_name(name)?;
    let id = match ingredient {
        Ingredient::EspressoShot => {
            espresso_shot::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Ingredient::Sweetener => {
            sweetener::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Ingredient::Size => {
            size::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Ingredient::Milk => {
            milk::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Ingredient::Juice => {
            juice::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Ingredient::Tea => {
            tea::ActiveModel {
                name: Set(name.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };
    tracing::debug!(?ingredient, id, %name, "Created catalog entry");
    Ok(CatalogEntry { id, name })
}

/// Lists every entry of a name-only catalog table, ordered by name.
pub async fn list_ingredients<C>(db: &C, ingredient: Ingredient) -> Result<Vec<CatalogEntry>>
where
    C: ConnectionTrait,
{
    let entries = match ingredient {
        Ingredient::EspressoShot => EspressoShot::find()
            .order_by_asc(espresso_shot::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
        Ingredient::Sweetener => Sweetener::find()
            .order_by_asc(sweetener::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
        Ingredient::Size => Size::find()
            .order_by_asc(size::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
        Ingredient::Milk => Milk::find()
            .order_by_asc(milk::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
        Ingredient::Juice => Juice::find()
            .order_by_asc(juice::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
        Ingredient::Tea => Tea::find()
            .order_by_asc(tea::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| CatalogEntry { id: m.id, name: m.name })
            .collect(),
    };
    Ok(entries)
}

/// Finds a name-only catalog entry by exact name.
pub async fn find_ingredient_by_name<C>(
    db: &C,
    ingredient: Ingredient,
    name: &str,
) -> Result<Option<CatalogEntry>>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    Ok(list_ingredients(db, ingredient)
        .await?
        .into_iter()
        .find(|entry| entry.name == name))
}

/// Adds a named customization level.
pub async fn create_choice<C>(db: &C, kind: ChoiceKind, name: &str) -> Result<choice::Model>
where
    C: ConnectionTrait,
{
    let choice = choice::ActiveModel {
        kind: Set(kind),
        name: Set(normalize_name(name)?),
        ..Default::default()
    };
    choice.insert(db).await.map_err(Into::into)
}

/// Lists the levels of one kind, in insertion order (which is usually "less" to "more").
pub async fn list_choices<C>(db: &C, kind: ChoiceKind) -> Result<Vec<choice::Model>>
where
    C: ConnectionTrait,
{
    Choice::find()
        .filter(choice::Column::Kind.eq(kind))
        .order_by_asc(choice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a level of `kind` by name.
pub async fn find_choice<C>(db: &C, kind: ChoiceKind, name: &str) -> Result<Option<choice::Model>>
where
    C: ConnectionTrait,
{
    Choice::find()
        .filter(choice::Column::Kind.eq(kind))
        .filter(choice::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn create_flavor_category<C>(db: &C, name: &str) -> Result<flavor_category::Model>
where
    C: ConnectionTrait,
{
    flavor_category::ActiveModel {
        name: Set(normalize_name(name)?),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Adds a flavor under an existing category.
pub async fn create_flavor<C>(db: &C, category_id: i64, name: &str) -> Result<flavor::Model>
where
    C: ConnectionTrait,
{
    let name = normalize_name(name)?;
    FlavorCategory::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Flavor category",
            id: category_id,
        })?;
    flavor::ActiveModel {
        category_id: Set(category_id),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

pub async fn find_flavor_by_name<C>(db: &C, name: &str) -> Result<Option<flavor::Model>>
where
    C: ConnectionTrait,
{
    Flavor::find()
        .filter(flavor::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn create_topping_category<C>(db: &C, name: &str) -> Result<topping_category::Model>
where
    C: ConnectionTrait,
{
    topping_category::ActiveModel {
        name: Set(normalize_name(name)?),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Adds a topping under an existing category, with the amounts it can be ordered in.
///
/// `default_amount` must be one of `amounts`.
pub async fn create_topping<C>(
    db: &C,
    category_id: i64,
    name: &str,
    amounts: &[i64],
    default_amount: Option<i64>,
) -> Result<topping::Model>
where
    C: ConnectionTrait,
{
    let name = normalize_name(name)?;
    ToppingCategory::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Topping category",
            id: category_id,
        })?;
    if let Some(default_amount) = default_amount {
        if !amounts.contains(&default_amount) {
            return Err(Error::validation(format!(
                "Default amount of '{name}' must be one of its allowed amounts"
            )));
        }
    }

    let topping = topping::ActiveModel {
        category_id: Set(category_id),
        default_choice_id: Set(default_amount),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for choice_id in amounts {
        topping_choice::ActiveModel {
            topping_id: Set(topping.id),
            choice_id: Set(*choice_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(topping)
}

pub async fn find_topping_by_name<C>(db: &C, name: &str) -> Result<Option<topping::Model>>
where
    C: ConnectionTrait,
{
    Topping::find()
        .filter(topping::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the amounts a topping may be ordered in.
pub async fn topping_amounts<C>(db: &C, topping_id: i64) -> Result<Vec<choice::Model>>
where
    C: ConnectionTrait,
{
    let rows = ToppingChoice::find()
        .filter(topping_choice::Column::ToppingId.eq(topping_id))
        .order_by_asc(topping_choice::Column::ChoiceId)
        .find_also_related(Choice)
        .all(db)
        .await?;
    Ok(rows.into_iter().filter_map(|(_, choice)| choice).collect())
}
