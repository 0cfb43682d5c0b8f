//! Choice entity - Named levels a drink can be customized with.
//!
//! Ice, room, milk temperature, milk foam and topping amounts are all lists of
//! named levels ("Light", "Extra Hot", "Extra Dry"...). They share one table and
//! are told apart by their [`ChoiceKind`], so new levels can be added or renamed
//! through the database instead of being compiled in.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which customization a [`Model`] is a level of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    /// Amount of ice in a cold drink
    #[sea_orm(string_value = "ice")]
    Ice,
    /// Room left at the top of the cup
    #[sea_orm(string_value = "room")]
    Room,
    /// Steamed milk temperature
    #[sea_orm(string_value = "milk_temp")]
    MilkTemp,
    /// Steamed milk foam
    #[sea_orm(string_value = "milk_foam")]
    MilkFoam,
    /// How much of a topping goes on
    #[sea_orm(string_value = "topping_amount")]
    ToppingAmount,
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ice => "ice",
            Self::Room => "room",
            Self::MilkTemp => "milk temperature",
            Self::MilkFoam => "milk foam",
            Self::ToppingAmount => "topping amount",
        };
        f.write_str(label)
    }
}

/// Choice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "choices")]
pub struct Model {
    /// Unique identifier for the choice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The customization this level belongs to
    pub kind: ChoiceKind,
    /// Human-readable level name (e.g., "Light", "Extra Hot")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
