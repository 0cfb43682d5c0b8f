//! EspressoShot entity - a kind of espresso shot that can be pulled for a drink.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// EspressoShot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "espresso_shots")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Signature", "Blonde")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
