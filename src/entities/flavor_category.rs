//! FlavorCategory entity - a label grouping flavors into sections (syrups, sauces).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// FlavorCategory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flavor_categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Syrups", "Sauces")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
