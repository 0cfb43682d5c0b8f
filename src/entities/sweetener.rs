//! Sweetener entity - a sweetener packet or liquid sweetener offered at the bar.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sweetener database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sweeteners")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Honey", "Stevia")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
