//! Juice entity - a juice base for refreshers and lemonades.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Juice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "juices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Lemonade", "Apple")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
