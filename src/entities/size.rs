//! Size entity - a cup size. Pricing per product lives on `product_size`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Size database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sizes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Tall", "Grande")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
