//! Flavor entity - A syrup or sauce, grouped under a flavor category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flavor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flavors")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Section label this flavor is listed under
    pub category_id: i64,
    /// Flavor name (e.g., "Vanilla", "Mocha")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The flavor category this row references
    #[sea_orm(
        belongs_to = "super::flavor_category::Entity",
        from = "Column::CategoryId",
        to = "super::flavor_category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    FlavorCategory,
}

impl Related<super::flavor_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlavorCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
