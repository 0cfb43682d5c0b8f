//! ProductMilk entity - A milk a product may be made with, and what it costs.
//!
//! The product's default milk is set on the product itself, along with the
//! allowed and default milk temperature and foam levels.

use super::active_value;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// ProductMilk database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_milks")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The product this option is allowed on
    pub product_id: i64,
    /// The milk being allowed
    pub milk_id: i64,
    /// Upcharge added to an order item when this option is selected
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Inactive options stay in order history but can no longer be selected
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The product this row references
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
    /// The milk this row references
    #[sea_orm(
        belongs_to = "super::milk::Entity",
        from = "Column::MilkId",
        to = "super::milk::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Milk,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::milk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milk.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        super::ensure_unchanged(&self.product_id, insert, "product_id")?;
        super::ensure_unchanged(&self.milk_id, insert, "milk_id")?;
        if insert {
            if matches!(self.price, ActiveValue::NotSet) {
                self.price = Set(Decimal::ZERO);
            }
            if matches!(self.is_active, ActiveValue::NotSet) {
                self.is_active = Set(true);
            }
        }
        if active_value(&self.price).is_some_and(|price| *price < Decimal::ZERO) {
            return Err(DbErr::Custom("Option price cannot be negative".to_string()));
        }
        Ok(self)
    }
}
