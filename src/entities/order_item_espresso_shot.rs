//! OrderItemEspressoShot entity - Espresso shots chosen for an order item.

use super::{active_value, product_espresso_shot};
use crate::core::pricing;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// OrderItemEspressoShot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item_espresso_shots")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The order item this selection belongs to
    pub order_item_id: i64,
    /// The product's `product_espresso_shot` row that was chosen
    pub product_espresso_shot_id: i64,
    /// Number of shots
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The order item this row references
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    OrderItem,
    /// The product espresso shot this row references
    #[sea_orm(
        belongs_to = "super::product_espresso_shot::Entity",
        from = "Column::ProductEspressoShotId",
        to = "super::product_espresso_shot::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductEspressoShot,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::product_espresso_shot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductEspressoShot.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        super::ensure_unchanged(&self.order_item_id, insert, "order_item_id")?;
        if insert && matches!(self.quantity, ActiveValue::NotSet) {
            self.quantity = Set(1);
        }
        if active_value(&self.quantity).is_some_and(|quantity| *quantity < 1) {
            return Err(DbErr::Custom("Quantity must be at least 1".to_string()));
        }
        let order_item_id = *active_value(&self.order_item_id)
            .ok_or_else(|| DbErr::Custom("order_item_id is required".to_string()))?;
        let option_id = *active_value(&self.product_espresso_shot_id)
            .ok_or_else(|| DbErr::Custom("product_espresso_shot_id is required".to_string()))?;
        let option = product_espresso_shot::Entity::find_by_id(option_id).one(db).await?;
        super::ensure_selection_allowed(
            db,
            order_item_id,
            option.map(|option| (option.product_id, option.is_active)),
            matches!(self.product_espresso_shot_id, ActiveValue::Set(_)),
            "Espresso shot",
            option_id,
        )
        .await?;
        Ok(self)
    }

    async fn after_save<C>(model: Model, db: &C, _insert: bool) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        pricing::recalculate_item_total(db, model.order_item_id).await?;
        Ok(model)
    }

    async fn after_delete<C>(self, db: &C) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(order_item_id) = active_value(&self.order_item_id) {
            pricing::recalculate_item_total(db, *order_item_id).await?;
        }
        Ok(self)
    }
}
