//! OrderItemSweetener entity - A sweetener chosen for an order item, with how many.

use super::{active_value, product_sweetener};
use crate::core::pricing;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// OrderItemSweetener database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item_sweeteners")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The order item this selection belongs to
    pub order_item_id: i64,
    /// The product's `product_sweetener` row that was chosen
    pub product_sweetener_id: i64,
    /// Number of packets or pumps
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
    /// The product sweetener this row references
    #[sea_orm(
        belongs_to = "super::product_sweetener::Entity",
        from = "Column::ProductSweetenerId",
        to = "super::product_sweetener::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductSweetener,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::product_sweetener::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSweetener.def()
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
        let option_id = *active_value(&self.product_sweetener_id)
            .ok_or_else(|| DbErr::Custom("product_sweetener_id is required".to_string()))?;
        let option = product_sweetener::Entity::find_by_id(option_id).one(db).await?;
        super::ensure_selection_allowed(
            db,
            order_item_id,
            option.map(|option| (option.product_id, option.is_active)),
            matches!(self.product_sweetener_id, ActiveValue::Set(_)),
            "Sweetener",
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
