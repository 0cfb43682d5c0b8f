//! Order item entity - One customized drink within an order.
//!
//! An item references its product plus one selection per single-valued dimension
//! (size, milk, ice, room, milk temperature, milk foam). Multi-valued dimensions
//! (flavors, sweeteners, espresso shots, juices, toppings, teas) are selection rows
//! pointing back at the item.
//!
//! Every referenced option must belong to the item's product; newly selected options
//! must also be active. The item `total` and its order's total are recomputed after
//! every save and delete.

use super::{ChoiceKind, active_value, product, product_milk, product_size};
use crate::core::pricing;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the order item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this item belongs to
    pub order_id: i64,
    /// Product being customized
    pub product_id: i64,
    /// Number of identical drinks
    pub quantity: i32,
    /// Base price times quantity plus selected option prices
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
    /// When the item was added
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
    /// Selected `product_size` row
    pub size_id: i64,
    /// Selected `product_milk` row, if the drink has milk
    pub milk_id: Option<i64>,
    /// Selected ice level
    pub ice_id: Option<i64>,
    /// Selected room level
    pub room_id: Option<i64>,
    /// Selected milk temperature
    pub milk_temp_id: Option<i64>,
    /// Selected milk foam
    pub milk_foam_id: Option<i64>,
}

/// Defines relationships between OrderItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The order this row references
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
    /// The product this row references
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Product,
    /// The size this row references
    #[sea_orm(
        belongs_to = "super::product_size::Entity",
        from = "Column::SizeId",
        to = "super::product_size::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Size,
    /// The milk this row references
    #[sea_orm(
        belongs_to = "super::product_milk::Entity",
        from = "Column::MilkId",
        to = "super::product_milk::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Milk,
    /// The ice this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::IceId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Ice,
    /// The room this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::RoomId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Room,
    /// The milk temp this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::MilkTempId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    MilkTemp,
    /// The milk foam this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::MilkFoamId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    MilkFoam,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        super::ensure_unchanged(&self.order_id, insert, "order_id")?;
        super::ensure_unchanged(&self.product_id, insert, "product_id")?;
        let now = chrono::Utc::now();
        if insert {
            if matches!(self.quantity, ActiveValue::NotSet) {
                self.quantity = Set(1);
            }
            if matches!(self.total, ActiveValue::NotSet) {
                self.total = Set(Decimal::ZERO);
            }
            if matches!(self.created_at, ActiveValue::NotSet) {
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(now);

        if active_value(&self.quantity).is_some_and(|quantity| *quantity < 1) {
            return Err(DbErr::Custom("Quantity must be at least 1".to_string()));
        }

        let product_id = *active_value(&self.product_id)
            .ok_or_else(|| DbErr::Custom("product_id is required".to_string()))?;
        product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::Custom(format!("Product {product_id} does not exist")))?;

        let size_id = *active_value(&self.size_id)
            .ok_or_else(|| DbErr::Custom("size_id is required".to_string()))?;
        let size = product_size::Entity::find_by_id(size_id).one(db).await?;
        super::ensure_option_selectable(
            product_id,
            size.map(|size| (size.product_id, size.is_active)),
            matches!(self.size_id, ActiveValue::Set(_)),
            "Size",
            size_id,
        )?;

        if let Some(Some(milk_id)) = active_value(&self.milk_id) {
            let milk = product_milk::Entity::find_by_id(*milk_id).one(db).await?;
            super::ensure_option_selectable(
                product_id,
                milk.map(|milk| (milk.product_id, milk.is_active)),
                matches!(self.milk_id, ActiveValue::Set(_)),
                "Milk",
                *milk_id,
            )?;
        }

        let choices = [
            (ChoiceKind::Ice, &self.ice_id),
            (ChoiceKind::Room, &self.room_id),
            (ChoiceKind::MilkTemp, &self.milk_temp_id),
            (ChoiceKind::MilkFoam, &self.milk_foam_id),
        ];
        for (kind, value) in choices {
            if let Some(Some(choice_id)) = active_value(value) {
                product::ensure_choice_allowed(db, Some(product_id), *choice_id, kind).await?;
            }
        }
        Ok(self)
    }

    async fn after_save<C>(model: Model, db: &C, _insert: bool) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let total = pricing::recalculate_item_total(db, model.id).await?;
        Ok(Model { total, ..model })
    }

    async fn after_delete<C>(self, db: &C) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(order_id) = active_value(&self.order_id) {
            pricing::recalculate_order_total(db, *order_id).await?;
        }
        Ok(self)
    }
}
