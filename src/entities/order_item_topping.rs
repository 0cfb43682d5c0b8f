//! OrderItemTopping entity - A topping chosen for an order item.
//!
//! Besides the quantity, a topping selection may name an amount ("Light",
//! "Extra"), which must be one of the amounts the topping allows.

use super::{ChoiceKind, active_value, choice, product_topping, topping_choice};
use crate::core::pricing;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// OrderItemTopping database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item_toppings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The order item this selection belongs to
    pub order_item_id: i64,
    /// The product's `product_topping` row that was chosen
    pub product_topping_id: i64,
    /// Amount of topping, a choice of kind `topping_amount`
    pub choice_id: Option<i64>,
    /// Number of servings
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
    /// The product topping this row references
    #[sea_orm(
        belongs_to = "super::product_topping::Entity",
        from = "Column::ProductToppingId",
        to = "super::product_topping::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductTopping,
    /// The choice this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::ChoiceId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Choice,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::product_topping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTopping.def()
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
        let option_id = *active_value(&self.product_topping_id)
            .ok_or_else(|| DbErr::Custom("product_topping_id is required".to_string()))?;
        let option = product_topping::Entity::find_by_id(option_id).one(db).await?;
        let topping_id = option.as_ref().map(|option| option.topping_id);
        super::ensure_selection_allowed(
            db,
            order_item_id,
            option.map(|option| (option.product_id, option.is_active)),
            matches!(self.product_topping_id, ActiveValue::Set(_)),
            "Topping",
            option_id,
        )
        .await?;

        if let (Some(Some(choice_id)), Some(topping_id)) =
            (active_value(&self.choice_id), topping_id)
        {
            let choice = choice::Entity::find_by_id(*choice_id)
                .one(db)
                .await?
                .ok_or_else(|| DbErr::Custom(format!("Choice {choice_id} does not exist")))?;
            if choice.kind != ChoiceKind::ToppingAmount {
                return Err(DbErr::Custom(format!(
                    "'{}' is a {} level, not a topping amount",
                    choice.name, choice.kind
                )));
            }
            let allowed = topping_choice::Entity::find()
                .filter(topping_choice::Column::ToppingId.eq(topping_id))
                .filter(topping_choice::Column::ChoiceId.eq(*choice_id))
                .one(db)
                .await?;
            if allowed.is_none() {
                return Err(DbErr::Custom(format!(
                    "'{}' is not an allowed amount for this topping",
                    choice.name
                )));
            }
        }
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
