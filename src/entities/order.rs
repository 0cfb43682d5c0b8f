//! Order entity - A customer's order, owning one or more order items.
//!
//! The order `total` is denormalized: it is recomputed from the item totals every
//! time the order, one of its items or one of their selections is saved.

use super::active_value;
use crate::core::pricing;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name called out when the order is ready
    pub customer_name: String,
    /// Free-form notes for the barista, may be empty
    pub special_instructions: String,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// Sum of the item totals
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if matches!(self.special_instructions, ActiveValue::NotSet) {
                self.special_instructions = Set(String::new());
            }
            if matches!(self.created_at, ActiveValue::NotSet) {
                self.created_at = Set(chrono::Utc::now());
            }
            if matches!(self.total, ActiveValue::NotSet) {
                self.total = Set(Decimal::ZERO);
            }
        }
        if active_value(&self.customer_name).is_some_and(|name| name.trim().is_empty()) {
            return Err(DbErr::Custom("Customer name cannot be empty".to_string()));
        }
        Ok(self)
    }

    async fn after_save<C>(model: Model, db: &C, _insert: bool) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let total = pricing::recalculate_order_total(db, model.id).await?;
        Ok(Model { total, ..model })
    }
}
