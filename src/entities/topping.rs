//! Topping entity - Drizzles, foams and other finishing touches.
//!
//! Each topping lists the amounts it can be ordered in through `topping_choice`
//! rows, and may name one of them as its default amount.

use super::{ChoiceKind, active_value, choice};
use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Topping database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "toppings")]
pub struct Model {
    /// Unique identifier for the topping
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Section label this topping is listed under
    pub category_id: i64,
    /// Default amount, a choice of kind `topping_amount`
    pub default_choice_id: Option<i64>,
    /// Topping name (e.g., "Caramel Drizzle")
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The topping category this row references
    #[sea_orm(
        belongs_to = "super::topping_category::Entity",
        from = "Column::CategoryId",
        to = "super::topping_category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ToppingCategory,
    /// The default choice this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::DefaultChoiceId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    DefaultChoice,
}

impl Related<super::topping_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ToppingCategory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(Some(choice_id)) = active_value(&self.default_choice_id) {
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
        }
        Ok(self)
    }
}
