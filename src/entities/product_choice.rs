//! Product choice entity - Ice, room and milk levels a product allows.
//!
//! Only ice, room, milk temperature and milk foam levels can be attached to a
//! product; topping amounts belong to toppings.

use super::{ChoiceKind, active_value, choice};
use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allowed product level database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_choices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The product this option is allowed on
    pub product_id: i64,
    /// The choice being allowed
    pub choice_id: i64,
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

impl Related<super::choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choice.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        super::ensure_unchanged(&self.product_id, insert, "product_id")?;
        super::ensure_unchanged(&self.choice_id, insert, "choice_id")?;
        let choice_id = *active_value(&self.choice_id)
            .ok_or_else(|| DbErr::Custom("choice_id is required".to_string()))?;
        let choice = choice::Entity::find_by_id(choice_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::Custom(format!("Choice {choice_id} does not exist")))?;
        if choice.kind == ChoiceKind::ToppingAmount {
            return Err(DbErr::Custom(format!(
                "'{}' is a topping amount and cannot be allowed on a product",
                choice.name
            )));
        }
        Ok(self)
    }
}
