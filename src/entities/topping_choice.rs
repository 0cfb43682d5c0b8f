//! Topping choice entity - The amounts a topping may be ordered in.

use super::{ChoiceKind, active_value, choice};
use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allowed topping amount database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topping_choices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The topping the amount applies to
    pub topping_id: i64,
    /// A choice of kind `topping_amount`
    pub choice_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The topping this row references
    #[sea_orm(
        belongs_to = "super::topping::Entity",
        from = "Column::ToppingId",
        to = "super::topping::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Topping,
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
    async fn before_save<C>(self, db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let choice_id = *active_value(&self.choice_id)
            .ok_or_else(|| DbErr::Custom("choice_id is required".to_string()))?;
        let choice = choice::Entity::find_by_id(choice_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::Custom(format!("Choice {choice_id} does not exist")))?;
        if choice.kind != ChoiceKind::ToppingAmount {
            return Err(DbErr::Custom(format!(
                "'{}' is a {} level, not a topping amount",
                choice.name, choice.kind
            )));
        }
        Ok(self)
    }
}
