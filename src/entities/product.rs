//! Product entity - A drink on the menu, like a recipe that also lists the allowed modifications.
//!
//! The allowed options of each ingredient category are the product's association rows
//! (`product_milk`, `product_size`, `product_flavor`, ...) and its `product_choice` rows.
//! Single-valued defaults (size, milk, ice, room, milk temperature and foam) are stored
//! here; multi-valued defaults are flagged with `is_default` on the association rows.

use super::{ChoiceKind, active_value, choice, product_choice, product_milk, product_size};
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Caffe Latte")
    pub name: String,
    /// Base price of the product, does not include cost of size increases
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Whether the product is currently offered
    pub is_active: bool,
    /// Default `product_size` row
    pub default_size_id: Option<i64>,
    /// Default `product_milk` row
    pub default_milk_id: Option<i64>,
    /// Default ice level
    pub default_ice_id: Option<i64>,
    /// Default room level
    pub default_room_id: Option<i64>,
    /// Default milk temperature
    pub default_milk_temp_id: Option<i64>,
    /// Default milk foam
    pub default_milk_foam_id: Option<i64>,
}

/// Defines relationships between Product and its defaults
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The default size this row references
    #[sea_orm(
        belongs_to = "super::product_size::Entity",
        from = "Column::DefaultSizeId",
        to = "super::product_size::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultSize,
    /// The default milk this row references
    #[sea_orm(
        belongs_to = "super::product_milk::Entity",
        from = "Column::DefaultMilkId",
        to = "super::product_milk::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultMilk,
    /// The default ice this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::DefaultIceId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultIce,
    /// The default room this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::DefaultRoomId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultRoom,
    /// The default milk temp this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::DefaultMilkTempId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultMilkTemp,
    /// The default milk foam this row references
    #[sea_orm(
        belongs_to = "super::choice::Entity",
        from = "Column::DefaultMilkFoamId",
        to = "super::choice::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DefaultMilkFoam,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && matches!(self.is_active, ActiveValue::NotSet) {
            self.is_active = Set(true);
        }
        if active_value(&self.name).is_some_and(|name| name.trim().is_empty()) {
            return Err(DbErr::Custom("Product name cannot be empty".to_string()));
        }
        if active_value(&self.price).is_some_and(|price| *price < Decimal::ZERO) {
            return Err(DbErr::Custom("Product price cannot be negative".to_string()));
        }

        // Defaults can only point at rows owned by this product, which has no id yet on insert.
        let product_id = active_value(&self.id).copied();

        if let Some(Some(size_id)) = active_value(&self.default_size_id) {
            let owner = product_size::Entity::find_by_id(*size_id)
                .one(db)
                .await?
                .map(|size| size.product_id);
            if owner.is_none() || owner != product_id {
                return Err(DbErr::Custom(format!(
                    "Size option {size_id} is not offered for this product"
                )));
            }
        }
        if let Some(Some(milk_id)) = active_value(&self.default_milk_id) {
            let owner = product_milk::Entity::find_by_id(*milk_id)
                .one(db)
                .await?
                .map(|milk| milk.product_id);
            if owner.is_none() || owner != product_id {
                return Err(DbErr::Custom(format!(
                    "Milk option {milk_id} is not offered for this product"
                )));
            }
        }

        let defaults = [
            (ChoiceKind::Ice, &self.default_ice_id),
            (ChoiceKind::Room, &self.default_room_id),
            (ChoiceKind::MilkTemp, &self.default_milk_temp_id),
            (ChoiceKind::MilkFoam, &self.default_milk_foam_id),
        ];
        for (kind, value) in defaults {
            if let Some(Some(choice_id)) = active_value(value) {
                ensure_choice_allowed(db, product_id, *choice_id, kind).await?;
            }
        }
        Ok(self)
    }
}

/// Checks that a choice is of `kind` and listed in the product's allowed levels.
pub(crate) async fn ensure_choice_allowed<C>(
    db: &C,
    product_id: Option<i64>,
    choice_id: i64,
    kind: ChoiceKind,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let choice = choice::Entity::find_by_id(choice_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("Choice {choice_id} does not exist")))?;
    if choice.kind != kind {
        return Err(DbErr::Custom(format!(
            "'{}' is a {} level, expected a {kind} level",
            choice.name, choice.kind
        )));
    }
    let Some(product_id) = product_id else {
        return Err(DbErr::Custom(format!(
            "'{}' is not allowed for this product",
            choice.name
        )));
    };
    let allowed = product_choice::Entity::find()
        .filter(product_choice::Column::ProductId.eq(product_id))
        .filter(product_choice::Column::ChoiceId.eq(choice_id))
        .one(db)
        .await?;
    if allowed.is_none() {
        return Err(DbErr::Custom(format!(
            "'{}' {kind} is not allowed for this product",
            choice.name
        )));
    }
    Ok(())
}
