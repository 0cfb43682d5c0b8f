//! ProductSize entity - A cup size a product is sold in, with its upcharge.
//!
//! Besides pricing, the size decides how much goes into the cup by default:
//! pumps of sauce and syrup, espresso shots and teas. The product's default size
//! is set on the product itself.

use super::active_value;
use async_trait::async_trait;
use sea_orm::{ActiveValue, Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// ProductSize database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_sizes")]
pub struct Model {
    /// Unique identifier for the product size
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product sold in this size
    pub product_id: i64,
    /// Catalog size
    pub size_id: i64,
    /// Price increase over the product's base price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Default number of pumps of sauce and syrup for the product size
    pub default_flavor_pumps: i32,
    /// Default number of espresso shots for the product size
    pub default_espresso_shots: i32,
    /// Default number of teas for the product size
    pub default_tea_quantity: i32,
    /// Inactive sizes stay in order history but can no longer be selected
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
    /// The size this row references
    #[sea_orm(
        belongs_to = "super::size::Entity",
        from = "Column::SizeId",
        to = "super::size::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Size,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::size::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Size.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        super::ensure_unchanged(&self.product_id, insert, "product_id")?;
        super::ensure_unchanged(&self.size_id, insert, "size_id")?;
        if insert {
            if matches!(self.price, ActiveValue::NotSet) {
                self.price = Set(Decimal::ZERO);
            }
            for count in [
                &mut self.default_flavor_pumps,
                &mut self.default_espresso_shots,
                &mut self.default_tea_quantity,
            ] {
                if matches!(count, ActiveValue::NotSet) {
                    *count = Set(0);
                }
            }
            if matches!(self.is_active, ActiveValue::NotSet) {
                self.is_active = Set(true);
            }
        }
        if active_value(&self.price).is_some_and(|price| *price < Decimal::ZERO) {
            return Err(DbErr::Custom("Size price cannot be negative".to_string()));
        }
        let counts = [
            &self.default_flavor_pumps,
            &self.default_espresso_shots,
            &self.default_tea_quantity,
        ];
        if counts
            .into_iter()
            .any(|count| active_value(count).is_some_and(|count| *count < 0))
        {
            return Err(DbErr::Custom(
                "Default pump, shot and tea counts cannot be negative".to_string(),
            ));
        }
        Ok(self)
    }
}
