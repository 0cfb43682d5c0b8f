//! Entity module - Contains all SeaORM entity definitions for the database.
//!
//! Entities fall into layers that repeat per ingredient type:
//! - catalog entities (`milk`, `size`, `flavor`, ...) name the ingredients the shop stocks,
//! - product-association entities (`product_milk`, `product_size`, ...) list which ingredients a
//!   product allows, with price, active flag and default metadata,
//! - selection entities (`order_item_flavor`, ...) record which options an order item chose.
//!
//! Application-level invariants that the schema cannot express (an order item may only select
//! options of its own product, levels must be of the right kind) are enforced in the
//! `ActiveModelBehavior` hooks, so every write path goes through them.

pub mod choice;
pub mod espresso_shot;
pub mod flavor;
pub mod flavor_category;
pub mod juice;
pub mod milk;
pub mod order;
pub mod order_item;
pub mod order_item_espresso_shot;
pub mod order_item_flavor;
pub mod order_item_juice;
pub mod order_item_sweetener;
pub mod order_item_tea;
pub mod order_item_topping;
pub mod product;
pub mod product_choice;
pub mod product_espresso_shot;
pub mod product_flavor;
pub mod product_juice;
pub mod product_milk;
pub mod product_size;
pub mod product_sweetener;
pub mod product_tea;
pub mod product_topping;
pub mod size;
pub mod sweetener;
pub mod tea;
pub mod topping;
pub mod topping_category;
pub mod topping_choice;

pub use choice::{ChoiceKind, Entity as Choice};
pub use espresso_shot::Entity as EspressoShot;
pub use flavor::Entity as Flavor;
pub use flavor_category::Entity as FlavorCategory;
pub use juice::Entity as Juice;
pub use milk::Entity as Milk;
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use order_item_espresso_shot::Entity as OrderItemEspressoShot;
pub use order_item_flavor::Entity as OrderItemFlavor;
pub use order_item_juice::Entity as OrderItemJuice;
pub use order_item_sweetener::Entity as OrderItemSweetener;
pub use order_item_tea::Entity as OrderItemTea;
pub use order_item_topping::Entity as OrderItemTopping;
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_choice::Entity as ProductChoice;
pub use product_espresso_shot::Entity as ProductEspressoShot;
pub use product_flavor::Entity as ProductFlavor;
pub use product_juice::Entity as ProductJuice;
pub use product_milk::Entity as ProductMilk;
pub use product_size::Entity as ProductSize;
pub use product_sweetener::Entity as ProductSweetener;
pub use product_tea::Entity as ProductTea;
pub use product_topping::Entity as ProductTopping;
pub use size::Entity as Size;
pub use sweetener::Entity as Sweetener;
pub use tea::Entity as Tea;
pub use topping::Entity as Topping;
pub use topping_category::Entity as ToppingCategory;
pub use topping_choice::Entity as ToppingChoice;

use sea_orm::{ActiveValue, ConnectionTrait, DbErr, EntityTrait, Value};

/// Returns the value held by an active model field, if it has one.
pub(crate) fn active_value<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

/// Rejects moving an existing row to a different parent.
///
/// Totals and ownership checks only look at the row's current parent, so references such as
/// an item's `order_id` or an option's `product_id` are fixed once the row exists.
pub(crate) fn ensure_unchanged<V>(value: &ActiveValue<V>, insert: bool, field: &str) -> Result<(), DbErr>
where
    V: Into<Value>,
{
    if !insert && matches!(value, ActiveValue::Set(_)) {
        return Err(DbErr::Custom(format!(
            "{field} cannot be changed on an existing record"
        )));
    }
    Ok(())
}

/// Checks that an option row belongs to `product_id`.
///
/// `option` is the `(product_id, is_active)` pair of the referenced association row, `None` if
/// the row does not exist. Inactive options are only rejected when `newly_selected`, so existing
/// order history keeps validating after an option is retired.
pub(crate) fn ensure_option_selectable(
    product_id: i64,
    option: Option<(i64, bool)>,
    newly_selected: bool,
    label: &str,
    option_id: i64,
) -> Result<(), DbErr> {
    match option {
        None => Err(DbErr::Custom(format!(
            "{label} option {option_id} does not exist"
        ))),
        Some((owner, _)) if owner != product_id => Err(DbErr::Custom(format!(
            "{label} option {option_id} is not offered for this product"
        ))),
        Some((_, false)) if newly_selected => Err(DbErr::Custom(format!(
            "{label} option {option_id} is no longer available"
        ))),
        Some(_) => Ok(()),
    }
}

/// Looks up the order item a selection row points at, then applies [`ensure_option_selectable`]
/// against the item's product.
pub(crate) async fn ensure_selection_allowed<C>(
    db: &C,
    order_item_id: i64,
    option: Option<(i64, bool)>,
    newly_selected: bool,
    label: &str,
    option_id: i64,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let item = order_item::Entity::find_by_id(order_item_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("Order item {order_item_id} does not exist")))?;
    ensure_option_selectable(item.product_id, option, newly_selected, label, option_id)
}
