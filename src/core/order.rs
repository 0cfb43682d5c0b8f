//! Order business logic - Placing orders and customizing their items.
//!
//! Every mutation runs inside one database transaction. The entity save hooks validate each
//! write against the item's product and recompute the item and order totals, so by the time a
//! transaction commits the stored totals match the stored selections.

use crate::{
    core::product::Extra,
    entities::{
        Choice, Milk, Order, OrderItem, OrderItemEspressoShot, OrderItemFlavor, OrderItemJuice,
        OrderItemSweetener, OrderItemTea, OrderItemTopping, Product, ProductEspressoShot,
        ProductFlavor, ProductJuice, ProductMilk, ProductSize, ProductSweetener, ProductTea,
        ProductTopping, Size, Topping, espresso_shot, flavor, juice, order, order_item,
        order_item_espresso_shot, order_item_flavor, order_item_juice, order_item_sweetener,
        order_item_tea, order_item_topping, product_espresso_shot, product_flavor,
        product_juice, product_sweetener, product_tea, product_topping, sweetener, tea,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const fn default_quantity() -> i32 {
    1
}

/// One multi-select option picked for an order item.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SelectionRequest {
    /// Id of the product association row (e.g. a `product_flavors` row)
    pub option_id: i64,
    /// Pumps, shots or portions; defaults to 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Topping amount; only valid for toppings
    #[serde(default)]
    pub choice_id: Option<i64>,
}

impl SelectionRequest {
    #[must_use]
    pub const fn new(option_id: i64, quantity: i32) -> Self {
        Self {
            option_id,
            quantity,
            choice_id: None,
        }
    }
}

/// A drink to add to an order.
///
/// Omitted single-valued options fall back to the product's defaults. An omitted selection
/// list falls back to the product's default options; an empty list selects nothing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemRequest {
    /// The product being ordered
    pub product_id: i64,
    /// Number of drinks; defaults to 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// A `product_sizes` row of the product
    #[serde(default)]
    pub size_id: Option<i64>,
    /// A `product_milks` row of the product
    #[serde(default)]
    pub milk_id: Option<i64>,
    /// `choices` rows allowed on the product through `product_choices`
    #[serde(default)]
    pub ice_id: Option<i64>,
    #[serde(default)]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub milk_temp_id: Option<i64>,
    #[serde(default)]
    pub milk_foam_id: Option<i64>,
    /// Multi-select options per category; `None` means the product defaults
    #[serde(default)]
    pub sweeteners: Option<Vec<SelectionRequest>>,
    #[serde(default)]
    pub espresso_shots: Option<Vec<SelectionRequest>>,
    #[serde(default)]
    pub flavors: Option<Vec<SelectionRequest>>,
    #[serde(default)]
    pub juices: Option<Vec<SelectionRequest>>,
    #[serde(default)]
    pub toppings: Option<Vec<SelectionRequest>>,
    #[serde(default)]
    pub teas: Option<Vec<SelectionRequest>>,
}

impl ItemRequest {
    /// A single drink of `product_id` with every option left at its default.
    #[must_use]
    pub const fn new(product_id: i64) -> Self {
        Self {
            product_id,
            quantity: 1,
            size_id: None,
            milk_id: None,
            ice_id: None,
            room_id: None,
            milk_temp_id: None,
            milk_foam_id: None,
            sweeteners: None,
            espresso_shots: None,
            flavors: None,
            juices: None,
            toppings: None,
            teas: None,
        }
    }

    fn selections(&self, extra: Extra) -> Option<&Vec<SelectionRequest>> {
        match extra {
            Extra::Sweetener => self.sweeteners.as_ref(),
            Extra::EspressoShot => self.espresso_shots.as_ref(),
            Extra::Flavor => self.flavors.as_ref(),
            Extra::Juice => self.juices.as_ref(),
            Extra::Topping => self.toppings.as_ref(),
            Extra::Tea => self.teas.as_ref(),
        }
    }
}

/// A whole order as submitted by a client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OrderRequest {
    /// Name called out at pickup; must not be blank
    pub customer_name: String,
    #[serde(default)]
    pub special_instructions: String,
    /// May be empty; items can be added later
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

/// An order with its items expanded for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    /// Items in the order they were added
    pub items: Vec<OrderItemDetail>,
}

/// One drink with the names of its chosen options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product_name: String,
    /// Names of the chosen single-valued options, if any
    pub size: Option<String>,
    pub milk: Option<String>,
    pub ice: Option<String>,
    pub room: Option<String>,
    pub milk_temp: Option<String>,
    pub milk_foam: Option<String>,
    /// Multi-select options across every category
    pub selections: Vec<SelectionDetail>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionDetail {
    /// Id of the selection row
    pub id: i64,
    /// Which category the option belongs to
    pub extra: Extra,
    /// Id of the product association row
    pub option_id: i64,
    /// Name of the catalog entry
    pub name: String,
    pub quantity: i32,
    /// Price of the association row, added once to the item total
    pub price: Decimal,
    /// Topping amount name
    pub amount: Option<String>,
}

/// Retrieves an order by id.
pub async fn get_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Order",
            id: order_id,
        })
}

async fn get_order_item<C>(db: &C, order_id: i64, item_id: i64) -> Result<order_item::Model>
where
    C: ConnectionTrait,
{
    OrderItem::find_by_id(item_id)
        .filter(order_item::Column::OrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Order item",
            id: item_id,
        })
}

/// Creates an empty order.
///
/// # Errors
/// Returns an error if the customer name is empty or the insert fails.
pub async fn create_order<C>(
    db: &C,
    customer_name: &str,
    special_instructions: &str,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let order = order::ActiveModel {
        customer_name: Set(customer_name.trim().to_string()),
        special_instructions: Set(special_instructions.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(order_id = order.id, customer = %order.customer_name, "Created order");
    Ok(order)
}

/// Creates an order together with its items. Nothing is stored if any item is rejected.
#[instrument(skip(db, request), fields(customer = %request.customer_name))]
pub async fn place_order(db: &DatabaseConnection, request: OrderRequest) -> Result<OrderDetail> {
    let txn = db.begin().await?;
    let order = create_order(&txn, &request.customer_name, &request.special_instructions).await?;
    for item in &request.items {
        insert_item(&txn, order.id, item).await?;
    }
    let detail = get_order_details(&txn, order.id).await?;
    txn.commit().await?;
    info!(order_id = order.id, total = %detail.order.total, "Placed order");
    Ok(detail)
}

/// Adds a customized drink to an existing order.
#[instrument(skip(db, request))]
pub async fn add_item(
    db: &DatabaseConnection,
    order_id: i64,
    request: &ItemRequest,
) -> Result<order_item::Model> {
    let txn = db.begin().await?;
    get_order(&txn, order_id).await?;
    let item = insert_item(&txn, order_id, request).await?;
    txn.commit().await?;
    Ok(item)
}

async fn insert_item<C>(db: &C, order_id: i64, request: &ItemRequest) -> Result<order_item::Model>
where
    C: ConnectionTrait,
{
    let product = Product::find_by_id(request.product_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Product",
            id: request.product_id,
        })?;
    if !product.is_active {
        return Err(Error::validation(format!(
            "'{}' is no longer on the menu",
            product.name
        )));
    }

    let size_id = request
        .size_id
        .or(product.default_size_id)
        .ok_or_else(|| Error::validation(format!("A size is required for '{}'", product.name)))?;

    let item = order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(product.id),
        quantity: Set(request.quantity),
        size_id: Set(size_id),
        milk_id: Set(request.milk_id.or(product.default_milk_id)),
        ice_id: Set(request.ice_id.or(product.default_ice_id)),
        room_id: Set(request.room_id.or(product.default_room_id)),
        milk_temp_id: Set(request.milk_temp_id.or(product.default_milk_temp_id)),
        milk_foam_id: Set(request.milk_foam_id.or(product.default_milk_foam_id)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let size = ProductSize::find_by_id(size_id).one(db).await?;
    let extras = [
        Extra::Sweetener,
        Extra::EspressoShot,
        Extra::Flavor,
        Extra::Juice,
        Extra::Topping,
        Extra::Tea,
    ];
    for extra in extras {
        let selections = match request.selections(extra) {
            Some(selections) => selections.clone(),
            None => {
                let quantity = match (extra, &size) {
                    (Extra::Flavor, Some(size)) => size.default_flavor_pumps,
                    (Extra::EspressoShot, Some(size)) => size.default_espresso_shots,
                    (Extra::Tea, Some(size)) => size.default_tea_quantity,
                    _ => 1,
                };
                default_options(db, product.id, extra)
                    .await?
                    .into_iter()
                    .map(|option_id| SelectionRequest::new(option_id, quantity.max(1)))
                    .collect()
            }
        };
        for selection in &selections {
            insert_selection(db, item.id, extra, selection).await?;
        }
    }

    let item = OrderItem::find_by_id(item.id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Order item",
            id: item.id,
        })?;
    info!(
        order_id,
        item_id = item.id,
        product = %product.name,
        total = %item.total,
        "Added order item"
    );
    Ok(item)
}

/// Ids of the active association rows a product flags as defaults for one category.
async fn default_options<C>(db: &C, product_id: i64, extra: Extra) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let ids = match extra {
        Extra::Sweetener => ProductSweetener::find()
            .filter(product_sweetener::Column::ProductId.eq(product_id))
            .filter(product_sweetener::Column::IsDefault.eq(true))
            .filter(product_sweetener::Column::IsActive.eq(true))
            .order_by_asc(product_sweetener::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
        Extra::EspressoShot => ProductEspressoShot::find()
            .filter(product_espresso_shot::Column::ProductId.eq(product_id))
            .filter(product_espresso_shot::Column::IsDefault.eq(true))
            .filter(product_espresso_shot::Column::IsActive.eq(true))
            .order_by_asc(product_espresso_shot::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
        Extra::Flavor => ProductFlavor::find()
            .filter(product_flavor::Column::ProductId.eq(product_id))
            .filter(product_flavor::Column::IsDefault.eq(true))
            .filter(product_flavor::Column::IsActive.eq(true))
            .order_by_asc(product_flavor::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
        Extra::Juice => ProductJuice::find()
            .filter(product_juice::Column::ProductId.eq(product_id))
            .filter(product_juice::Column::IsDefault.eq(true))
            .filter(product_juice::Column::IsActive.eq(true))
            .order_by_asc(product_juice::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
        Extra::Topping => ProductTopping::find()
            .filter(product_topping::Column::ProductId.eq(product_id))
            .filter(product_topping::Column::IsDefault.eq(true))
            .filter(product_topping::Column::IsActive.eq(true))
            .order_by_asc(product_topping::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
        Extra::Tea => ProductTea::find()
            .filter(product_tea::Column::ProductId.eq(product_id))
            .filter(product_tea::Column::IsDefault.eq(true))
            .filter(product_tea::Column::IsActive.eq(true))
            .order_by_asc(product_tea::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect(),
    };
    Ok(ids)
}

async fn insert_selection<C>(
    db: &C,
    order_item_id: i64,
    extra: Extra,
    selection: &SelectionRequest,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if selection.choice_id.is_some() && extra != Extra::Topping {
        return Err(Error::validation("Only toppings take an amount"));
    }
    let id = match extra {
        Extra::Sweetener => {
            order_item_sweetener::ActiveModel {
                order_item_id: Set(order_item_id),
                product_sweetener_id: Set(selection.option_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::EspressoShot => {
            order_item_espresso_shot::ActiveModel {
                order_item_id: Set(order_item_id),
                product_espresso_shot_id: Set(selection.option_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Flavor => {
            order_item_flavor::ActiveModel {
                order_item_id: Set(order_item_id),
                product_flavor_id: Set(selection.option_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Juice => {
            order_item_juice::ActiveModel {
                order_item_id: Set(order_item_id),
                product_juice_id: Set(selection.option_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Topping => {
            order_item_topping::ActiveModel {
                order_item_id: Set(order_item_id),
                product_topping_id: Set(selection.option_id),
                choice_id: Set(selection.choice_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        Extra::Tea => {
            order_item_tea::ActiveModel {
                order_item_id: Set(order_item_id),
                product_tea_id: Set(selection.option_id),
                quantity: Set(selection.quantity),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };
    Ok(id)
}

/// Adds one option to an existing order item and returns the item with its new total.
#[instrument(skip(db, selection))]
pub async fn add_selection(
    db: &DatabaseConnection,
    order_id: i64,
    item_id: i64,
    extra: Extra,
    selection: &SelectionRequest,
) -> Result<order_item::Model> {
    let txn = db.begin().await?;
    get_order_item(&txn, order_id, item_id).await?;
    insert_selection(&txn, item_id, extra, selection).await?;
    let item = get_order_item(&txn, order_id, item_id).await?;
    txn.commit().await?;
    Ok(item)
}

/// Removes one selection row from an order item and returns the item with its new total.
#[instrument(skip(db))]
pub async fn remove_selection(
    db: &DatabaseConnection,
    order_id: i64,
    item_id: i64,
    extra: Extra,
    selection_id: i64,
) -> Result<order_item::Model> {
    let txn = db.begin().await?;
    get_order_item(&txn, order_id, item_id).await?;

    let not_found = Error::NotFound {
        entity: "Selection",
        id: selection_id,
    };
    // Deleting through the model runs the hook that recomputes the totals
    match extra {
        Extra::Sweetener => {
            OrderItemSweetener::find_by_id(selection_id)
                .filter(order_item_sweetener::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
        Extra::EspressoShot => {
            OrderItemEspressoShot::find_by_id(selection_id)
                .filter(order_item_espresso_shot::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
        Extra::Flavor => {
            OrderItemFlavor::find_by_id(selection_id)
                .filter(order_item_flavor::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
        Extra::Juice => {
            OrderItemJuice::find_by_id(selection_id)
                .filter(order_item_juice::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
        Extra::Topping => {
            OrderItemTopping::find_by_id(selection_id)
                .filter(order_item_topping::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
        Extra::Tea => {
            OrderItemTea::find_by_id(selection_id)
                .filter(order_item_tea::Column::OrderItemId.eq(item_id))
                .one(&txn)
                .await?
                .ok_or(not_found)?
                .delete(&txn)
                .await?;
        }
    }

    let item = get_order_item(&txn, order_id, item_id).await?;
    txn.commit().await?;
    Ok(item)
}

/// Changes how many of a drink are ordered.
#[instrument(skip(db))]
pub async fn update_item_quantity(
    db: &DatabaseConnection,
    order_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<order_item::Model> {
    let txn = db.begin().await?;
    let mut item: order_item::ActiveModel = get_order_item(&txn, order_id, item_id).await?.into();
    item.quantity = Set(quantity);
    let item = item.update(&txn).await?;
    txn.commit().await?;
    Ok(item)
}

/// Removes a drink from an order.
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, order_id: i64, item_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    get_order_item(&txn, order_id, item_id)
        .await?
        .delete(&txn)
        .await?;
    txn.commit().await?;
    info!(order_id, item_id, "Deleted order item");
    Ok(())
}

/// Deletes an order with all of its items.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let result = Order::delete_by_id(order_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Order",
            id: order_id,
        });
    }
    info!(order_id, "Deleted order");
    Ok(())
}

async fn choice_name<C>(db: &C, choice_id: Option<i64>) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let Some(choice_id) = choice_id else {
        return Ok(None);
    };
    Ok(Choice::find_by_id(choice_id)
        .one(db)
        .await?
        .map(|choice| choice.name))
}

macro_rules! push_selections {
    ($db:expr, $item_id:expr, $out:expr, $extra:expr, $selection:ident, $association:ident, $catalog:ident, $catalog_id:ident) => {{
        let rows = $selection::Entity::find()
            .filter($selection::Column::OrderItemId.eq($item_id))
            .order_by_asc($selection::Column::Id)
            .find_also_related($association::Entity)
            .all($db)
            .await?;
        for (row, option) in rows {
            let Some(option) = option else { continue };
            let name = $catalog::Entity::find_by_id(option.$catalog_id)
                .one($db)
                .await?
                .map(|entry| entry.name)
                .unwrap_or_default();
            $out.push(SelectionDetail {
                id: row.id,
                extra: $extra,
                option_id: option.id,
                name,
                quantity: row.quantity,
                price: option.price,
                amount: None,
            });
        }
    }};
}

async fn selection_details<C>(db: &C, item_id: i64) -> Result<Vec<SelectionDetail>>
where
    C: ConnectionTrait,
{
    let mut selections = Vec::new();
    push_selections!(db, item_id, selections, Extra::Sweetener, order_item_sweetener, product_sweetener, sweetener, sweetener_id);
    push_selections!(db, item_id, selections, Extra::EspressoShot, order_item_espresso_shot, product_espresso_shot, espresso_shot, espresso_shot_id);
    push_selections!(db, item_id, selections, Extra::Flavor, order_item_flavor, product_flavor, flavor, flavor_id);
    push_selections!(db, item_id, selections, Extra::Juice, order_item_juice, product_juice, juice, juice_id);
    push_selections!(db, item_id, selections, Extra::Tea, order_item_tea, product_tea, tea, tea_id);

    let toppings = OrderItemTopping::find()
        .filter(order_item_topping::Column::OrderItemId.eq(item_id))
        .order_by_asc(order_item_topping::Column::Id)
        .find_also_related(ProductTopping)
        .all(db)
        .await?;
    for (row, option) in toppings {
        let Some(option) = option else { continue };
        let name = Topping::find_by_id(option.topping_id)
            .one(db)
            .await?
            .map(|topping| topping.name)
            .unwrap_or_default();
        selections.push(SelectionDetail {
            id: row.id,
            extra: Extra::Topping,
            option_id: option.id,
            name,
            quantity: row.quantity,
            price: option.price,
            amount: choice_name(db, row.choice_id).await?,
        });
    }
    Ok(selections)
}

/// Loads an order with every item, its chosen options and its selections.
pub async fn get_order_details<C>(db: &C, order_id: i64) -> Result<OrderDetail>
where
    C: ConnectionTrait,
{
    let order = get_order(db, order_id).await?;
    let rows = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let size = match ProductSize::find_by_id(item.size_id)
            .find_also_related(Size)
            .one(db)
            .await?
        {
            Some((_, Some(size))) => Some(size.name),
            _ => None,
        };
        let milk = match item.milk_id {
            Some(milk_id) => ProductMilk::find_by_id(milk_id)
                .find_also_related(Milk)
                .one(db)
                .await?
                .and_then(|(_, milk)| milk)
                .map(|milk| milk.name),
            None => None,
        };
        items.push(OrderItemDetail {
            product_name: product.map(|p| p.name).unwrap_or_default(),
            size,
            milk,
            ice: choice_name(db, item.ice_id).await?,
            room: choice_name(db, item.room_id).await?,
            milk_temp: choice_name(db, item.milk_temp_id).await?,
            milk_foam: choice_name(db, item.milk_foam_id).await?,
            selections: selection_details(db, item.id).await?,
            item,
        });
    }

    Ok(OrderDetail { order, items })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{product_milk, product_size};
    use crate::test_utils::*;

    fn latte_request(menu: &TestMenu) -> ItemRequest {
        ItemRequest {
            quantity: 2,
            milk_id: Some(menu.latte_oat.id),
            flavors: Some(vec![SelectionRequest::new(menu.latte_vanilla, 2)]),
            toppings: Some(vec![SelectionRequest {
                option_id: menu.latte_caramel_drizzle,
                quantity: 1,
                choice_id: Some(menu.drizzle_extra.id),
            }]),
            ..ItemRequest::new(menu.latte.id)
        }
    }

    #[tokio::test]
    async fn test_place_order_computes_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;

        let detail = place_order(
            &db,
            OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items: vec![latte_request(&menu), ItemRequest::new(menu.mocha.id)],
            },
        )
        .await?;

        // 3.95 * 2 + oat 0.70 + vanilla 0.50 + drizzle 0.25 (tall and shot are free)
        assert_eq!(detail.items[0].item.total, price(935));
        assert_eq!(detail.items[1].item.total, price(425));
        assert_eq!(detail.order.total, price(1360));

        let stored = get_order(&db, detail.order.id).await?;
        assert_eq!(stored.total, price(1360));
        Ok(())
    }

    #[tokio::test]
    async fn test_item_defaults_applied() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Grace", "").await?;

        let item = add_item(
            &db,
            order.id,
            &ItemRequest {
                size_id: Some(menu.latte_grande.id),
                ..ItemRequest::new(menu.latte.id)
            },
        )
        .await?;
        assert_eq!(item.milk_id, Some(menu.latte_whole.id));
        assert_eq!(item.ice_id, Some(menu.ice_light.id));

        let detail = get_order_details(&db, order.id).await?;
        let item = &detail.items[0];
        assert_eq!(item.size.as_deref(), Some("Grande"));
        assert_eq!(item.milk.as_deref(), Some("Whole"));
        // The default shot is pulled as many times as the grande size calls for
        assert_eq!(item.selections.len(), 1);
        assert_eq!(item.selections[0].extra, Extra::EspressoShot);
        assert_eq!(item.selections[0].option_id, menu.latte_signature_shot);
        assert_eq!(item.selections[0].name, "Signature");
        assert_eq!(item.selections[0].quantity, 2);
        // 3.95 + grande 0.50
        assert_eq!(item.item.total, price(445));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_selection_list_selects_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Linus", "").await?;

        add_item(
            &db,
            order.id,
            &ItemRequest {
                espresso_shots: Some(Vec::new()),
                ..ItemRequest::new(menu.latte.id)
            },
        )
        .await?;

        let detail = get_order_details(&db, order.id).await?;
        assert!(detail.items[0].selections.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_option_from_other_product_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Ken", "").await?;

        let result = add_item(
            &db,
            order.id,
            &ItemRequest {
                size_id: Some(menu.mocha_tall.id),
                ..ItemRequest::new(menu.latte.id)
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // The transaction rolled back
        let detail = get_order_details(&db, order.id).await?;
        assert!(detail.items.is_empty());
        assert_eq!(detail.order.total, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_disallowed_choice_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Barbara", "").await?;

        let result = add_item(
            &db,
            order.id,
            &ItemRequest {
                ice_id: Some(menu.drizzle_light.id),
                ..ItemRequest::new(menu.latte.id)
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_option_cannot_be_selected() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Dennis", "").await?;

        let mut oat: product_milk::ActiveModel = menu.latte_oat.clone().into();
        oat.is_active = Set(false);
        oat.update(&db).await?;

        let result = add_item(&db, order.id, &latte_request(&menu)).await;
        assert!(matches!(result, Err(Error::Validation { ref message }) if message.contains("no longer available")));
        Ok(())
    }

    #[tokio::test]
    async fn test_retired_option_keeps_existing_items_valid() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Margaret", "").await?;
        let item = add_item(&db, order.id, &latte_request(&menu)).await?;

        let mut oat: product_milk::ActiveModel = menu.latte_oat.clone().into();
        oat.is_active = Set(false);
        oat.update(&db).await?;

        let item = update_item_quantity(&db, order.id, item.id, 1).await?;
        // 3.95 + oat 0.70 + vanilla 0.50 + drizzle 0.25
        assert_eq!(item.total, price(540));
        assert_eq!(get_order(&db, order.id).await?.total, price(540));
        Ok(())
    }

    #[tokio::test]
    async fn test_quantity_must_be_positive() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Alan", "").await?;
        let item = add_item(&db, order.id, &ItemRequest::new(menu.mocha.id)).await?;

        let result = update_item_quantity(&db, order.id, item.id, 0).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_changes_update_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Edsger", "").await?;
        let item = add_item(
            &db,
            order.id,
            &ItemRequest {
                espresso_shots: Some(Vec::new()),
                ..ItemRequest::new(menu.latte.id)
            },
        )
        .await?;
        assert_eq!(item.total, price(395));

        let item = add_selection(
            &db,
            order.id,
            item.id,
            Extra::Flavor,
            &SelectionRequest::new(menu.latte_vanilla, 3),
        )
        .await?;
        assert_eq!(item.total, price(445));
        assert_eq!(get_order(&db, order.id).await?.total, price(445));

        let detail = get_order_details(&db, order.id).await?;
        let selection_id = detail.items[0].selections[0].id;
        let item = remove_selection(&db, order.id, item.id, Extra::Flavor, selection_id).await?;
        assert_eq!(item.total, price(395));
        assert_eq!(get_order(&db, order.id).await?.total, price(395));
        Ok(())
    }

    #[tokio::test]
    async fn test_amount_only_for_toppings() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Donald", "").await?;
        let item = add_item(&db, order.id, &ItemRequest::new(menu.latte.id)).await?;

        let selection = SelectionRequest {
            choice_id: Some(menu.drizzle_extra.id),
            ..SelectionRequest::new(menu.latte_vanilla, 1)
        };
        let result = add_selection(&db, order.id, item.id, Extra::Flavor, &selection).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item_updates_order_total() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let detail = place_order(
            &db,
            OrderRequest {
                customer_name: "Frances".to_string(),
                special_instructions: "Extra hot".to_string(),
                items: vec![latte_request(&menu), ItemRequest::new(menu.mocha.id)],
            },
        )
        .await?;

        delete_item(&db, detail.order.id, detail.items[0].item.id).await?;
        let order = get_order(&db, detail.order.id).await?;
        assert_eq!(order.total, price(425));
        assert_eq!(order.special_instructions, "Extra hot");

        let missing = delete_item(&db, detail.order.id, 999).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let detail = place_order(
            &db,
            OrderRequest {
                customer_name: "John".to_string(),
                special_instructions: String::new(),
                items: vec![latte_request(&menu)],
            },
        )
        .await?;

        delete_order(&db, detail.order.id).await?;
        assert!(OrderItem::find().all(&db).await?.is_empty());
        assert!(matches!(
            delete_order(&db, detail.order.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_referenced_options_are_protected() -> Result<()> {
        let db = setup_test_db().await?;
        let menu = seed_test_menu(&db).await?;
        let order = create_order(&db, "Niklaus", "").await?;
        add_item(&db, order.id, &ItemRequest::new(menu.mocha.id)).await?;

        let result: Result<_> = product_size::Entity::delete_by_id(menu.mocha_tall.id)
            .exec(&db)
            .await
            .map_err(Into::into);
        assert!(matches!(result, Err(Error::Protected { .. })));

        let result: Result<_> = Product::delete_by_id(menu.mocha.id)
            .exec(&db)
            .await
            .map_err(Into::into);
        assert!(matches!(result, Err(Error::Protected { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_customer_name_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_order(&db, "  ", "").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
