//! Pricing - Order item and order total computation.
//!
//! `item_total = base_price * quantity + Σ(selected option prices)` and
//! `order_total = Σ(item totals)`. Totals are stored denormalized on `order_items` and
//! `orders` and rewritten here after every save.
//!
//! The recalculation functions run inside entity save hooks, so they are generic over the
//! connection (plain connection or open transaction) and return `DbErr` rather than the
//! crate error type. They write with `update_many`, which does not re-enter the hooks.

use crate::entities::{
    Order, OrderItem, OrderItemEspressoShot, OrderItemFlavor, OrderItemJuice, OrderItemSweetener,
    OrderItemTea, OrderItemTopping, Product, ProductEspressoShot, ProductFlavor, ProductJuice,
    ProductMilk, ProductSize, ProductSweetener, ProductTea, ProductTopping, order, order_item,
    order_item_espresso_shot, order_item_flavor, order_item_juice, order_item_sweetener,
    order_item_tea, order_item_topping,
};
use sea_orm::{ConnectionTrait, DbErr, prelude::*, sea_query::Expr};

/// Monetary values are kept to cents.
pub const MONEY_SCALE: u32 = 2;

/// Computes an order item's total from its base price, quantity and selected option prices.
///
/// Option prices are added once per selection; the item quantity multiplies only the base price.
/// Returns `None` if the total does not fit in a `Decimal`.
#[must_use]
pub fn item_total<I>(base_price: Decimal, quantity: i32, option_prices: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let base = base_price.checked_mul(Decimal::from(quantity))?;
    option_prices
        .into_iter()
        .try_fold(base, Decimal::checked_add)
        .map(|total| total.round_dp(MONEY_SCALE))
}

/// Sums item totals into an order total. Returns `None` on overflow.
#[must_use]
pub fn order_total<I>(item_totals: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    item_totals
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .map(|total| total.round_dp(MONEY_SCALE))
}

fn too_large() -> DbErr {
    DbErr::Custom("Total is too large".to_string())
}

/// Collects the price of every option an order item selected.
///
/// Size and milk come from the item row itself, everything else from its selection rows.
pub async fn selected_option_prices<C>(
    db: &C,
    item: &order_item::Model,
) -> Result<Vec<Decimal>, DbErr>
where
    C: ConnectionTrait,
{
    let mut prices = Vec::new();

    if let Some(size) = ProductSize::find_by_id(item.size_id).one(db).await? {
        prices.push(size.price);
    }
    if let Some(milk_id) = item.milk_id {
        if let Some(milk) = ProductMilk::find_by_id(milk_id).one(db).await? {
            prices.push(milk.price);
        }
    }

    let sweeteners = OrderItemSweetener::find()
        .filter(order_item_sweetener::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductSweetener)
        .all(db)
        .await?;
    prices.extend(sweeteners.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    let shots = OrderItemEspressoShot::find()
        .filter(order_item_espresso_shot::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductEspressoShot)
        .all(db)
        .await?;
    prices.extend(shots.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    let flavors = OrderItemFlavor::find()
        .filter(order_item_flavor::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductFlavor)
        .all(db)
        .await?;
    prices.extend(flavors.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    let juices = OrderItemJuice::find()
        .filter(order_item_juice::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductJuice)
        .all(db)
        .await?;
    prices.extend(juices.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    let toppings = OrderItemTopping::find()
        .filter(order_item_topping::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductTopping)
        .all(db)
        .await?;
    prices.extend(toppings.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    let teas = OrderItemTea::find()
        .filter(order_item_tea::Column::OrderItemId.eq(item.id))
        .find_also_related(ProductTea)
        .all(db)
        .await?;
    prices.extend(teas.into_iter().filter_map(|(_, option)| option.map(|o| o.price)));

    Ok(prices)
}

/// Recomputes and stores an order item's total, then its order's total.
///
/// Returns the new item total.
pub async fn recalculate_item_total<C>(db: &C, item_id: i64) -> Result<Decimal, DbErr>
where
    C: ConnectionTrait,
{
    let item = OrderItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Order item {item_id}")))?;
    let product = Product::find_by_id(item.product_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Product {}", item.product_id)))?;

    let option_prices = selected_option_prices(db, &item).await?;
    let total = item_total(product.price, item.quantity, option_prices).ok_or_else(too_large)?;

    OrderItem::update_many()
        .col_expr(order_item::Column::Total, Expr::value(total))
        .filter(order_item::Column::Id.eq(item_id))
        .exec(db)
        .await?;
    tracing::debug!(item_id, %total, "Recalculated order item total");

    recalculate_order_total(db, item.order_id).await?;
    Ok(total)
}

/// Recomputes and stores an order's total from its items' stored totals.
///
/// Returns the new order total.
pub async fn recalculate_order_total<C>(db: &C, order_id: i64) -> Result<Decimal, DbErr>
where
    C: ConnectionTrait,
{
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(db)
        .await?;
    let total = order_total(items.into_iter().map(|item| item.total)).ok_or_else(too_large)?;

    Order::update_many()
        .col_expr(order::Column::Total, Expr::value(total))
        .filter(order::Column::Id.eq(order_id))
        .exec(db)
        .await?;
    tracing::debug!(order_id, %total, "Recalculated order total");

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_item_total_base_price_times_quantity() {
        assert_eq!(item_total(price(450), 2, []), Some(price(900)));
    }

    #[test]
    fn test_item_total_adds_each_option_once() {
        // Options are not multiplied by the item quantity
        let total = item_total(price(450), 3, [price(50), price(75), Decimal::ZERO]);
        assert_eq!(total, Some(price(1475)));
    }

    #[test]
    fn test_item_total_rounds_to_cents() {
        let total = item_total(Decimal::new(3333, 3), 1, []);
        assert_eq!(total, Some(price(333)));
    }

    #[test]
    fn test_order_total_sums_items() {
        assert_eq!(order_total([price(900), price(1475), price(325)]), Some(price(2700)));
        assert_eq!(order_total([]), Some(Decimal::ZERO));
    }

    #[test]
    fn test_totals_overflow_is_none() {
        assert_eq!(item_total(Decimal::MAX, 2, []), None);
        assert_eq!(item_total(Decimal::MAX, 1, [price(100)]), None);
        assert_eq!(order_total([Decimal::MAX, Decimal::MAX]), None);
    }
}
