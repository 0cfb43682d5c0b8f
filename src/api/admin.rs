//! Admin CRUD over every table.
//!
//! Each table gets `GET/POST /admin/{table}/` and `GET/PATCH/DELETE /admin/{table}/{id}`.
//! Writes go through the active model, so the entity save and delete hooks validate the
//! change and keep the order totals current. `PATCH` only changes the fields present in the
//! request body.

use super::AppState;
use crate::{
    entities::{
        choice, espresso_shot, flavor, flavor_category, juice, milk, order, order_item,
        order_item_espresso_shot, order_item_flavor, order_item_juice, order_item_sweetener,
        order_item_tea, order_item_topping, product, product_choice, product_espresso_shot,
        product_flavor, product_juice, product_milk, product_size, product_sweetener, product_tea,
        product_topping, size, sweetener, tea, topping, topping_category, topping_choice,
    },
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, EntityName, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryOrder, TryIntoModel,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{info, instrument};

type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

macro_rules! admin_routes {
    ($($table:literal => $module:ident),+ $(,)?) => {
        /// Routes for every table, to be nested under `/admin`.
        pub fn routes() -> Router<AppState> {
            Router::new()
                $(
                    .route(
                        concat!("/", $table, "/"),
                        get(list::<$module::ActiveModel>).post(create::<$module::ActiveModel>),
                    )
                    .route(
                        concat!("/", $table, "/:id"),
                        get(retrieve::<$module::ActiveModel>)
                            .patch(update::<$module::ActiveModel>)
                            .delete(destroy::<$module::ActiveModel>),
                    )
                )+
        }
    };
}

admin_routes! {
    "espresso_shots" => espresso_shot,
    "sweeteners" => sweetener,
    "sizes" => size,
    "milks" => milk,
    "juices" => juice,
    "teas" => tea,
    "flavor_categories" => flavor_category,
    "flavors" => flavor,
    "topping_categories" => topping_category,
    "toppings" => topping,
    "choices" => choice,
    "topping_choices" => topping_choice,
    "products" => product,
    "product_choices" => product_choice,
    "product_sizes" => product_size,
    "product_milks" => product_milk,
    "product_sweeteners" => product_sweetener,
    "product_espresso_shots" => product_espresso_shot,
    "product_flavors" => product_flavor,
    "product_juices" => product_juice,
    "product_toppings" => product_topping,
    "product_teas" => product_tea,
    "orders" => order,
    "order_items" => order_item,
    "order_item_sweeteners" => order_item_sweetener,
    "order_item_espresso_shots" => order_item_espresso_shot,
    "order_item_flavors" => order_item_flavor,
    "order_item_juices" => order_item_juice,
    "order_item_toppings" => order_item_topping,
    "order_item_teas" => order_item_tea,
}

fn primary_key_names<A>() -> Vec<String>
where
    A: ActiveModelTrait,
{
    <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
        .map(|key| key.into_column().as_str().to_string())
        .collect()
}

fn json_object(body: Value) -> Result<serde_json::Map<String, Value>> {
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(Error::validation("Expected a JSON object")),
    }
}

async fn find_record<A>(state: &AppState, id: i64) -> Result<ModelOf<A>>
where
    A: ActiveModelTrait,
    <<A::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
{
    A::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(Error::NotFound { entity: "Record", id })
}

#[instrument(skip(state))]
async fn list<A>(State(state): State<AppState>) -> Result<Json<Vec<ModelOf<A>>>>
where
    A: ActiveModelTrait + Send + Sync + 'static,
    ModelOf<A>: Serialize,
{
    let mut select = A::Entity::find();
    for key in <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter() {
        select = select.order_by_asc(key.into_column());
    }
    Ok(Json(select.all(&state.db).await?))
}

#[instrument(skip(state))]
async fn retrieve<A>(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<ModelOf<A>>>
where
    A: ActiveModelTrait + Send + Sync + 'static,
    ModelOf<A>: Serialize,
    <<A::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
{
    find_record::<A>(&state, id).await.map(Json)
}

#[instrument(skip(state, body))]
async fn create<A>(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ModelOf<A>>)>
where
    A: ActiveModelTrait + ActiveModelBehavior + TryIntoModel<ModelOf<A>> + Send + Sync + 'static,
    ModelOf<A>: IntoActiveModel<A> + Serialize + DeserializeOwned,
{
    let mut fields = json_object(body)?;
    // Ids are always assigned by the database
    for key in primary_key_names::<A>() {
        fields.insert(key, Value::from(0));
    }

    let mut active = A::from_json(Value::Object(fields))?;
    for key in <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter() {
        active.not_set(key.into_column());
    }
    let model = active.insert(&state.db).await?;
    info!("Admin created {}", A::Entity::default().table_name());
    Ok((StatusCode::CREATED, Json(model)))
}

#[instrument(skip(state, body))]
async fn update<A>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<ModelOf<A>>>
where
    A: ActiveModelTrait + ActiveModelBehavior + TryIntoModel<ModelOf<A>> + Send + Sync + 'static,
    ModelOf<A>: IntoActiveModel<A> + Serialize + DeserializeOwned,
    <<A::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
{
    let changes = json_object(body)?;
    let existing = find_record::<A>(&state, id).await?;

    // Parse the changes on top of the current row so partial bodies deserialize
    let mut merged = json_object(
        serde_json::to_value(&existing).map_err(|e| Error::validation(e.to_string()))?,
    )?;
    for (key, value) in &changes {
        merged.insert(key.clone(), value.clone());
    }
    let parsed = A::from_json(Value::Object(merged))?;

    let primary_keys = primary_key_names::<A>();
    let mut active: A = existing.into_active_model();
    for column in <<A::Entity as EntityTrait>::Column as Iterable>::iter() {
        let name = column.as_str();
        if primary_keys.iter().any(|key| key == name) || !changes.contains_key(name) {
            continue;
        }
        let value = match parsed.get(column) {
            ActiveValue::Set(value) | ActiveValue::Unchanged(value) => value,
            ActiveValue::NotSet => continue,
        };
        // Resending the current value is not a change
        if matches!(active.get(column), ActiveValue::Unchanged(current) if current == value) {
            continue;
        }
        active.set(column, value);
    }

    let model = active.update(&state.db).await?;
    info!("Admin updated {} {id}", A::Entity::default().table_name());
    Ok(Json(model))
}

#[instrument(skip(state))]
async fn destroy<A>(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
    ModelOf<A>: IntoActiveModel<A>,
    <<A::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
{
    // Delete through the active model so the delete hooks run
    let existing: A = find_record::<A>(&state, id).await?.into_active_model();
    existing.delete(&state.db).await?;
    info!("Admin deleted {} {id}", A::Entity::default().table_name());
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::api::test_support::{decimal, send, test_state};
    use crate::core::order::{self as order_core, ItemRequest, OrderDetail, OrderRequest, SelectionRequest};
    use crate::test_utils::*;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_catalog_crud() -> Result<()> {
        let state = test_state().await?;

        let (status, milk) = send(&state, Method::POST, "/admin/milks/", Some(json!({ "name": "Oat" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = milk["id"].as_i64().unwrap();

        let (status, milk) = send(
            &state,
            Method::PATCH,
            &format!("/admin/milks/{id}"),
            Some(json!({ "name": "Oat Milk", "id": 999 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(milk["name"], "Oat Milk");
        assert_eq!(milk["id"], id);

        let (status, milks) = send(&state, Method::GET, "/admin/milks/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(milks.as_array().unwrap().len(), 1);

        let (status, _) = send(&state, Method::DELETE, &format!("/admin/milks/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, Method::GET, &format!("/admin/milks/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_choice() -> Result<()> {
        let state = test_state().await?;
        let (status, choice) = send(
            &state,
            Method::POST,
            "/admin/choices/",
            Some(json!({ "kind": "milk_foam", "name": "Dry" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(choice["kind"], "milk_foam");

        let (status, _) = send(
            &state,
            Method::POST,
            "/admin/choices/",
            Some(json!({ "kind": "sprinkles", "name": "Rainbow" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn test_patch_order_item_recalculates_totals() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        let placed = order_core::place_order(
            &state.db,
            OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items: vec![ItemRequest::new(menu.mocha.id)],
            },
        )
        .await?;
        let item_id = placed.items[0].item.id;

        let (status, item) = send(
            &state,
            Method::PATCH,
            &format!("/admin/order_items/{item_id}"),
            Some(json!({ "quantity": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&item["total"]), price(1275));

        let (_, order) = send(
            &state,
            Method::GET,
            &format!("/admin/orders/{}", placed.order.id),
            None,
        )
        .await;
        assert_eq!(decimal(&order["total"]), price(1275));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_selection_for_wrong_product_rejected() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        let placed = order_core::place_order(
            &state.db,
            OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items: vec![ItemRequest::new(menu.mocha.id)],
            },
        )
        .await?;

        // Vanilla is offered on the latte, not the mocha
        let (status, body) = send(
            &state,
            Method::POST,
            "/admin/order_item_flavors/",
            Some(json!({
                "order_item_id": placed.items[0].item.id,
                "product_flavor_id": menu.latte_vanilla,
                "quantity": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("not offered"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_referenced_row_is_protected() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        order_core::place_order(
            &state.db,
            OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items: vec![ItemRequest::new(menu.mocha.id)],
            },
        )
        .await?;

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/admin/products/{}", menu.mocha.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/admin/product_sizes/{}", menu.mocha_tall.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_object_body_rejected() -> Result<()> {
        let state = test_state().await?;
        let (status, _) = send(&state, Method::POST, "/admin/milks/", Some(json!(["Oat"]))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    async fn place(state: &AppState, items: Vec<ItemRequest>) -> Result<OrderDetail> {
        order_core::place_order(
            &state.db,
            OrderRequest {
                customer_name: "Ada".to_string(),
                special_instructions: String::new(),
                items,
            },
        )
        .await
    }

    fn latte_with_vanilla(menu: &TestMenu) -> ItemRequest {
        ItemRequest {
            flavors: Some(vec![SelectionRequest::new(menu.latte_vanilla, 1)]),
            ..ItemRequest::new(menu.latte.id)
        }
    }

    #[tokio::test]
    async fn test_delete_referenced_catalog_entry_is_protected() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        place(&state, vec![ItemRequest::new(menu.mocha.id)]).await?;

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/admin/sizes/{}", menu.mocha_tall.size_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/admin/milks/{}", menu.latte_oat.milk_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_item_stays_on_its_order() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        let first = place(&state, vec![ItemRequest::new(menu.mocha.id)]).await?;
        let second = place(&state, vec![ItemRequest::new(menu.mocha.id)]).await?;
        let item_id = first.items[0].item.id;

        let (status, body) = send(
            &state,
            Method::PATCH,
            &format!("/admin/order_items/{item_id}"),
            Some(json!({ "order_id": second.order.id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("order_id"));

        // Resending the current order is allowed
        let (status, item) = send(
            &state,
            Method::PATCH,
            &format!("/admin/order_items/{item_id}"),
            Some(json!({ "order_id": first.order.id, "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&item["total"]), price(850));

        let first = order_core::get_order_details(&state.db, first.order.id).await?;
        let second = order_core::get_order_details(&state.db, second.order.id).await?;
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.order.total, price(850));
        assert_eq!(second.order.total, price(425));
        Ok(())
    }

    #[tokio::test]
    async fn test_order_item_product_is_fixed() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        let placed = place(&state, vec![latte_with_vanilla(&menu)]).await?;
        let item_id = placed.items[0].item.id;

        let (status, _) = send(
            &state,
            Method::PATCH,
            &format!("/admin/order_items/{item_id}"),
            Some(json!({
                "product_id": menu.mocha.id,
                "size_id": menu.mocha_tall.id,
                "milk_id": null,
                "ice_id": null
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let detail = order_core::get_order_details(&state.db, placed.order.id).await?;
        assert_eq!(detail.items[0].item.product_id, menu.latte.id);
        assert_eq!(detail.order.total, price(445));
        Ok(())
    }

    #[tokio::test]
    async fn test_option_stays_on_its_product() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        place(&state, vec![latte_with_vanilla(&menu)]).await?;
        let uri = format!("/admin/product_flavors/{}", menu.latte_vanilla);

        let (status, _) = send(&state, Method::PATCH, &uri, Some(json!({ "product_id": menu.mocha.id }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, option) = send(&state, Method::PATCH, &uri, Some(json!({ "price": "0.75" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(option["product_id"], menu.latte.id);
        assert_eq!(decimal(&option["price"]), price(75));
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_stays_on_its_item() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        let placed = place(
            &state,
            vec![latte_with_vanilla(&menu), ItemRequest::new(menu.latte.id)],
        )
        .await?;
        let flavor = placed.items[0]
            .selections
            .iter()
            .find(|selection| selection.extra == crate::core::product::Extra::Flavor)
            .unwrap();

        let (status, _) = send(
            &state,
            Method::PATCH,
            &format!("/admin/order_item_flavors/{}", flavor.id),
            Some(json!({ "order_item_id": placed.items[1].item.id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let detail = order_core::get_order_details(&state.db, placed.order.id).await?;
        assert_eq!(detail.items[0].item.total, price(445));
        assert_eq!(detail.items[1].item.total, price(395));
        assert_eq!(detail.order.total, price(840));
        Ok(())
    }
}
