//! Product list endpoint

use super::AppState;
use crate::{
    core::product::{self, ProductDetail},
    errors::Result,
};
use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/products/", get(list_products))
}

/// Active products ordered by name, each with its allowed options nested three levels deep.
#[instrument(skip(state))]
async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductDetail>>> {
    let products = product::get_all_active_products(&state.db).await?;
    let details = product::product_details(&state.db, products).await?;
    Ok(Json(details))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::api::test_support::{decimal, send, test_state};
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_list_products() -> Result<()> {
        let state = test_state().await?;
        let menu = seed_test_menu(&state.db).await?;
        product::create_product(&state.db, "Americano", price(300)).await?;
        product::deactivate_product(&state.db, menu.mocha.id).await?;

        let (status, body) = send(&state, Method::GET, "/api/products/", None).await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Americano", "Latte"]);

        let latte = &body[1];
        assert_eq!(decimal(&latte["price"]), price(395));
        assert_eq!(latte["default_size"]["size"]["name"], "Tall");
        assert_eq!(latte["allowed_flavors"][0]["ingredient"]["category"]["name"], "Syrups");
        assert_eq!(
            latte["allowed_toppings"][0]["ingredient"]["allowed_choices"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_empty() -> Result<()> {
        let state = test_state().await?;
        let (status, body) = send(&state, Method::GET, "/api/products/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
        Ok(())
    }
}
