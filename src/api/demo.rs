//! Demo pages: a home page, a plain HTML form that places orders server side, and a Vue page
//! that talks to the JSON API.

use super::AppState;
use crate::{
    core::{
        order::{self, ItemRequest, OrderDetail, OrderRequest},
        product,
    },
    entities::ProductSize,
    errors::{Error, Result},
};
use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::get,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{info, instrument};

/// Compiles the templates embedded in the binary.
pub fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("example_home.html", include_str!("../../templates/example_home.html")),
        ("server_side_form.html", include_str!("../../templates/server_side_form.html")),
        ("vue_form_example.html", include_str!("../../templates/vue_form_example.html")),
    ])?;
    Ok(tera)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route(
            "/server-side-form-example/",
            get(order_form).post(submit_order_form),
        )
        .route("/vue-form-example/", get(vue_form))
}

/// Submitted values of the server side form. Also echoed back when re-rendering.
#[derive(Debug, Deserialize, Serialize)]
struct DemoForm {
    #[serde(default)]
    customer_name: String,
    /// The chosen `product_size` row, which also picks the product
    #[serde(default)]
    size_id: Option<i64>,
    #[serde(default = "default_quantity")]
    quantity: i32,
    #[serde(default)]
    special_instructions: String,
}

const fn default_quantity() -> i32 {
    1
}

impl Default for DemoForm {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            size_id: None,
            quantity: default_quantity(),
            special_instructions: String::new(),
        }
    }
}

fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>> {
    Ok(Html(state.templates.render(template, context)?))
}

#[instrument(skip(state))]
async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    render(&state, "example_home.html", &Context::new())
}

#[instrument(skip(state))]
async fn vue_form(State(state): State<AppState>) -> Result<Html<String>> {
    render(&state, "vue_form_example.html", &Context::new())
}

async fn render_form(
    state: &AppState,
    form: &DemoForm,
    placed: Option<&OrderDetail>,
    error: Option<String>,
) -> Result<Html<String>> {
    let products = product::get_all_active_products(&state.db).await?;
    let products = product::product_details(&state.db, products).await?;

    let mut context = Context::new();
    context.insert("products", &products);
    context.insert("form", form);
    context.insert("order", &placed);
    context.insert("error", &error);
    render(state, "server_side_form.html", &context)
}

#[instrument(skip(state))]
async fn order_form(State(state): State<AppState>) -> Result<Html<String>> {
    render_form(&state, &DemoForm::default(), None, None).await
}

async fn place_from_form(state: &AppState, form: &DemoForm) -> Result<OrderDetail> {
    let size_id = form
        .size_id
        .ok_or_else(|| Error::validation("Please choose a drink"))?;
    let size = ProductSize::find_by_id(size_id)
        .one(&state.db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Product size",
            id: size_id,
        })?;

    let request = OrderRequest {
        customer_name: form.customer_name.clone(),
        special_instructions: form.special_instructions.clone(),
        items: vec![ItemRequest {
            quantity: form.quantity,
            size_id: Some(size.id),
            ..ItemRequest::new(size.product_id)
        }],
    };
    order::place_order(&state.db, request).await
}

/// Places a one-item order and renders the form again with the outcome.
///
/// Rejected orders are shown on the page rather than returned as an error status, so the
/// customer keeps what they typed.
#[instrument(skip(state, form))]
async fn submit_order_form(
    State(state): State<AppState>,
    Form(form): Form<DemoForm>,
) -> Result<Html<String>> {
    match place_from_form(&state, &form).await {
        Ok(placed) => {
            info!(order_id = placed.order.id, "Order placed from form");
            render_form(&state, &DemoForm::default(), Some(&placed), None).await
        }
        Err(err @ (Error::Validation { .. } | Error::NotFound { .. })) => {
            render_form(&state, &form, None, Some(err.to_string())).await
        }
        Err(err) => Err(err),
    }
}
