//! Database configuration module for the coffee ordering API.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema, including foreign keys and their `ON DELETE` actions, always matches the
//! Rust models. Creation is idempotent and runs on every start.

use crate::entities::{
    Choice, EspressoShot, Flavor, FlavorCategory, Juice, Milk, Order, OrderItem,
    OrderItemEspressoShot, OrderItemFlavor, OrderItemJuice, OrderItemSweetener, OrderItemTea,
    OrderItemTopping, Product, ProductChoice, ProductEspressoShot, ProductFlavor, ProductJuice,
    ProductMilk, ProductSize, ProductSweetener, ProductTea, ProductTopping, Size, Sweetener, Tea,
    Topping, ToppingCategory, ToppingChoice,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Returns the directory a file-backed `SQLite` URL points into, if any.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` databases the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database: {database_url}");
    let db = Database::connect(database_url).await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    db.execute(builder.build(statement.if_not_exists())).await?;
    Ok(())
}

/// Creates all necessary database tables that do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    // Catalog
    create_table(db, &schema, EspressoShot).await?;
    create_table(db, &schema, Sweetener).await?;
    create_table(db, &schema, Size).await?;
    create_table(db, &schema, Milk).await?;
    create_table(db, &schema, Juice).await?;
    create_table(db, &schema, Tea).await?;
    create_table(db, &schema, FlavorCategory).await?;
    create_table(db, &schema, Flavor).await?;
    create_table(db, &schema, ToppingCategory).await?;
    create_table(db, &schema, Choice).await?;
    create_table(db, &schema, Topping).await?;
    create_table(db, &schema, ToppingChoice).await?;

    // Products and what they allow
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, ProductChoice).await?;
    create_table(db, &schema, ProductSize).await?;
    create_table(db, &schema, ProductMilk).await?;
    create_table(db, &schema, ProductSweetener).await?;
    create_table(db, &schema, ProductEspressoShot).await?;
    create_table(db, &schema, ProductFlavor).await?;
    create_table(db, &schema, ProductJuice).await?;
    create_table(db, &schema, ProductTopping).await?;
    create_table(db, &schema, ProductTea).await?;

    // Orders
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, OrderItemSweetener).await?;
    create_table(db, &schema, OrderItemEspressoShot).await?;
    create_table(db, &schema, OrderItemFlavor).await?;
    create_table(db, &schema, OrderItemJuice).await?;
    create_table(db, &schema, OrderItemTopping).await?;
    create_table(db, &schema, OrderItemTea).await?;

    info!("Database tables ready");
    Ok(())
}
