/// Catalog management - ingredients, levels, flavors and toppings
pub mod catalog;

/// Order placement and customization
pub mod order;

/// Item and order total computation
pub mod pricing;

/// Products, their allowed options and the nested product view
pub mod product;

/// Seeding an empty database from the menu configuration
pub mod seed;
