pub use sea_orm_migration::prelude::*;

mod m20251112_000000_create_categories_and_products;
mod m20251118_000000_create_reviews;
mod m20251130_000000_create_search_vector;
mod m20251220_000000_create_cart_items;
mod m20260110_000000_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251112_000000_create_categories_and_products::Migration),
            Box::new(m20251118_000000_create_reviews::Migration),
            Box::new(m20251130_000000_create_search_vector::Migration),
            Box::new(m20251220_000000_create_cart_items::Migration),
            Box::new(m20260110_000000_create_orders::Migration),
        ]
    }
}
