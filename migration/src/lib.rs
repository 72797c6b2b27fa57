pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_promotions;
mod m20251001_000002_create_promotion_details;
mod m20251001_000003_create_promotion_usage;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_promotions::Migration),
            Box::new(m20251001_000002_create_promotion_details::Migration),
            Box::new(m20251001_000003_create_promotion_usage::Migration),
        ]
    }
}
