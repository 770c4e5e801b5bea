pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_create_urls;
mod m20260301_000002_create_url_clicks;

pub use m20260301_000001_create_urls::SHORT_CODE_UNIQUE_INDEX;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_urls::Migration),
            Box::new(m20260301_000002_create_url_clicks::Migration),
        ]
    }
}
