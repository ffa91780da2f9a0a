pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_branches_table;
mod m20240301_000002_create_users_table;
mod m20240301_000003_create_customers_table;
mod m20240301_000004_create_orders_table;
mod m20240301_000005_create_order_line_tables;
mod m20240301_000006_create_activity_logs_table;
mod m20240301_000007_create_notification_templates_table;
mod m20240301_000008_add_list_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_branches_table::Migration),
            Box::new(m20240301_000002_create_users_table::Migration),
            Box::new(m20240301_000003_create_customers_table::Migration),
            Box::new(m20240301_000004_create_orders_table::Migration),
            Box::new(m20240301_000005_create_order_line_tables::Migration),
            Box::new(m20240301_000006_create_activity_logs_table::Migration),
            Box::new(m20240301_000007_create_notification_templates_table::Migration),
            Box::new(m20240301_000008_add_list_indexes::Migration),
        ]
    }
}
