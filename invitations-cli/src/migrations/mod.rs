pub mod migration_01;
pub mod run_migrations;
