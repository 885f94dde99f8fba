//! Migration runner for the Bordereau schema.
//!
//! Delegates to the sea-orm-migration CLI, so the usual subcommands
//! apply: `up`, `down`, `status`, and `fresh` (drop everything and
//! re-run, for development databases only).

use bordereau_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // The migrator CLI sets up its own tracing
    cli::run_cli(Migrator).await;
}
