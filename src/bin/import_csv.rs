// src/bin/import_csv.rs
use std::process::ExitCode;

use fashion_shop_backend::{config::Config, database, importer, store::PgRecordStore};
use tracing_subscriber::fmt::init as tracing_init;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let db_pool = match database::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "DB connection failed");
            return ExitCode::FAILURE;
        }
    };

    let store = PgRecordStore::new(db_pool.clone());
    let outcome = match importer::read_rows_from_path(&config.import_csv_path) {
        Ok(rows) => importer::run_import(&store, rows).await,
        Err(e) => Err(e),
    };

    db_pool.close().await;

    match outcome {
        Ok(report) => {
            tracing::info!(rows = report.rows, path = %config.import_csv_path.display(), "Import finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Import error");
            ExitCode::FAILURE
        }
    }
}
