//! Minimal console front end: fetch the schema and the first page of
//! contracts and print them as a grid. Mostly useful for smoke-testing a
//! backend; pass `--verbose` to mirror the log file on stderr.

use anyhow::{Context, Result};
use tabula::TabularViewModel;
use tabula_client::{ClientConfig, HttpApi, SchemaStore};
use tabula_logging::{init_logging, LogConfig};
use tabula_schema::SERIAL_COLUMN;

#[tokio::main]
async fn main() -> Result<()> {
    let verbose = std::env::args().any(|arg| arg == "--verbose" || arg == "-v");
    init_logging(LogConfig { app_name: "tabula", verbose })?;

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "connecting");
    let page_size = config.page_size;
    let api = HttpApi::new(config).context("Failed to build HTTP client")?;

    let schema = api.fetch_schema().await.context("Failed to fetch schema")?;
    let mut view = TabularViewModel::new(page_size);
    view.sync_schema(schema);
    view.load_page(&api).await.context("Failed to fetch rows")?;

    // The serial column is derived from the page position, not row data.
    let columns: Vec<&str> = view
        .visible_columns()
        .into_iter()
        .filter(|name| *name != SERIAL_COLUMN)
        .collect();
    println!("{:>4}  {}", SERIAL_COLUMN, columns.join(" | "));

    for (index, row) in view.rows().iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| view.cell(row, column).display())
            .collect();
        println!("{:>4}  {}", view.row_serial(index), cells.join(" | "));
    }
    println!(
        "page {} of {} ({} rows)",
        view.page(),
        view.total_pages(),
        view.rows().len()
    );

    Ok(())
}
