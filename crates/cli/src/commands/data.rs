//! Read-only commands against the transaction store.

use ethpulse_core::{
    config::AppConfig,
    query::QueryGateway,
    store::{SqliteStore, TransactionStore},
    types::TransactionRecord,
};
use prettytable::{row, Cell, Row, Table};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::utils::{abbreviate, print_info, CliResult};

/// Opens the configured store, optionally pointed at a different database file.
pub async fn open_store(
    config: &AppConfig,
    database_override: Option<&str>,
) -> CliResult<Arc<SqliteStore>> {
    let mut store_config = config.store.clone();
    if let Some(url) = database_override {
        store_config.database_url = url.to_string();
    }

    let store = SqliteStore::open(&store_config).await?;
    store.initialize().await?;
    Ok(Arc::new(store))
}

pub async fn show_stats(store: &dyn TransactionStore) -> CliResult<()> {
    let stats = store.stats().await?;

    let mut table = Table::new();
    table.add_row(row!["Metric", "Value"]);
    table.add_row(row!["Total transactions", stats.total_transactions]);
    table.add_row(row!["Unique senders", stats.unique_senders]);
    table.add_row(row!["Unique receivers", stats.unique_receivers]);
    table.add_row(row!["Lowest block", display_opt(stats.min_block)]);
    table.add_row(row!["Highest block", display_opt(stats.max_block)]);
    table.add_row(row!["Average value (wei)", stats.avg_value.as_deref().unwrap_or("-")]);
    table.printstd();

    Ok(())
}

pub async fn show_recent(store: &dyn TransactionStore, limit: i64) -> CliResult<()> {
    let records = store.query_recent(limit).await?;
    print_records(&records);
    Ok(())
}

pub async fn show_by_address(
    store: &dyn TransactionStore,
    address: &str,
    limit: i64,
) -> CliResult<()> {
    let records = store.query_by_address(address, limit).await?;
    print_records(&records);
    Ok(())
}

pub async fn run_query(store: Arc<SqliteStore>, sql: &str, params: &[Value]) -> CliResult<()> {
    let gateway = QueryGateway::new(store);
    let response = gateway.execute(sql, params).await?;

    if response.rows.is_empty() {
        print_info("Query returned no rows");
        return Ok(());
    }

    query_table(&response.rows).printstd();
    print_info(&format!("{} row(s)", response.row_count));
    Ok(())
}

fn print_records(records: &[TransactionRecord]) {
    if records.is_empty() {
        print_info("No transactions stored yet");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Hash", "Block", "From", "To", "Value (wei)", "Seen"]);
    for record in records {
        let to = record
            .to_address
            .as_deref()
            .map_or_else(|| "(create)".to_string(), |a| abbreviate(a, 4));
        table.add_row(row![
            abbreviate(&record.hash, 6),
            record.block_number,
            abbreviate(&record.from_address, 4),
            to,
            record.value,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
        ]);
    }
    table.printstd();
    print_info(&format!("{} transaction(s)", records.len()));
}

fn query_table(rows: &[Map<String, Value>]) -> Table {
    let mut table = Table::new();
    let Some(first) = rows.first() else {
        return table;
    };

    let columns: Vec<&String> = first.keys().collect();
    table.add_row(Row::new(columns.iter().map(|c| Cell::new(c)).collect()));

    for row in rows {
        let cells = columns
            .iter()
            .map(|column| Cell::new(&render_value(row.get(column.as_str()))))
            .collect();
        table.add_row(Row::new(cells));
    }
    table
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn display_opt(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
