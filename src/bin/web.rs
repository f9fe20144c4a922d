#![cfg(not(tarpaulin_include))]

use clap::Parser;
use gridserve::app;
use gridserve::config::ServerConfig;
use gridserve::content::Node;
use gridserve::loader::{self, LoadOptions};
use gridserve::order::ColumnType;
use gridserve::registry;
use gridserve::row::RowSpec;
use gridserve::server_data::ServerData;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridserve-web", about = "Serve grid tables over HTTP")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV files to serve; a demo table is served when none are given
    files: Vec<PathBuf>,

    /// Ordering type per column, comma separated
    #[arg(long, value_delimiter = ',')]
    types: Vec<ColumnType>,

    /// Column holding the row id
    #[arg(long)]
    id_column: Option<usize>,
}

/// Small table showing typed ordering and rich cell content
fn demo_table(config: &ServerConfig) -> Result<ServerData, gridserve::GridError> {
    let fruits = [
        ("Apple", "red", "1.20", "2024-03-01"),
        ("Banana", "yellow", "0.55", "2024-02-14"),
        ("Cherry", "red", "12.00", "2024-06-20"),
        ("Grape", "green", "3.10", "2024-09-02"),
        ("Kiwi", "brown", "0.90", "2024-01-30"),
        ("Lemon", "yellow", "0.45", "2024-04-11"),
        ("Mango", "orange", "2.75", "2024-05-05"),
        ("Plum", "purple", "1.95", "2024-08-19"),
    ];

    let rows = fruits.iter().enumerate().map(|(i, (name, colour, price, harvested))| {
        let name_cell = vec![
            Node::element("strong").with_child(Node::text(*name)),
            Node::element("style").with_child(Node::text("strong { color: #335; }")),
        ];
        RowSpec::new(vec![
            name_cell,
            vec![Node::text(*colour)],
            vec![Node::text(*price)],
            vec![Node::text(*harvested)],
        ])
        .with_id(format!("fruit-{}", i + 1))
        .with_attribute("data-colour", *colour)
    });

    ServerData::builder(4)
        .locale(config.locale())
        .filter_type(config.filter_type)
        .column_type(2, ColumnType::Decimal)
        .column_type(3, ColumnType::Date)
        .rows(rows)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter.as_str())).init();

    let registry = registry::global();
    if args.files.is_empty() {
        let id = registry.register_new(demo_table(&config)?);
        log::info!("Serving demo table {}", id);
    }
    for file in &args.files {
        let options = LoadOptions {
            column_types: args.types.clone(),
            locale: config.locale(),
            filter_type: config.filter_type,
            id_column: args.id_column,
            ..Default::default()
        };
        let loaded = loader::from_csv(file, &options)?;
        let id = registry.register_new(loaded.table);
        log::info!("Serving {} as table {}", file.display(), id);
    }

    app::run(config, registry).await
}
