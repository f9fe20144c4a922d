#![cfg(not(tarpaulin_include))]

use clap::Parser;
use gridserve::engine;
use gridserve::loader::{self, LoadOptions};
use gridserve::locale::Locale;
use gridserve::order::{ColumnType, SortDirection};
use gridserve::registry::TableRegistry;
use gridserve::request::{COUNT_ALL, RequestData};
use gridserve::server_data::FilterType;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "gridq", about = "Run one grid request against a CSV file")]
struct Args {
    /// CSV file to load
    file: PathBuf,

    /// Global search text
    #[arg(long, default_value = "")]
    search: String,

    /// Treat search terms as regular expressions
    #[arg(long)]
    regex: bool,

    /// Per-column search as COL=TEXT
    #[arg(long = "column-search")]
    column_search: Vec<String>,

    /// Ordering as COL or COL:asc / COL:desc, most significant first
    #[arg(long)]
    order: Vec<String>,

    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Page length, -1 for all rows
    #[arg(long, default_value_t = COUNT_ALL, allow_negative_numbers = true)]
    length: i64,

    /// Keep rows matching any search term instead of all of them
    #[arg(long)]
    any_term: bool,

    #[arg(long, default_value = "en-US")]
    locale: String,

    /// Ordering type per column, comma separated
    #[arg(long, value_delimiter = ',')]
    types: Vec<ColumnType>,

    /// The file has no header row
    #[arg(long)]
    no_headers: bool,

    /// Column holding the row id
    #[arg(long)]
    id_column: Option<usize>,

    #[arg(long)]
    pretty: bool,
}

fn parse_order(value: &str) -> Result<(usize, Option<SortDirection>), String> {
    let (column, direction) = match value.split_once(':') {
        Some((column, direction)) => {
            let direction = SortDirection::from_name(direction)
                .ok_or_else(|| format!("invalid direction in {:?}", value))?;
            (column, Some(direction))
        }
        None => (value, None),
    };
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column in {:?}", value))?;
    Ok((column, direction))
}

fn parse_column_search(value: &str) -> Result<(usize, &str), String> {
    let (column, text) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COL=TEXT, got {:?}", value))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column in {:?}", value))?;
    Ok((column, text))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let start_time = Instant::now();
    let options = LoadOptions {
        has_headers: !args.no_headers,
        column_types: args.types.clone(),
        locale: Locale::parse(&args.locale),
        filter_type: if args.any_term {
            FilterType::AnyTermPerRow
        } else {
            FilterType::AllTermsPerRow
        },
        id_column: args.id_column,
        ..Default::default()
    };
    let loaded = loader::from_csv(&args.file, &options)?;
    let column_count = loaded.table.column_count();

    let mut request = RequestData::with_columns(column_count)
        .with_draw(1)
        .with_page(args.start, args.length)
        .with_search(args.search.as_str(), args.regex);
    for order in &args.order {
        let (column, direction) = parse_order(order)?;
        request = request.with_order(column, direction);
    }
    for search in &args.column_search {
        let (column, text) = parse_column_search(search)?;
        request = request.with_column_search(column, text, args.regex);
    }

    let registry = TableRegistry::new();
    let id = registry.register_new(loaded.table);
    let response = engine::handle_request(&registry, &id, &request)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);
    eprintln!("[{:.3}s] {} of {} rows", start_time.elapsed().as_secs_f64(), response.records_filtered, response.records_total);

    Ok(())
}
