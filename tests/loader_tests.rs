use gridserve::engine;
use gridserve::loader::{self, LoadOptions};
use gridserve::locale::Locale;
use gridserve::order::{ColumnType, SortDirection};
use gridserve::request::RequestData;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_and_query_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sku,name,price,added").unwrap();
    writeln!(file, "A1,Kettle,\"1.234,50\",03.02.2024").unwrap();
    writeln!(file, "A2,Toaster,\"99,00\",15.01.2024").unwrap();
    writeln!(file, "A3,Mixer,\"250,75\",01.12.2023").unwrap();
    file.flush().unwrap();

    let options = LoadOptions {
        column_types: vec![ColumnType::Text, ColumnType::Text, ColumnType::Decimal, ColumnType::Date],
        locale: Locale::parse("de-DE"),
        id_column: Some(0),
        ..Default::default()
    };
    let loaded = loader::from_csv(file.path(), &options).unwrap();
    assert_eq!(loaded.headers, vec!["sku", "name", "price", "added"]);

    let by_price = RequestData::with_columns(4).with_order(2, Some(SortDirection::Desc));
    let response = engine::serve(&loaded.table, &by_price).unwrap();
    let ids: Vec<&str> = response.data.iter().filter_map(|r| r.id.as_deref()).collect();
    assert_eq!(ids, vec!["A1", "A3", "A2"]);

    let by_date = RequestData::with_columns(4).with_order(3, Some(SortDirection::Asc));
    let response = engine::serve(&loaded.table, &by_date).unwrap();
    let ids: Vec<&str> = response.data.iter().filter_map(|r| r.id.as_deref()).collect();
    assert_eq!(ids, vec!["A3", "A2", "A1"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = loader::from_csv(dir.path().join("absent.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, gridserve::GridError::Io(_)));
}
