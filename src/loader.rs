use crate::error::Result;
use crate::locale::Locale;
use crate::order::ColumnType;
use crate::row::RowSpec;
use crate::server_data::{FilterType, ServerData};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How a CSV file is turned into a table
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Treat the first record as column names
    pub has_headers: bool,
    pub delimiter: u8,
    /// Ordering type per column; columns beyond the list order as text
    pub column_types: Vec<ColumnType>,
    pub locale: Locale,
    pub filter_type: FilterType,
    /// Column whose value becomes the row id
    pub id_column: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            has_headers: true,
            delimiter: b',',
            column_types: Vec::new(),
            locale: Locale::default(),
            filter_type: FilterType::default(),
            id_column: None,
        }
    }
}

/// A table read from CSV together with its column names
#[derive(Debug)]
pub struct LoadedTable {
    /// Column names; empty when the input has no header row
    pub headers: Vec<String>,
    pub table: ServerData,
}

/// Load a table from a CSV file
///
/// Every record becomes a row of plain text cells.
///
/// # Arguments
/// * `path` - Path to the CSV file to load
/// * `options` - Header, typing and locale settings
///
/// # Returns
/// * `Result<LoadedTable>` - The loaded table or an error
///
/// # Examples
/// ```no_run
/// use gridserve::loader::{from_csv, LoadOptions};
///
/// match from_csv("data.csv", &LoadOptions::default()) {
///     Ok(loaded) => println!("Loaded {} rows", loaded.table.row_count()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedTable> {
    let file = File::open(path)?;
    from_reader(file, options)
}

/// Load a table from any CSV source
///
/// All records must have the same number of fields. The column count is
/// taken from the header row, or from the first record without one.
pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<LoadedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(options.delimiter)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = if options.has_headers {
        csv_reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut spec = RowSpec::from_texts(record.iter());
        if let Some(id) = options.id_column.and_then(|column| record.get(column)) {
            spec = spec.with_id(id);
        }
        rows.push(spec);
    }

    let column_count = if options.has_headers {
        headers.len()
    } else {
        rows.first().map_or(0, |row| row.cells.len())
    };

    let mut builder = ServerData::builder(column_count)
        .locale(options.locale.clone())
        .filter_type(options.filter_type);
    for (column, column_type) in options.column_types.iter().enumerate().take(column_count) {
        builder = builder.column_type(column, *column_type);
    }
    if options.column_types.len() > column_count {
        log::warn!(
            "Ignoring {} column types beyond the {} columns of the input",
            options.column_types.len() - column_count,
            column_count
        );
    }

    let table = builder.rows(rows).build()?;
    Ok(LoadedTable { headers, table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;

    #[test]
    fn test_from_reader_with_headers() {
        let input = "id,name,price\n1,\"Apple, red\",1.50\n2,Pear,0.75\n";
        let options = LoadOptions {
            column_types: vec![ColumnType::Int, ColumnType::Text, ColumnType::Decimal],
            id_column: Some(0),
            ..Default::default()
        };
        let loaded = from_reader(input.as_bytes(), &options).unwrap();
        assert_eq!(loaded.headers, vec!["id", "name", "price"]);
        assert_eq!(loaded.table.row_count(), 2);
        assert_eq!(loaded.table.column_count(), 3);
        let apple = loaded.table.row_of_id("1").unwrap();
        assert_eq!(apple.cells()[1].text(), "Apple, red");
        assert_eq!(
            loaded.table.column_order_spec(2).map(|s| s.column_type()),
            Some(ColumnType::Decimal)
        );
    }

    #[test]
    fn test_from_reader_without_headers() {
        let options = LoadOptions {
            has_headers: false,
            delimiter: b';',
            ..Default::default()
        };
        let loaded = from_reader("a;b\nc;d\n".as_bytes(), &options).unwrap();
        assert!(loaded.headers.is_empty());
        assert_eq!(loaded.table.row_count(), 2);
        assert_eq!(loaded.table.column_count(), 2);
    }

    #[test]
    fn test_ragged_input_is_rejected() {
        let err = from_reader("a,b\n1,2\n3\n".as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, GridError::Csv(_)));
    }
}
