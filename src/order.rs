//! Column ordering
//!
//! Every table column carries an [`OrderSpec`] decided when the table is
//! built. Requests only say *which* columns to sort by and in which
//! direction; the comparison itself always comes from the table.

use crate::cell::Cell;
use crate::locale::Locale;
use crate::request::RequestOrderColumn;
use crate::row::Row;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc` / `desc` (any case); anything else is no direction
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// How the plain text of a column is turned into a sort key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnType {
    /// Locale-aware, case-insensitive collation
    #[default]
    Text,
    /// Plain code point order
    Raw,
    Int,
    Decimal,
    Date,
    DateTime,
    Time,
    Boolean,
    /// Dotted numeric versions such as `1.10.2`
    Version,
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(ColumnType::Text),
            "raw" => Ok(ColumnType::Raw),
            "int" | "integer" => Ok(ColumnType::Int),
            "decimal" | "double" | "number" => Ok(ColumnType::Decimal),
            "date" => Ok(ColumnType::Date),
            "datetime" | "date-time" => Ok(ColumnType::DateTime),
            "time" => Ok(ColumnType::Time),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            "version" => Ok(ColumnType::Version),
            other => Err(format!("unknown column type: {}", other)),
        }
    }
}

/// Comparable key extracted from a cell's plain text
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text { folded: String, original: String },
    Raw(String),
    Int(i128),
    Decimal(OrderedFloat<f64>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Bool(bool),
    Version(Vec<u64>),
}

/// Missing keys sort before present ones; direction is applied afterwards,
/// so nulls come first ascending and last descending.
fn compare_keys(left: &Option<SortKey>, right: &Option<SortKey>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => l.cmp(r),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" | "x" | "✓" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_version(text: &str) -> Option<Vec<u64>> {
    let text = text.trim().trim_start_matches(['v', 'V']);
    if text.is_empty() {
        return None;
    }
    text.split(['.', '-', '_'])
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

fn parse_date(text: &str, locale: &Locale) -> Option<NaiveDate> {
    locale
        .date_patterns()
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
}

fn parse_time(text: &str, locale: &Locale) -> Option<NaiveTime> {
    locale
        .time_patterns()
        .iter()
        .find_map(|pattern| NaiveTime::parse_from_str(text, pattern).ok())
}

fn parse_date_time(text: &str, locale: &Locale) -> Option<NaiveDateTime> {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed);
    }
    // "<date> <time>" in the locale's conventions
    let (date_part, time_part) = text.split_once(' ')?;
    let date = parse_date(date_part.trim(), locale)?;
    let time = parse_time(time_part.trim(), locale)?;
    Some(date.and_time(time))
}

/// Optional text rewrite applied before key extraction
pub type Formatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Comparator descriptor for one column
///
/// Built once with the table and shared by every request against it.
#[derive(Clone)]
pub struct OrderSpec {
    column_type: ColumnType,
    locale: Locale,
    default_direction: SortDirection,
    formatter: Option<Formatter>,
}

impl fmt::Debug for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSpec")
            .field("column_type", &self.column_type)
            .field("locale", &self.locale)
            .field("default_direction", &self.default_direction)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl OrderSpec {
    pub fn new(column_type: ColumnType, locale: Locale) -> Self {
        OrderSpec {
            column_type,
            locale,
            default_direction: SortDirection::Asc,
            formatter: None,
        }
    }

    /// Natural, locale-aware text ordering
    pub fn text(locale: Locale) -> Self {
        Self::new(ColumnType::Text, locale)
    }

    pub fn with_default_direction(mut self, direction: SortDirection) -> Self {
        self.default_direction = direction;
        self
    }

    pub fn with_formatter(mut self, formatter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn default_direction(&self) -> SortDirection {
        self.default_direction
    }

    /// Extract the sort key of a cell text; `None` means null
    pub fn sort_key(&self, text: &str) -> Option<SortKey> {
        let formatted;
        let text = match &self.formatter {
            Some(formatter) => {
                formatted = formatter(text);
                formatted.as_str()
            }
            None => text,
        };
        let trimmed = text.trim();
        let locale = &self.locale;

        match self.column_type {
            ColumnType::Text => Some(SortKey::Text {
                folded: locale.to_lower(text),
                original: text.to_string(),
            }),
            ColumnType::Raw => Some(SortKey::Raw(text.to_string())),
            ColumnType::Int => locale.parse_integer(trimmed).map(SortKey::Int),
            ColumnType::Decimal => locale
                .parse_decimal(trimmed)
                .map(|v| SortKey::Decimal(OrderedFloat(v))),
            ColumnType::Date => parse_date(trimmed, locale).map(SortKey::Date),
            ColumnType::DateTime => parse_date_time(trimmed, locale).map(SortKey::DateTime),
            ColumnType::Time => parse_time(trimmed, locale).map(SortKey::Time),
            ColumnType::Boolean => parse_bool(trimmed).map(SortKey::Bool),
            ColumnType::Version => parse_version(trimmed).map(SortKey::Version),
        }
    }

    /// Compare two plain texts of this column
    ///
    /// `direction` falls back to the column's default direction.
    pub fn compare(&self, left: &str, right: &str, direction: Option<SortDirection>) -> Ordering {
        let ordering = compare_keys(&self.sort_key(left), &self.sort_key(right));
        direction.unwrap_or(self.default_direction).apply(ordering)
    }
}

/// One sort criterion bound to the table's comparator for that column
#[derive(Clone, Debug)]
pub struct OrderColumn {
    column: usize,
    direction: Option<SortDirection>,
    spec: Arc<OrderSpec>,
}

// The comparator is table configuration, not part of the requested state
impl PartialEq for OrderColumn {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column && self.direction == other.direction
    }
}

impl Eq for OrderColumn {}

impl OrderColumn {
    pub fn new(column: usize, direction: Option<SortDirection>, spec: Arc<OrderSpec>) -> Self {
        OrderColumn {
            column,
            direction,
            spec,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.direction
    }

    pub fn effective_direction(&self) -> SortDirection {
        self.direction.unwrap_or(self.spec.default_direction)
    }

    pub fn spec(&self) -> &OrderSpec {
        &self.spec
    }
}

/// Complete ordering of a table; empty means insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortState {
    columns: Vec<OrderColumn>,
}

impl SortState {
    pub fn new(columns: Vec<OrderColumn>) -> Self {
        SortState { columns }
    }

    /// Bind requested (column, direction) pairs to the table's comparators
    ///
    /// Columns beyond the table are skipped with a warning. Columns without
    /// a configured comparator use `fallback`.
    pub fn resolve(
        columns: &[Option<Arc<OrderSpec>>],
        fallback: &Arc<OrderSpec>,
        requested: &[RequestOrderColumn],
    ) -> Self {
        let mut resolved = Vec::with_capacity(requested.len());
        for order in requested {
            match columns.get(order.column) {
                Some(spec) => {
                    let spec = spec.clone().unwrap_or_else(|| fallback.clone());
                    resolved.push(OrderColumn::new(order.column, order.dir, spec));
                }
                None => log::warn!(
                    "Ignoring order on column {} - table has only {} columns",
                    order.column,
                    columns.len()
                ),
            }
        }
        SortState { columns: resolved }
    }

    pub fn columns(&self) -> &[OrderColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn cell_text(row: &Row, column: usize) -> &str {
    row.cell(column).map(Cell::text).unwrap_or("")
}

/// Total order over rows derived from a [`SortState`]
///
/// The first column decides; later columns only break ties. Rows equal on
/// every column compare equal, so a stable sort keeps their relative order.
pub struct RowComparator<'a> {
    state: &'a SortState,
}

impl<'a> RowComparator<'a> {
    pub fn new(state: &'a SortState) -> Self {
        RowComparator { state }
    }

    pub fn compare(&self, left: &Row, right: &Row) -> Ordering {
        for order in &self.state.columns {
            let ordering = order.spec.compare(
                cell_text(left, order.column),
                cell_text(right, order.column),
                order.direction,
            );
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn keys(&self, row: &Row) -> Vec<Option<SortKey>> {
        self.state
            .columns
            .iter()
            .map(|order| order.spec.sort_key(cell_text(row, order.column)))
            .collect()
    }

    fn compare_key_lists(&self, left: &[Option<SortKey>], right: &[Option<SortKey>]) -> Ordering {
        for (index, order) in self.state.columns.iter().enumerate() {
            let ordering = order
                .effective_direction()
                .apply(compare_keys(&left[index], &right[index]));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort; keys are extracted once per row, not once per comparison
    pub fn sort(&self, rows: &mut Vec<Arc<Row>>) {
        if self.state.is_empty() || rows.len() < 2 {
            return;
        }
        let mut keyed: Vec<(Vec<Option<SortKey>>, Arc<Row>)> = rows
            .drain(..)
            .map(|row| (self.keys(&row), row))
            .collect();
        keyed.sort_by(|(left, _), (right, _)| self.compare_key_lists(left, right));
        rows.extend(keyed.into_iter().map(|(_, row)| row));
    }
}
