//! Inbound grid requests
//!
//! The browser-side grid sends its state either as flat form/query
//! parameters (`order[0][column]=2&order[0][dir]=desc&…`) or as the
//! equivalent JSON document. Both end up as a [`RequestData`].

use crate::error::{GridError, Result};
use crate::order::SortDirection;
use crate::search::SearchSpec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Page length meaning "all rows"
pub const COUNT_ALL: i64 = -1;

/// One requested sort criterion, in table column numbering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrderColumn {
    pub column: usize,
    #[serde(default, deserialize_with = "lenient_direction")]
    pub dir: Option<SortDirection>,
}

/// Client-side view of one column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestColumn {
    #[serde(default, deserialize_with = "string_or_number")]
    pub data: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default = "default_true")]
    pub orderable: bool,
    #[serde(default)]
    pub search: SearchSpec,
}

impl Default for RequestColumn {
    fn default() -> Self {
        RequestColumn {
            data: None,
            name: None,
            searchable: true,
            orderable: true,
            search: SearchSpec::default(),
        }
    }
}

/// A parsed grid request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    /// Correlation token echoed back unchanged
    #[serde(default)]
    pub draw: i64,
    #[serde(default, deserialize_with = "clamped_start")]
    pub start: usize,
    #[serde(default = "default_length")]
    pub length: i64,
    #[serde(default)]
    pub search: SearchSpec,
    #[serde(default)]
    pub order: Vec<RequestOrderColumn>,
    #[serde(default)]
    pub columns: Vec<RequestColumn>,
}

impl Default for RequestData {
    fn default() -> Self {
        RequestData {
            draw: 0,
            start: 0,
            length: COUNT_ALL,
            search: SearchSpec::default(),
            order: Vec::new(),
            columns: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_length() -> i64 {
    COUNT_ALL
}

fn lenient_direction<'de, D>(deserializer: D) -> std::result::Result<Option<SortDirection>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SortDirection::from_name))
}

/// Negative offsets start at the first row, as in the flat parameter form
fn clamped_start<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<i64> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or(0).max(0) as usize)
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_flag(value: Option<&String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_int(value: Option<&String>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

impl RequestData {
    /// A request with `column_count` default columns (searchable, orderable)
    pub fn with_columns(column_count: usize) -> Self {
        RequestData {
            columns: vec![RequestColumn::default(); column_count],
            ..Default::default()
        }
    }

    pub fn with_draw(mut self, draw: i64) -> Self {
        self.draw = draw;
        self
    }

    pub fn with_page(mut self, start: usize, length: i64) -> Self {
        self.start = start;
        self.length = length;
        self
    }

    pub fn with_search(mut self, value: impl Into<String>, regex: bool) -> Self {
        self.search = SearchSpec::new(value, regex);
        self
    }

    pub fn with_order(mut self, column: usize, dir: Option<SortDirection>) -> Self {
        self.order.push(RequestOrderColumn { column, dir });
        self
    }

    /// Set a column's own search box; missing columns are added with defaults
    pub fn with_column_search(mut self, column: usize, value: impl Into<String>, regex: bool) -> Self {
        if self.columns.len() <= column {
            self.columns.resize(column + 1, RequestColumn::default());
        }
        self.columns[column].search = SearchSpec::new(value, regex);
        self
    }

    pub fn with_searchable(mut self, column: usize, searchable: bool) -> Self {
        if self.columns.len() <= column {
            self.columns.resize(column + 1, RequestColumn::default());
        }
        self.columns[column].searchable = searchable;
        self
    }

    /// True if every remaining row was requested
    pub fn show_all_entries(&self) -> bool {
        self.length < 0
    }

    pub fn column(&self, index: usize) -> Option<&RequestColumn> {
        self.columns.get(index)
    }

    /// True if any of the first `column_count` columns is searchable and
    /// has its own search text
    ///
    /// Columns beyond the table's column count never take part in filtering.
    pub fn has_column_specific_search(&self, column_count: usize) -> bool {
        self.columns
            .iter()
            .take(column_count)
            .any(|c| c.searchable && c.search.has_search_text())
    }

    pub fn is_search_active(&self, column_count: usize) -> bool {
        self.search.has_search_text() || self.has_column_specific_search(column_count)
    }

    /// Parse the flat parameter convention of the grid widget
    ///
    /// Indexed groups (`order[i]…`, `columns[i]…`) are read from index 0 up
    /// to the first missing index. `start` is clamped to zero and a missing
    /// or unparseable `length` (the widget sends `""` or `NaN` while
    /// scrolling) means all rows.
    ///
    /// # Errors
    /// * [`GridError::InvalidParameter`] if `draw` is present but not an integer
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let draw = match params.get("draw") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| GridError::invalid_parameter("draw", raw.as_str()))?,
            None => 0,
        };
        let start = parse_int(params.get("start")).unwrap_or(0).max(0) as usize;
        let length = parse_int(params.get("length")).unwrap_or(COUNT_ALL);
        let search = SearchSpec::new(
            params.get("search[value]").cloned().unwrap_or_default(),
            parse_flag(params.get("search[regex]"), false),
        );

        let mut order = Vec::new();
        for index in 0.. {
            let prefix = format!("order[{}]", index);
            let column = params.get(&format!("{}[column]", prefix));
            let dir = params.get(&format!("{}[dir]", prefix));
            if column.is_none() && dir.is_none() {
                break;
            }
            order.push(RequestOrderColumn {
                column: parse_int(column).unwrap_or(0).max(0) as usize,
                dir: dir.and_then(|d| SortDirection::from_name(d)),
            });
        }

        let mut columns = Vec::new();
        for index in 0.. {
            let prefix = format!("columns[{}]", index);
            let key = |suffix: &str| format!("{}{}", prefix, suffix);
            let present = params.keys().any(|k| k.starts_with(&prefix));
            if !present {
                break;
            }
            columns.push(RequestColumn {
                data: params.get(&key("[data]")).cloned(),
                name: params.get(&key("[name]")).cloned(),
                searchable: parse_flag(params.get(&key("[searchable]")), true),
                orderable: parse_flag(params.get(&key("[orderable]")), true),
                search: SearchSpec::new(
                    params.get(&key("[search][value]")).cloned().unwrap_or_default(),
                    parse_flag(params.get(&key("[search][regex]")), true),
                ),
            });
        }

        Ok(RequestData {
            draw,
            start,
            length,
            search,
            order,
            columns,
        })
    }
}
