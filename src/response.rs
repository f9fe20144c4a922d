//! Outbound page of a grid response

use crate::content::SideArtifacts;
use crate::error::Result;
use crate::request::RequestData;
use crate::row::Row;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One row of a response page
///
/// Serialised as an object with the cell markup under the keys `"0"`,
/// `"1"`, ... followed by the optional `DT_Row*` entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseRow {
    pub cells: Vec<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
    pub attr: Option<BTreeMap<String, String>>,
}

impl ResponseRow {
    /// Render a row, merging the side artifacts of its cells into `side`
    pub fn from_row(row: &Row, side: &mut SideArtifacts) -> Result<Self> {
        let mut cells = Vec::with_capacity(row.cell_count());
        for cell in row.cells() {
            cells.push(cell.markup()?.to_string());
            side.merge(cell.side_artifacts()?);
        }
        Ok(ResponseRow {
            cells,
            id: row.id().map(str::to_string),
            class: row.class().map(str::to_string),
            data: row.data().cloned(),
            attr: row.attrs().cloned(),
        })
    }
}

impl Serialize for ResponseRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (index, markup) in self.cells.iter().enumerate() {
            map.serialize_entry(&index.to_string(), markup)?;
        }
        if let Some(id) = &self.id {
            map.serialize_entry("DT_RowId", id)?;
        }
        if let Some(class) = &self.class {
            map.serialize_entry("DT_RowClass", class)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("DT_RowData", data)?;
        }
        if let Some(attr) = &self.attr {
            map.serialize_entry("DT_RowAttr", attr)?;
        }
        map.end()
    }
}

/// Response to one grid request
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Echo of the request's draw token
    pub draw: i64,
    /// Rows in the table before filtering
    pub records_total: usize,
    /// Rows left after filtering
    pub records_filtered: usize,
    pub data: Vec<ResponseRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub side: SideArtifacts,
}

impl ResponseData {
    /// A response carrying an error message and no rows
    pub fn error_response(draw: i64, records_total: usize, message: impl Into<String>) -> Self {
        ResponseData {
            draw,
            records_total,
            records_filtered: 0,
            data: Vec::new(),
            error: Some(message.into()),
            side: SideArtifacts::default(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Cut the requested page out of `filtered` and render it
///
/// `start` past the end yields an empty page and a negative length means
/// every row from `start` on.
///
/// # Arguments
/// * `request` - Request supplying draw token, start and length
/// * `filtered` - Matching rows in display order
/// * `records_total` - Row count of the unfiltered table
///
/// # Returns
/// * `Result<ResponseData>` - The page, or a content error if a cell cannot be rendered
pub fn build_page(request: &RequestData, filtered: &[Arc<Row>], records_total: usize) -> Result<ResponseData> {
    let start = request.start.min(filtered.len());
    let end = if request.show_all_entries() {
        filtered.len()
    } else {
        let length = usize::try_from(request.length).unwrap_or(usize::MAX);
        start.saturating_add(length).min(filtered.len())
    };

    let mut side = SideArtifacts::new();
    let data = filtered[start..end]
        .iter()
        .map(|row| ResponseRow::from_row(row, &mut side))
        .collect::<Result<Vec<_>>>()?;

    Ok(ResponseData {
        draw: request.draw,
        records_total,
        records_filtered: filtered.len(),
        data,
        error: None,
        side,
    })
}
