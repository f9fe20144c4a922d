use crate::cell::Cell;
use crate::content::Node;
use crate::error::{GridError, Result};
use std::collections::BTreeMap;

/// Attribute prefix marking row data attributes
pub const DATA_ATTR_PREFIX: &str = "data-";

/// A structural row as supplied by the table renderer
#[derive(Clone, Debug, Default)]
pub struct RowSpec {
    pub id: Option<String>,
    pub class: Option<String>,
    /// Custom attributes in declaration order
    pub attributes: Vec<(String, String)>,
    pub cells: Vec<Vec<Node>>,
}

impl RowSpec {
    pub fn new(cells: Vec<Vec<Node>>) -> Self {
        RowSpec {
            cells,
            ..Default::default()
        }
    }

    /// A row of plain text cells
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| vec![Node::text(t)]).collect())
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// One table row: fixed cells plus optional identity and attributes
///
/// Rows never change after construction; sorting only moves them around
/// inside the owning table.
#[derive(Clone, Debug)]
pub struct Row {
    cells: Vec<Cell>,
    id: Option<String>,
    class: Option<String>,
    data: Option<BTreeMap<String, String>>,
    attrs: Option<BTreeMap<String, String>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Row {
    /// Build a row for a table with `column_count` columns
    ///
    /// Attributes named `data-*` end up in the data map with the prefix
    /// removed, everything else in the attribute map.
    ///
    /// # Errors
    /// * [`GridError::ColumnCountMismatch`] if the cell count differs from `column_count`
    pub fn new(spec: RowSpec, column_count: usize) -> Result<Self> {
        if spec.cells.len() != column_count {
            return Err(GridError::ColumnCountMismatch {
                expected: column_count,
                actual: spec.cells.len(),
            });
        }

        let mut data: Option<BTreeMap<String, String>> = None;
        let mut attrs: Option<BTreeMap<String, String>> = None;
        for (name, value) in spec.attributes {
            match name.strip_prefix(DATA_ATTR_PREFIX) {
                Some("") => {
                    log::warn!("Ignoring row data attribute without a name: {:?}", name);
                }
                Some(key) => {
                    data.get_or_insert_with(BTreeMap::new)
                        .insert(key.to_string(), value);
                }
                None => {
                    attrs.get_or_insert_with(BTreeMap::new).insert(name, value);
                }
            }
        }

        Ok(Row {
            cells: spec.cells.into_iter().map(Cell::create).collect(),
            id: non_empty(spec.id),
            class: non_empty(spec.class),
            data,
            attrs,
        })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn data(&self) -> Option<&BTreeMap<String, String>> {
        self.data.as_ref()
    }

    pub fn attrs(&self) -> Option<&BTreeMap<String, String>> {
        self.attrs.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_partitioning() {
        let spec = RowSpec::from_texts(["a", "b"])
            .with_id("row-1")
            .with_class("odd")
            .with_attribute("data-owner", "alice")
            .with_attribute("title", "First")
            .with_attribute("data-", "nameless");
        let row = Row::new(spec, 2).unwrap();

        assert_eq!(row.id(), Some("row-1"));
        assert_eq!(row.class(), Some("odd"));
        let data = row.data().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("owner").map(String::as_str), Some("alice"));
        let attrs = row.attrs().unwrap();
        assert_eq!(attrs.get("title").map(String::as_str), Some("First"));
        assert_eq!(row.cell(1).map(Cell::text), Some("b"));
    }

    #[test]
    fn test_absent_maps_and_empty_identity() {
        let row = Row::new(RowSpec::from_texts(["x"]).with_id(""), 1).unwrap();
        assert!(row.id().is_none());
        assert!(row.class().is_none());
        assert!(row.data().is_none());
        assert!(row.attrs().is_none());
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = Row::new(RowSpec::from_texts(["a", "b", "c"]), 2).unwrap_err();
        assert!(matches!(
            err,
            GridError::ColumnCountMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }
}
