//! Request execution: sort if needed, filter, page

use crate::error::{GridError, Result};
use crate::filter;
use crate::registry::TableRegistry;
use crate::request::RequestData;
use crate::response::{self, ResponseData};
use crate::server_data::ServerData;

/// Answer a grid request for the table registered under `table_id`
///
/// # Arguments
/// * `registry` - Registry holding the table
/// * `table_id` - Id the table was registered under
/// * `request` - The parsed request
///
/// # Returns
/// * `Result<ResponseData>` - The response page; [`GridError::TableNotFound`] for an unknown id
pub fn handle_request(registry: &TableRegistry, table_id: &str, request: &RequestData) -> Result<ResponseData> {
    log::debug!("Grid request {} for table {}", request.draw, table_id);
    let Some(table) = registry.get(table_id) else {
        log::error!("No such table ID: {}", table_id);
        return Err(GridError::TableNotFound(table_id.to_string()));
    };
    serve(&table, request)
}

/// Answer a grid request against one table
///
/// Rows are re-sorted only if the requested order differs from the
/// current one. Filtering runs on a consistent snapshot under the table's
/// read lock; rendering the page happens after the lock is released.
///
/// An invalid regex search term does not fail the call: the response
/// carries the error message, no rows and the unfiltered total.
pub fn serve(table: &ServerData, request: &RequestData) -> Result<ResponseData> {
    let sort_state = table.sort_state_for(&request.order);
    let (records_total, filtered) = table.query(&sort_state, |rows| {
        (rows.len(), filter::filter_rows(rows, request, table))
    });

    match filtered {
        Ok(filtered) => response::build_page(request, &filtered, records_total),
        Err(err @ GridError::InvalidSearchPattern { .. }) => {
            log::warn!("Rejecting search of request {}: {}", request.draw, err);
            Ok(ResponseData::error_response(
                request.draw,
                records_total,
                err.to_string(),
            ))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::SortDirection;
    use crate::row::RowSpec;

    fn registry() -> TableRegistry {
        let registry = TableRegistry::new();
        let table = ServerData::builder(2)
            .rows((1..=7).map(|i| RowSpec::from_texts([format!("name {}", 8 - i), i.to_string()])))
            .build()
            .unwrap();
        registry.register("people", table);
        registry
    }

    #[test]
    fn test_unknown_table() {
        let err = handle_request(&registry(), "nope", &RequestData::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sorted_page() {
        let registry = registry();
        let request = RequestData::with_columns(2)
            .with_draw(9)
            .with_order(0, Some(SortDirection::Asc))
            .with_page(5, 10);
        let page = handle_request(&registry, "people", &request).unwrap();
        assert_eq!(page.draw, 9);
        assert_eq!(page.records_total, 7);
        assert_eq!(page.records_filtered, 7);
        let names: Vec<&str> = page.data.iter().map(|r| r.cells[0].as_str()).collect();
        assert_eq!(names, vec!["name 6", "name 7"]);
    }

    #[test]
    fn test_invalid_regex_becomes_error_response() {
        let registry = registry();
        let request = RequestData::with_columns(2).with_draw(2).with_search("(", true);
        let page = handle_request(&registry, "people", &request).unwrap();
        assert!(page.is_error());
        assert_eq!(page.records_total, 7);
        assert_eq!(page.records_filtered, 0);
        assert!(page.data.is_empty());
    }
}
