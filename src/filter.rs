//! Row filtering against global and per-column search terms

use crate::error::Result;
use crate::request::RequestData;
use crate::row::Row;
use crate::search::{Matcher, TermMatches};
use crate::server_data::{FilterType, ServerData};
use std::sync::Arc;

/// Select the rows of `rows` that satisfy the request's search criteria
///
/// Without any search text every row is returned. When at least one
/// searchable column has its own search text, a row is kept as soon as
/// one of its searchable columns matches that column's terms (or the
/// global terms, for columns without their own). Otherwise the global
/// terms are matched across all searchable columns of the row, and the
/// table's [`FilterType`] decides whether all or any of them must match.
///
/// The result keeps the order of `rows`. A table column without a request
/// column entry counts as searchable without a search of its own.
///
/// # Arguments
/// * `rows` - Rows in current table order
/// * `request` - The parsed grid request
/// * `table` - Table supplying locale, filter policy and column count
///
/// # Returns
/// * `Result<Vec<Arc<Row>>>` - The matching rows, or an error if a regex term is invalid
pub fn filter_rows(rows: &[Arc<Row>], request: &RequestData, table: &ServerData) -> Result<Vec<Arc<Row>>> {
    let column_count = table.column_count();
    if request.columns.len() > column_count {
        log::warn!(
            "Ignoring {} request columns beyond the table's {} columns",
            request.columns.len() - column_count,
            column_count
        );
    }
    if !request.is_search_active(column_count) {
        return Ok(rows.to_vec());
    }

    let global = request.search.compile()?;
    let searchable: Vec<bool> = (0..column_count)
        .map(|column| request.column(column).is_none_or(|c| c.searchable))
        .collect();

    let filtered = if request.has_column_specific_search(column_count) {
        if table.filter_type() == FilterType::AllTermsPerRow {
            log::error!(
                "Column specific search combined with filter type {:?}; matching any column instead",
                table.filter_type()
            );
            table.note_policy_deviation();
        }

        let own: Vec<Option<Matcher>> = (0..column_count)
            .map(|column| match request.column(column) {
                Some(c) if c.searchable && c.search.has_search_text() => c.search.compile().map(Some),
                _ => Ok(None),
            })
            .collect::<Result<_>>()?;
        let effective: Vec<Option<&Matcher>> = own
            .iter()
            .zip(&searchable)
            .map(|(matcher, &searchable)| searchable.then(|| matcher.as_ref().unwrap_or(&global)))
            .collect();

        rows.iter()
            .filter(|row| matches_any_column(row, &effective, table))
            .cloned()
            .collect::<Vec<_>>()
    } else {
        let columns: Vec<usize> = (0..column_count).filter(|&c| searchable[c]).collect();
        rows.iter()
            .filter(|row| matches_global(row, &columns, &global, table))
            .cloned()
            .collect::<Vec<_>>()
    };

    log::debug!("Filtered {} rows out of {}", filtered.len(), rows.len());
    Ok(filtered)
}

fn matches_any_column(row: &Row, matchers: &[Option<&Matcher>], table: &ServerData) -> bool {
    matchers.iter().enumerate().any(|(column, matcher)| {
        let (Some(matcher), Some(cell)) = (matcher, row.cell(column)) else {
            return false;
        };
        if matcher.is_empty() {
            return false;
        }
        let mut matches = TermMatches::new(matcher.term_count());
        matcher.match_cell(cell, table.display_locale(), &mut matches);
        !matches.is_empty()
    })
}

fn matches_global(row: &Row, columns: &[usize], global: &Matcher, table: &ServerData) -> bool {
    let mut matches = TermMatches::new(global.term_count());
    for &column in columns {
        let Some(cell) = row.cell(column) else {
            continue;
        };
        global.match_cell(cell, table.display_locale(), &mut matches);
        let done = match table.filter_type() {
            FilterType::AllTermsPerRow => matches.all_set(),
            FilterType::AnyTermPerRow => !matches.is_empty(),
        };
        if done {
            return true;
        }
    }
    false
}
