use crate::error::{GridError, Result};
use crate::filter;
use crate::locale::Locale;
use crate::order::{ColumnType, OrderSpec, RowComparator, SortState};
use crate::request::{RequestData, RequestOrderColumn};
use crate::row::{Row, RowSpec};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// How global search terms decide whether a row is shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// Every term must match somewhere in the row
    #[default]
    AllTermsPerRow,
    /// One matching term anywhere in the row is enough
    AnyTermPerRow,
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all-terms-per-row" | "all" => Ok(FilterType::AllTermsPerRow),
            "any-term-per-row" | "any" => Ok(FilterType::AnyTermPerRow),
            other => Err(format!("unknown filter type: {}", other)),
        }
    }
}

/// Everything guarded by the table lock
#[derive(Debug)]
struct TableState {
    rows: Vec<Arc<Row>>,
    sort_state: SortState,
}

/// Server-side state of one rendered grid
///
/// Rows and the current sort state live behind a single read/write lock.
/// Filtering and paging only read; re-sorting is the one exclusive
/// operation and happens at most once per distinct sort state.
#[derive(Debug)]
pub struct ServerData {
    state: RwLock<TableState>,
    columns: Vec<Option<Arc<OrderSpec>>>,
    fallback_spec: Arc<OrderSpec>,
    display_locale: Locale,
    filter_type: FilterType,
    sort_count: AtomicUsize,
    policy_deviations: AtomicUsize,
}

/// Builder materialising a [`ServerData`] from column definitions and rows
#[derive(Debug)]
pub struct TableBuilder {
    column_count: usize,
    locale: Locale,
    filter_type: FilterType,
    column_defs: Vec<(Vec<usize>, OrderSpec)>,
    column_types: Vec<(usize, ColumnType)>,
    rows: Vec<RowSpec>,
}

impl TableBuilder {
    pub fn new(column_count: usize) -> Self {
        TableBuilder {
            column_count,
            locale: Locale::default(),
            filter_type: FilterType::default(),
            column_defs: Vec::new(),
            column_types: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    /// Use `spec` to order every column in `targets`
    pub fn column(mut self, targets: &[usize], spec: OrderSpec) -> Self {
        self.column_defs.push((targets.to_vec(), spec));
        self
    }

    /// Order one column by type, using the table locale
    pub fn column_type(mut self, target: usize, column_type: ColumnType) -> Self {
        self.column_types.push((target, column_type));
        self
    }

    pub fn row(mut self, row: RowSpec) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = RowSpec>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// # Errors
    /// * [`GridError::ColumnTargetOutOfRange`] if a column definition targets a missing column
    /// * [`GridError::ColumnCountMismatch`] if a row has the wrong number of cells
    pub fn build(self) -> Result<ServerData> {
        let column_count = self.column_count;
        let mut columns: Vec<Option<Arc<OrderSpec>>> = vec![None; column_count];

        for (target, column_type) in self.column_types {
            let slot = columns.get_mut(target).ok_or(GridError::ColumnTargetOutOfRange {
                target,
                column_count,
            })?;
            *slot = Some(Arc::new(OrderSpec::new(column_type, self.locale.clone())));
        }
        for (targets, spec) in self.column_defs {
            let spec = Arc::new(spec);
            for target in targets {
                let slot = columns.get_mut(target).ok_or(GridError::ColumnTargetOutOfRange {
                    target,
                    column_count,
                })?;
                *slot = Some(spec.clone());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for spec in self.rows {
            rows.push(Arc::new(Row::new(spec, column_count)?));
        }
        log::debug!(
            "Server-side table with {} rows and a total of {} cells",
            rows.len(),
            rows.len() * column_count
        );

        Ok(ServerData {
            state: RwLock::new(TableState {
                rows,
                sort_state: SortState::default(),
            }),
            columns,
            fallback_spec: Arc::new(OrderSpec::text(self.locale.clone())),
            display_locale: self.locale,
            filter_type: self.filter_type,
            sort_count: AtomicUsize::new(0),
            policy_deviations: AtomicUsize::new(0),
        })
    }
}

impl ServerData {
    pub fn builder(column_count: usize) -> TableBuilder {
        TableBuilder::new(column_count)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn display_locale(&self) -> &Locale {
        &self.display_locale
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Configured comparator of a column, if any
    pub fn column_order_spec(&self, column: usize) -> Option<&OrderSpec> {
        self.columns.get(column).and_then(|spec| spec.as_deref())
    }

    /// Bind a request's ordering to this table's comparators
    pub fn sort_state_for(&self, order: &[RequestOrderColumn]) -> SortState {
        SortState::resolve(&self.columns, &self.fallback_spec, order)
    }

    pub fn sort_state(&self) -> SortState {
        self.state.read().sort_state.clone()
    }

    pub fn has_sort_state(&self, sort_state: &SortState) -> bool {
        self.state.read().sort_state == *sort_state
    }

    /// Number of full re-sorts performed so far
    pub fn sort_count(&self) -> usize {
        self.sort_count.load(AtomicOrdering::Relaxed)
    }

    /// Number of requests that combined column searches with the
    /// all-terms policy and were served with any-column semantics
    pub fn policy_deviation_count(&self) -> usize {
        self.policy_deviations.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn note_policy_deviation(&self) {
        self.policy_deviations.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn sort_locked(&self, state: &mut TableState, sort_state: &SortState) {
        state.sort_state = sort_state.clone();
        RowComparator::new(sort_state).sort(&mut state.rows);
        self.sort_count.fetch_add(1, AtomicOrdering::Relaxed);
        log::debug!("Re-sorted {} rows", state.rows.len());
    }

    /// Re-sort the rows unless `sort_state` is already in effect
    ///
    /// The comparison and the sort happen under one exclusive lock, so
    /// concurrent callers asking for the same new state sort only once.
    /// Returns true if a sort was performed.
    pub fn apply_sort_if_changed(&self, sort_state: &SortState) -> bool {
        if self.has_sort_state(sort_state) {
            return false;
        }
        let mut state = self.state.write();
        if state.sort_state == *sort_state {
            return false;
        }
        self.sort_locked(&mut state, sort_state);
        true
    }

    /// Run `f` on the rows ordered by `sort_state`
    ///
    /// The rows passed to `f` are one consistent snapshot: if a re-sort is
    /// needed it happens under the write lock, which is then downgraded so
    /// `f` still sees exactly the order it asked for.
    pub fn query<R>(&self, sort_state: &SortState, f: impl FnOnce(&[Arc<Row>]) -> R) -> R {
        {
            let state = self.state.read();
            if state.sort_state == *sort_state {
                return f(&state.rows);
            }
        }

        let mut state = self.state.write();
        if state.sort_state != *sort_state {
            self.sort_locked(&mut state, sort_state);
        }
        let state = RwLockWriteGuard::downgrade(state);
        f(&state.rows)
    }

    pub fn row_count(&self) -> usize {
        self.state.read().rows.len()
    }

    /// Visit every row in current order while holding the read lock
    pub fn for_each_row(&self, mut f: impl FnMut(&Arc<Row>)) {
        let state = self.state.read();
        state.rows.iter().for_each(|row| f(row));
    }

    /// Copy of the rows in current order
    pub fn all_rows(&self) -> Vec<Arc<Row>> {
        self.state.read().rows.clone()
    }

    pub fn row_of_id(&self, id: &str) -> Option<Arc<Row>> {
        if id.is_empty() {
            return None;
        }
        self.state
            .read()
            .rows
            .iter()
            .find(|row| row.id() == Some(id))
            .cloned()
    }

    /// Rows matching the request's search criteria, in current order
    ///
    /// # Errors
    /// * [`GridError::InvalidSearchPattern`] if a regex search term does not compile
    pub fn filter_rows(&self, request: &RequestData) -> Result<Vec<Arc<Row>>> {
        let state = self.state.read();
        filter::filter_rows(&state.rows, request, self)
    }
}
