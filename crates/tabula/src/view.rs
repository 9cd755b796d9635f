//! Table view state: filter, sort, pagination, column selection.
//!
//! [`TabularViewModel`] holds everything the row grid needs between
//! fetches. The server does the actual filtering/sorting/paging; this type
//! validates filter input against the schema, normalises it into wire
//! terms, clamps the page after data shrinks, and mirrors the sort
//! comparator locally for in-memory row slices.

use crate::paging::display_sl_no;
use std::cmp::Ordering;
use tabula_client::{
    ExportFormat, ExportRequest, RemoteError, Row, RowQuery, RowStore, SortDirection, WireFilter,
};
use tabula_schema::{dates, CellValue, FieldType, SchemaSnapshot, ValidationError, SERIAL_COLUMN};

/// Raw filter input as the presentation layer collects it. Empty range ends
/// mean an open end.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Value(String),
    Range { min: String, max: String },
    Dates { from: String, to: String },
}

/// The active, validated filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterState {
    #[default]
    None,
    Active {
        field: String,
        filter: WireFilter,
    },
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        !matches!(self, FilterState::None)
    }

    fn to_wire(&self) -> Option<WireFilter> {
        match self {
            FilterState::None => None,
            FilterState::Active { filter, .. } => Some(filter.clone()),
        }
    }
}

/// The active sort. Defaults to the serial column ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SERIAL_COLUMN.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// View state for the paginated contract grid.
#[derive(Debug, Clone)]
pub struct TabularViewModel {
    schema: SchemaSnapshot,
    selected: Vec<String>,
    filter: FilterState,
    sort: SortState,
    page: u32,
    page_size: u32,
    total_pages: u32,
    rows: Vec<Row>,
}

impl TabularViewModel {
    pub fn new(page_size: u32) -> Self {
        Self {
            schema: SchemaSnapshot::default(),
            selected: Vec::new(),
            filter: FilterState::None,
            sort: SortState::default(),
            page: 1,
            page_size: page_size.max(1),
            total_pages: 1,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Adopt a freshly fetched schema (after a reconciler commit, or from
    /// row-page metadata). Stale selections are dropped; an empty selection
    /// falls back to every column. A filter or sort over a column that no
    /// longer exists is cleared.
    pub fn sync_schema(&mut self, schema: SchemaSnapshot) {
        self.schema = schema;
        self.selected.retain(|name| self.schema.by_name(name).is_some());
        if self.selected.is_empty() {
            self.selected = self.schema.names().iter().map(|n| n.to_string()).collect();
        }
        if let FilterState::Active { field, .. } = &self.filter {
            if self.schema.by_name(field).is_none() {
                self.filter = FilterState::None;
            }
        }
        if self.schema.by_name(&self.sort.field).is_none() {
            self.sort = SortState::default();
        }
    }

    // ---- Filtering -------------------------------------------------------

    /// Validate raw filter input against the field's declared type and
    /// activate it. Any filter change snaps back to page 1.
    ///
    /// Shape rules: text fields take a substring, numeric fields a range
    /// with optional ends, date fields a closed dd-mm-yyyy range. Clearing
    /// the input (empty substring, both range ends blank) drops the filter.
    /// An inverted range is accepted and simply matches nothing.
    pub fn apply_filter(&mut self, field: &str, input: FilterInput) -> Result<(), ValidationError> {
        let field_type = self
            .schema
            .field_type_of(field)
            .ok_or_else(|| ValidationError::UnknownColumn(field.to_string()))?;

        let filter = match (field_type, input) {
            (FieldType::Text, FilterInput::Value(value)) => {
                let value = value.trim().to_string();
                if value.is_empty() {
                    self.filter = FilterState::None;
                    self.page = 1;
                    return Ok(());
                }
                WireFilter::Value { field: field.to_string(), value }
            }
            (FieldType::Numeric, FilterInput::Range { min, max }) => {
                let min = parse_range_end(&min)?;
                let max = parse_range_end(&max)?;
                if min.is_none() && max.is_none() {
                    self.filter = FilterState::None;
                    self.page = 1;
                    return Ok(());
                }
                WireFilter::Range { field: field.to_string(), min, max }
            }
            (FieldType::Date, FilterInput::Dates { from, to }) => {
                let from = dates::parse_ui(from.trim())?;
                let to = dates::parse_ui(to.trim())?;
                WireFilter::Dates { field: field.to_string(), from, to }
            }
            _ => return Err(ValidationError::FilterMismatch(field.to_string())),
        };

        self.filter = FilterState::Active { field: field.to_string(), filter };
        self.page = 1;
        Ok(())
    }

    /// Drop the filter and return to the unfiltered first page with the
    /// default sort.
    pub fn clear_filter(&mut self) {
        self.filter = FilterState::None;
        self.sort = SortState::default();
        self.page = 1;
    }

    // ---- Sorting ---------------------------------------------------------

    /// Text columns do not sort; the serial column does despite being
    /// system-owned.
    pub fn is_sortable(&self, field: &str) -> bool {
        match self.schema.by_name(field) {
            Some(col) => col.system || col.field_type != FieldType::Text,
            None => false,
        }
    }

    /// Activate or toggle the sort on a column. Requests against
    /// non-sortable columns are ignored, leaving the current state intact.
    pub fn set_sort(&mut self, field: &str) {
        if !self.is_sortable(field) {
            return;
        }
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.toggled();
        } else {
            self.sort = SortState { field: field.to_string(), direction: SortDirection::Asc };
        }
    }

    /// Comparator matching the server's ordering, for rows already in
    /// memory. Nulls stay last regardless of direction.
    pub fn compare_rows(&self, a: &Row, b: &Row) -> Ordering {
        let field_type = self
            .schema
            .field_type_of(&self.sort.field)
            .unwrap_or(FieldType::Text);
        let va = cell(a, &self.sort.field, field_type);
        let vb = cell(b, &self.sort.field, field_type);

        match (va.is_null(), vb.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = va.cmp_ascending(&vb);
                match self.sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    }

    pub fn sort_rows(&self, rows: &mut [Row]) {
        rows.sort_by(|a, b| self.compare_rows(a, b));
    }

    // ---- Column selection ------------------------------------------------

    /// Columns currently shown, in schema order.
    pub fn visible_columns(&self) -> Vec<&str> {
        self.schema
            .names()
            .into_iter()
            .filter(|name| self.selected.iter().any(|s| s == name))
            .collect()
    }

    pub fn selected_fields(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.selected.iter().any(|s| s == field)
    }

    /// Toggle a column in or out of the visible set. Deselecting the last
    /// column is refused so the grid never goes blank.
    pub fn toggle_selected(&mut self, field: &str) {
        if self.schema.by_name(field).is_none() {
            return;
        }
        if let Some(pos) = self.selected.iter().position(|s| s == field) {
            if self.selected.len() > 1 {
                self.selected.remove(pos);
            }
        } else {
            self.selected.push(field.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.schema.names().iter().map(|n| n.to_string()).collect();
    }

    // ---- Pagination and data ---------------------------------------------

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Take a row out of the current page (optimistic delete).
    pub(crate) fn remove_row(&mut self, index: usize) -> Option<Row> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    /// Put a removed row back at its former index (delete rollback).
    pub(crate) fn restore_row(&mut self, index: usize, row: Row) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
    }

    #[cfg(test)]
    pub(crate) fn set_rows_for_tests(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Serial number of the row at `index` on the current page.
    pub fn row_serial(&self, index: usize) -> u64 {
        display_sl_no(self.page, self.page_size, index)
    }

    /// Interpret one cell of a row through the schema's declared type.
    pub fn cell(&self, row: &Row, column: &str) -> CellValue {
        let field_type = self.schema.field_type_of(column).unwrap_or(FieldType::Text);
        cell(row, column, field_type)
    }

    /// The wire query for the current view state.
    pub fn row_query(&self) -> RowQuery {
        RowQuery {
            page: self.page,
            limit: self.page_size,
            sort_field: self.sort.field.clone(),
            sort_direction: self.sort.direction,
            filter: self.filter.to_wire(),
        }
    }

    /// The export query for the current view state: same filter and sort,
    /// restricted to the selected columns.
    pub fn export_request(&self, format: ExportFormat) -> ExportRequest {
        ExportRequest {
            format,
            sort_field: self.sort.field.clone(),
            sort_direction: self.sort.direction,
            selected_fields: self.visible_columns().iter().map(|s| s.to_string()).collect(),
            filter: self.filter.to_wire(),
        }
    }

    /// Fetch the current page from the store.
    ///
    /// If the page index has run past the end (rows deleted, filter
    /// narrowed), clamp to the last page and refetch once. Schema metadata
    /// on the response is adopted when present.
    pub async fn load_page(&mut self, store: &impl RowStore) -> Result<(), RemoteError> {
        let mut page = store.fetch_rows(&self.row_query()).await?;

        let last = page.total_pages.max(1);
        if page.data.is_empty() && self.page > last {
            tracing::debug!(requested = self.page, last, "page out of range, clamping");
            self.page = last;
            page = store.fetch_rows(&self.row_query()).await?;
        }

        if page.has_metadata() {
            let schema = SchemaSnapshot::new(
                page.headers
                    .iter()
                    .map(|name| {
                        tabula_schema::ColumnSchema::remote(
                            name.clone(),
                            name.clone(),
                            page.field_types.classify(name),
                        )
                    })
                    .collect(),
            );
            self.sync_schema(schema);
        }

        self.total_pages = page.total_pages.max(1);
        self.rows = page.data;
        Ok(())
    }
}

fn cell(row: &Row, column: &str, field_type: FieldType) -> CellValue {
    match row.get(column) {
        Some(raw) => CellValue::from_raw(raw, field_type),
        None => CellValue::Null,
    }
}

fn parse_range_end(raw: &str) -> Result<Option<f64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::BadNumber(raw.to_string()))
}
