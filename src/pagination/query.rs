use serde::Serialize;
use serde_json::{Map, Value};

use super::cursor;
use super::error::PaginationError;
use super::order::OrderSpec;
use super::seek;

/// A rendered query: SQL text plus bind values in `$n` order.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Intermediate representation of one paginated list query: a row source,
/// an optional caller filter, the ordering, the page size and an optional
/// continuation cursor. Built once per request and rendered by a single
/// `to_sql`/`to_count_sql` call; nothing here touches the database.
#[derive(Debug)]
pub struct PageQuery {
    source: String,
    base_where: Option<String>,
    base_params: Vec<Value>,
    order: OrderSpec,
    take: i64,
    cursor: Option<String>,
}

impl PageQuery {
    pub fn new(source: impl Into<String>, order: OrderSpec) -> Self {
        Self {
            source: source.into(),
            base_where: None,
            base_params: vec![],
            order,
            take: 20,
            cursor: None,
        }
    }

    /// AND-combined caller filter. `sql` numbers its placeholders from `$1`
    /// over `params`; seek placeholders continue after them.
    pub fn filter(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.base_where = Some(sql.into());
        self.base_params = params;
        self
    }

    pub fn take(mut self, take: i64) -> Result<Self, PaginationError> {
        if take <= 0 {
            return Err(PaginationError::InvalidTake(format!(
                "take must be positive, got: {}",
                take
            )));
        }
        self.take = take;
        Ok(self)
    }

    pub fn cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    /// Render the page query. Decodes the cursor if present, requires its
    /// embedded order to equal the request order, and ANDs the seek
    /// predicate with the caller filter.
    pub fn to_sql(&self) -> Result<SqlResult, PaginationError> {
        let mut conditions: Vec<String> = vec![];
        let mut params = self.base_params.clone();

        if let Some(where_sql) = &self.base_where {
            conditions.push(format!("({})", where_sql));
        }

        if let Some(raw) = &self.cursor {
            let payload = cursor::decode(raw)?;
            if payload.order != self.order.to_entries() {
                return Err(PaginationError::CursorOrderMismatch {
                    cursor_order: payload.order.join(", "),
                    request_order: self.order.to_entries().join(", "),
                });
            }

            let clauses = seek::build_clauses(&self.order, &payload.values)?;
            let (seek_sql, seek_params) = seek::to_sql(&clauses, params.len());
            conditions.push(seek_sql);
            params.extend(seek_params);
        }

        let query = [
            format!("SELECT * FROM {}", self.source),
            if conditions.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", conditions.join(" AND "))
            },
            self.order.to_sql(),
            format!("LIMIT {}", self.take),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// Count of the whole filtered set: the cursor range predicate and the
    /// limit are deliberately ignored so `count` communicates the overall
    /// result-set size, not the current page.
    pub fn to_count_sql(&self) -> SqlResult {
        let query = match &self.base_where {
            Some(where_sql) => format!(
                "SELECT COUNT(*) as count FROM {} WHERE {}",
                self.source, where_sql
            ),
            None => format!("SELECT COUNT(*) as count FROM {}", self.source),
        };
        SqlResult {
            query,
            params: self.base_params.clone(),
        }
    }
}

/// Derive the continuation cursor from a fetched page: project the order
/// columns out of the last row and encode them. An empty page has no row to
/// resume from, so it yields no cursor.
pub fn next_cursor<T: Serialize>(
    rows: &[T],
    order: &OrderSpec,
) -> Result<Option<String>, PaginationError> {
    let last = match rows.last() {
        Some(row) => row,
        None => return Ok(None),
    };

    let row = serde_json::to_value(last)?;
    let row = row.as_object().ok_or_else(|| {
        PaginationError::InvalidColumn("row did not serialize to an object".to_string())
    })?;

    let mut values = Map::new();
    for column in order.columns() {
        let value = row.get(column).cloned().ok_or_else(|| {
            PaginationError::InvalidColumn(format!("row has no column: {}", column))
        })?;
        values.insert(column.to_string(), value);
    }

    cursor::encode(values, order).map(Some)
}
