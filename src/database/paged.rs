use serde::Serialize;
use serde_json::Value;
use sqlx::{
    self,
    postgres::{PgArguments, PgRow},
    FromRow, PgPool, Row,
};
use thiserror::Error;

use crate::pagination::{self, PageQuery, PaginationError};

#[derive(Debug, Error)]
pub enum PagedQueryError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One page of a filtered list: the rows, the total size of the filtered
/// set (ignoring pagination) and the continuation cursor, `null` once the
/// set is exhausted.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: i64,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Execute a `PageQuery`: one fetch for the page rows, one for the filtered
/// count, then derive the next cursor from the last row. Pagination errors
/// (malformed cursor, order mismatch) surface before any query runs;
/// storage failures propagate unchanged.
pub async fn fetch_page<T>(pool: &PgPool, query: &PageQuery) -> Result<Page<T>, PagedQueryError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    let page_sql = query.to_sql()?;
    let mut q = sqlx::query_as::<_, T>(&page_sql.query);
    for p in page_sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    let rows = q.fetch_all(pool).await?;

    let count_sql = query.to_count_sql();
    let mut cq = sqlx::query(&count_sql.query);
    for p in count_sql.params.iter() {
        cq = bind_param_query(cq, p);
    }
    let row = cq.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;

    let next_cursor = pagination::next_cursor(&rows, query.order())?;

    Ok(Page {
        data: rows,
        count,
        next_cursor,
    })
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres doesn't have u64; cast down if safe
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
