// End-to-end cursor pagination over an in-memory dataset. The seek clauses
// produced for SQL are evaluated directly against JSON rows, so the paging
// semantics are exercised without a database.
use serde_json::{json, Value};
use std::cmp::Ordering;

use reelbase::pagination::cursor;
use reelbase::pagination::seek::{build_clauses, SeekClause};
use reelbase::pagination::{next_cursor, OrderSpec, PaginationError, SortDirection};

fn order(entries: &[&str]) -> OrderSpec {
    let raw: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    OrderSpec::parse(&raw).unwrap()
}

fn movie(id: i64, title: &str) -> Value {
    json!({ "id": id, "title": title })
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_i64().unwrap(), y.as_i64().unwrap());
            x.cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => panic!("unexpected value types: {} vs {}", a, b),
    }
}

fn sort_rows(rows: &mut [Value], spec: &OrderSpec) {
    rows.sort_by(|a, b| {
        for term in spec.terms() {
            let (x, y) = (&a[&term.column], &b[&term.column]);
            let ord = match term.direction {
                SortDirection::Asc => cmp_values(x, y),
                SortDirection::Desc => cmp_values(y, x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn row_matches(row: &Value, clauses: &[SeekClause]) -> bool {
    clauses.iter().any(|clause| {
        let prefix_holds = clause
            .equals
            .iter()
            .all(|(column, value)| &row[column] == value);
        let strict_holds = match clause.direction {
            SortDirection::Asc => cmp_values(&row[&clause.column], &clause.value) == Ordering::Greater,
            SortDirection::Desc => cmp_values(&row[&clause.column], &clause.value) == Ordering::Less,
        };
        prefix_holds && strict_holds
    })
}

#[derive(Debug)]
struct PageResult {
    data: Vec<Value>,
    next_cursor: Option<String>,
}

/// Fetch one page the way the paged query executes: apply the seek predicate
/// of the decoded cursor, take the first `take` rows of the sorted set and
/// derive the continuation cursor from the last returned row.
fn fetch_page(
    dataset: &[Value],
    spec: &OrderSpec,
    take: usize,
    cursor_token: Option<&str>,
) -> Result<PageResult, PaginationError> {
    let mut rows: Vec<Value> = dataset.to_vec();
    sort_rows(&mut rows, spec);

    if let Some(token) = cursor_token {
        let payload = cursor::decode(token)?;
        if payload.order != spec.to_entries() {
            return Err(PaginationError::CursorOrderMismatch {
                cursor_order: payload.order.join(", "),
                request_order: spec.to_entries().join(", "),
            });
        }
        let clauses = build_clauses(spec, &payload.values)?;
        rows.retain(|row| row_matches(row, &clauses));
    }

    rows.truncate(take);
    let next = next_cursor(&rows, spec)?;
    Ok(PageResult {
        data: rows,
        next_cursor: next,
    })
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn fifteen_movies() -> Vec<Value> {
    (1..=15).map(|id| movie(id, &format!("Movie {:02}", id))).collect()
}

#[test]
fn first_two_pages_descend_through_the_dataset() {
    let dataset = fifteen_movies();
    let spec = order(&["id_DESC"]);

    let page1 = fetch_page(&dataset, &spec, 5, None).unwrap();
    assert_eq!(ids(&page1.data), vec![15, 14, 13, 12, 11]);

    let token = page1.next_cursor.expect("non-empty page must yield a cursor");
    let payload = cursor::decode(&token).unwrap();
    assert_eq!(payload.values.get("id"), Some(&json!(11)));
    assert_eq!(payload.order, vec!["id_DESC"]);

    let page2 = fetch_page(&dataset, &spec, 5, Some(&token)).unwrap();
    assert_eq!(ids(&page2.data), vec![10, 9, 8, 7, 6]);
}

#[test]
fn empty_dataset_yields_empty_page_and_no_cursor() {
    let spec = order(&["id_DESC"]);
    let page = fetch_page(&[], &spec, 5, None).unwrap();
    assert!(page.data.is_empty());
    assert!(page.next_cursor.is_none());
}

#[test]
fn walking_all_pages_visits_every_row_exactly_once() {
    let dataset = fifteen_movies();
    let spec = order(&["id_DESC"]);

    let mut seen: Vec<i64> = vec![];
    let mut token: Option<String> = None;
    let mut pages = 0;

    loop {
        let page = fetch_page(&dataset, &spec, 4, token.as_deref()).unwrap();
        if page.data.is_empty() {
            assert!(page.next_cursor.is_none());
            break;
        }
        seen.extend(ids(&page.data));
        token = page.next_cursor;
        pages += 1;
        assert!(pages <= 5, "pagination must terminate");
    }

    assert_eq!(seen, (1..=15).rev().collect::<Vec<i64>>());
}

#[test]
fn replaying_a_cursor_returns_the_same_page() {
    let dataset = fifteen_movies();
    let spec = order(&["id_DESC"]);

    let first = fetch_page(&dataset, &spec, 5, None).unwrap();
    let token = first.next_cursor.unwrap();

    let a = fetch_page(&dataset, &spec, 5, Some(&token)).unwrap();
    let b = fetch_page(&dataset, &spec, 5, Some(&token)).unwrap();
    assert_eq!(ids(&a.data), ids(&b.data));
}

#[test]
fn composite_order_breaks_title_ties_deterministically() {
    let dataset = vec![
        movie(1, "Alien"),
        movie(2, "Alien"),
        movie(3, "Alien"),
        movie(4, "Brazil"),
        movie(5, "Brazil"),
        movie(6, "Casino"),
    ];
    let spec = order(&["title_ASC", "id_DESC"]);

    let page1 = fetch_page(&dataset, &spec, 2, None).unwrap();
    assert_eq!(ids(&page1.data), vec![3, 2]);

    let page2 = fetch_page(&dataset, &spec, 2, Some(&page1.next_cursor.unwrap())).unwrap();
    assert_eq!(ids(&page2.data), vec![1, 5]);

    let page3 = fetch_page(&dataset, &spec, 2, Some(&page2.next_cursor.unwrap())).unwrap();
    assert_eq!(ids(&page3.data), vec![4, 6]);

    let page4 = fetch_page(&dataset, &spec, 2, Some(&page3.next_cursor.unwrap())).unwrap();
    assert!(page4.data.is_empty());
    assert!(page4.next_cursor.is_none());
}

#[test]
fn cursor_with_different_order_is_rejected() {
    let dataset = fifteen_movies();
    let first = fetch_page(&dataset, &order(&["title_ASC"]), 5, None).unwrap();
    let token = first.next_cursor.unwrap();

    let err = fetch_page(&dataset, &order(&["id_DESC"]), 5, Some(&token)).unwrap_err();
    assert!(matches!(err, PaginationError::CursorOrderMismatch { .. }));
}

#[test]
fn garbage_cursor_is_rejected_as_malformed() {
    let dataset = fifteen_movies();
    let err = fetch_page(&dataset, &order(&["id_DESC"]), 5, Some("!!!not-a-cursor!!!")).unwrap_err();
    assert!(matches!(err, PaginationError::MalformedCursor(_)));
}
