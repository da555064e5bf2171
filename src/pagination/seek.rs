use serde_json::{Map, Value};

use super::error::PaginationError;
use super::order::{OrderSpec, SortDirection};

/// One disjunct of the seek predicate: equality on a prefix of the order
/// columns plus a strict comparison on the next column.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekClause {
    pub equals: Vec<(String, Value)>,
    pub column: String,
    pub direction: SortDirection,
    pub value: Value,
}

/// Build the "strictly after the cursor row" predicate for a composite
/// lexicographic order. For order terms (c1,d1)..(cn,dn), clause i fixes
/// c1..ci by equality and applies the strict comparator of d(i+1) on c(i+1);
/// the OR of all n clauses selects exactly the rows after the cursor row.
/// With a single order column this degenerates to one strict inequality.
pub fn build_clauses(
    order: &OrderSpec,
    values: &Map<String, Value>,
) -> Result<Vec<SeekClause>, PaginationError> {
    let terms = order.terms();
    let mut clauses = Vec::with_capacity(terms.len());

    for (i, term) in terms.iter().enumerate() {
        let value = cursor_value(values, &term.column)?;

        let mut equals = Vec::with_capacity(i);
        for prev in &terms[..i] {
            equals.push((prev.column.clone(), cursor_value(values, &prev.column)?));
        }

        clauses.push(SeekClause {
            equals,
            column: term.column.clone(),
            direction: term.direction,
            value,
        });
    }

    Ok(clauses)
}

/// Render the clauses as a parenthesized SQL disjunction with positional
/// `$n` placeholders starting after `starting_param_index` existing params.
/// Returns the SQL fragment and the bind values in placeholder order.
pub fn to_sql(clauses: &[SeekClause], starting_param_index: usize) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut param_index = starting_param_index;
    let mut disjuncts = Vec::with_capacity(clauses.len());

    for clause in clauses {
        let mut conditions = Vec::with_capacity(clause.equals.len() + 1);
        for (column, value) in &clause.equals {
            params.push(value.clone());
            param_index += 1;
            conditions.push(format!("\"{}\" = ${}", column, param_index));
        }
        params.push(clause.value.clone());
        param_index += 1;
        conditions.push(format!(
            "\"{}\" {} ${}",
            clause.column,
            clause.direction.seek_comparator(),
            param_index
        ));
        disjuncts.push(format!("({})", conditions.join(" AND ")));
    }

    (format!("({})", disjuncts.join(" OR ")), params)
}

fn cursor_value(values: &Map<String, Value>, column: &str) -> Result<Value, PaginationError> {
    values.get(column).cloned().ok_or_else(|| {
        PaginationError::MalformedCursor(format!("cursor has no value for column: {}", column))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(entries: &[&str]) -> OrderSpec {
        let raw: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        OrderSpec::parse(&raw).unwrap()
    }

    fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn single_column_is_one_strict_inequality() {
        let clauses = build_clauses(&order(&["id_DESC"]), &values(&[("id", json!(11))])).unwrap();
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].equals.is_empty());
        assert_eq!(clauses[0].column, "id");
        assert_eq!(clauses[0].value, json!(11));

        let (sql, params) = to_sql(&clauses, 0);
        assert_eq!(sql, "((\"id\" < $1))");
        assert_eq!(params, vec![json!(11)]);
    }

    #[test]
    fn composite_order_builds_prefix_equality_clauses() {
        let spec = order(&["title_ASC", "id_DESC"]);
        let vals = values(&[("title", json!("Alien")), ("id", json!(7))]);
        let clauses = build_clauses(&spec, &vals).unwrap();

        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].equals.is_empty());
        assert_eq!(clauses[1].equals, vec![("title".to_string(), json!("Alien"))]);

        let (sql, params) = to_sql(&clauses, 0);
        assert_eq!(
            sql,
            "((\"title\" > $1) OR (\"title\" = $2 AND \"id\" < $3))"
        );
        assert_eq!(params, vec![json!("Alien"), json!("Alien"), json!(7)]);
    }

    #[test]
    fn placeholder_numbering_continues_after_existing_params() {
        let clauses = build_clauses(&order(&["id_ASC"]), &values(&[("id", json!(3))])).unwrap();
        let (sql, params) = to_sql(&clauses, 2);
        assert_eq!(sql, "((\"id\" > $3))");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn missing_cursor_value_is_malformed() {
        let spec = order(&["title_ASC", "id_DESC"]);
        let err = build_clauses(&spec, &values(&[("title", json!("Alien"))])).unwrap_err();
        assert!(matches!(err, PaginationError::MalformedCursor(_)));
    }
}
