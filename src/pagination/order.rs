use serde::{Deserialize, Serialize};

use super::error::PaginationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Comparator used to select rows strictly after a cursor row.
    pub fn seek_comparator(&self) -> &'static str {
        match self {
            SortDirection::Asc => ">",
            SortDirection::Desc => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderTerm {
    /// Wire form, e.g. "created_at_DESC".
    pub fn to_entry(&self) -> String {
        format!("{}_{}", self.column, self.direction.to_sql())
    }
}

/// Validated, non-empty ordering used both for output order and as the
/// pagination resume key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    /// Parse `"column_DIRECTION"` entries. The direction suffix is taken
    /// after the last underscore so column names may themselves contain
    /// underscores (`created_at_DESC` -> `created_at` + `DESC`).
    pub fn parse(entries: &[String]) -> Result<Self, PaginationError> {
        if entries.is_empty() {
            return Err(PaginationError::InvalidOrderSpec(
                "order must contain at least one column".to_string(),
            ));
        }

        let mut terms = Vec::with_capacity(entries.len());
        for entry in entries {
            let (column, direction) = entry.rsplit_once('_').ok_or_else(|| {
                PaginationError::InvalidOrderSpec(format!(
                    "order entry must be <column>_<ASC|DESC>, got: {}",
                    entry
                ))
            })?;

            let direction = match direction {
                "ASC" => SortDirection::Asc,
                "DESC" => SortDirection::Desc,
                other => {
                    return Err(PaginationError::InvalidOrderDirection(format!(
                        "order direction must be ASC or DESC, got: {}",
                        other
                    )))
                }
            };

            Self::validate_column(column)?;
            terms.push(OrderTerm {
                column: column.to_string(),
                direction,
            });
        }

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.column.as_str())
    }

    /// Wire form carried inside cursors, e.g. `["id_DESC"]`.
    pub fn to_entries(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.to_entry()).collect()
    }

    pub fn to_sql(&self) -> String {
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("\"{}\" {}", t.column, t.direction.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    fn validate_column(column: &str) -> Result<(), PaginationError> {
        let mut chars = column.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            return Err(PaginationError::InvalidColumn(format!(
                "invalid column name format: {}",
                column
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_single_column() {
        let spec = OrderSpec::parse(&entries(&["id_DESC"])).unwrap();
        assert_eq!(spec.terms().len(), 1);
        assert_eq!(spec.terms()[0].column, "id");
        assert_eq!(spec.terms()[0].direction, SortDirection::Desc);
    }

    #[test]
    fn parses_column_containing_underscores() {
        let spec = OrderSpec::parse(&entries(&["created_at_DESC", "id_ASC"])).unwrap();
        assert_eq!(spec.terms()[0].column, "created_at");
        assert_eq!(spec.terms()[0].direction, SortDirection::Desc);
        assert_eq!(spec.terms()[1].column, "id");
        assert_eq!(spec.terms()[1].direction, SortDirection::Asc);
    }

    #[test]
    fn rejects_empty_order() {
        let err = OrderSpec::parse(&[]).unwrap_err();
        assert!(matches!(err, PaginationError::InvalidOrderSpec(_)));
    }

    #[test]
    fn rejects_lowercase_direction() {
        // Directions are case-sensitive by contract.
        let err = OrderSpec::parse(&entries(&["id_desc"])).unwrap_err();
        assert!(matches!(err, PaginationError::InvalidOrderDirection(_)));
    }

    #[test]
    fn rejects_missing_direction() {
        let err = OrderSpec::parse(&entries(&["id"])).unwrap_err();
        assert!(matches!(err, PaginationError::InvalidOrderSpec(_)));
    }

    #[test]
    fn rejects_unsafe_column_name() {
        let err = OrderSpec::parse(&entries(&["id\"; DROP TABLE movie;--_ASC"])).unwrap_err();
        assert!(matches!(err, PaginationError::InvalidColumn(_)));
    }

    #[test]
    fn renders_order_by_sql() {
        let spec = OrderSpec::parse(&entries(&["created_at_DESC", "id_ASC"])).unwrap();
        assert_eq!(spec.to_sql(), "ORDER BY \"created_at\" DESC, \"id\" ASC");
    }

    #[test]
    fn round_trips_wire_entries() {
        let raw = entries(&["created_at_DESC", "id_ASC"]);
        let spec = OrderSpec::parse(&raw).unwrap();
        assert_eq!(spec.to_entries(), raw);
    }
}
