use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::PaginationError;
use super::order::OrderSpec;

/// Decoded continuation token: the sort-key values of the last row of the
/// previous page plus the order the page was fetched with. Cursors are
/// client-held and never persisted server-side; they carry no integrity
/// check, so a forged cursor only ever changes which rows come back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPayload {
    pub values: Map<String, Value>,
    pub order: Vec<String>,
}

/// Encode the sort-key values of a page's last row into an opaque token:
/// JSON `{values, order}`, then base64.
pub fn encode(values: Map<String, Value>, order: &OrderSpec) -> Result<String, PaginationError> {
    let payload = CursorPayload {
        values,
        order: order.to_entries(),
    };
    let json = serde_json::to_string(&payload)?;
    Ok(BASE64.encode(json.as_bytes()))
}

/// Decode an opaque cursor back into its payload. Any structural failure is
/// the caller's error, reported as `MalformedCursor`.
pub fn decode(cursor: &str) -> Result<CursorPayload, PaginationError> {
    let bytes = BASE64
        .decode(cursor.as_bytes())
        .map_err(|e| PaginationError::MalformedCursor(format!("invalid base64: {}", e)))?;

    let raw: Value = serde_json::from_slice(&bytes)
        .map_err(|e| PaginationError::MalformedCursor(format!("invalid JSON: {}", e)))?;

    let obj = raw
        .as_object()
        .ok_or_else(|| PaginationError::MalformedCursor("cursor is not an object".to_string()))?;

    let values = obj
        .get("values")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| {
            PaginationError::MalformedCursor("cursor is missing the values object".to_string())
        })?;

    let order = obj
        .get("order")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            PaginationError::MalformedCursor("cursor is missing the order array".to_string())
        })?
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                PaginationError::MalformedCursor("order entries must be strings".to_string())
            })
        })
        .collect::<Result<Vec<String>, PaginationError>>()?;

    Ok(CursorPayload { values, order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(entries: &[&str]) -> OrderSpec {
        let raw: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        OrderSpec::parse(&raw).unwrap()
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut values = Map::new();
        values.insert("id".to_string(), json!(11));
        values.insert("title".to_string(), json!("Alien"));

        let spec = order(&["title_ASC", "id_DESC"]);
        let cursor = encode(values.clone(), &spec).unwrap();
        let payload = decode(&cursor).unwrap();

        assert_eq!(payload.values, values);
        assert_eq!(payload.order, vec!["title_ASC", "id_DESC"]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut values = Map::new();
        values.insert("id".to_string(), json!(42));
        let spec = order(&["id_DESC"]);

        let a = encode(values.clone(), &spec).unwrap();
        let b = encode(values, &spec).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn matches_documented_wire_format() {
        // base64 of {"values":{"id":11},"order":["id_DESC"]}
        let mut values = Map::new();
        values.insert("id".to_string(), json!(11));
        let cursor = encode(values, &order(&["id_DESC"])).unwrap();

        let decoded = BASE64.decode(cursor.as_bytes()).unwrap();
        let raw: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(raw, json!({"values": {"id": 11}, "order": ["id_DESC"]}));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode("not base64 at all!!").unwrap_err();
        assert!(matches!(err, PaginationError::MalformedCursor(_)));
    }

    #[test]
    fn rejects_non_json_payload() {
        let cursor = BASE64.encode(b"plain text");
        let err = decode(&cursor).unwrap_err();
        assert!(matches!(err, PaginationError::MalformedCursor(_)));
    }

    #[test]
    fn rejects_missing_values() {
        let cursor = BASE64.encode(json!({"order": ["id_DESC"]}).to_string().as_bytes());
        let err = decode(&cursor).unwrap_err();
        assert!(matches!(err, PaginationError::MalformedCursor(_)));
    }

    #[test]
    fn rejects_missing_order() {
        let cursor = BASE64.encode(json!({"values": {"id": 1}}).to_string().as_bytes());
        let err = decode(&cursor).unwrap_err();
        assert!(matches!(err, PaginationError::MalformedCursor(_)));
    }
}
