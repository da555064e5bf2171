use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaginationError {
    #[error("Invalid order spec: {0}")]
    InvalidOrderSpec(String),

    #[error("Invalid order direction: {0}")]
    InvalidOrderDirection(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    #[error("Cursor order mismatch: cursor was issued for order [{cursor_order}], request asked for [{request_order}]")]
    CursorOrderMismatch {
        cursor_order: String,
        request_order: String,
    },

    #[error("Invalid take: {0}")]
    InvalidTake(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
