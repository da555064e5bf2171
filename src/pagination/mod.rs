pub mod cursor;
pub mod error;
pub mod order;
pub mod query;
pub mod seek;

pub use error::PaginationError;
pub use order::{OrderSpec, OrderTerm, SortDirection};
pub use query::{next_cursor, PageQuery, SqlResult};
