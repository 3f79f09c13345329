//! Data model for tabular data representation

mod schema;
mod table;
mod value;

pub use schema::{CellType, Column};
pub use table::{Record, Row, Table};
pub use value::Value;
