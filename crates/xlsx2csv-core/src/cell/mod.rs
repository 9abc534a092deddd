//! Cell-related types

pub mod address;
pub mod datetime;
pub mod value;

pub use address::CellAddress;
pub use value::CellValue;
