// Module for value and column type definitions
pub mod value;

pub use value::Value;

/// Declared type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Integer,
    BigInteger,
    Real,
    Text,
    Blob,
}
