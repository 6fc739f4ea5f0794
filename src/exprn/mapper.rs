use std::fmt;

use crate::exprn::column::{ColumnIdSet, ColumnRef};
use crate::sql::SqlWriter;
use crate::types::Value;

/// A scalar expression: something that maps to one value per row
pub trait Mapper: fmt::Debug + Send + Sync {
    /// Columns this expression touches
    fn imports(&self) -> ColumnIdSet;

    fn write_mapper(&self, sql: &mut dyn SqlWriter);
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
    column: ColumnRef,
}

impl ColumnMapper {
    pub fn new(column: ColumnRef) -> Self {
        Self { column }
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }
}

impl Mapper for ColumnMapper {
    fn imports(&self) -> ColumnIdSet {
        ColumnIdSet::from([self.column.id()])
    }

    fn write_mapper(&self, sql: &mut dyn SqlWriter) {
        sql.write_column(&self.column);
    }
}

#[derive(Debug, Clone)]
pub struct LiteralMapper {
    value: Value,
}

impl LiteralMapper {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Mapper for LiteralMapper {
    fn imports(&self) -> ColumnIdSet {
        ColumnIdSet::new()
    }

    fn write_mapper(&self, sql: &mut dyn SqlWriter) {
        sql.write_value(&self.value);
    }
}

pub fn column(column: &ColumnRef) -> Box<dyn Mapper> {
    Box::new(ColumnMapper::new(column.clone()))
}

pub fn literal(value: impl Into<Value>) -> Box<dyn Mapper> {
    Box::new(LiteralMapper::new(value.into()))
}
