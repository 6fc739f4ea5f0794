//! Dialect-specific SQL text generation.
//!
//! Expression nodes never produce text themselves; they call back into a
//! [`SqlWriter`] which decides how each construct is spelled.

pub mod buffer;

use sqlparser::dialect::{PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::exprn::{Collective, ColumnRef, Expressionist, Mapper, Relation, Table};
use crate::types::Value;
use crate::Result;

pub use buffer::{to_sql, SqlBuffer, VALUE_ALIAS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Longest identifier the backend keeps without truncation
    pub fn max_identifier_length(self) -> Option<usize> {
        match self {
            Dialect::Sqlite => None,
            Dialect::Postgres => Some(63),
        }
    }

    /// Whether `x < ALL (SELECT ...)` style predicates are understood natively
    pub fn supports_quantified_subquery(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    pub fn parser_dialect(self) -> Box<dyn sqlparser::dialect::Dialect> {
        match self {
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }

    /// Parse `sql` with this dialect's grammar, returning the statement count
    pub fn check_syntax(self, sql: &str) -> Result<usize> {
        let dialect = self.parser_dialect();
        let statements = Parser::parse_sql(dialect.as_ref(), sql)?;
        Ok(statements.len())
    }
}

/// Receives the structure of an expression tree and turns it into text
pub trait SqlWriter {
    fn dialect(&self) -> Dialect;

    /// Append raw SQL
    fn write_text(&mut self, text: &str);

    fn write_column(&mut self, column: &ColumnRef);

    fn write_value(&mut self, value: &Value);

    fn write_table(&mut self, table: &Table);

    fn write_comparison(&mut self, relation: Relation, lhs: &dyn Mapper, rhs: &dyn Mapper);

    fn write_collective_comparison(&mut self, relation: Relation, lhs: &dyn Mapper, rhs: &Collective);

    fn write_select(
        &mut self,
        value: &dyn Mapper,
        value_alias: &str,
        from: &Table,
        filter: Option<&dyn Expressionist>,
    );
}
