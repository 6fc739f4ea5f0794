use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{Result, SqlWeaveError};

static NEXT_COLUMN_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mapped column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(u64);

impl ColumnId {
    fn next() -> Self {
        ColumnId(NEXT_COLUMN_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

pub type ColumnIdSet = BTreeSet<ColumnId>;

/// Union of two column sets, consuming both
pub fn set_union(mut a: ColumnIdSet, mut b: ColumnIdSet) -> ColumnIdSet {
    if a.len() < b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    a.extend(b);
    a
}

/// A column of a particular table occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    id: ColumnId,
    table: Arc<str>,
    name: Arc<str>,
}

impl ColumnRef {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// Name (or alias) of the table occurrence the column belongs to
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A table occurrence in a query. Each occurrence gets fresh column ids, so a
/// table joined to itself or used in a correlated sub-query stays distinguishable.
#[derive(Debug, Clone)]
pub struct Table {
    name: Arc<str>,
    alias: Arc<str>,
    columns: Vec<ColumnRef>,
}

impl Table {
    pub fn new(name: &str, columns: &[&str]) -> Result<Self> {
        Self::aliased(name, name, columns)
    }

    pub fn aliased(name: &str, alias: &str, columns: &[&str]) -> Result<Self> {
        if name.trim().is_empty() || alias.trim().is_empty() {
            return Err(SqlWeaveError::InvalidExpression(
                "table name and alias must not be empty".to_string(),
            ));
        }
        if columns.is_empty() {
            return Err(SqlWeaveError::InvalidExpression(format!(
                "table {name} has no columns"
            )));
        }

        let alias: Arc<str> = Arc::from(alias);
        let mut refs: Vec<ColumnRef> = Vec::with_capacity(columns.len());
        for column in columns {
            if column.trim().is_empty() {
                return Err(SqlWeaveError::InvalidExpression(format!(
                    "table {name} has an empty column name"
                )));
            }
            if refs.iter().any(|c| &*c.name == *column) {
                return Err(SqlWeaveError::InvalidExpression(format!(
                    "duplicate column {column} in table {name}"
                )));
            }
            refs.push(ColumnRef {
                id: ColumnId::next(),
                table: alias.clone(),
                name: Arc::from(*column),
            });
        }

        Ok(Self {
            name: Arc::from(name),
            alias,
            columns: refs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn is_aliased(&self) -> bool {
        self.name != self.alias
    }

    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        self.columns
            .iter()
            .find(|c| &*c.name == name)
            .cloned()
            .ok_or_else(|| {
                SqlWeaveError::InvalidExpression(format!("no column {name} in table {}", self.alias))
            })
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Ids of every column this occurrence provides
    pub fn exports(&self) -> ColumnIdSet {
        self.columns.iter().map(ColumnRef::id).collect()
    }
}
