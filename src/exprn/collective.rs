use std::fmt;

use crate::exprn::column::{set_union, ColumnIdSet, Table};
use crate::exprn::mapper::Mapper;
use crate::exprn::Expressionist;
use crate::sql::SqlWriter;
use crate::types::Value;

/// A query producing a single column of values
pub trait Query: fmt::Debug + Send + Sync {
    /// Columns the query depends on from its enclosing expression.
    ///
    /// Columns of the query's own tables are excluded, so an uncorrelated
    /// sub-query imports nothing even if its value and filter name columns.
    fn imports(&self) -> ColumnIdSet;

    /// Write the query with its output column named `value_alias`
    fn write_query(&self, sql: &mut dyn SqlWriter, value_alias: &str);
}

/// `SELECT <value> FROM <table> [WHERE <filter>]`
#[derive(Debug)]
pub struct Select {
    from: Table,
    value: Box<dyn Mapper>,
    filter: Option<Box<dyn Expressionist>>,
}

impl Select {
    pub fn new(from: Table, value: Box<dyn Mapper>) -> Self {
        Self {
            from,
            value,
            filter: None,
        }
    }

    pub fn filter(mut self, predicate: Box<dyn Expressionist>) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn from_table(&self) -> &Table {
        &self.from
    }
}

impl Query for Select {
    fn imports(&self) -> ColumnIdSet {
        let referenced = match &self.filter {
            Some(filter) => set_union(self.value.imports(), filter.imports()),
            None => self.value.imports(),
        };
        let own = self.from.exports();
        referenced.into_iter().filter(|id| !own.contains(id)).collect()
    }

    fn write_query(&self, sql: &mut dyn SqlWriter, value_alias: &str) {
        sql.write_select(self.value.as_ref(), value_alias, &self.from, self.filter.as_deref());
    }
}

/// How a relation applies across the members of a collective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Holds for at least one member
    Some,
    /// Holds for every member
    All,
}

#[derive(Debug)]
enum Members {
    Values(Vec<Value>),
    Query(Box<dyn Query>),
}

/// The right-hand operand of a collective comparison: a literal list or a sub-query
#[derive(Debug)]
pub struct Collective {
    quantifier: Quantifier,
    members: Members,
}

impl Collective {
    pub fn some_of_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::values(Quantifier::Some, values)
    }

    pub fn all_of_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::values(Quantifier::All, values)
    }

    pub fn some_of(query: Box<dyn Query>) -> Self {
        Self {
            quantifier: Quantifier::Some,
            members: Members::Query(query),
        }
    }

    pub fn all_of(query: Box<dyn Query>) -> Self {
        Self {
            quantifier: Quantifier::All,
            members: Members::Query(query),
        }
    }

    fn values<V: Into<Value>>(quantifier: Quantifier, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            quantifier,
            members: Members::Values(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    /// The literal members, or `None` for a sub-query
    pub fn values_list(&self) -> Option<&[Value]> {
        match &self.members {
            Members::Values(values) => Some(values.as_slice()),
            Members::Query(_) => None,
        }
    }

    /// The sub-query, or `None` for a literal list
    pub fn query(&self) -> Option<&dyn Query> {
        match &self.members {
            Members::Values(_) => None,
            Members::Query(query) => Some(query.as_ref()),
        }
    }

    pub fn imports(&self) -> ColumnIdSet {
        self.query().map(|query| query.imports()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exprn::comparison::make_comparison_expressionist;
    use crate::exprn::mapper::column;
    use crate::exprn::Relation;

    #[test]
    fn test_uncorrelated_select_imports_nothing() {
        let orders = Table::new("orders", &["id", "customer_id"]).unwrap();
        let select = Select::new(orders.clone(), column(&orders.column("customer_id").unwrap()));
        assert!(select.imports().is_empty());
    }

    #[test]
    fn test_correlated_select_imports_outer_columns() {
        let customers = Table::new("customers", &["id", "name"]).unwrap();
        let orders = Table::new("orders", &["id", "customer_id", "total"]).unwrap();
        let outer_id = customers.column("id").unwrap();

        let select = Select::new(orders.clone(), column(&orders.column("total").unwrap())).filter(
            make_comparison_expressionist(
                Relation::Equal,
                column(&orders.column("customer_id").unwrap()),
                column(&outer_id),
            ),
        );

        assert_eq!(select.imports(), ColumnIdSet::from([outer_id.id()]));
    }

    #[test]
    fn test_literal_collective_has_no_query() {
        let collective = Collective::some_of_values([1, 2, 3]);
        assert_eq!(collective.quantifier(), Quantifier::Some);
        assert_eq!(collective.values_list().unwrap().len(), 3);
        assert!(collective.query().is_none());
        assert!(collective.imports().is_empty());
    }
}
