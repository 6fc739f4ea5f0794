use crate::exprn::collective::{Collective, Query};
use crate::exprn::column::{set_union, ColumnIdSet};
use crate::exprn::mapper::Mapper;
use crate::exprn::{Expressionist, Relation};
use crate::sql::SqlWriter;
use crate::types::Value;

#[derive(Debug)]
struct CollectiveComparison {
    relation: Relation,
    lhs: Box<dyn Mapper>,
    rhs: Collective,
}

impl Expressionist for CollectiveComparison {
    fn write_expression(&self, sql: &mut dyn SqlWriter) {
        sql.write_collective_comparison(self.relation, self.lhs.as_ref(), &self.rhs);
    }

    fn imports(&self) -> ColumnIdSet {
        set_union(self.lhs.imports(), self.rhs.imports())
    }
}

/// `lhs <relation> SOME|ALL (rhs)`, taking ownership of both operands
pub fn make_collective_comparison_expressionist(
    relation: Relation,
    lhs: Box<dyn Mapper>,
    rhs: Collective,
) -> Box<dyn Expressionist> {
    Box::new(CollectiveComparison { relation, lhs, rhs })
}

/// `lhs IN (values...)`
pub fn in_values<V: Into<Value>>(lhs: Box<dyn Mapper>, values: impl IntoIterator<Item = V>) -> Box<dyn Expressionist> {
    make_collective_comparison_expressionist(Relation::Equal, lhs, Collective::some_of_values(values))
}

/// `lhs NOT IN (values...)`
pub fn not_in_values<V: Into<Value>>(lhs: Box<dyn Mapper>, values: impl IntoIterator<Item = V>) -> Box<dyn Expressionist> {
    make_collective_comparison_expressionist(Relation::NotEqual, lhs, Collective::all_of_values(values))
}

/// `lhs IN (query)`
pub fn in_query(lhs: Box<dyn Mapper>, query: Box<dyn Query>) -> Box<dyn Expressionist> {
    make_collective_comparison_expressionist(Relation::Equal, lhs, Collective::some_of(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exprn::column::{ColumnRef, Table};
    use crate::exprn::collective::Select;
    use crate::exprn::comparison::make_comparison_expressionist;
    use crate::exprn::mapper::{column, literal};

    /// Stands in for a sub-query that references a fixed set of outer columns
    #[derive(Debug)]
    struct FixedImports(ColumnIdSet);

    impl Query for FixedImports {
        fn imports(&self) -> ColumnIdSet {
            self.0.clone()
        }

        fn write_query(&self, sql: &mut dyn SqlWriter, _value_alias: &str) {
            sql.write_text("SELECT 1");
        }
    }

    fn ids(table: &Table) -> Vec<ColumnRef> {
        table.columns().to_vec()
    }

    #[test]
    fn test_imports_union_with_subquery() {
        let t = Table::new("t", &["c1", "c2", "c3"]).unwrap();
        let [c1, c2, c3]: [ColumnRef; 3] = ids(&t).try_into().unwrap();

        let node = make_collective_comparison_expressionist(
            Relation::Equal,
            column(&c1),
            Collective::some_of(Box::new(FixedImports(ColumnIdSet::from([c2.id(), c3.id()])))),
        );

        assert_eq!(node.imports(), ColumnIdSet::from([c1.id(), c2.id(), c3.id()]));
    }

    #[test]
    fn test_imports_with_literal_collection() {
        let t = Table::new("t", &["c1"]).unwrap();
        let c1 = t.column("c1").unwrap();

        let node = in_values(column(&c1), ["a", "b"]);
        assert_eq!(node.imports(), ColumnIdSet::from([c1.id()]));
    }

    #[test]
    fn test_literal_lhs_imports_only_subquery() {
        let t = Table::new("t", &["c2"]).unwrap();
        let c2 = t.column("c2").unwrap();

        let node = make_collective_comparison_expressionist(
            Relation::Less,
            literal(10),
            Collective::all_of(Box::new(FixedImports(ColumnIdSet::from([c2.id()])))),
        );
        assert_eq!(node.imports(), ColumnIdSet::from([c2.id()]));
    }

    #[test]
    fn test_select_imports_exclude_own_table_columns() {
        let t = Table::new("t", &["c1", "c2", "c3"]).unwrap();
        let [c1, c2, c3]: [ColumnRef; 3] = ids(&t).try_into().unwrap();
        let u = Table::new("u", &["v", "w"]).unwrap();
        let (v, w) = (u.column("v").unwrap(), u.column("w").unwrap());

        // u.v and u.w belong to the sub-query; t.c2 and t.c3 are correlated
        let correlated = Select::new(u.clone(), column(&v)).filter(make_comparison_expressionist(
            Relation::Equal,
            column(&w),
            column(&c2),
        ));
        let node = in_query(column(&c1), Box::new(correlated));
        assert_eq!(node.imports(), ColumnIdSet::from([c1.id(), c2.id()]));

        let both = Select::new(u.clone(), column(&c3)).filter(make_comparison_expressionist(
            Relation::Equal,
            column(&w),
            column(&c2),
        ));
        let node = in_query(column(&c1), Box::new(both));
        assert_eq!(node.imports(), ColumnIdSet::from([c1.id(), c2.id(), c3.id()]));

        let uncorrelated = Select::new(u, column(&v));
        let node = in_query(column(&c1), Box::new(uncorrelated));
        assert_eq!(node.imports(), ColumnIdSet::from([c1.id()]));
    }
}
