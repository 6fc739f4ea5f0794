use crate::exprn::column::{set_union, ColumnIdSet};
use crate::exprn::mapper::Mapper;
use crate::exprn::{Expressionist, Relation};
use crate::sql::SqlWriter;

#[derive(Debug)]
struct Comparison {
    relation: Relation,
    lhs: Box<dyn Mapper>,
    rhs: Box<dyn Mapper>,
}

impl Expressionist for Comparison {
    fn write_expression(&self, sql: &mut dyn SqlWriter) {
        sql.write_comparison(self.relation, self.lhs.as_ref(), self.rhs.as_ref());
    }

    fn imports(&self) -> ColumnIdSet {
        set_union(self.lhs.imports(), self.rhs.imports())
    }
}

/// `lhs <relation> rhs` between two scalar expressions
pub fn make_comparison_expressionist(
    relation: Relation,
    lhs: Box<dyn Mapper>,
    rhs: Box<dyn Mapper>,
) -> Box<dyn Expressionist> {
    Box::new(Comparison { relation, lhs, rhs })
}
