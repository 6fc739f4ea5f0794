//! Typed expression trees.
//!
//! Nodes own their children outright and never share them, so every tree is
//! single-owner and acyclic. Nodes hold structure only; the text of each
//! construct comes from the [`SqlWriter`] they are written to.

pub mod collective;
pub mod collective_comparison;
pub mod column;
pub mod comparison;
pub mod mapper;

use std::fmt;

use crate::sql::SqlWriter;

pub use collective::{Collective, Quantifier, Query, Select};
pub use collective_comparison::{in_query, in_values, make_collective_comparison_expressionist, not_in_values};
pub use column::{set_union, ColumnId, ColumnIdSet, ColumnRef, Table};
pub use comparison::make_comparison_expressionist;
pub use mapper::{column, literal, ColumnMapper, LiteralMapper, Mapper};

/// A boolean-valued node of a query predicate
pub trait Expressionist: fmt::Debug + Send + Sync {
    fn write_expression(&self, sql: &mut dyn SqlWriter);

    /// Columns the subtree references from enclosing scopes
    fn imports(&self) -> ColumnIdSet;
}

/// Comparison operator between two scalar operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Relation {
    /// The relation that holds exactly when this one does not
    pub fn negate(self) -> Self {
        match self {
            Relation::Equal => Relation::NotEqual,
            Relation::NotEqual => Relation::Equal,
            Relation::Less => Relation::GreaterOrEqual,
            Relation::LessOrEqual => Relation::Greater,
            Relation::Greater => Relation::LessOrEqual,
            Relation::GreaterOrEqual => Relation::Less,
        }
    }
}
