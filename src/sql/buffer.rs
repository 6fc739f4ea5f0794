use crate::exprn::{Collective, ColumnRef, Expressionist, Mapper, Quantifier, Query, Relation, Table};
use crate::sql::{Dialect, SqlWriter};
use crate::types::Value;

/// Output column name given to sub-queries used as collectives
pub const VALUE_ALIAS: &str = "value";

/// Accumulates SQL text for one dialect
#[derive(Debug)]
pub struct SqlBuffer {
    dialect: Dialect,
    text: String,
    next_alias: usize,
}

impl SqlBuffer {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::with_capacity(128),
            next_alias: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn write_predicate(&mut self, predicate: &dyn Expressionist) {
        predicate.write_expression(self);
    }

    fn write_ident(&mut self, ident: &str) {
        self.text.push('"');
        self.text.push_str(&ident.replace('"', "\"\""));
        self.text.push('"');
    }

    fn write_string_literal(&mut self, s: &str) {
        self.text.push('\'');
        self.text.push_str(&s.replace('\'', "''"));
        self.text.push('\'');
    }

    fn write_operator(&mut self, relation: Relation) {
        self.text.push_str(match relation {
            Relation::Equal => " = ",
            Relation::NotEqual => " <> ",
            Relation::Less => " < ",
            Relation::LessOrEqual => " <= ",
            Relation::Greater => " > ",
            Relation::GreaterOrEqual => " >= ",
        });
    }

    fn fresh_alias(&mut self) -> String {
        self.next_alias += 1;
        format!("q{}", self.next_alias)
    }

    fn write_value_list(&mut self, values: &[Value]) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            self.write_value(value);
        }
    }

    fn write_literal_collective(
        &mut self,
        relation: Relation,
        lhs: &dyn Mapper,
        quantifier: Quantifier,
        values: &[Value],
    ) {
        if values.is_empty() {
            // SOME over nothing is false, ALL over nothing is vacuously true
            self.text.push_str(match quantifier {
                Quantifier::Some => "1 = 0",
                Quantifier::All => "1 = 1",
            });
            return;
        }

        match (relation, quantifier) {
            (Relation::Equal, Quantifier::Some) | (Relation::NotEqual, Quantifier::All) => {
                lhs.write_mapper(self);
                self.text.push_str(if relation == Relation::Equal { " IN (" } else { " NOT IN (" });
                self.write_value_list(values);
                self.text.push(')');
            }
            _ => {
                let joiner = match quantifier {
                    Quantifier::Some => " OR ",
                    Quantifier::All => " AND ",
                };
                self.text.push('(');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.text.push_str(joiner);
                    }
                    lhs.write_mapper(self);
                    self.write_operator(relation);
                    self.write_value(value);
                }
                self.text.push(')');
            }
        }
    }

    fn write_subquery_collective(
        &mut self,
        relation: Relation,
        lhs: &dyn Mapper,
        quantifier: Quantifier,
        query: &dyn Query,
    ) {
        match (relation, quantifier) {
            (Relation::Equal, Quantifier::Some) | (Relation::NotEqual, Quantifier::All) => {
                lhs.write_mapper(self);
                self.text.push_str(if relation == Relation::Equal { " IN (" } else { " NOT IN (" });
                query.write_query(self, VALUE_ALIAS);
                self.text.push(')');
            }
            _ if self.dialect.supports_quantified_subquery() => {
                lhs.write_mapper(self);
                self.write_operator(relation);
                self.text.push_str(match quantifier {
                    Quantifier::Some => "ANY (",
                    Quantifier::All => "ALL (",
                });
                query.write_query(self, VALUE_ALIAS);
                self.text.push(')');
            }
            _ => {
                // Emulated with a correlated EXISTS; a NULL comparison counts
                // as not holding, matching how ANY/ALL behave in a WHERE clause
                let alias = self.fresh_alias();
                self.text.push_str(match quantifier {
                    Quantifier::Some => "EXISTS (SELECT 1 FROM (",
                    Quantifier::All => "NOT EXISTS (SELECT 1 FROM (",
                });
                query.write_query(self, VALUE_ALIAS);
                self.text.push_str(") AS ");
                self.write_ident(&alias);
                self.text.push_str(" WHERE ");
                if quantifier == Quantifier::All {
                    self.text.push('(');
                }
                lhs.write_mapper(self);
                self.write_operator(relation);
                self.write_ident(&alias);
                self.text.push('.');
                self.write_ident(VALUE_ALIAS);
                if quantifier == Quantifier::All {
                    self.text.push_str(") IS NOT TRUE");
                }
                self.text.push(')');
            }
        }
    }
}

impl SqlWriter for SqlBuffer {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn write_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn write_column(&mut self, column: &ColumnRef) {
        self.write_ident(column.table());
        self.text.push('.');
        self.write_ident(column.name());
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.text.push_str("NULL"),
            Value::Boolean(b) => self.text.push_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Integer(i) => self.text.push_str(&i.to_string()),
            Value::Real(r) if r.is_finite() => self.text.push_str(&format!("{r:?}")),
            Value::Real(_) => self.text.push_str("NULL"),
            Value::Text(s) => self.write_string_literal(s),
            Value::Blob(b) => match self.dialect {
                Dialect::Sqlite => self.text.push_str(&format!("X'{}'", hex::encode(b))),
                Dialect::Postgres => self.text.push_str(&format!("'\\x{}'::bytea", hex::encode(b))),
            },
        }
    }

    fn write_table(&mut self, table: &Table) {
        self.write_ident(table.name());
        if table.is_aliased() {
            self.text.push_str(" AS ");
            self.write_ident(table.alias());
        }
    }

    fn write_comparison(&mut self, relation: Relation, lhs: &dyn Mapper, rhs: &dyn Mapper) {
        lhs.write_mapper(self);
        self.write_operator(relation);
        rhs.write_mapper(self);
    }

    fn write_collective_comparison(&mut self, relation: Relation, lhs: &dyn Mapper, rhs: &Collective) {
        match rhs.query() {
            Some(query) => self.write_subquery_collective(relation, lhs, rhs.quantifier(), query),
            None => {
                let values = rhs.values_list().unwrap_or_default();
                self.write_literal_collective(relation, lhs, rhs.quantifier(), values);
            }
        }
    }

    fn write_select(
        &mut self,
        value: &dyn Mapper,
        value_alias: &str,
        from: &Table,
        filter: Option<&dyn Expressionist>,
    ) {
        self.text.push_str("SELECT ");
        value.write_mapper(self);
        self.text.push_str(" AS ");
        self.write_ident(value_alias);
        self.text.push_str(" FROM ");
        self.write_table(from);
        if let Some(filter) = filter {
            self.text.push_str(" WHERE ");
            filter.write_expression(self);
        }
    }
}

/// Render a predicate for `dialect`
pub fn to_sql(predicate: &dyn Expressionist, dialect: Dialect) -> String {
    let mut buffer = SqlBuffer::new(dialect);
    buffer.write_predicate(predicate);
    buffer.into_string()
}
