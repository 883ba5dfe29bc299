//! Declarative description of the rows a statement targets.
//!
//! A [`Query`] names a table, an optional [`Condition`] tree, the projected
//! fields, the sort order and an optional page. The adapter never inspects a
//! query: it only hands it to a [`CommandBuilder`](crate::CommandBuilder).

use crate::changeset::QueryValue;
use crate::value::Value;

/// Comparison operator of a [`Condition::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
}

impl CompareOp {
    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// Predicate tree scoping a SELECT, UPDATE or DELETE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Binary comparison between two operands.
    Compare {
        /// Left operand.
        left: QueryValue,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: QueryValue,
    },
    /// `operand IS NULL`
    IsNull(QueryValue),
    /// `operand IS NOT NULL`
    IsNotNull(QueryValue),
    /// Conjunction; an empty group is always true.
    And(Vec<Condition>),
    /// Disjunction; an empty group is always false.
    Or(Vec<Condition>),
    /// Negation.
    Not(Box<Condition>),
}

impl Condition {
    /// `field op value`
    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<QueryValue>) -> Self {
        Self::Compare {
            left: QueryValue::Field(field.into()),
            op,
            right: value.into(),
        }
    }

    /// `field = value`
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field IS NULL`
    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull(QueryValue::Field(field.into()))
    }

    /// Conjunction of the given conditions.
    #[must_use]
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// Disjunction of the given conditions.
    #[must_use]
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    /// Negation of the given condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Equality conjunction identifying one stored record by its key.
    ///
    /// A NULL key value is matched with `IS NULL`, since `= NULL` never holds.
    #[must_use]
    pub fn primary_key<'a>(key: impl IntoIterator<Item = (&'a str, &'a Value)>) -> Self {
        Self::and(key.into_iter().map(|(column, value)| {
            if value.is_null() {
                Self::is_null(column)
            } else {
                Self::eq(column, value.clone())
            }
        }))
    }
}

/// Sort key of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortField {
    /// Column to sort on.
    pub field: String,
    /// Whether the order is descending.
    pub descending: bool,
}

impl SortField {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Table, predicate, projection, ordering and page of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    table: String,
    condition: Option<Condition>,
    fields: Vec<String>,
    sort: Vec<SortField>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Query matching every row of `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            condition: None,
            fields: Vec::new(),
            sort: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Restricts the query to the rows matching `condition`.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Projects the given fields; no field means all columns.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a sort key.
    #[must_use]
    pub fn order_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// Skips the first `offset` rows.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most `limit` rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The predicate, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// The projected fields.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The sort keys.
    #[must_use]
    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn record_offset(&self) -> usize {
        self.offset
    }

    /// Maximum number of rows to return.
    #[must_use]
    pub fn record_limit(&self) -> Option<usize> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_condition() {
        let id = Value::Integer(5);
        let region = Value::Null;
        let cond = Condition::primary_key([("id", &id), ("region", &region)]);
        assert_eq!(
            cond,
            Condition::And(vec![
                Condition::eq("id", 5i64),
                Condition::IsNull(QueryValue::field("region")),
            ])
        );
    }

    #[test]
    fn test_query_builder() {
        let q = Query::new("users")
            .filter(Condition::eq("active", true))
            .select(["id", "name"])
            .order_by(SortField::desc("id"))
            .offset(10)
            .limit(5);
        assert_eq!(q.table(), "users");
        assert_eq!(q.fields(), &["id".to_string(), "name".to_string()]);
        assert_eq!(q.sort(), &[SortField::desc("id")]);
        assert_eq!(q.record_offset(), 10);
        assert_eq!(q.record_limit(), Some(5));
        assert!(q.condition().is_some());
    }
}
