//! Submodule defining the changeset of a single row write.
//!
//! A [`Changeset`] is an ordered sequence of `column -> value` pairs used as the
//! body of INSERT and UPDATE statements. Values are either literal constants,
//! which are always bound as statement parameters, or server-side expressions.
//!
//! # Example
//!
//! ```
//! use recordset_adapter::{Changeset, QueryValue, Value};
//!
//! let changeset = Changeset::new()
//!     .set("name", "Alice")
//!     .set_expression("updated_at", "CURRENT_TIMESTAMP");
//!
//! assert_eq!(changeset.len(), 2);
//! assert_eq!(changeset.get("name"), Some(&QueryValue::Const(Value::from("Alice"))));
//! ```

use core::hash::BuildHasher;

use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::Error;
use crate::value::Value;

/// Model property name -> column name map used when reflecting a model.
pub type PropertyMap = IndexMap<String, String>;

/// The right-hand side of a changeset entry or a filter operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryValue {
    /// A literal bound as a statement parameter.
    Const(Value),
    /// A reference to another column.
    Field(String),
    /// A raw SQL expression evaluated by the server.
    Raw(String),
}

impl QueryValue {
    /// Creates a column reference.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Creates a raw SQL expression.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

macro_rules! const_query_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    Self::Const(value.into())
                }
            }
        )*
    };
}

const_query_value_from!(Value, i64, i32, u32, bool, f64, String, &str, Vec<u8>, &[u8]);

impl<T: Into<Value>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        Self::Const(value.into())
    }
}

/// Ordered `column -> value` pairs describing the content of one row write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    entries: IndexMap<String, QueryValue>,
}

impl Changeset {
    /// Creates an empty changeset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a column, replacing any previous value in place.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a column to a server-side SQL expression.
    #[must_use]
    pub fn set_expression(self, column: impl Into<String>, sql: impl Into<String>) -> Self {
        self.set(column, QueryValue::raw(sql))
    }

    /// Sets the value of a column through a mutable reference.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.insert(column.into(), value.into());
    }

    /// Returns the value assigned to a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&QueryValue> {
        self.entries.get(column)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the changeset has no column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Iterates over the column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reflects the public fields of a serializable model into a changeset.
    ///
    /// Fields keep their declaration order. When `property_map` is provided
    /// only the mapped properties are included, under their mapped column
    /// name, which restricts an UPDATE to a subset of the model.
    ///
    /// # Errors
    ///
    /// * `InvalidModel` - If the model does not serialize to a map of fields.
    ///
    /// # Example
    ///
    /// ```
    /// use recordset_adapter::{Changeset, PropertyMap, Value, QueryValue};
    ///
    /// #[derive(serde::Serialize)]
    /// struct User { id: i64, display_name: String, age: u32 }
    ///
    /// let user = User { id: 1, display_name: "Alice".into(), age: 30 };
    /// let map: PropertyMap = [("display_name".to_string(), "name".to_string())].into_iter().collect();
    ///
    /// let changeset = Changeset::from_model(&user, Some(&map)).unwrap();
    /// assert_eq!(changeset.columns().collect::<Vec<_>>(), vec!["name"]);
    /// assert_eq!(changeset.get("name"), Some(&QueryValue::Const(Value::from("Alice"))));
    /// ```
    pub fn from_model<T: Serialize + ?Sized>(
        model: &T,
        property_map: Option<&PropertyMap>,
    ) -> Result<Self, Error> {
        let json = serde_json::to_value(model).map_err(|e| Error::InvalidModel(e.to_string()))?;
        let serde_json::Value::Object(fields) = json else {
            return Err(Error::InvalidModel(format!(
                "expected a struct or map, got {json}"
            )));
        };

        let mut changeset = Self::new();
        match property_map {
            None => {
                for (property, value) in fields {
                    changeset.insert(property, Value::from(value));
                }
            }
            Some(map) => {
                for (property, value) in fields {
                    if let Some(column) = map.get(&property) {
                        changeset.insert(column.clone(), Value::from(value));
                    }
                }
            }
        }
        Ok(changeset)
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for Changeset {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

impl<V: Into<QueryValue>, S: BuildHasher> From<IndexMap<String, V, S>> for Changeset {
    fn from(map: IndexMap<String, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<V: Into<QueryValue>, S: BuildHasher> From<hashbrown::HashMap<String, V, S>> for Changeset {
    fn from(map: hashbrown::HashMap<String, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<V: Into<QueryValue>, S: BuildHasher> From<std::collections::HashMap<String, V, S>>
    for Changeset
{
    fn from(map: std::collections::HashMap<String, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<QueryValue>> From<Vec<(K, V)>> for Changeset {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Changeset {
    type Item = (&'a String, &'a QueryValue);
    type IntoIter = indexmap::map::Iter<'a, String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Product {
        id: i64,
        title: String,
        price: f64,
        discontinued: bool,
        notes: Option<String>,
    }

    fn product() -> Product {
        Product {
            id: 7,
            title: "Lamp".into(),
            price: 19.5,
            discontinued: false,
            notes: None,
        }
    }

    #[test]
    fn test_from_model_keeps_field_order() {
        let cs = Changeset::from_model(&product(), None).unwrap();
        assert_eq!(
            cs.columns().collect::<Vec<_>>(),
            vec!["id", "title", "price", "discontinued", "notes"]
        );
        assert_eq!(cs.get("id"), Some(&QueryValue::Const(Value::Integer(7))));
        assert_eq!(cs.get("price"), Some(&QueryValue::Const(Value::Real(19.5))));
        assert_eq!(cs.get("discontinued"), Some(&QueryValue::Const(Value::Integer(0))));
        assert_eq!(cs.get("notes"), Some(&QueryValue::Const(Value::Null)));
    }

    #[test]
    fn test_from_model_property_map_filters_and_renames() {
        let map: PropertyMap = [
            ("title".to_string(), "product_title".to_string()),
            ("price".to_string(), "unit_price".to_string()),
        ]
        .into_iter()
        .collect();
        let cs = Changeset::from_model(&product(), Some(&map)).unwrap();
        assert_eq!(
            cs.columns().collect::<Vec<_>>(),
            vec!["product_title", "unit_price"]
        );
    }

    #[test]
    fn test_from_model_unmapped_property_ignored() {
        let map: PropertyMap = [("missing".to_string(), "col".to_string())]
            .into_iter()
            .collect();
        let cs = Changeset::from_model(&product(), Some(&map)).unwrap();
        assert!(cs.is_empty());
    }

    #[test]
    fn test_from_model_rejects_scalars() {
        let err = Changeset::from_model(&42, None).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn test_from_map_sources() {
        let mut map: IndexMap<String, Value> = IndexMap::new();
        map.insert("b".into(), Value::Integer(2));
        map.insert("a".into(), Value::Integer(1));
        let cs = Changeset::from(map);
        assert_eq!(cs.columns().collect::<Vec<_>>(), vec!["b", "a"]);

        let mut hashed: hashbrown::HashMap<String, i64> = hashbrown::HashMap::new();
        hashed.insert("x".into(), 1);
        let cs = Changeset::from(hashed);
        assert_eq!(cs.get("x"), Some(&QueryValue::Const(Value::Integer(1))));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let cs = Changeset::new()
            .set("a", 1i64)
            .set("b", 2i64)
            .set("a", 3i64);
        assert_eq!(cs.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(cs.get("a"), Some(&QueryValue::Const(Value::Integer(3))));
    }
}
