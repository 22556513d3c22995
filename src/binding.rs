//! Value binding: caller-supplied named values and per-statement positional slots.

use std::collections::HashMap;

use crate::error::NamedSqlError;
use crate::translation::NamedParamMap;
use crate::types::SqlValue;

/// Caller-supplied `name → value` mapping for a named-parameter statement.
///
/// Names are case-sensitive and written without the leading colon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    values: HashMap<String, SqlValue>,
}

impl NamedParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Option<SqlValue> {
        self.values.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for NamedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Build a [`NamedParams`] from `"name" => value` pairs.
///
/// ```rust
/// use named_sql::prelude::*;
///
/// let params = named_params! { "id" => 7, "name" => "bob" };
/// assert_eq!(params.get("id"), Some(&SqlValue::Int(7)));
/// ```
#[macro_export]
macro_rules! named_params {
    () => {
        $crate::binding::NamedParams::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::binding::NamedParams::new()$(.with($name, $value))+
    };
}

/// Positional parameter slots of one prepared statement (1-based, like the SQL markers).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlots {
    slots: Vec<Option<SqlValue>>,
}

impl ParamSlots {
    #[must_use]
    pub fn new(parameter_count: usize) -> Self {
        Self {
            slots: vec![None; parameter_count],
        }
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    /// Bind `value` at a 1-based position.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] when the position is outside the statement.
    pub fn bind(&mut self, position: usize, value: SqlValue) -> Result<(), NamedSqlError> {
        let count = self.slots.len();
        let slot = position
            .checked_sub(1)
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| {
                NamedSqlError::ParameterError(format!(
                    "parameter position {position} is out of range (statement has {count})"
                ))
            })?;
        *slot = Some(value);
        Ok(())
    }

    /// Bind `value` at every position the name occupies.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::UnknownParameter`] when `name` is not in `map`.
    pub fn bind_named(
        &mut self,
        map: &NamedParamMap,
        name: &str,
        value: SqlValue,
    ) -> Result<(), NamedSqlError> {
        let positions = map
            .positions(name)
            .ok_or_else(|| NamedSqlError::UnknownParameter(name.to_owned()))?;
        for &position in positions {
            self.bind(position, value.clone())?;
        }
        Ok(())
    }

    /// Bind every name the statement uses from the caller's values.
    ///
    /// Names the caller supplies but the SQL does not use are ignored.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::MissingParameter`] when a name in `map` has no caller value.
    pub fn bind_all(&mut self, map: &NamedParamMap, values: &NamedParams) -> Result<(), NamedSqlError> {
        for name in map.names() {
            let value = values
                .get(name)
                .ok_or_else(|| NamedSqlError::MissingParameter(name.to_owned()))?;
            self.bind_named(map, name, value.clone())?;
        }
        Ok(())
    }

    /// Bind a flat ordered list starting at position 1.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] when more values than markers are supplied.
    pub fn bind_positional(&mut self, values: &[SqlValue]) -> Result<(), NamedSqlError> {
        for (idx, value) in values.iter().enumerate() {
            self.bind(idx + 1, value.clone())?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Snapshot of the bound values in positional order.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::ParameterError`] naming the first unbound position.
    pub fn values(&self) -> Result<Vec<SqlValue>, NamedSqlError> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.clone().ok_or_else(|| {
                    NamedSqlError::ParameterError(format!(
                        "no value bound for parameter position {}",
                        idx + 1
                    ))
                })
            })
            .collect()
    }
}
