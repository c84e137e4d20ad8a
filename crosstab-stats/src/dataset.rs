//! In-memory categorical dataset.
//!
//! A [`Dataset`] is a rectangular, column-major table of named
//! [`CategoricalColumn`]s. Values are plain strings drawn from a finite,
//! unordered domain; `None` marks a missing entry.

use std::collections::{BTreeSet, HashSet};

use crosstab_core::{CrosstabError, Result};

/// A named column of categorical values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoricalColumn {
    name: String,
    values: Vec<Option<String>>,
}

impl CategoricalColumn {
    /// Create a column from explicit values, `None` meaning missing.
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a column from raw text cells, treating empty strings as missing.
    ///
    /// # Example
    ///
    /// ```
    /// use crosstab_stats::dataset::CategoricalColumn;
    ///
    /// let col = CategoricalColumn::from_strs("smoker", &["yes", "", "no"]);
    /// assert_eq!(col.missing_count(), 1);
    /// assert_eq!(col.levels(), vec!["no", "yes"]);
    /// ```
    pub fn from_strs<S: AsRef<str>>(name: impl Into<String>, cells: &[S]) -> Self {
        let values = cells
            .iter()
            .map(|c| {
                let c = c.as_ref();
                if c.is_empty() {
                    None
                } else {
                    Some(c.to_string())
                }
            })
            .collect();
        Self::new(name, values)
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in row order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Number of rows, including missing entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing entries.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Sorted distinct non-missing values.
    pub fn levels(&self) -> Vec<&str> {
        self.values
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Rectangular table of categorical columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dataset {
    columns: Vec<CategoricalColumn>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that columns are equally long and uniquely named.
    ///
    /// # Errors
    ///
    /// Returns [`CrosstabError::InvalidInput`] for ragged columns or a
    /// repeated column name.
    pub fn new(columns: Vec<CategoricalColumn>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, CategoricalColumn::len);

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if col.len() != n_rows {
                return Err(CrosstabError::InvalidInput(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name(),
                    col.len(),
                    n_rows
                )));
            }
            if !seen.insert(col.name()) {
                return Err(CrosstabError::InvalidInput(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[CategoricalColumn] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&CategoricalColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(CategoricalColumn::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_strs_marks_empty_as_missing() {
        let col = CategoricalColumn::from_strs("a", &["x", "", "y", "x"]);
        assert_eq!(col.len(), 4);
        assert_eq!(col.missing_count(), 1);
        assert_eq!(col.values()[1], None);
        assert_eq!(col.levels(), vec!["x", "y"]);
    }

    #[test]
    fn dataset_lookup() {
        let ds = Dataset::new(vec![
            CategoricalColumn::from_strs("a", &["1", "2"]),
            CategoricalColumn::from_strs("b", &["x", "y"]),
        ])
        .unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.n_cols(), 2);
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert!(ds.column("b").is_some());
        assert!(ds.column("c").is_none());
    }

    #[test]
    fn empty_dataset() {
        let ds = Dataset::new(Vec::new()).unwrap();
        assert_eq!(ds.n_rows(), 0);
        assert_eq!(ds.n_cols(), 0);
    }

    #[test]
    fn ragged_columns_rejected() {
        let err = Dataset::new(vec![
            CategoricalColumn::from_strs("a", &["1", "2"]),
            CategoricalColumn::from_strs("b", &["x"]),
        ])
        .unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidInput(_)));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Dataset::new(vec![
            CategoricalColumn::from_strs("a", &["1"]),
            CategoricalColumn::from_strs("a", &["2"]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
