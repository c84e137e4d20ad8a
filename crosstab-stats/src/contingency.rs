//! Contingency tables (cross-tabulations) of two categorical columns.
//!
//! [`build`] counts every row where both columns are present. Row and column
//! labels are the sorted distinct values actually observed, so a table built
//! from data never contains an all-zero row or column. Tables assembled by
//! hand through [`ContingencyTable::from_counts`] may, and
//! [`ContingencyTable::expected_frequencies`] rejects them.

use std::collections::BTreeSet;

use crosstab_core::{CrosstabError, Result};

// ── Observed counts ────────────────────────────────────────────────────────

/// Row-major table of joint frequency counts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    counts: Vec<u64>,
}

impl ContingencyTable {
    /// Assemble a table from labels and row-major counts.
    ///
    /// # Errors
    ///
    /// Returns [`CrosstabError::Shape`] if either label list is empty or
    /// `counts.len() != rows × cols`.
    pub fn from_counts(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        counts: Vec<u64>,
    ) -> Result<Self> {
        if row_labels.is_empty() || col_labels.is_empty() {
            return Err(CrosstabError::Shape(
                "contingency table needs at least one row and one column".into(),
            ));
        }
        if counts.len() != row_labels.len() * col_labels.len() {
            return Err(CrosstabError::Shape(format!(
                "expected {}×{} = {} counts, got {}",
                row_labels.len(),
                col_labels.len(),
                row_labels.len() * col_labels.len(),
                counts.len()
            )));
        }
        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Row labels (observed values of the first column).
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column labels (observed values of the second column).
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Row-major counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.col_labels.len()
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Count at row `i`, column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    pub fn get(&self, i: usize, j: usize) -> u64 {
        assert!(i < self.nrows() && j < self.ncols(), "cell ({i}, {j}) out of range");
        self.counts[i * self.ncols() + j]
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.counts.chunks(self.ncols())
    }

    /// Per-row totals.
    pub fn row_totals(&self) -> Vec<u64> {
        self.rows().map(|r| r.iter().sum()).collect()
    }

    /// Per-column totals.
    pub fn col_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.ncols()];
        for row in self.rows() {
            for (t, &c) in totals.iter_mut().zip(row) {
                *t += c;
            }
        }
        totals
    }

    /// Grand total.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Whether the table is exactly 2×2.
    pub fn is_2x2(&self) -> bool {
        self.shape() == (2, 2)
    }

    /// The counts as `[[a, b], [c, d]]` when the table is 2×2.
    pub fn as_2x2(&self) -> Option<[[u64; 2]; 2]> {
        self.is_2x2().then(|| {
            [
                [self.counts[0], self.counts[1]],
                [self.counts[2], self.counts[3]],
            ]
        })
    }

    /// Smallest observed cell count.
    pub fn min_count(&self) -> u64 {
        self.counts.iter().copied().min().unwrap_or(0)
    }

    /// Expected counts under independence: `row_total × col_total / total`.
    ///
    /// # Errors
    ///
    /// Returns [`CrosstabError::DegenerateTable`] if the grand total is zero
    /// or any row or column total is zero.
    pub fn expected_frequencies(&self) -> Result<ExpectedFrequencies> {
        let total = self.total();
        if total == 0 {
            return Err(CrosstabError::DegenerateTable("all counts are zero".into()));
        }

        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        if let Some(i) = row_totals.iter().position(|&t| t == 0) {
            return Err(CrosstabError::DegenerateTable(format!(
                "row '{}' has no observations",
                self.row_labels[i]
            )));
        }
        if let Some(j) = col_totals.iter().position(|&t| t == 0) {
            return Err(CrosstabError::DegenerateTable(format!(
                "column '{}' has no observations",
                self.col_labels[j]
            )));
        }

        let total = total as f64;
        let values = row_totals
            .iter()
            .flat_map(|&r| col_totals.iter().map(move |&c| r as f64 * c as f64 / total))
            .collect();

        Ok(ExpectedFrequencies {
            nrows: self.nrows(),
            ncols: self.ncols(),
            values,
        })
    }
}

// ── Expected counts ────────────────────────────────────────────────────────

/// Table-shaped matrix of expected counts under independence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpectedFrequencies {
    nrows: usize,
    ncols: usize,
    values: Vec<f64>,
}

impl ExpectedFrequencies {
    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row-major expected counts.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Expected count at row `i`, column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.nrows && j < self.ncols, "cell ({i}, {j}) out of range");
        self.values[i * self.ncols + j]
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.ncols)
    }

    /// Smallest expected count.
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Whether any expected count is strictly below `threshold`.
    pub fn any_below(&self, threshold: f64) -> bool {
        self.values.iter().any(|&e| e < threshold)
    }
}

// ── Cross-tabulation ───────────────────────────────────────────────────────

/// Cross-tabulate two equal-length categorical columns.
///
/// Rows where either value is missing are skipped. Labels are the sorted
/// distinct values observed in the remaining rows.
///
/// # Errors
///
/// Returns [`CrosstabError::Shape`] if the columns differ in length or no row
/// has both values present.
///
/// # Example
///
/// ```
/// use crosstab_stats::contingency::build;
///
/// let a = [Some("Yes"), Some("No"), Some("Yes"), Some("No")];
/// let b = [Some("A"), Some("A"), Some("B"), Some("B")];
/// let table = build(&a, &b).unwrap();
/// assert_eq!(table.row_labels(), ["No", "Yes"]);
/// assert_eq!(table.counts(), [1, 1, 1, 1]);
/// ```
pub fn build<S: AsRef<str>>(column1: &[Option<S>], column2: &[Option<S>]) -> Result<ContingencyTable> {
    if column1.len() != column2.len() {
        return Err(CrosstabError::Shape(format!(
            "columns differ in length ({} vs {})",
            column1.len(),
            column2.len()
        )));
    }

    let observed: Vec<(&str, &str)> = column1
        .iter()
        .zip(column2)
        .filter_map(|(a, b)| Some((a.as_ref()?.as_ref(), b.as_ref()?.as_ref())))
        .collect();
    if observed.is_empty() {
        return Err(CrosstabError::Shape(
            "no rows with values present in both columns".into(),
        ));
    }

    let rows: Vec<&str> = observed
        .iter()
        .map(|&(a, _)| a)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cols: Vec<&str> = observed
        .iter()
        .map(|&(_, b)| b)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let ncols = cols.len();
    let mut counts = vec![0u64; rows.len() * ncols];
    for (a, b) in observed {
        // Both labels were collected from `observed`, so the searches succeed.
        if let (Ok(i), Ok(j)) = (rows.binary_search(&a), cols.binary_search(&b)) {
            counts[i * ncols + j] += 1;
        }
    }

    ContingencyTable::from_counts(
        rows.into_iter().map(str::to_string).collect(),
        cols.into_iter().map(str::to_string).collect(),
        counts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn build_two_by_two() {
        let a = [Some("Yes"), Some("No"), Some("Yes"), Some("No")];
        let b = [Some("A"), Some("A"), Some("B"), Some("B")];
        let table = build(&a, &b).unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.as_2x2(), Some([[1, 1], [1, 1]]));
        assert_eq!(table.col_labels(), ["A", "B"]);
    }

    #[test]
    fn build_skips_missing() {
        let a = [Some("x"), None, Some("y"), Some("x"), Some("y")];
        let b = [Some("p"), Some("q"), None, Some("q"), Some("p")];
        let table = build(&a, &b).unwrap();
        // Rows 1 and 2 are dropped.
        assert_eq!(table.total(), 3);
        assert_eq!(table.row_labels(), ["x", "y"]);
        assert_eq!(table.col_labels(), ["p", "q"]);
        assert_eq!(table.counts(), [1, 1, 1, 0]);
    }

    #[test]
    fn build_labels_only_from_filtered_rows() {
        // "z" appears only where the partner is missing.
        let a = [Some("x"), Some("z"), Some("y")];
        let b = [Some("p"), None, Some("p")];
        let table = build(&a, &b).unwrap();
        assert_eq!(table.row_labels(), ["x", "y"]);
        assert_eq!(table.shape(), (2, 1));
    }

    #[test]
    fn build_length_mismatch() {
        let a = [Some("x"), Some("y")];
        let b = [Some("p")];
        assert!(matches!(build(&a, &b), Err(CrosstabError::Shape(_))));
    }

    #[test]
    fn build_all_missing() {
        let a: [Option<&str>; 2] = [None, Some("x")];
        let b: [Option<&str>; 2] = [Some("p"), None];
        assert!(matches!(build(&a, &b), Err(CrosstabError::Shape(_))));
        let empty: [Option<&str>; 0] = [];
        assert!(build(&empty, &empty).is_err());
    }

    #[test]
    fn totals() {
        let table =
            ContingencyTable::from_counts(labels(&["a", "b"]), labels(&["x", "y", "z"]), vec![1, 2, 3, 4, 5, 6])
                .unwrap();
        assert_eq!(table.row_totals(), vec![6, 15]);
        assert_eq!(table.col_totals(), vec![5, 7, 9]);
        assert_eq!(table.total(), 21);
        assert_eq!(table.get(1, 2), 6);
        assert_eq!(table.min_count(), 1);
        assert!(!table.is_2x2());
        assert_eq!(table.as_2x2(), None);
    }

    #[test]
    fn from_counts_rejects_bad_shape() {
        assert!(ContingencyTable::from_counts(labels(&["a"]), labels(&["x", "y"]), vec![1]).is_err());
        assert!(ContingencyTable::from_counts(Vec::new(), labels(&["x"]), Vec::new()).is_err());
    }

    #[test]
    fn expected_frequencies_known() {
        let table =
            ContingencyTable::from_counts(labels(&["a", "b"]), labels(&["x", "y"]), vec![10, 20, 30, 40]).unwrap();
        let exp = table.expected_frequencies().unwrap();
        // Row totals 30, 70; column totals 40, 60; total 100.
        assert!((exp.get(0, 0) - 12.0).abs() < 1e-12);
        assert!((exp.get(0, 1) - 18.0).abs() < 1e-12);
        assert!((exp.get(1, 0) - 28.0).abs() < 1e-12);
        assert!((exp.get(1, 1) - 42.0).abs() < 1e-12);
        assert!((exp.min() - 12.0).abs() < 1e-12);
        assert!(!exp.any_below(5.0));
        assert!(exp.any_below(12.5));
    }

    #[test]
    fn expected_preserves_margins() {
        let table =
            ContingencyTable::from_counts(labels(&["a", "b"]), labels(&["x", "y", "z"]), vec![3, 0, 7, 2, 9, 1])
                .unwrap();
        let exp = table.expected_frequencies().unwrap();
        for (row, &total) in exp.rows().zip(&table.row_totals()) {
            assert!((row.iter().sum::<f64>() - total as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn expected_degenerate() {
        let zero = ContingencyTable::from_counts(labels(&["a"]), labels(&["x"]), vec![0]).unwrap();
        assert!(matches!(
            zero.expected_frequencies(),
            Err(CrosstabError::DegenerateTable(_))
        ));

        let empty_row =
            ContingencyTable::from_counts(labels(&["a", "b"]), labels(&["x", "y"]), vec![3, 4, 0, 0]).unwrap();
        let err = empty_row.expected_frequencies().unwrap_err();
        assert!(err.to_string().contains("row 'b'"));

        let empty_col =
            ContingencyTable::from_counts(labels(&["a", "b"]), labels(&["x", "y"]), vec![0, 4, 0, 2]).unwrap();
        let err = empty_col.expected_frequencies().unwrap_err();
        assert!(err.to_string().contains("column 'x'"));
    }
}
