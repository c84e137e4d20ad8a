//! Pairwise analysis over a column selection.
//!
//! [`analyze`] is the entry point: it validates the selection, enumerates
//! every unordered pair with [`column_pairs`], runs [`analyze_pair`] on each
//! and collects the outcomes into an [`AnalysisReport`]. Errors confined to a
//! single pair are stored in that pair's entry and never abort the report.

use std::collections::HashSet;

use crosstab_core::{CrosstabError, Result, Scored, Summarizable};
use tracing::{debug, warn};

use crate::combinatorics::combinations;
use crate::config::AnalysisConfig;
use crate::contingency::{build, ContingencyTable};
use crate::dataset::Dataset;
use crate::testing::{select_and_run, TestResult};

// ── Pairs ──────────────────────────────────────────────────────────────────

/// Two distinct selected columns, `first` preceding `second` in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnPair {
    pub first: String,
    pub second: String,
}

impl ColumnPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl std::fmt::Display for ColumnPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.first, self.second)
    }
}

/// All unordered pairs of `selection`, outer loop over the earlier column.
///
/// # Example
///
/// ```
/// use crosstab_stats::report::column_pairs;
///
/// let pairs = column_pairs(&["a", "b", "c"]);
/// let names: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
/// assert_eq!(names, ["a x b", "a x c", "b x c"]);
/// ```
pub fn column_pairs<S: AsRef<str>>(selection: &[S]) -> Vec<ColumnPair> {
    combinations(selection.len(), 2)
        .map(|idx| ColumnPair::new(selection[idx[0]].as_ref(), selection[idx[1]].as_ref()))
        .collect()
}

// ── Per-pair outcome ───────────────────────────────────────────────────────

/// What happened when a pair was analysed.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// A test ran and produced a result.
    Computed(TestResult),
    /// No result; the pair failed with a pair-local error.
    Failed(CrosstabError),
}

/// Analysis of one column pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairAnalysis {
    pub pair: ColumnPair,
    /// The cross-tabulation, absent when it could not be built.
    pub table: Option<ContingencyTable>,
    pub outcome: PairOutcome,
    /// `p < alpha` on the unrounded p-value; `false` for failed pairs.
    pub is_significant: bool,
    /// Validity warnings, or the error message of a failed pair.
    pub warnings: Vec<String>,
}

impl PairAnalysis {
    fn computed(
        pair: ColumnPair,
        table: ContingencyTable,
        result: TestResult,
        warning: Option<String>,
        alpha: f64,
    ) -> Self {
        Self {
            pair,
            table: Some(table),
            is_significant: result.p_value() < alpha,
            outcome: PairOutcome::Computed(result),
            warnings: warning.into_iter().collect(),
        }
    }

    fn failed(pair: ColumnPair, table: Option<ContingencyTable>, error: CrosstabError) -> Self {
        Self {
            pair,
            table,
            is_significant: false,
            warnings: vec![error.to_string()],
            outcome: PairOutcome::Failed(error),
        }
    }

    /// The test result, if one was computed.
    pub fn result(&self) -> Option<&TestResult> {
        match &self.outcome {
            PairOutcome::Computed(r) => Some(r),
            PairOutcome::Failed(_) => None,
        }
    }

    /// The error, if the pair failed.
    pub fn error(&self) -> Option<&CrosstabError> {
        match &self.outcome {
            PairOutcome::Computed(_) => None,
            PairOutcome::Failed(e) => Some(e),
        }
    }

    /// The first warning, if any.
    pub fn validity_warning(&self) -> Option<&str> {
        self.warnings.first().map(String::as_str)
    }

    /// The p-value, if a result was computed.
    pub fn p_value(&self) -> Option<f64> {
        self.result().map(TestResult::p_value)
    }

    /// Whether a result was computed without any warning.
    pub fn is_clean(&self) -> bool {
        self.result().is_some() && self.warnings.is_empty()
    }
}

impl Summarizable for PairAnalysis {
    fn summary(&self) -> String {
        match &self.outcome {
            PairOutcome::Computed(r) => {
                let mut s = format!("{}: {}", self.pair, r.summary());
                if self.is_significant {
                    s.push_str(" [significant]");
                }
                if let Some(w) = self.validity_warning() {
                    s.push_str(&format!(" (warning: {w})"));
                }
                s
            }
            PairOutcome::Failed(e) => format!("{}: no result ({e})", self.pair),
        }
    }
}

impl Scored for PairAnalysis {
    /// The p-value, or 1.0 when no result was computed.
    fn score(&self) -> f64 {
        self.p_value().unwrap_or(1.0)
    }
}

// ── Report ─────────────────────────────────────────────────────────────────

/// Per-pair analyses in generation order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    analyses: Vec<PairAnalysis>,
    alpha: f64,
}

impl AnalysisReport {
    /// Number of analysed pairs.
    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    /// Whether the report has no pairs.
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Significance level the flags were computed with.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Analyses in generation order.
    pub fn analyses(&self) -> &[PairAnalysis] {
        &self.analyses
    }

    /// Iterate analyses in generation order.
    pub fn iter(&self) -> std::slice::Iter<'_, PairAnalysis> {
        self.analyses.iter()
    }

    /// Analysed pairs in generation order.
    pub fn pairs(&self) -> impl Iterator<Item = &ColumnPair> {
        self.analyses.iter().map(|a| &a.pair)
    }

    /// Pairs flagged significant, in generation order.
    pub fn significant(&self) -> impl Iterator<Item = &PairAnalysis> {
        self.analyses.iter().filter(|a| a.is_significant)
    }

    /// Pairs without a result, in generation order.
    pub fn failed(&self) -> impl Iterator<Item = &PairAnalysis> {
        self.analyses.iter().filter(|a| a.error().is_some())
    }

    /// Indices into [`analyses`](Self::analyses), significant pairs first.
    ///
    /// Generation order is kept within each group.
    pub fn significance_index(&self) -> Vec<usize> {
        let mut index: Vec<usize> = (0..self.analyses.len()).collect();
        index.sort_by_key(|&i| !self.analyses[i].is_significant);
        index
    }

    /// Analyses with significant pairs first, generation order kept otherwise.
    pub fn ordered_by_significance(&self) -> Vec<&PairAnalysis> {
        self.significance_index()
            .into_iter()
            .map(|i| &self.analyses[i])
            .collect()
    }

    pub fn into_analyses(self) -> Vec<PairAnalysis> {
        self.analyses
    }
}

impl<'a> IntoIterator for &'a AnalysisReport {
    type Item = &'a PairAnalysis;
    type IntoIter = std::slice::Iter<'a, PairAnalysis>;

    fn into_iter(self) -> Self::IntoIter {
        self.analyses.iter()
    }
}

// ── Aggregation ────────────────────────────────────────────────────────────

/// Run `analyze` once for every pair and collect the results in pair order.
///
/// With the `parallel` feature the pairs are analysed on the rayon thread
/// pool; the report is identical to the serial one.
pub fn aggregate<F>(pairs: &[ColumnPair], alpha: f64, analyze: F) -> AnalysisReport
where
    F: Fn(&ColumnPair) -> PairAnalysis + Sync,
{
    #[cfg(feature = "parallel")]
    let analyses = {
        use rayon::prelude::*;
        pairs.par_iter().map(&analyze).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let analyses = pairs.iter().map(&analyze).collect();

    AnalysisReport { analyses, alpha }
}

/// Cross-tabulate and test one pair of dataset columns.
///
/// Never fails: errors are recorded in the returned [`PairAnalysis`].
pub fn analyze_pair(dataset: &Dataset, pair: &ColumnPair, config: &AnalysisConfig) -> PairAnalysis {
    let (first, second) = match (dataset.column(&pair.first), dataset.column(&pair.second)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return PairAnalysis::failed(
                pair.clone(),
                None,
                CrosstabError::InvalidSelection(format!("{pair} refers to an unknown column")),
            )
        }
    };

    let table = match build(first.values(), second.values()) {
        Ok(t) => t,
        Err(e) => {
            warn!(pair = %pair, error = %e, "skipping pair");
            return PairAnalysis::failed(pair.clone(), None, e);
        }
    };

    match select_and_run(&table, config) {
        Ok((result, warning)) => {
            debug!(pair = %pair, test = result.method(), p_value = result.p_value(), "pair analysed");
            if let Some(w) = &warning {
                warn!(pair = %pair, "{w}");
            }
            PairAnalysis::computed(pair.clone(), table, result, warning, config.alpha)
        }
        Err(e) => {
            warn!(pair = %pair, error = %e, "no test result for pair");
            PairAnalysis::failed(pair.clone(), Some(table), e)
        }
    }
}

/// Check that every selected name is a distinct column of `dataset`.
///
/// # Errors
///
/// Returns [`CrosstabError::InvalidSelection`] naming the first unknown or
/// repeated column.
pub fn validate_selection<S: AsRef<str>>(dataset: &Dataset, selection: &[S]) -> Result<()> {
    let mut seen = HashSet::with_capacity(selection.len());
    for name in selection {
        let name = name.as_ref();
        if dataset.column(name).is_none() {
            return Err(CrosstabError::InvalidSelection(format!(
                "column '{name}' not found"
            )));
        }
        if !seen.insert(name) {
            return Err(CrosstabError::InvalidSelection(format!(
                "column '{name}' selected more than once"
            )));
        }
    }
    Ok(())
}

/// Analyse every unordered pair of the selected columns.
///
/// Selecting fewer than two columns yields an empty report.
///
/// # Errors
///
/// Returns [`CrosstabError::InvalidInput`] for an invalid `config` and
/// [`CrosstabError::InvalidSelection`] for an unknown or repeated column;
/// both are checked before any pair is analysed.
///
/// # Example
///
/// ```
/// use crosstab_stats::config::AnalysisConfig;
/// use crosstab_stats::dataset::{CategoricalColumn, Dataset};
/// use crosstab_stats::report::analyze;
///
/// let ds = Dataset::new(vec![
///     CategoricalColumn::from_strs("answer", &["Yes", "No", "Yes", "No"]),
///     CategoricalColumn::from_strs("group", &["A", "A", "B", "B"]),
/// ])
/// .unwrap();
///
/// let report = analyze(&ds, &["answer", "group"], &AnalysisConfig::default()).unwrap();
/// assert_eq!(report.len(), 1);
/// assert!(report.analyses()[0].validity_warning().is_some());
/// ```
pub fn analyze<S: AsRef<str>>(
    dataset: &Dataset,
    selection: &[S],
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    validate_selection(dataset, selection)?;

    let pairs = column_pairs(selection);
    debug!(columns = selection.len(), pairs = pairs.len(), "starting pairwise analysis");

    Ok(aggregate(&pairs, config.alpha, |pair| analyze_pair(dataset, pair, config)))
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CategoricalColumn;
    use crate::testing::TestKind;

    /// Route pair-level events to the test harness; set `RUST_LOG=debug` to see them.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn repeat(pattern: &[&str], times: usize) -> Vec<String> {
        pattern
            .iter()
            .cycle()
            .take(pattern.len() * times)
            .map(|s| s.to_string())
            .collect()
    }

    fn survey() -> Dataset {
        Dataset::new(vec![
            CategoricalColumn::from_strs("answer", &["Yes", "No", "Yes", "No"]),
            CategoricalColumn::from_strs("group", &["A", "A", "B", "B"]),
            CategoricalColumn::from_strs("empty", &["", "", "", ""]),
        ])
        .unwrap()
    }

    #[test]
    fn pairs_preserve_selection_order() {
        let pairs = column_pairs(&["c", "a", "b"]);
        assert_eq!(
            pairs,
            vec![
                ColumnPair::new("c", "a"),
                ColumnPair::new("c", "b"),
                ColumnPair::new("a", "b"),
            ]
        );
    }

    #[test]
    fn zero_and_one_column_selections_are_empty() {
        let ds = survey();
        let none: [&str; 0] = [];
        let report = analyze(&ds, &none, &AnalysisConfig::default()).unwrap();
        assert!(report.is_empty());
        let report = analyze(&ds, &["answer"], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn sparse_two_by_two_scenario() {
        init_tracing();
        let report = analyze(&survey(), &["answer", "group"], &AnalysisConfig::default()).unwrap();
        let pa = &report.analyses()[0];
        assert_eq!(pa.table.as_ref().unwrap().as_2x2(), Some([[1, 1], [1, 1]]));
        let result = pa.result().unwrap();
        assert_eq!(result.kind(), TestKind::ChiSquare);
        assert_eq!(result.degrees_of_freedom(), Some(1));
        assert_eq!(
            pa.validity_warning(),
            Some("chi-square test may be invalid due to expected frequency less than 5")
        );
        assert!(!pa.is_significant);
        assert!(!pa.is_clean());
    }

    #[test]
    fn failed_pair_does_not_abort_report() {
        init_tracing();
        let report = analyze(
            &survey(),
            &["answer", "empty", "group"],
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.len(), 3);

        let failed: Vec<_> = report.failed().map(|a| a.pair.to_string()).collect();
        assert_eq!(failed, ["answer x empty", "empty x group"]);
        for pa in report.failed() {
            assert!(pa.result().is_none());
            assert!(pa.table.is_none());
            assert!(matches!(pa.error(), Some(CrosstabError::Shape(_))));
            assert!(pa.validity_warning().unwrap().starts_with("shape error"));
            assert!(!pa.is_significant);
        }
        assert!(report.analyses()[2].result().is_none());
        assert!(report.analyses()[1].result().is_some());
    }

    #[test]
    fn unknown_column_aborts_up_front() {
        let err = analyze(&survey(), &["answer", "nope"], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidSelection(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn repeated_column_rejected() {
        let err = analyze(&survey(), &["answer", "answer"], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidSelection(_)));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = AnalysisConfig::default().with_alpha(2.0);
        assert!(matches!(
            analyze(&survey(), &["answer", "group"], &config),
            Err(CrosstabError::InvalidInput(_))
        ));
    }

    #[test]
    fn three_by_three_without_warning() {
        // 3 × 3 levels, 225 rows, 25 per cell → every expected count is 25.
        let a = repeat(&["x", "y", "z"], 75);
        let b: Vec<String> = (0..225).map(|i| ["p", "q", "r"][(i / 3) % 3].to_string()).collect();
        let ds = Dataset::new(vec![
            CategoricalColumn::from_strs("a", &a),
            CategoricalColumn::from_strs("b", &b),
        ])
        .unwrap();
        let report = analyze(&ds, &["a", "b"], &AnalysisConfig::default()).unwrap();
        let pa = &report.analyses()[0];
        let result = pa.result().unwrap();
        assert_eq!(result.kind(), TestKind::ChiSquare);
        assert_eq!(result.degrees_of_freedom(), Some(4));
        assert!(pa.warnings.is_empty());
        assert!(pa.is_clean());
    }

    #[test]
    fn strong_association_is_significant_and_ordered_first() {
        // "u" and "v" mirror each other; "noise" is independent of both.
        let u = repeat(&["a", "b"], 20);
        let noise = repeat(&["k", "k", "m", "m"], 10);
        let ds = Dataset::new(vec![
            CategoricalColumn::from_strs("noise", &noise),
            CategoricalColumn::from_strs("u", &u),
            CategoricalColumn::from_strs("v", &u),
        ])
        .unwrap();
        let report = analyze(&ds, &["noise", "u", "v"], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.len(), 3);

        let flags: Vec<bool> = report.iter().map(|a| a.is_significant).collect();
        assert_eq!(flags, [false, false, true]);

        // u x v is [[20, 0], [0, 20]]: a zero cell → chi-square branch.
        let uv = &report.analyses()[2];
        assert_eq!(uv.result().unwrap().kind(), TestKind::ChiSquare);

        assert_eq!(report.significance_index(), vec![2, 0, 1]);
        let ordered: Vec<String> = report
            .ordered_by_significance()
            .iter()
            .map(|a| a.pair.to_string())
            .collect();
        assert_eq!(ordered, ["u x v", "noise x u", "noise x v"]);
        assert_eq!(report.significant().count(), 1);
    }

    #[test]
    fn fisher_branch_through_dataset() {
        // [[12, 5], [7, 9]]
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (x, y, n) in [("r0", "c0", 12), ("r0", "c1", 5), ("r1", "c0", 7), ("r1", "c1", 9)] {
            for _ in 0..n {
                a.push(x);
                b.push(y);
            }
        }
        let ds = Dataset::new(vec![
            CategoricalColumn::from_strs("a", &a),
            CategoricalColumn::from_strs("b", &b),
        ])
        .unwrap();
        let report = analyze(&ds, &["a", "b"], &AnalysisConfig::default()).unwrap();
        let pa = &report.analyses()[0];
        assert_eq!(pa.result().unwrap().kind(), TestKind::Fisher);
        assert!(pa.is_clean());
        assert_eq!(pa.is_significant, pa.p_value().unwrap() < 0.05);
    }

    #[test]
    fn aggregate_calls_each_pair_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ds = survey();
        let pairs = column_pairs(&["answer", "group", "empty"]);
        let calls = AtomicUsize::new(0);
        let config = AnalysisConfig::default();
        let report = aggregate(&pairs, 0.05, |p| {
            calls.fetch_add(1, Ordering::SeqCst);
            analyze_pair(&ds, p, &config)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let got: Vec<&ColumnPair> = report.pairs().collect();
        let want: Vec<&ColumnPair> = pairs.iter().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn analyze_pair_unknown_column() {
        let pa = analyze_pair(
            &survey(),
            &ColumnPair::new("answer", "ghost"),
            &AnalysisConfig::default(),
        );
        assert!(matches!(pa.error(), Some(CrosstabError::InvalidSelection(_))));
    }

    #[test]
    fn summary_distinguishes_outcomes() {
        let report = analyze(&survey(), &["answer", "group", "empty"], &AnalysisConfig::default()).unwrap();
        let with_warning = report.analyses()[0].summary();
        assert!(with_warning.contains("warning:"));
        let failed = report.analyses()[1].summary();
        assert!(failed.contains("no result"));
        assert_eq!(report.analyses()[1].score(), 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::dataset::CategoricalColumn;
    use proptest::prelude::*;

    fn dataset(n_cols: usize) -> impl Strategy<Value = Dataset> {
        let cell = prop_oneof![
            1 => Just(String::new()),
            5 => proptest::sample::select(vec!["a", "b", "c"]).prop_map(String::from),
        ];
        (1usize..50).prop_flat_map(move |rows| {
            proptest::collection::vec(proptest::collection::vec(cell.clone(), rows), n_cols).prop_map(
                |cols| {
                    let cols = cols
                        .iter()
                        .enumerate()
                        .map(|(i, c)| CategoricalColumn::from_strs(format!("c{i}"), c))
                        .collect();
                    Dataset::new(cols).unwrap()
                },
            )
        })
    }

    proptest! {
        #[test]
        fn one_entry_per_pair_and_flag_consistency(ds in dataset(4)) {
            let names = ds.column_names();
            let report = analyze(&ds, &names, &AnalysisConfig::default()).unwrap();
            prop_assert_eq!(report.len(), 6);
            for pa in &report {
                match pa.p_value() {
                    Some(p) => prop_assert_eq!(pa.is_significant, p < 0.05),
                    None => prop_assert!(!pa.is_significant),
                }
            }
        }

        #[test]
        fn significance_index_is_stable_partition(ds in dataset(4)) {
            let names = ds.column_names();
            let report = analyze(&ds, &names, &AnalysisConfig::default()).unwrap();
            let index = report.significance_index();
            let flags: Vec<bool> = index.iter().map(|&i| report.analyses()[i].is_significant).collect();
            prop_assert!(flags.windows(2).all(|w| w[0] || !w[1]));
            let sig: Vec<usize> = index.iter().copied().filter(|&i| report.analyses()[i].is_significant).collect();
            let rest: Vec<usize> = index.iter().copied().filter(|&i| !report.analyses()[i].is_significant).collect();
            prop_assert!(sig.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(rest.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
