//! Independence tests for contingency tables.
//!
//! Provides [`fisher_exact`] for 2×2 tables, [`chi_squared_independence`] for
//! r×c tables, and [`select_and_run`], which picks between them.
//!
//! Selection policy, applied in this order:
//!
//! 1. Expected frequencies are computed once (a degenerate table fails here).
//! 2. A 2×2 table whose observed cells are all at least
//!    [`AnalysisConfig::fisher_min_count`] gets Fisher's exact test.
//! 3. Every other table gets the chi-square test, with a validity warning when
//!    any expected count is below [`AnalysisConfig::min_expected`].

use crosstab_core::{CrosstabError, Result, Scored, Summarizable};
use tracing::debug;

use crate::combinatorics::ln_binomial;
use crate::config::AnalysisConfig;
use crate::contingency::{ContingencyTable, ExpectedFrequencies};
use crate::distribution::{ChiSquared, Distribution};

/// Which test produced a [`TestResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestKind {
    /// Fisher's exact test.
    Fisher,
    /// Pearson's chi-square test of independence.
    ChiSquare,
}

/// Outcome of an independence test. Values are never rounded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "test", rename_all = "snake_case"))]
pub enum TestResult {
    /// Fisher's exact test on a 2×2 table.
    Fisher {
        /// Sample odds ratio `(a·d) / (b·c)`.
        odds_ratio: f64,
        /// Two-sided exact p-value.
        p_value: f64,
    },
    /// Chi-square test of independence on an r×c table.
    ChiSquare {
        /// Pearson's χ² statistic.
        statistic: f64,
        /// Upper-tail p-value of χ²(dof).
        p_value: f64,
        /// `(rows - 1) × (cols - 1)`.
        degrees_of_freedom: usize,
        /// Expected counts under independence.
        expected: ExpectedFrequencies,
        /// Whether Yates' continuity correction was applied.
        yates_corrected: bool,
    },
}

impl TestResult {
    /// The p-value.
    pub fn p_value(&self) -> f64 {
        match self {
            Self::Fisher { p_value, .. } | Self::ChiSquare { p_value, .. } => *p_value,
        }
    }

    /// The test statistic: the odds ratio for Fisher, χ² for chi-square.
    pub fn statistic(&self) -> f64 {
        match self {
            Self::Fisher { odds_ratio, .. } => *odds_ratio,
            Self::ChiSquare { statistic, .. } => *statistic,
        }
    }

    /// Degrees of freedom, if applicable.
    pub fn degrees_of_freedom(&self) -> Option<usize> {
        match self {
            Self::Fisher { .. } => None,
            Self::ChiSquare {
                degrees_of_freedom, ..
            } => Some(*degrees_of_freedom),
        }
    }

    /// Expected frequencies, if the chi-square test was run.
    pub fn expected(&self) -> Option<&ExpectedFrequencies> {
        match self {
            Self::Fisher { .. } => None,
            Self::ChiSquare { expected, .. } => Some(expected),
        }
    }

    /// Which test this is.
    pub fn kind(&self) -> TestKind {
        match self {
            Self::Fisher { .. } => TestKind::Fisher,
            Self::ChiSquare { .. } => TestKind::ChiSquare,
        }
    }

    /// Human-readable name of the test.
    pub fn method(&self) -> &'static str {
        match self.kind() {
            TestKind::Fisher => "Fisher's exact test",
            TestKind::ChiSquare => "Chi-square test",
        }
    }
}

impl Scored for TestResult {
    fn score(&self) -> f64 {
        self.p_value()
    }
}

impl Summarizable for TestResult {
    fn summary(&self) -> String {
        match self.degrees_of_freedom() {
            Some(df) => format!(
                "{}: statistic={:.4}, df={}, p={:.6}",
                self.method(),
                self.statistic(),
                df,
                self.p_value(),
            ),
            None => format!(
                "{}: statistic={:.4}, p={:.6}",
                self.method(),
                self.statistic(),
                self.p_value(),
            ),
        }
    }
}

// ── Fisher's exact test (2×2) ─────────────────────────────────────────────

/// Relative tolerance when comparing table probabilities against the
/// observed one, so that ties lost to rounding still count as "as extreme".
const FISHER_RTOL: f64 = 1e-7;

/// Fisher's exact test for a 2×2 contingency table.
///
/// The table is specified as `[[a, b], [c, d]]`. The odds ratio is the sample
/// odds ratio `(a·d) / (b·c)`: infinite when only `b·c` is zero, NaN when both
/// products are. The two-sided p-value sums the hypergeometric probabilities
/// of every table with the same margins that is no more likely than the
/// observed one. A table with an empty margin has odds ratio NaN and p = 1.
///
/// # Errors
///
/// Returns [`CrosstabError::DegenerateTable`] if the table is all zeros.
///
/// # Example
///
/// ```
/// use crosstab_stats::testing::fisher_exact;
///
/// let result = fisher_exact(&[[8, 2], [1, 5]]).unwrap();
/// assert!((result.statistic() - 20.0).abs() < 1e-12);
/// assert!((result.p_value() - 0.034965).abs() < 1e-5);
/// ```
pub fn fisher_exact(table: &[[u64; 2]; 2]) -> Result<TestResult> {
    let [[a, b], [c, d]] = *table;
    let n = a + b + c + d;

    if n == 0 {
        return Err(CrosstabError::DegenerateTable(
            "fisher_exact: table is all zeros".into(),
        ));
    }

    let row1 = a + b;
    let col1 = a + c;
    if row1 == 0 || row1 == n || col1 == 0 || col1 == n {
        return Ok(TestResult::Fisher {
            odds_ratio: f64::NAN,
            p_value: 1.0,
        });
    }

    let p_observed = hypergeometric_pmf(a, row1, col1, n)?;
    let threshold = p_observed * (1.0 + FISHER_RTOL);

    // Two-tailed: sum probabilities of tables as or more extreme than observed
    let min_a = (row1 + col1).saturating_sub(n);
    let max_a = row1.min(col1);

    let mut p_value = 0.0;
    for k in min_a..=max_a {
        let p_k = hypergeometric_pmf(k, row1, col1, n)?;
        if p_k <= threshold {
            p_value += p_k;
        }
    }

    Ok(TestResult::Fisher {
        odds_ratio: odds_ratio(a, b, c, d),
        p_value: p_value.min(1.0),
    })
}

fn odds_ratio(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let num = a as f64 * d as f64;
    let den = b as f64 * c as f64;
    if den > 0.0 {
        num / den
    } else if num > 0.0 {
        f64::INFINITY
    } else {
        f64::NAN
    }
}

/// Hypergeometric PMF: P(X = k) where X ~ Hypergeometric(N, K, n).
///
/// Probability of drawing exactly `k` successes from a population of `total`
/// containing `success_pop` successes, in a sample of size `sample_size`.
fn hypergeometric_pmf(k: u64, sample_size: u64, success_pop: u64, total: u64) -> Result<f64> {
    // P = C(K,k) * C(N-K, n-k) / C(N, n), in log-space to avoid overflow.
    let log_p = ln_binomial(success_pop, k)?
        + ln_binomial(total - success_pop, sample_size - k)?
        - ln_binomial(total, sample_size)?;
    Ok(log_p.exp())
}

// ── Chi-squared test of independence ──────────────────────────────────────

/// Chi-squared test of independence for an r×c contingency table.
///
/// `expected` must come from [`ContingencyTable::expected_frequencies`] on the
/// same table. Uses Pearson's statistic χ² = Σ (O − E)² / E. With one degree
/// of freedom and `yates_correction` set, each |O − E| is first reduced by
/// `min(0.5, |O − E|)`. A table with a single row or column has zero degrees
/// of freedom; its statistic is 0 and its p-value 1.
///
/// # Errors
///
/// Returns [`CrosstabError::Shape`] if `expected` does not match the table's
/// shape.
pub fn chi_squared_independence(
    table: &ContingencyTable,
    expected: &ExpectedFrequencies,
    yates_correction: bool,
) -> Result<TestResult> {
    let (nrows, ncols) = table.shape();
    if (expected.nrows(), expected.ncols()) != (nrows, ncols) {
        return Err(CrosstabError::Shape(format!(
            "expected frequencies are {}×{}, table is {}×{}",
            expected.nrows(),
            expected.ncols(),
            nrows,
            ncols
        )));
    }

    let dof = (nrows - 1) * (ncols - 1);
    if dof == 0 {
        return Ok(TestResult::ChiSquare {
            statistic: 0.0,
            p_value: 1.0,
            degrees_of_freedom: 0,
            expected: expected.clone(),
            yates_corrected: false,
        });
    }

    let corrected = yates_correction && dof == 1;
    let statistic: f64 = table
        .counts()
        .iter()
        .zip(expected.values())
        .map(|(&o, &e)| {
            let mut diff = (o as f64 - e).abs();
            if corrected {
                diff -= diff.min(0.5);
            }
            diff * diff / e
        })
        .sum();

    let p_value = ChiSquared::new(dof as f64)?.sf(statistic);

    Ok(TestResult::ChiSquare {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
        degrees_of_freedom: dof,
        expected: expected.clone(),
        yates_corrected: corrected,
    })
}

// ── Test selection ─────────────────────────────────────────────────────────

/// Warning attached to a chi-square result with a low expected count.
pub fn low_expected_warning(min_expected: f64) -> String {
    format!("chi-square test may be invalid due to expected frequency less than {min_expected}")
}

/// Choose and run the appropriate independence test for `table`.
///
/// Returns the result together with an optional validity warning; a warning
/// never suppresses the result.
///
/// # Errors
///
/// Returns [`CrosstabError::DegenerateTable`] if expected frequencies are
/// undefined for the table.
///
/// # Example
///
/// ```
/// use crosstab_stats::config::AnalysisConfig;
/// use crosstab_stats::contingency::build;
/// use crosstab_stats::testing::{select_and_run, TestKind};
///
/// let a = [Some("Yes"), Some("No"), Some("Yes"), Some("No")];
/// let b = [Some("A"), Some("A"), Some("B"), Some("B")];
/// let table = build(&a, &b).unwrap();
///
/// let (result, warning) = select_and_run(&table, &AnalysisConfig::default()).unwrap();
/// assert_eq!(result.kind(), TestKind::ChiSquare);
/// assert_eq!(result.degrees_of_freedom(), Some(1));
/// assert!(warning.is_some());
/// ```
pub fn select_and_run(
    table: &ContingencyTable,
    config: &AnalysisConfig,
) -> Result<(TestResult, Option<String>)> {
    let expected = table.expected_frequencies()?;
    let (nrows, ncols) = table.shape();

    if let Some(cells) = table.as_2x2() {
        if table.min_count() >= config.fisher_min_count {
            debug!(nrows, ncols, "running Fisher's exact test");
            return Ok((fisher_exact(&cells)?, None));
        }
    }

    debug!(nrows, ncols, min_expected = expected.min(), "running chi-square test");
    let result = chi_squared_independence(table, &expected, config.yates_correction)?;
    let warning = expected
        .any_below(config.min_expected)
        .then(|| low_expected_warning(config.min_expected));

    Ok((result, warning))
}

// ── Tests ──────────────────────────────────────────────────────────────────
