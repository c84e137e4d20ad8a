//! Pairwise association analysis for categorical columns.
//!
//! Given a [`Dataset`] and an ordered selection of its columns, every
//! unordered pair of selected columns is cross-tabulated and tested for
//! independence:
//!
//! - **Contingency tables** — [`contingency::build`] counts joint occurrences,
//!   skipping rows with a missing value
//! - **Test selection** — [`testing::select_and_run`] runs Fisher's exact test
//!   on well-populated 2×2 tables and the chi-square test otherwise, warning
//!   when expected counts are low
//! - **Reports** — [`report::analyze`] collects one [`PairAnalysis`] per pair
//!   and flags significant associations
//! - **Rendering** — [`render::render_report`] formats a report as plain text
//!
//! # Quick start
//!
//! ```
//! use crosstab_stats::{analyze, AnalysisConfig, CategoricalColumn, Dataset};
//!
//! let ds = Dataset::new(vec![
//!     CategoricalColumn::from_strs("smoker", &["yes", "no", "no", "yes", "no"]),
//!     CategoricalColumn::from_strs("sex", &["f", "m", "f", "", "m"]),
//!     CategoricalColumn::from_strs("region", &["n", "s", "s", "n", "e"]),
//! ])
//! .unwrap();
//!
//! let report = analyze(&ds, &["smoker", "sex", "region"], &AnalysisConfig::default()).unwrap();
//! assert_eq!(report.len(), 3);
//! // smoker × sex skips the row with a missing sex.
//! assert_eq!(report.analyses()[0].table.as_ref().unwrap().total(), 4);
//! ```

pub mod combinatorics;
pub mod config;
pub mod contingency;
pub mod dataset;
pub mod distribution;
pub mod render;
pub mod report;
pub mod testing;

pub use config::AnalysisConfig;
pub use contingency::{ContingencyTable, ExpectedFrequencies};
pub use dataset::{CategoricalColumn, Dataset};
pub use render::render_report;
pub use report::{
    aggregate, analyze, analyze_pair, column_pairs, AnalysisReport, ColumnPair, PairAnalysis,
    PairOutcome,
};
pub use testing::{chi_squared_independence, fisher_exact, select_and_run, TestKind, TestResult};
