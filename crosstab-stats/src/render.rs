//! Plain-text rendering of analysis reports.
//!
//! Numbers are rounded to four decimals here and only here; the report itself
//! keeps full precision.

use std::fmt::Write;

use crate::contingency::{ContingencyTable, ExpectedFrequencies};
use crate::report::{AnalysisReport, PairAnalysis, PairOutcome};
use crate::testing::TestResult;

/// Decimals shown for statistics and p-values.
pub const DISPLAY_DECIMALS: usize = 4;

/// Format a value with [`DISPLAY_DECIMALS`] decimals.
pub fn format_value(x: f64) -> String {
    format!("{x:.prec$}", prec = DISPLAY_DECIMALS)
}

/// Render observed counts, followed by `Expected_<label>` columns when
/// `expected` is given.
///
/// `corner` labels the row-label column.
pub fn render_table(
    table: &ContingencyTable,
    expected: Option<&ExpectedFrequencies>,
    corner: &str,
) -> String {
    let mut header: Vec<String> = vec![corner.to_string()];
    header.extend(table.col_labels().iter().cloned());
    if expected.is_some() {
        header.extend(table.col_labels().iter().map(|l| format!("Expected_{l}")));
    }

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.nrows());
    for (i, counts) in table.rows().enumerate() {
        let mut row = vec![table.row_labels()[i].clone()];
        row.extend(counts.iter().map(u64::to_string));
        if let Some(exp) = expected {
            row.extend((0..exp.ncols()).map(|j| format_value(exp.get(i, j))));
        }
        rows.push(row);
    }

    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            rows.iter()
                .map(|r| r[c].chars().count())
                .chain(std::iter::once(header[c].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                if c == 0 {
                    format!("{cell:<w$}", w = widths[c])
                } else {
                    format!("{cell:>w$}", w = widths[c])
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
    out
}

/// One-line description of a test result, values rounded for display.
pub fn render_result(result: &TestResult) -> String {
    match result {
        TestResult::Fisher {
            odds_ratio,
            p_value,
        } => format!(
            "Fisher's exact test statistic: {}, p-value: {}",
            format_value(*odds_ratio),
            format_value(*p_value)
        ),
        TestResult::ChiSquare {
            statistic,
            p_value,
            degrees_of_freedom,
            ..
        } => format!(
            "Chi-square test statistic: {}, p-value: {}, dof: {}",
            format_value(*statistic),
            format_value(*p_value),
            degrees_of_freedom
        ),
    }
}

/// Render the section for one pair.
pub fn render_pair(analysis: &PairAnalysis) -> String {
    let pair = &analysis.pair;
    let mut out = format!("Cross-tabulation of {} and {}\n", pair.first, pair.second);

    if let Some(table) = &analysis.table {
        let expected = analysis.result().and_then(TestResult::expected);
        out.push_str(&render_table(table, expected, &pair.first));
    }

    match &analysis.outcome {
        PairOutcome::Computed(result) => {
            for w in &analysis.warnings {
                let _ = writeln!(out, "Warning: {w}");
            }
            let _ = writeln!(out, "{}", render_result(result));
            if analysis.is_significant {
                out.push_str("Significant\n");
            }
        }
        PairOutcome::Failed(e) => {
            let _ = writeln!(out, "No result: {e}");
        }
    }
    out
}

/// Render every pair in generation order, followed by an index of all pairs
/// with significant ones marked `*`.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::from("Cross-tabulations\n\n");
    if report.is_empty() {
        out.push_str("Select at least two columns to cross-tabulate.\n");
        return out;
    }

    for analysis in report {
        out.push_str(&render_pair(analysis));
        out.push('\n');
    }

    out.push_str("Index\n");
    for i in report.significance_index() {
        let analysis = &report.analyses()[i];
        let marker = if analysis.is_significant { " *" } else { "" };
        let _ = writeln!(out, "{}{}", analysis.pair, marker);
    }
    out
}
