//! Pairwise analysis wrappers with JSON input/output.
//!
//! [`PairAnalysis`] and [`AnalysisReport`] carry a [`CrosstabError`] and do
//! not derive `Serialize`, so we provide thin wrappers (`Js*` types) that
//! mirror their fields and add `#[derive(Serialize)]`.
//!
//! Datasets are accepted in two shapes:
//!
//! - a list of columns: `[{"name": "a", "values": ["x", null, "y"]}, ...]`
//! - an object of columns: `{"a": ["x", null, "y"], "b": [...]}`
//!
//! Cells may be strings, numbers, booleans or `null`. Numbers and booleans are
//! treated as category labels; `null` and the empty string are missing.
//!
//! [`CrosstabError`]: crosstab_core::CrosstabError

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crosstab_stats::config::AnalysisConfig;
use crosstab_stats::contingency::{self, ContingencyTable};
use crosstab_stats::dataset::{CategoricalColumn, Dataset};
use crosstab_stats::render;
use crosstab_stats::report::{self, AnalysisReport, PairAnalysis};
use crosstab_stats::testing::{self, TestResult};

use crate::error::{wasm_err, wasm_ok, wasm_result};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

// ── Wrapper types ────────────────────────────────────────────────────────

/// Serializable contingency table with nested rows.
#[derive(Debug, Serialize)]
pub struct JsContingencyTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub counts: Vec<Vec<u64>>,
    pub total: u64,
}

impl From<&ContingencyTable> for JsContingencyTable {
    fn from(t: &ContingencyTable) -> Self {
        Self {
            row_labels: t.row_labels().to_vec(),
            col_labels: t.col_labels().to_vec(),
            counts: t.rows().map(<[u64]>::to_vec).collect(),
            total: t.total(),
        }
    }
}

/// Serializable mirror of [`PairAnalysis`].
#[derive(Debug, Serialize)]
pub struct JsPairAnalysis {
    pub first: String,
    pub second: String,
    pub table: Option<JsContingencyTable>,
    pub result: Option<TestResult>,
    pub is_significant: bool,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl From<&PairAnalysis> for JsPairAnalysis {
    fn from(a: &PairAnalysis) -> Self {
        Self {
            first: a.pair.first.clone(),
            second: a.pair.second.clone(),
            table: a.table.as_ref().map(JsContingencyTable::from),
            result: a.result().cloned(),
            is_significant: a.is_significant,
            warnings: a.warnings.clone(),
            error: a.error().map(ToString::to_string),
        }
    }
}

/// Serializable mirror of [`AnalysisReport`].
#[derive(Debug, Serialize)]
pub struct JsAnalysisReport {
    pub alpha: f64,
    pub pairs: Vec<JsPairAnalysis>,
    /// Indices into `pairs`, significant pairs first.
    pub significance_index: Vec<usize>,
}

impl From<&AnalysisReport> for JsAnalysisReport {
    fn from(r: &AnalysisReport) -> Self {
        Self {
            alpha: r.alpha(),
            pairs: r.iter().map(JsPairAnalysis::from).collect(),
            significance_index: r.significance_index(),
        }
    }
}

/// Test outcome for a bare table.
#[derive(Debug, Serialize)]
pub struct JsTestSelection {
    pub result: TestResult,
    pub warning: Option<String>,
}

// ── JSON parsing ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct JsColumn {
    name: String,
    values: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsDataset {
    List(Vec<JsColumn>),
    Map(BTreeMap<String, Vec<Value>>),
}

fn cell_to_category(cell: &Value) -> Result<Option<String>, String> {
    match cell {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("unsupported cell value: {other}")),
    }
}

fn column_values(cells: &[Value]) -> Result<Vec<Option<String>>, String> {
    cells.iter().map(cell_to_category).collect()
}

fn parse_dataset(json: &str) -> Result<Dataset, String> {
    let parsed: JsDataset =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON dataset: {e}"))?;
    let columns = match parsed {
        JsDataset::List(cols) => cols
            .into_iter()
            .map(|c| Ok(CategoricalColumn::new(c.name, column_values(&c.values)?)))
            .collect::<Result<Vec<_>, String>>()?,
        JsDataset::Map(cols) => cols
            .into_iter()
            .map(|(name, cells)| Ok(CategoricalColumn::new(name, column_values(&cells)?)))
            .collect::<Result<Vec<_>, String>>()?,
    };
    Dataset::new(columns).map_err(|e| e.to_string())
}

fn parse_selection(json: &str) -> Result<Vec<String>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid JSON selection: {e}"))
}

fn parse_config(json: &str) -> Result<AnalysisConfig, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid JSON config: {e}"))
}

fn parse_cells(json: &str) -> Result<Vec<Option<String>>, String> {
    let cells: Vec<Value> =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON array: {e}"))?;
    column_values(&cells)
}

fn parse_counts(json: &str) -> Result<ContingencyTable, String> {
    let rows: Vec<Vec<u64>> =
        serde_json::from_str(json).map_err(|e| format!("invalid JSON table: {e}"))?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err("table rows must all have the same length".into());
    }
    let row_labels = (0..rows.len()).map(|i| i.to_string()).collect();
    let col_labels = (0..ncols).map(|j| j.to_string()).collect();
    ContingencyTable::from_counts(row_labels, col_labels, rows.concat()).map_err(|e| e.to_string())
}

fn run_analysis(
    dataset_json: &str,
    selection_json: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, String> {
    let dataset = parse_dataset(dataset_json)?;
    let selection = parse_selection(selection_json)?;
    report::analyze(&dataset, &selection, config).map_err(|e| e.to_string())
}

// ── JSON boundary functions ──────────────────────────────────────────────

/// Analyse every pair of selected columns with the default configuration.
///
/// Input: a dataset (see module docs) and `'["a", "b", "c"]'` —
/// Output: JSON `JsAnalysisReport`.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn analyze_pairs(dataset_json: &str, selection_json: &str) -> String {
    match run_analysis(dataset_json, selection_json, &AnalysisConfig::default()) {
        Ok(r) => wasm_ok(&JsAnalysisReport::from(&r)),
        Err(e) => wasm_err(e),
    }
}

/// Like [`analyze_pairs`] with a JSON `AnalysisConfig`; missing fields keep
/// their defaults.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn analyze_pairs_with_config(dataset_json: &str, selection_json: &str, config_json: &str) -> String {
    let config = match parse_config(config_json) {
        Ok(c) => c,
        Err(e) => return wasm_err(e),
    };
    match run_analysis(dataset_json, selection_json, &config) {
        Ok(r) => wasm_ok(&JsAnalysisReport::from(&r)),
        Err(e) => wasm_err(e),
    }
}

/// Plain-text rendering of the pairwise report, as a JSON string.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn render_pairs(dataset_json: &str, selection_json: &str) -> String {
    match run_analysis(dataset_json, selection_json, &AnalysisConfig::default()) {
        Ok(r) => wasm_ok(&render::render_report(&r)),
        Err(e) => wasm_err(e),
    }
}

/// Cross-tabulate two JSON arrays of category labels.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn crosstab(x_json: &str, y_json: &str) -> String {
    let x = match parse_cells(x_json) {
        Ok(d) => d,
        Err(e) => return wasm_err(e),
    };
    let y = match parse_cells(y_json) {
        Ok(d) => d,
        Err(e) => return wasm_err(e),
    };
    wasm_result(contingency::build(&x, &y).map(|t| JsContingencyTable::from(&t)))
}

/// Select and run the independence test for a JSON table of counts,
/// e.g. `"[[12, 5], [7, 9]]"`.
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub fn select_test(table_json: &str) -> String {
    let table = match parse_counts(table_json) {
        Ok(t) => t,
        Err(e) => return wasm_err(e),
    };
    wasm_result(
        testing::select_and_run(&table, &AnalysisConfig::default())
            .map(|(result, warning)| JsTestSelection { result, warning }),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────
