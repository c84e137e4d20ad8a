//! WASM bindings for the crosstab workspace.
//!
//! This crate provides in-memory, JSON-based wrappers around
//! `crosstab-stats`, designed for presentation layers that cannot link Rust
//! types directly (browsers, sandboxed workers, other languages). Every public
//! function accepts `&str` JSON and returns a JSON `String`:
//!
//! - Success: `{"ok": <value>}`
//! - Failure: `{"error": "<message>"}`
//!
//! `#[wasm_bindgen]` annotations are enabled by the `wasm` feature.
//!
//! # Example
//!
//! ```
//! let dataset = r#"{"smoker": ["yes", "no", "yes", "no"], "sex": ["f", "f", "m", "m"]}"#;
//! let json = crosstab_wasm::analyze_pairs(dataset, r#"["smoker", "sex"]"#);
//! let v: serde_json::Value = serde_json::from_str(&json).unwrap();
//! assert_eq!(v["ok"]["pairs"].as_array().unwrap().len(), 1);
//! ```

pub mod error;
pub mod stats;

/// Crate version (set from Cargo.toml at compile time).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use stats::{
    analyze_pairs, analyze_pairs_with_config, crosstab, render_pairs, select_test,
    JsAnalysisReport, JsContingencyTable, JsPairAnalysis, JsTestSelection,
};
