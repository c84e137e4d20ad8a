//! Shared primitives and traits for the crosstab workspace.
//!
//! `crosstab-core` provides the foundation the other crosstab crates build on:
//!
//! - **Error types** — [`CrosstabError`] and [`Result`] for structured error handling
//! - **Traits** — [`Scored`] and [`Summarizable`], implemented by test results
//!   and per-pair analyses

pub mod error;
pub mod traits;

pub use error::{CrosstabError, Result};
pub use traits::*;
