//! Core trait definitions for the crosstab workspace.
//!
//! These traits define the contracts that result types implement across crates.

/// A type that carries a numeric score (p-value, statistic, etc.).
pub trait Scored {
    /// The score value.
    fn score(&self) -> f64;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
