//! Analysis thresholds.

use crosstab_core::{CrosstabError, Result};

/// Thresholds controlling test selection and significance.
///
/// The defaults reproduce the conventional policy: Fisher's exact test for
/// 2×2 tables whose observed cells are all at least 5, a low-expected-frequency
/// warning below 5, Yates' correction for one degree of freedom, and a
/// significance level of 0.05.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Significance level; a pair is significant when `p < alpha`.
    pub alpha: f64,
    /// Minimum observed count every cell of a 2×2 table needs for Fisher's
    /// exact test to be chosen.
    pub fisher_min_count: u64,
    /// Expected frequency below which the chi-square result carries a
    /// validity warning.
    pub min_expected: f64,
    /// Apply Yates' continuity correction when the chi-square test has one
    /// degree of freedom.
    pub yates_correction: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            fisher_min_count: 5,
            min_expected: 5.0,
            yates_correction: true,
        }
    }
}

impl AnalysisConfig {
    /// Set the significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the minimum observed cell count for Fisher's exact test.
    pub fn with_fisher_min_count(mut self, count: u64) -> Self {
        self.fisher_min_count = count;
        self
    }

    /// Set the expected-frequency warning threshold.
    pub fn with_min_expected(mut self, min_expected: f64) -> Self {
        self.min_expected = min_expected;
        self
    }

    /// Enable or disable Yates' continuity correction.
    pub fn with_yates_correction(mut self, enabled: bool) -> Self {
        self.yates_correction = enabled;
        self
    }

    /// Check that all thresholds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CrosstabError::InvalidInput`] if `alpha` is outside `(0, 1)`
    /// or `min_expected` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(CrosstabError::InvalidInput(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.min_expected.is_finite() && self.min_expected > 0.0) {
            return Err(CrosstabError::InvalidInput(format!(
                "min_expected must be positive, got {}",
                self.min_expected
            )));
        }
        Ok(())
    }
}
