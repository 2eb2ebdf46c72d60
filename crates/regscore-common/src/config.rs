//! Scoring configuration.
//!
//! Users pick the statistic and the evidence thresholds via YAML/TOML config
//! or command line flags. Keys accept both `fc_thresh` and the dotted
//! `fc.thresh` spelling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegScoreError, Result};

/// Scoring run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Statistic: Quaternary, Ternary or Enrichment
    #[serde(default = "default_method")]
    pub method: String,

    /// Minimum absolute fold change, on the linear scale
    #[serde(default = "default_fc_thresh", alias = "fc.thresh")]
    pub fc_thresh: f64,

    /// Whether evidence fold changes are log2 values
    #[serde(default, alias = "is.Logfc")]
    pub is_logfc: bool,

    /// Maximum evidence p-value
    #[serde(default = "default_pval_thresh", alias = "pval.thresh")]
    pub pval_thresh: f64,
}

fn default_method() -> String { "Quaternary".to_string() }
fn default_fc_thresh() -> f64 { 1.3 }
fn default_pval_thresh() -> f64 { 0.05 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            fc_thresh: default_fc_thresh(),
            is_logfc: false,
            pval_thresh: default_pval_thresh(),
        }
    }
}

impl ScoringConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a `.yaml`/`.yml` or `.toml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(RegScoreError::Config(format!(
                "unsupported config file type: {}",
                path.display()
            ))),
        }
    }

    /// Check the numeric thresholds.
    pub fn validate(&self) -> Result<()> {
        if !self.fc_thresh.is_finite() || !self.pval_thresh.is_finite() {
            return Err(RegScoreError::Config(
                "fc_thresh and pval_thresh must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pval_thresh) {
            return Err(RegScoreError::Config(format!(
                "pval_thresh must be in [0, 1], got {}",
                self.pval_thresh
            )));
        }
        if self.is_logfc && self.fc_thresh <= 0.0 {
            return Err(RegScoreError::Config(format!(
                "fc_thresh must be positive when fold changes are log2, got {}",
                self.fc_thresh
            )));
        }
        if self.fc_thresh < 0.0 {
            return Err(RegScoreError::Config(format!(
                "fc_thresh must not be negative, got {}",
                self.fc_thresh
            )));
        }
        Ok(())
    }

    /// Fold-change cutoff on the scale of the evidence values.
    pub fn effective_fc_thresh(&self) -> f64 {
        if self.is_logfc {
            self.fc_thresh.log2()
        } else {
            self.fc_thresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.method, "Quaternary");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_yaml_accepts_dotted_keys() {
        let cfg = ScoringConfig::from_yaml_str(
            "method: Ternary\nfc.thresh: 2.0\nis.Logfc: true\npval.thresh: 0.01\n",
        )
        .unwrap();
        assert_eq!(cfg.method, "Ternary");
        assert!(cfg.is_logfc);
        assert!((cfg.effective_fc_thresh() - 1.0).abs() < 1e-12);
        assert!((cfg.pval_thresh - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_toml_fills_defaults() {
        let cfg = ScoringConfig::from_toml_str("method = \"Enrichment\"\n").unwrap();
        assert_eq!(cfg.method, "Enrichment");
        assert!((cfg.fc_thresh - 1.3).abs() < 1e-12);
        assert!(!cfg.is_logfc);
    }

    #[test]
    fn test_linear_threshold_unchanged() {
        let cfg = ScoringConfig { fc_thresh: 1.3, ..Default::default() };
        assert!((cfg.effective_fc_thresh() - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let cfg = ScoringConfig { pval_thresh: 1.5, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(RegScoreError::Config(_))));

        let cfg = ScoringConfig { fc_thresh: 0.0, is_logfc: true, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(RegScoreError::Config(_))));

        let cfg = ScoringConfig { fc_thresh: f64::NAN, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(RegScoreError::Config(_))));
    }
}
