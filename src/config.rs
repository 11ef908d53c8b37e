//! Planner configuration file.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! standard planner. Files ending in `.toml` are read as TOML, anything else
//! as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assembler::QualityRules;
use crate::batch::BatchSettings;
use crate::brands::BrandResolver;
use crate::budget::BudgetPolicy;
use crate::classifier::{DEFAULT_KEYWORD_WEIGHT, MAX_KEYWORD_WEIGHT};
use crate::error::SurveyError;
use crate::generator::DEFAULT_MODEL;

fn default_keyword_weight() -> u32 {
    DEFAULT_KEYWORD_WEIGHT
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// OpenRouter model id used for batches, completion and brand lookup.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: u32,
    /// Ask the model for brands before using the static table.
    #[serde(default = "default_true")]
    pub brand_lookup: bool,
    #[serde(default)]
    pub budget: BudgetPolicy,
    #[serde(default)]
    pub brands: BrandResolver,
    #[serde(default)]
    pub batches: BatchSettings,
    #[serde(default)]
    pub quality: QualityRules,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            keyword_weight: default_keyword_weight(),
            brand_lookup: true,
            budget: BudgetPolicy::default(),
            brands: BrandResolver::default(),
            batches: BatchSettings::default(),
            quality: QualityRules::default(),
        }
    }
}

impl SurveyConfig {
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.model.trim().is_empty() {
            return Err(SurveyError::config("model must not be empty"));
        }
        if !(1..=MAX_KEYWORD_WEIGHT).contains(&self.keyword_weight) {
            return Err(SurveyError::config(format!(
                "keyword_weight must be between 1 and {MAX_KEYWORD_WEIGHT}"
            )));
        }
        self.budget
            .validate()
            .map_err(|e| SurveyError::config(format!("budget: {e}")))?;
        self.brands
            .validate()
            .map_err(|e| SurveyError::config(format!("brands: {e}")))?;
        self.batches
            .validate()
            .map_err(|e| SurveyError::config(format!("batches: {e}")))?;
        Ok(())
    }

    pub fn from_json(raw: &str) -> Result<Self, SurveyError> {
        serde_json::from_str(raw).map_err(|e| SurveyError::config(format!("invalid JSON: {e}")))
    }

    pub fn from_toml(raw: &str) -> Result<Self, SurveyError> {
        toml::from_str(raw).map_err(|e| SurveyError::config(format!("invalid TOML: {e}")))
    }
}

/// Read, parse and validate a config file.
pub fn load_config(path: &Path) -> Result<SurveyConfig, SurveyError> {
    let raw = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let config = if is_toml {
        SurveyConfig::from_toml(&raw)?
    } else {
        SurveyConfig::from_json(&raw)?
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn oversized_numbers_fail_validation() {
        let config = SurveyConfig::from_json(r#"{"keyword_weight": 4294967295}"#).unwrap();
        assert!(config.validate().is_err());

        let config = SurveyConfig::from_json(r#"{"budget": {"core_multiplier": 1e9}}"#).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("core_multiplier"), "{err}");
    }

    #[test]
    fn empty_documents_give_defaults() {
        assert_eq!(SurveyConfig::from_json("{}").unwrap(), SurveyConfig::default());
        assert_eq!(SurveyConfig::from_toml("").unwrap(), SurveyConfig::default());
    }

    #[test]
    fn toml_file_overrides_nested_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "model = \"test/model\"\n\n[budget]\ncore_multiplier = 2.0\n\n[quality]\nmin_fraud_checks = 3\nrequire_nps_pair = false"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.model, "test/model");
        assert_eq!(config.budget.core_multiplier, 2.0);
        assert_eq!(config.budget.screener_floor, 5);
        assert_eq!(config.quality.min_fraud_checks, 3);
        assert!(!config.quality.require_nps_pair);
        assert!(config.quality.repair_numbering);
    }

    #[test]
    fn json_file_is_validated() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"batches": {{"temperature": 1.5}}}}"#).unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, SurveyError::Config(_)), "{err}");
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let err = load_config(Path::new("/nonexistent/survey.toml")).unwrap_err();
        assert!(matches!(err, SurveyError::Io(_)));
    }
}
