//! Survey inputs.
//!
//! A [`SurveySpec`] is built once per generation run from the request file and
//! passed by reference through every planning stage. Nothing downstream
//! mutates it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Shortest and longest interview the planner accepts, in minutes.
pub const MIN_LOI_MINUTES: u32 = 5;
pub const MAX_LOI_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Methodology {
    #[default]
    Online,
    Phone,
    #[serde(rename = "Face-to-Face", alias = "face_to_face")]
    FaceToFace,
    #[serde(rename = "Mobile App", alias = "mobile_app")]
    MobileApp,
}

impl Methodology {
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Phone => "Phone",
            Self::FaceToFace => "Face-to-Face",
            Self::MobileApp => "Mobile App",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceContext {
    Desktop,
    Mobile,
    #[default]
    Mixed,
}

impl DeviceContext {
    pub fn label(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Mobile => "Mobile",
            Self::Mixed => "Mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatisticalMethod {
    Regression,
    Conjoint,
    #[serde(rename = "Cluster Analysis")]
    ClusterAnalysis,
    MaxDiff,
    #[serde(rename = "Factor Analysis")]
    FactorAnalysis,
    #[serde(rename = "TURF Analysis")]
    TurfAnalysis,
    #[serde(rename = "Discriminant Analysis")]
    DiscriminantAnalysis,
    #[serde(rename = "Correspondence Analysis")]
    CorrespondenceAnalysis,
    #[serde(rename = "Latent Class Analysis")]
    LatentClassAnalysis,
    #[serde(rename = "SEM")]
    Sem,
    #[serde(rename = "CHAID")]
    Chaid,
}

impl StatisticalMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Regression => "Regression",
            Self::Conjoint => "Conjoint",
            Self::ClusterAnalysis => "Cluster Analysis",
            Self::MaxDiff => "MaxDiff",
            Self::FactorAnalysis => "Factor Analysis",
            Self::TurfAnalysis => "TURF Analysis",
            Self::DiscriminantAnalysis => "Discriminant Analysis",
            Self::CorrespondenceAnalysis => "Correspondence Analysis",
            Self::LatentClassAnalysis => "Latent Class Analysis",
            Self::Sem => "SEM",
            Self::Chaid => "CHAID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionTypeTag {
    Likert,
    #[serde(rename = "Open-End")]
    OpenEnd,
    #[serde(rename = "Rating Scale")]
    RatingScale,
    #[serde(rename = "Matrix/Grid")]
    MatrixGrid,
    Dichotomous,
    Ranking,
    Slider,
}

impl QuestionTypeTag {
    pub fn label(self) -> &'static str {
        match self {
            Self::Likert => "Likert",
            Self::OpenEnd => "Open-End",
            Self::RatingScale => "Rating Scale",
            Self::MatrixGrid => "Matrix/Grid",
            Self::Dichotomous => "Dichotomous",
            Self::Ranking => "Ranking",
            Self::Slider => "Slider",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplianceTag {
    #[serde(rename = "GDPR")]
    Gdpr,
    #[serde(rename = "CCPA")]
    Ccpa,
    #[serde(rename = "HIPAA")]
    Hipaa,
    Other,
}

impl ComplianceTag {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gdpr => "GDPR",
            Self::Ccpa => "CCPA",
            Self::Hipaa => "HIPAA",
            Self::Other => "Other",
        }
    }
}

fn default_population() -> u32 {
    1000
}

fn default_loi() -> u32 {
    20
}

fn default_market() -> String {
    "India".into()
}

/// Immutable description of the survey to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySpec {
    pub objective: String,
    pub target_audience: String,
    #[serde(default = "default_population")]
    pub population_size: u32,
    /// Length of interview in minutes.
    #[serde(default = "default_loi")]
    pub loi_minutes: u32,
    #[serde(default)]
    pub methodology: Methodology,
    #[serde(default)]
    pub device_context: DeviceContext,
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default)]
    pub statistical_methods: BTreeSet<StatisticalMethod>,
    #[serde(default)]
    pub question_types: BTreeSet<QuestionTypeTag>,
    #[serde(default)]
    pub compliance: BTreeSet<ComplianceTag>,
}

impl SurveySpec {
    pub fn new(objective: impl Into<String>, target_audience: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            target_audience: target_audience.into(),
            population_size: default_population(),
            loi_minutes: default_loi(),
            methodology: Methodology::default(),
            device_context: DeviceContext::default(),
            market: default_market(),
            statistical_methods: BTreeSet::new(),
            question_types: BTreeSet::new(),
            compliance: BTreeSet::new(),
        }
    }

    pub fn loi(mut self, minutes: u32) -> Self {
        self.loi_minutes = minutes;
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    pub fn population(mut self, size: u32) -> Self {
        self.population_size = size;
        self
    }

    pub fn methodology(mut self, methodology: Methodology) -> Self {
        self.methodology = methodology;
        self
    }

    pub fn statistical_method(mut self, method: StatisticalMethod) -> Self {
        self.statistical_methods.insert(method);
        self
    }

    /// Reject specs that cannot start a generation run.
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.objective.trim().is_empty() {
            return Err(SurveyError::input("survey objective is required"));
        }
        if self.target_audience.trim().is_empty() {
            return Err(SurveyError::input("target audience is required"));
        }
        if self.population_size == 0 {
            return Err(SurveyError::input("population size must be positive"));
        }
        if !(MIN_LOI_MINUTES..=MAX_LOI_MINUTES).contains(&self.loi_minutes) {
            return Err(SurveyError::input(format!(
                "LOI must be between {MIN_LOI_MINUTES} and {MAX_LOI_MINUTES} minutes, got {}",
                self.loi_minutes
            )));
        }
        if self.market.trim().is_empty() {
            return Err(SurveyError::input("market is required"));
        }
        Ok(())
    }

    pub(crate) fn statistical_method_labels(&self) -> Vec<&'static str> {
        self.statistical_methods.iter().map(|m| m.label()).collect()
    }

    pub(crate) fn question_type_labels(&self) -> Vec<&'static str> {
        self.question_types.iter().map(|t| t.label()).collect()
    }

    pub(crate) fn compliance_labels(&self) -> Vec<&'static str> {
        self.compliance.iter().map(|c| c.label()).collect()
    }
}

impl fmt::Display for SurveySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objective: {}", self.objective)?;
        writeln!(f, "Target Audience: {}", self.target_audience)?;
        writeln!(f, "Population Size: {}", self.population_size)?;
        writeln!(f, "Survey LOI: {} minutes", self.loi_minutes)?;
        writeln!(f, "Methodology: {}", self.methodology.label())?;
        writeln!(f, "Device Context: {}", self.device_context.label())?;
        write!(f, "Market: {}", self.market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_objective_is_rejected() {
        let err = SurveySpec::new("  ", "car buyers").validate().unwrap_err();
        assert!(matches!(err, SurveyError::InputValidation(_)));
    }

    #[test]
    fn loi_outside_form_bounds_is_rejected() {
        assert!(SurveySpec::new("o", "a").loi(4).validate().is_err());
        assert!(SurveySpec::new("o", "a").loi(61).validate().is_err());
        assert!(SurveySpec::new("o", "a").loi(5).validate().is_ok());
    }

    #[test]
    fn request_json_uses_form_labels() {
        let raw = r#"{
            "objective": "Understand EV purchase drivers",
            "target_audience": "Urban car buyers aged 25-45",
            "loi_minutes": 15,
            "methodology": "Face-to-Face",
            "statistical_methods": ["Cluster Analysis", "MaxDiff"],
            "compliance": ["GDPR"]
        }"#;
        let spec: SurveySpec = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.methodology, Methodology::FaceToFace);
        assert_eq!(spec.market, "India");
        assert_eq!(spec.population_size, 1000);
        assert_eq!(
            spec.statistical_method_labels(),
            vec!["Cluster Analysis", "MaxDiff"]
        );
        assert!(spec.validate().is_ok());
    }
}
