//! Static question-metadata catalog.
//!
//! Built once on first access from fixed tables and checked before use. The
//! catalog is the only process-wide state in the crate and is read-only.

use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

// =============================================================================
// Scale types
// =============================================================================

/// Canonical 5-point scales offered to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Likert,
    Rating,
    Importance,
    Likelihood,
    Association,
    Frequency,
}

impl ScaleType {
    pub const ALL: [ScaleType; 6] = [
        ScaleType::Likert,
        ScaleType::Rating,
        ScaleType::Importance,
        ScaleType::Likelihood,
        ScaleType::Association,
        ScaleType::Frequency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Likert => "Likert_5_Point",
            Self::Rating => "Rating_5_Point",
            Self::Importance => "Importance_5_Point",
            Self::Likelihood => "Likelihood_5_Point",
            Self::Association => "Association_5_Point",
            Self::Frequency => "Frequency_5_Point",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaleDefinition {
    pub scale: ScaleType,
    pub labels: [&'static str; 5],
    pub analysis: &'static [&'static str],
}

impl ScaleDefinition {
    /// `1=Strongly Disagree, 2=Disagree, ...`
    pub fn numbered(&self) -> String {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!("{}={}", i + 1, l))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// =============================================================================
// Question metadata
// =============================================================================

/// Metadata groups of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Screener,
    CoreResearch,
    PurchaseJourney,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 3] = [
        QuestionCategory::Screener,
        QuestionCategory::CoreResearch,
        QuestionCategory::PurchaseJourney,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Screener => "Screener",
            Self::CoreResearch => "Core Research",
            Self::PurchaseJourney => "Purchase Journey",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    AgeScreening,
    IncomeScreening,
    GeographicScreening,
    BrandAwarenessUnaided,
    BrandAwarenessAided,
    BrandUsageCurrent,
    AttributeImportanceRatings,
    BrandAssociationMatrix,
    InformationSources,
    PurchaseDecisionFactors,
    PurchaseTimeline,
}

impl QuestionType {
    pub fn key(self) -> &'static str {
        match self {
            Self::AgeScreening => "age_screening",
            Self::IncomeScreening => "income_screening",
            Self::GeographicScreening => "geographic_screening",
            Self::BrandAwarenessUnaided => "brand_awareness_unaided",
            Self::BrandAwarenessAided => "brand_awareness_aided",
            Self::BrandUsageCurrent => "brand_usage_current",
            Self::AttributeImportanceRatings => "attribute_importance_ratings",
            Self::BrandAssociationMatrix => "brand_association_matrix",
            Self::InformationSources => "information_sources",
            Self::PurchaseDecisionFactors => "purchase_decision_factors",
            Self::PurchaseTimeline => "purchase_timeline",
        }
    }

    /// Group each question type belongs to.
    pub fn category(self) -> QuestionCategory {
        match self {
            Self::AgeScreening | Self::IncomeScreening | Self::GeographicScreening => {
                QuestionCategory::Screener
            }
            Self::BrandAwarenessUnaided
            | Self::BrandAwarenessAided
            | Self::BrandUsageCurrent
            | Self::AttributeImportanceRatings
            | Self::BrandAssociationMatrix => QuestionCategory::CoreResearch,
            Self::InformationSources | Self::PurchaseDecisionFactors | Self::PurchaseTimeline => {
                QuestionCategory::PurchaseJourney
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataEntry {
    pub category: QuestionCategory,
    pub question_type: QuestionType,
    pub purpose: &'static str,
    pub data_type: &'static str,
    pub validation_rule: &'static str,
    pub termination_logic: &'static str,
    pub statistical_applications: &'static [&'static str],
    pub required_for_analysis: &'static [&'static str],
    pub quality_checks: &'static [&'static str],
    pub estimated_time_seconds: u32,
    pub mobile_optimization: &'static str,
    pub accessibility_notes: &'static str,
}

impl MetadataEntry {
    pub fn terminates(&self) -> bool {
        self.termination_logic.starts_with("Terminate")
    }
}

/// A keyed guideline row (fraud checks, termination criteria, LOI timing).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Guideline {
    pub key: &'static str,
    pub text: &'static str,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug)]
pub struct MetadataCatalog {
    scales: Vec<ScaleDefinition>,
    entries: Vec<MetadataEntry>,
    fraud_checks: &'static [Guideline],
    termination_criteria: &'static [Guideline],
    loi_guidelines: &'static [Guideline],
}

static CATALOG: Lazy<MetadataCatalog> = Lazy::new(|| {
    let catalog = MetadataCatalog::build();
    if let Err(problem) = catalog.check() {
        // Static data: a failure here is a programming error in the tables.
        panic!("metadata catalog is inconsistent: {problem}");
    }
    catalog
});

impl MetadataCatalog {
    /// Process-wide catalog.
    pub fn global() -> &'static MetadataCatalog {
        &CATALOG
    }

    /// The entry for one question type within a group, if the group defines it.
    /// Screener batch requirements take their termination rules from here.
    pub fn lookup(
        &self,
        category: QuestionCategory,
        question_type: QuestionType,
    ) -> Option<&MetadataEntry> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.question_type == question_type)
    }

    /// Entries of one group in declaration order.
    pub fn entries_for(&self, category: QuestionCategory) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn scale(&self, scale: ScaleType) -> &ScaleDefinition {
        // `check` guarantees one definition per scale type.
        self.scales
            .iter()
            .find(|d| d.scale == scale)
            .unwrap_or(&self.scales[0])
    }

    pub fn scales(&self) -> &[ScaleDefinition] {
        &self.scales
    }

    pub fn fraud_checks(&self) -> &[Guideline] {
        self.fraud_checks
    }

    pub fn termination_criteria(&self) -> &[Guideline] {
        self.termination_criteria
    }

    pub fn loi_guidelines(&self) -> &[Guideline] {
        self.loi_guidelines
    }

    fn check(&self) -> Result<(), String> {
        for scale in ScaleType::ALL {
            let n = self.scales.iter().filter(|d| d.scale == scale).count();
            if n != 1 {
                return Err(format!("scale {} defined {n} times", scale.name()));
            }
        }
        for entry in &self.entries {
            if entry.question_type.category() != entry.category {
                return Err(format!(
                    "{} filed under {} but belongs to {}",
                    entry.question_type.key(),
                    entry.category,
                    entry.question_type.category()
                ));
            }
            if entry.estimated_time_seconds == 0 {
                return Err(format!("{} has no time estimate", entry.question_type.key()));
            }
            if entry.statistical_applications.is_empty() {
                return Err(format!(
                    "{} lists no statistical applications",
                    entry.question_type.key()
                ));
            }
            let dupes = self
                .entries
                .iter()
                .filter(|e| e.question_type == entry.question_type)
                .count();
            if dupes != 1 {
                return Err(format!("{} defined {dupes} times", entry.question_type.key()));
            }
        }
        for category in QuestionCategory::ALL {
            if self.entries_for(category).next().is_none() {
                return Err(format!("no entries for {category}"));
            }
        }
        Ok(())
    }

    fn build() -> Self {
        Self {
            scales: scale_table(),
            entries: entry_table(),
            fraud_checks: FRAUD_CHECKS,
            termination_criteria: TERMINATION_CRITERIA,
            loi_guidelines: LOI_GUIDELINES,
        }
    }
}

fn scale_table() -> Vec<ScaleDefinition> {
    vec![
        ScaleDefinition {
            scale: ScaleType::Likert,
            labels: [
                "Strongly Disagree",
                "Disagree",
                "Neither Agree nor Disagree",
                "Agree",
                "Strongly Agree",
            ],
            analysis: &[
                "Descriptive Statistics",
                "Factor Analysis",
                "Regression Analysis",
                "Correlation Analysis",
            ],
        },
        ScaleDefinition {
            scale: ScaleType::Rating,
            labels: ["Very Poor", "Poor", "Fair", "Good", "Excellent"],
            analysis: &[
                "Descriptive Statistics",
                "Gap Analysis",
                "Driver Analysis",
                "Satisfaction Modeling",
            ],
        },
        ScaleDefinition {
            scale: ScaleType::Importance,
            labels: [
                "Not at all Important",
                "Slightly Important",
                "Moderately Important",
                "Very Important",
                "Extremely Important",
            ],
            analysis: &[
                "Importance-Performance Analysis",
                "Driver Analysis",
                "MaxDiff Analysis",
                "Key Driver Analysis",
            ],
        },
        ScaleDefinition {
            scale: ScaleType::Likelihood,
            labels: [
                "Very Unlikely",
                "Unlikely",
                "Neither Likely nor Unlikely",
                "Likely",
                "Very Likely",
            ],
            analysis: &[
                "Purchase Intent Modeling",
                "Predictive Analytics",
                "Logistic Regression",
                "Conversion Analysis",
            ],
        },
        ScaleDefinition {
            scale: ScaleType::Association,
            labels: [
                "Not at all Associated",
                "Slightly Associated",
                "Moderately Associated",
                "Strongly Associated",
                "Extremely Associated",
            ],
            analysis: &[
                "Brand Mapping",
                "Correspondence Analysis",
                "Perceptual Mapping",
                "Brand Equity Analysis",
            ],
        },
        ScaleDefinition {
            scale: ScaleType::Frequency,
            labels: ["Never", "Rarely", "Sometimes", "Often", "Always"],
            analysis: &[
                "Usage & Attitude Analysis",
                "Behavioral Segmentation",
                "Frequency Distribution",
                "Usage Patterns",
            ],
        },
    ]
}

fn entry_table() -> Vec<MetadataEntry> {
    use QuestionCategory::*;
    use QuestionType::*;

    vec![
        MetadataEntry {
            category: Screener,
            question_type: AgeScreening,
            purpose: "Validate target demographic age range",
            data_type: "Categorical",
            validation_rule: "Must be within specified age range for target audience",
            termination_logic: "Terminate if outside 18-65 or specific target range",
            statistical_applications: &[
                "Demographic Profiling",
                "Cross-tabulation Base",
                "Quota Management",
            ],
            required_for_analysis: &["All demographic analyses", "Age-based segmentation"],
            quality_checks: &["Range validation", "Logical consistency"],
            estimated_time_seconds: 10,
            mobile_optimization: "Dropdown with age ranges",
            accessibility_notes: "Screen reader compatible",
        },
        MetadataEntry {
            category: Screener,
            question_type: IncomeScreening,
            purpose: "Qualify respondents based on income level for target segment",
            data_type: "Categorical_Ordinal",
            validation_rule: "Must meet minimum income threshold",
            termination_logic: "Terminate if below specified income level",
            statistical_applications: &[
                "Income-based Segmentation",
                "Purchasing Power Analysis",
                "Price Sensitivity Modeling",
            ],
            required_for_analysis: &[
                "Economic demographic profiling",
                "Price elasticity studies",
            ],
            quality_checks: &[
                "Income range validation",
                "Consistency with lifestyle indicators",
            ],
            estimated_time_seconds: 15,
            mobile_optimization: "Clear income ranges with local currency",
            accessibility_notes: "High contrast for readability",
        },
        MetadataEntry {
            category: Screener,
            question_type: GeographicScreening,
            purpose: "Ensure respondents are from target geographic area",
            data_type: "Categorical",
            validation_rule: "Must match specified geographic criteria",
            termination_logic: "Terminate if outside target geography",
            statistical_applications: &[
                "Geographic Analysis",
                "Regional Comparisons",
                "Location-based Insights",
            ],
            required_for_analysis: &["Regional market analysis", "Geographic segmentation"],
            quality_checks: &[
                "GPS validation",
                "IP address verification",
                "Postal code validation",
            ],
            estimated_time_seconds: 12,
            mobile_optimization: "Auto-detect location with manual override",
            accessibility_notes: "Location services permission handling",
        },
        MetadataEntry {
            category: CoreResearch,
            question_type: BrandAwarenessUnaided,
            purpose: "Measure spontaneous brand recall without prompting",
            data_type: "Text_Multiple_Response",
            validation_rule: "Minimum 1 character, maximum 200 characters per brand",
            termination_logic: "No termination",
            statistical_applications: &[
                "Top-of-Mind Awareness Analysis",
                "Brand Salience Measurement",
                "Competitive Analysis",
            ],
            required_for_analysis: &[
                "Brand equity studies",
                "Market share correlation",
                "Brand health tracking",
            ],
            quality_checks: &[
                "Text quality validation",
                "Brand name standardization",
                "Spelling correction",
            ],
            estimated_time_seconds: 60,
            mobile_optimization: "Auto-complete with brand suggestions",
            accessibility_notes: "Voice input support",
        },
        MetadataEntry {
            category: CoreResearch,
            question_type: BrandAwarenessAided,
            purpose: "Measure brand recognition when prompted with brand list",
            data_type: "Multiple_Choice_Multiple_Response",
            validation_rule: "At least one brand must be selected or \"None\" option",
            termination_logic: "No termination",
            statistical_applications: &[
                "Aided Awareness Analysis",
                "Brand Recognition Tracking",
                "Competitive Landscape Mapping",
            ],
            required_for_analysis: &[
                "Brand performance benchmarking",
                "Market penetration analysis",
            ],
            quality_checks: &[
                "Consistency with unaided awareness",
                "Logical brand combinations",
            ],
            estimated_time_seconds: 45,
            mobile_optimization: "Grid layout with brand logos",
            accessibility_notes: "Alt-text for brand logos",
        },
        MetadataEntry {
            category: CoreResearch,
            question_type: BrandUsageCurrent,
            purpose: "Identify current brand usage patterns and frequency",
            data_type: "Multiple_Choice_Single_Response",
            validation_rule: "Must select one option per brand",
            termination_logic: "Route non-users to different question path",
            statistical_applications: &[
                "Usage & Attitude Analysis",
                "Customer Journey Mapping",
                "Brand Loyalty Assessment",
            ],
            required_for_analysis: &[
                "Current customer profiling",
                "Usage frequency analysis",
                "Brand switching behavior",
            ],
            quality_checks: &["Usage consistency validation", "Frequency logic checks"],
            estimated_time_seconds: 30,
            mobile_optimization: "Swipe-friendly interface",
            accessibility_notes: "Clear usage frequency labels",
        },
        MetadataEntry {
            category: CoreResearch,
            question_type: AttributeImportanceRatings,
            purpose: "Measure importance of product/service attributes in decision making",
            data_type: "Rating_Scale_5_Point",
            validation_rule: "All attributes must be rated on 1-5 scale",
            termination_logic: "No termination",
            statistical_applications: &[
                "Importance-Performance Analysis",
                "Key Driver Analysis",
                "Factor Analysis",
                "Conjoint Analysis",
            ],
            required_for_analysis: &[
                "Product development priorities",
                "Marketing message optimization",
                "Feature prioritization",
            ],
            quality_checks: &[
                "Straight-lining detection",
                "Response time validation",
                "Logical consistency",
            ],
            estimated_time_seconds: 90,
            mobile_optimization: "Slider interface with haptic feedback",
            accessibility_notes: "Voice guidance for ratings",
        },
        MetadataEntry {
            category: CoreResearch,
            question_type: BrandAssociationMatrix,
            purpose: "Measure strength of association between brands and attributes",
            data_type: "Matrix_5_Point_Scale",
            validation_rule: "All brand-attribute combinations must be rated",
            termination_logic: "No termination",
            statistical_applications: &[
                "Correspondence Analysis",
                "Perceptual Mapping",
                "Brand Positioning Analysis",
                "Competitive Analysis",
            ],
            required_for_analysis: &[
                "Brand positioning studies",
                "Competitive intelligence",
                "Brand differentiation",
            ],
            quality_checks: &[
                "Matrix completion validation",
                "Attention check integration",
                "Response pattern analysis",
            ],
            estimated_time_seconds: 120,
            mobile_optimization: "Scrollable matrix with fixed headers",
            accessibility_notes: "Row and column reading support",
        },
        MetadataEntry {
            category: PurchaseJourney,
            question_type: InformationSources,
            purpose: "Identify key information sources used in purchase research",
            data_type: "Multiple_Choice_Multiple_Response",
            validation_rule: "At least one source must be selected",
            termination_logic: "No termination",
            statistical_applications: &[
                "Media Mix Analysis",
                "Customer Journey Mapping",
                "Touchpoint Analysis",
            ],
            required_for_analysis: &[
                "Marketing channel effectiveness",
                "Media planning optimization",
            ],
            quality_checks: &[
                "Logical source combinations",
                "Consistency with demographics",
            ],
            estimated_time_seconds: 45,
            mobile_optimization: "Icon-based selection with descriptions",
            accessibility_notes: "Audio descriptions for icons",
        },
        MetadataEntry {
            category: PurchaseJourney,
            question_type: PurchaseDecisionFactors,
            purpose: "Understand factors that influence final purchase decision",
            data_type: "Rating_Scale_5_Point",
            validation_rule: "All factors must be rated for influence level",
            termination_logic: "No termination",
            statistical_applications: &[
                "Decision Factor Analysis",
                "Purchase Driver Modeling",
                "Choice Modeling",
            ],
            required_for_analysis: &["Sales strategy optimization", "Product positioning"],
            quality_checks: &["Rating consistency", "Factor importance logic"],
            estimated_time_seconds: 75,
            mobile_optimization: "Progressive disclosure of factors",
            accessibility_notes: "Factor explanations available",
        },
        MetadataEntry {
            category: PurchaseJourney,
            question_type: PurchaseTimeline,
            purpose: "Map the timeline from consideration to purchase",
            data_type: "Categorical_Single_Response",
            validation_rule: "Must select one timeline option",
            termination_logic: "Route based on timeline for follow-up questions",
            statistical_applications: &[
                "Purchase Cycle Analysis",
                "Sales Forecasting",
                "Conversion Timeline Modeling",
            ],
            required_for_analysis: &[
                "Sales cycle optimization",
                "Marketing timing strategies",
            ],
            quality_checks: &[
                "Timeline logic validation",
                "Consistency with urgency indicators",
            ],
            estimated_time_seconds: 20,
            mobile_optimization: "Timeline visual selector",
            accessibility_notes: "Timeline read-aloud support",
        },
    ]
}

const FRAUD_CHECKS: &[Guideline] = &[
    Guideline {
        key: "attention_check",
        text: "Please select 'Agree' for this question to confirm you are reading carefully.",
    },
    Guideline {
        key: "time_validation",
        text: "Minimum time per question: 3-5 seconds, Maximum: 120 seconds",
    },
    Guideline {
        key: "straight_lining",
        text: "Flag responses with same rating across 5+ consecutive questions",
    },
    Guideline {
        key: "open_end_quality",
        text: "Check for meaningful responses, minimum 10 characters for detailed questions",
    },
    Guideline {
        key: "geographic_validation",
        text: "Validate IP location matches declared location",
    },
    Guideline {
        key: "duplicate_detection",
        text: "Check for duplicate responses using device fingerprinting",
    },
];

const TERMINATION_CRITERIA: &[Guideline] = &[
    Guideline {
        key: "age_out",
        text: "Respondents outside target age range",
    },
    Guideline {
        key: "income_screening",
        text: "Below minimum income threshold for target segment",
    },
    Guideline {
        key: "geographic_screening",
        text: "Outside specified geographic boundaries",
    },
    Guideline {
        key: "category_usage",
        text: "Non-users of category if users-only study",
    },
    Guideline {
        key: "quota_full",
        text: "Target demographic quota reached",
    },
    Guideline {
        key: "quality_screening",
        text: "Failed fraud/attention checks",
    },
];

const LOI_GUIDELINES: &[Guideline] = &[
    Guideline {
        key: "simple_questions",
        text: "15-20 seconds each",
    },
    Guideline {
        key: "matrix_questions",
        text: "45-90 seconds each",
    },
    Guideline {
        key: "ranking_questions",
        text: "60-120 seconds each",
    },
    Guideline {
        key: "open_ended",
        text: "90-180 seconds each",
    },
    Guideline {
        key: "demographics",
        text: "10-15 seconds each",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_catalog_passes_its_own_check() {
        let catalog = MetadataCatalog::global();
        assert!(catalog.check().is_ok());
        assert_eq!(catalog.entries().len(), 11);
        assert_eq!(catalog.scales().len(), 6);
    }

    #[test]
    fn lookup_requires_matching_group() {
        let catalog = MetadataCatalog::global();
        let age = catalog
            .lookup(QuestionCategory::Screener, QuestionType::AgeScreening)
            .unwrap();
        assert!(age.terminates());
        assert_eq!(age.estimated_time_seconds, 10);
        assert!(catalog
            .lookup(QuestionCategory::CoreResearch, QuestionType::AgeScreening)
            .is_none());
    }

    #[test]
    fn group_sizes_match_tables() {
        let catalog = MetadataCatalog::global();
        assert_eq!(catalog.entries_for(QuestionCategory::Screener).count(), 3);
        assert_eq!(catalog.entries_for(QuestionCategory::CoreResearch).count(), 5);
        assert_eq!(catalog.entries_for(QuestionCategory::PurchaseJourney).count(), 3);
    }

    #[test]
    fn numbered_scale_lists_all_five_points() {
        let likert = MetadataCatalog::global().scale(ScaleType::Likert);
        assert_eq!(
            likert.numbered(),
            "1=Strongly Disagree, 2=Disagree, 3=Neither Agree nor Disagree, 4=Agree, 5=Strongly Agree"
        );
    }

    #[test]
    fn guideline_tables_are_populated() {
        let catalog = MetadataCatalog::global();
        assert_eq!(catalog.fraud_checks().len(), 6);
        assert_eq!(catalog.termination_criteria().len(), 6);
        assert_eq!(catalog.loi_guidelines().len(), 5);
    }
}
