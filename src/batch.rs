//! Batch planning.
//!
//! The question budget is split into numbered, contiguous batches: one
//! screener batch, two core-research halves and one demographics batch.
//! Each batch turns into one generation request whose instructions pin the
//! exact question range, the category and the brands it may reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assembler::QualityRules;
use crate::brands::BrandList;
use crate::budget::QuestionBudget;
use crate::catalog::{MetadataCatalog, QuestionCategory, QuestionType};
use crate::classifier::Category;
use crate::generator::GenerationParams;
use crate::prompts::{
    metadata_block, scales_block, PromptInstance, Var, BATCH_PROMPT, SUPPLEMENT_PROMPT,
};
use crate::survey::SurveySpec;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    Screener,
    CoreResearch { part: u8 },
    Demographics,
}

impl Section {
    /// Banner used in assembled output.
    pub fn title(self) -> String {
        match self {
            Section::Screener => "SECTION 1: SCREENER & TERMINATION CRITERIA".to_string(),
            Section::CoreResearch { part } => format!("SECTION 2: CORE RESEARCH (PART {part})"),
            Section::Demographics => "SECTION 3: DEMOGRAPHICS".to_string(),
        }
    }

    fn metadata_groups(self) -> &'static [QuestionCategory] {
        match self {
            Section::Screener => &[QuestionCategory::Screener],
            Section::CoreResearch { part: 1 } => &[QuestionCategory::CoreResearch],
            Section::CoreResearch { .. } => {
                &[QuestionCategory::CoreResearch, QuestionCategory::PurchaseJourney]
            }
            Section::Demographics => &[],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Screener => f.write_str("screener"),
            Section::CoreResearch { part } => write!(f, "core research (part {part})"),
            Section::Demographics => f.write_str("demographics"),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

fn default_temperature() -> f32 {
    0.2
}
fn default_tokens_per_question() -> u32 {
    220
}
fn default_max_output_tokens() -> u32 {
    4000
}
fn default_screener_brands() -> usize {
    5
}
fn default_core_brands() -> usize {
    20
}

/// Request sizing and brand slicing for batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output-token allowance per requested question.
    #[serde(default = "default_tokens_per_question")]
    pub tokens_per_question: u32,
    /// Hard cap on output tokens for a single request.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Brands offered to the screener (top of the list).
    #[serde(default = "default_screener_brands")]
    pub screener_brands: usize,
    /// Brands offered to core-research batches.
    #[serde(default = "default_core_brands")]
    pub core_brands: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            tokens_per_question: default_tokens_per_question(),
            max_output_tokens: default_max_output_tokens(),
            screener_brands: default_screener_brands(),
            core_brands: default_core_brands(),
        }
    }
}

impl BatchSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!("temperature must be in [0, 1], got {}", self.temperature));
        }
        if self.tokens_per_question == 0 || self.max_output_tokens == 0 {
            return Err("token limits must be positive".to_string());
        }
        Ok(())
    }

    /// Sampling parameters for a request of `count` questions.
    pub fn params_for(&self, count: u32) -> GenerationParams {
        GenerationParams {
            max_output_tokens: count
                .saturating_mul(self.tokens_per_question)
                .min(self.max_output_tokens),
            temperature: self.temperature,
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// One contiguous numbered range of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDescriptor {
    /// Position in the plan, starting at 1.
    pub index: usize,
    pub section: Section,
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    pub count: u32,
    pub brands: Vec<String>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub category: Category,
    pub market: String,
    pub total: u32,
    pub batches: Vec<BatchDescriptor>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchDescriptor> {
        self.batches.iter()
    }

    /// Ranges are contiguous from 1 and their counts sum to `total`.
    pub fn covers_total(&self) -> bool {
        let mut next = 1;
        for b in &self.batches {
            if b.start != next || b.end < b.start || b.count != b.end - b.start + 1 {
                return false;
            }
            next = b.end + 1;
        }
        next == self.total + 1
    }
}

/// Split `budget` into batches with the default brand slices.
pub fn plan_batches(
    budget: &QuestionBudget,
    brands: &BrandList,
    category: Category,
    market: &str,
) -> BatchPlan {
    BatchPlanner::default().plan(budget, brands, category, market)
}

#[derive(Debug, Clone, Default)]
pub struct BatchPlanner {
    pub settings: BatchSettings,
}

impl BatchPlanner {
    pub fn new(settings: BatchSettings) -> Self {
        Self { settings }
    }

    pub fn plan(
        &self,
        budget: &QuestionBudget,
        brands: &BrandList,
        category: Category,
        market: &str,
    ) -> BatchPlan {
        let first_half = budget.core_research / 2;
        let sections = [
            (Section::Screener, budget.screener, self.settings.screener_brands),
            (Section::CoreResearch { part: 1 }, first_half, self.settings.core_brands),
            (
                Section::CoreResearch { part: 2 },
                budget.core_research - first_half,
                self.settings.core_brands,
            ),
            (Section::Demographics, budget.demographics, 0),
        ];

        let mut batches = Vec::with_capacity(sections.len());
        let mut next: u32 = 1;
        for (section, count, brand_slice) in sections {
            if count == 0 {
                continue;
            }
            let Some(end) = next.checked_add(count - 1) else {
                warn!(%section, start = next, count, "question range overflows, batch dropped");
                break;
            };
            batches.push(BatchDescriptor {
                index: batches.len() + 1,
                section,
                start: next,
                end,
                count,
                brands: brands.top(brand_slice).to_vec(),
                category,
            });
            let Some(after) = end.checked_add(1) else {
                break;
            };
            next = after;
        }

        BatchPlan {
            category,
            market: market.to_string(),
            total: budget.total,
            batches,
        }
    }
}

// =============================================================================
// Instructions
// =============================================================================

/// Prompt plus sampling parameters for one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInstruction {
    pub prompt: PromptInstance,
    pub params: GenerationParams,
}

/// Survey summary block shared by every request of a run.
pub fn survey_block(spec: &SurveySpec) -> String {
    let mut lines = vec![spec.to_string()];
    let methods = spec.statistical_method_labels();
    if !methods.is_empty() {
        lines.push(format!("Statistical Methods: {}", methods.join(", ")));
    }
    let types = spec.question_type_labels();
    if !types.is_empty() {
        lines.push(format!("Question Types: {}", types.join(", ")));
    }
    let compliance = spec.compliance_labels();
    if !compliance.is_empty() {
        lines.push(format!("Compliance: {}", compliance.join(", ")));
    }
    lines.join("\n")
}

fn brands_block(brands: &[String]) -> String {
    if brands.is_empty() {
        "None. Do not reference brands in this section.".to_string()
    } else {
        brands.join(", ")
    }
}

/// A screener requirement followed by the catalog's termination rule for it.
fn screening_line(catalog: &MetadataCatalog, question_type: QuestionType, label: &str) -> String {
    match catalog.lookup(QuestionCategory::Screener, question_type) {
        Some(entry) if entry.terminates() => format!("{label}. {}.", entry.termination_logic),
        _ => format!("{label}."),
    }
}

fn section_requirements(
    catalog: &MetadataCatalog,
    section: Section,
    category: Category,
    rules: &QualityRules,
) -> String {
    let category = category.display_name();
    let mut lines: Vec<String> = match section {
        Section::Screener => vec![
            screening_line(catalog, QuestionType::AgeScreening, "Age screening with range validation"),
            screening_line(
                catalog,
                QuestionType::IncomeScreening,
                "Income or socio-economic screening with quota notes",
            ),
            screening_line(
                catalog,
                QuestionType::GeographicScreening,
                "Geographic validation of the respondent's location",
            ),
            format!("{category} category usage or purchase-intent screening with routing."),
            "At least one question must state Termination Logic beginning with \"Terminate if\"."
                .into(),
            "Include at least 1 attention check question marked Fraud Detection: Yes.".into(),
        ],
        Section::CoreResearch { part: 1 } => vec![
            "Unaided brand awareness (open-ended) followed by aided awareness using the brand list."
                .into(),
            "Current brand usage and ownership with consistency checks.".into(),
            "Attribute importance ratings on the 5-point importance scale with straight-lining detection."
                .into(),
            "Brand association matrix across the brand list.".into(),
            format!(
                "Include at least {} attention check questions marked Fraud Detection: Yes.",
                rules.min_fraud_checks
            ),
        ],
        Section::CoreResearch { .. } => {
            let mut v: Vec<String> = vec![
                "Purchase consideration with logical routing.".into(),
                "Satisfaction and experience ratings with response time validation.".into(),
                "Purchase journey: information sources, decision factors, purchase timeline, price sensitivity."
                    .into(),
            ];
            if rules.require_nps_pair {
                v.push(
                    "Include a likelihood to recommend question on a 0-10 scale (0=Not at all likely, 10=Extremely likely), immediately followed by an open question asking why."
                        .into(),
                );
            }
            v
        }
        Section::Demographics => vec![
            "Age, gender and household income with range and consistency checks.".into(),
            "City or region of residence.".into(),
            "Household composition, education and occupation.".into(),
        ],
    };
    lines.push(format!(
        "All rating questions list the complete 5-point scale. Keep every question about {category}."
    ));
    lines
        .iter()
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl BatchDescriptor {
    /// Instruction payload for this batch.
    pub fn instruction(
        &self,
        spec: &SurveySpec,
        settings: &BatchSettings,
        rules: &QualityRules,
    ) -> BatchInstruction {
        let catalog = MetadataCatalog::global();
        let start = self.start.to_string();
        let end = self.end.to_string();
        let count = self.count.to_string();
        let section = self.section.to_string();
        let survey = survey_block(spec);
        let brands = brands_block(&self.brands);
        let requirements = section_requirements(catalog, self.section, self.category, rules);
        let scales = scales_block(catalog);
        let metadata = metadata_block(catalog, self.section.metadata_groups());

        let prompt = BATCH_PROMPT.render(&[
            Var::Fixed("start", &start),
            Var::Fixed("end", &end),
            Var::Fixed("count", &count),
            Var::Fixed("section", &section),
            Var::Fixed("category_name", self.category.display_name()),
            Var::Input("market", &spec.market),
            Var::Input("survey", &survey),
            Var::Input("brands", &brands),
            Var::Fixed("requirements", &requirements),
            Var::Fixed("scales", &scales),
            Var::Fixed("metadata", &metadata),
        ]);
        BatchInstruction {
            prompt,
            params: settings.params_for(self.count),
        }
    }
}

/// Instruction for the single completion pass over `start..=end`.
pub fn supplement_instruction(
    spec: &SurveySpec,
    plan: &BatchPlan,
    brands: &BrandList,
    start: u32,
    end: u32,
    existing_questions: &[String],
    settings: &BatchSettings,
) -> BatchInstruction {
    let count = end.saturating_sub(start) + 1;
    let (start_s, end_s, count_s) = (start.to_string(), end.to_string(), count.to_string());
    let survey = survey_block(spec);
    let brand_names = brands_block(brands.top(settings.core_brands));
    let existing = existing_questions.join("\n");
    let scales = scales_block(MetadataCatalog::global());

    let prompt = SUPPLEMENT_PROMPT.render(&[
        Var::Fixed("start", &start_s),
        Var::Fixed("end", &end_s),
        Var::Fixed("count", &count_s),
        Var::Fixed("category_name", plan.category.display_name()),
        Var::Input("market", &plan.market),
        Var::Input("survey", &survey),
        Var::Input("brands", &brand_names),
        Var::Input("existing", &existing),
        Var::Fixed("scales", &scales),
    ]);
    BatchInstruction {
        prompt,
        params: settings.params_for(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget;

    fn automotive_brands() -> BrandList {
        BrandList::from_candidates(
            ["Maruti Suzuki", "Hyundai", "Tata Motors", "Mahindra", "Toyota", "Honda", "Kia"],
            20,
        )
        .unwrap()
    }

    #[test]
    fn loi_20_plan_has_four_contiguous_batches() {
        let plan = plan_batches(
            &budget::plan(20),
            &automotive_brands(),
            Category::Automotive,
            "India",
        );
        let ranges: Vec<_> = plan.iter().map(|b| (b.section, b.start, b.end)).collect();
        assert_eq!(
            ranges,
            vec![
                (Section::Screener, 1, 6),
                (Section::CoreResearch { part: 1 }, 7, 21),
                (Section::CoreResearch { part: 2 }, 22, 36),
                (Section::Demographics, 37, 41),
            ]
        );
        assert!(plan.covers_total());
        assert_eq!(plan.iter().map(|b| b.index).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn brand_slices_come_from_one_list() {
        let brands = automotive_brands();
        let plan = plan_batches(&budget::plan(20), &brands, Category::Automotive, "India");
        assert_eq!(plan.batches[0].brands, brands.top(5));
        assert_eq!(plan.batches[1].brands, brands.names());
        assert_eq!(plan.batches[2].brands, plan.batches[1].brands);
        assert!(plan.batches[3].brands.is_empty());
        assert!(plan.iter().all(|b| b.category == Category::Automotive));
    }

    #[test]
    fn odd_core_puts_remainder_in_second_half() {
        let plan = plan_batches(&budget::plan(15), &BrandList::placeholders(), Category::General, "India");
        assert_eq!(plan.batches[1].count, 11);
        assert_eq!(plan.batches[2].count, 11);
        let plan = plan_batches(&budget::plan(9), &BrandList::placeholders(), Category::General, "India");
        // core = 13
        assert_eq!(plan.batches[1].count, 6);
        assert_eq!(plan.batches[2].count, 7);
    }

    #[test]
    fn empty_core_half_is_skipped() {
        let budget = QuestionBudget {
            screener: 5,
            core_research: 1,
            demographics: 5,
            total: 11,
        };
        let plan = plan_batches(&budget, &BrandList::placeholders(), Category::General, "India");
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.batches[1].section, Section::CoreResearch { part: 2 });
        assert_eq!((plan.batches[1].start, plan.batches[1].end), (6, 6));
        assert!(plan.covers_total());
    }

    #[test]
    fn overflowing_ranges_stop_instead_of_wrapping() {
        let budget = QuestionBudget {
            screener: u32::MAX - 1,
            core_research: 10,
            demographics: 5,
            total: u32::MAX,
        };
        let plan = plan_batches(&budget, &BrandList::placeholders(), Category::General, "India");
        assert_eq!(plan.len(), 1);
        assert_eq!((plan.batches[0].start, plan.batches[0].end), (1, u32::MAX - 1));
    }

    #[test]
    fn section_display_names_parts() {
        assert_eq!(Section::CoreResearch { part: 2 }.to_string(), "core research (part 2)");
        assert_eq!(Section::Screener.to_string(), "screener");
    }

    #[test]
    fn instruction_pins_range_category_and_brands() {
        let spec = SurveySpec::new("Understand EV purchase drivers", "Urban car buyers");
        let plan = plan_batches(&budget::plan(20), &automotive_brands(), Category::Automotive, "India");
        let settings = BatchSettings::default();
        let rules = QualityRules::default();

        let screener = plan.batches[0].instruction(&spec, &settings, &rules);
        assert!(screener.prompt.system.contains("Q1 through Q6"));
        assert!(screener.prompt.user.contains("Terminate if"));
        assert!(screener.prompt.user.contains("Maruti Suzuki, Hyundai, Tata Motors, Mahindra, Toyota"));
        assert!(!screener.prompt.user.contains("Honda"));
        assert_eq!(screener.params.max_output_tokens, 6 * 220);
        assert!((screener.params.temperature - 0.2).abs() < f32::EPSILON);

        let core2 = plan.batches[2].instruction(&spec, &settings, &rules);
        assert!(core2.prompt.user.contains("0-10 scale"));
        assert_eq!(core2.params.max_output_tokens, 3300);

        let demo = plan.batches[3].instruction(&spec, &settings, &rules);
        assert!(demo.prompt.user.contains("Do not reference brands"));
    }

    #[test]
    fn screener_requirements_carry_catalog_termination_rules() {
        let catalog = MetadataCatalog::global();
        let text = section_requirements(
            catalog,
            Section::Screener,
            Category::Automotive,
            &QualityRules::default(),
        );
        assert!(text.contains("Age screening with range validation. Terminate if outside 18-65"));
        assert!(text.contains("Terminate if below specified income level"));
        assert!(text.contains("Terminate if outside target geography"));

        let demographics =
            section_requirements(catalog, Section::Demographics, Category::Automotive, &QualityRules::default());
        assert!(!demographics.contains("Terminate if outside 18-65"));
    }

    #[test]
    fn output_tokens_are_capped() {
        let settings = BatchSettings::default();
        assert_eq!(settings.params_for(45).max_output_tokens, 4000);
    }

    #[test]
    fn supplement_targets_missing_tail() {
        let spec = SurveySpec::new("Measure sentiment", "Adults 18+");
        let brands = BrandList::placeholders();
        let plan = plan_batches(&budget::plan(20), &brands, Category::General, "India");
        let existing = vec!["Q1. What is your age?".to_string()];
        let ins = supplement_instruction(&spec, &plan, &brands, 39, 41, &existing, &BatchSettings::default());
        assert!(ins.prompt.system.contains("Q39 through Q41 (3 questions)"));
        assert!(ins.prompt.user.contains("Q1. What is your age?"));
        assert_eq!(ins.prompt.template_slug, "questionnaire_supplement_v1");
    }
}
