//! End-to-end survey generation.
//!
//! 1. **Validate** the survey spec
//! 2. **Classify** the category from objective and audience
//! 3. **Resolve** one brand list for the run
//! 4. **Budget** and **plan** numbered batches
//! 5. **Generate** each batch in order, stopping at the first failure
//! 6. **Assemble** with at most one completion pass
//!
//! Usage:
//! ```bash
//! survey generate --request survey.json --out session.json
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assembler::{Assembly, CompletionPass, QuestionnaireAssembler, ValidationReport};
use crate::batch::{supplement_instruction, BatchPlan, BatchPlanner};
use crate::brands::{BrandList, BrandLookup};
use crate::budget::QuestionBudget;
use crate::classifier::{CategoryClassifier, Classification};
use crate::config::SurveyConfig;
use crate::error::{GenerationError, SurveyError};
use crate::generator::{Generation, TextGenerator};
use crate::parse::QuestionRecord;
use crate::survey::SurveySpec;

// =============================================================================
// Types
// =============================================================================

/// Everything decided before the first generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyPlan {
    pub spec: SurveySpec,
    pub classification: Classification,
    pub brands: BrandList,
    pub budget: QuestionBudget,
    pub batches: BatchPlan,
}

/// Token and cost totals across every request of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub requests: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_nanodollars: i64,
    /// Requests that stopped at the output-token cap.
    pub truncated: u32,
}

impl UsageTotals {
    fn add(&mut self, g: &Generation) {
        self.requests += 1;
        self.input_tokens += u64::from(g.input_tokens);
        self.output_tokens += u64::from(g.output_tokens);
        self.cost_nanodollars = self.cost_nanodollars.saturating_add(g.cost_nanodollars);
        if g.truncated {
            self.truncated += 1;
        }
    }

    pub fn cost_dollars(&self) -> f64 {
        self.cost_nanodollars as f64 / 1_000_000_000.0
    }
}

/// Full generation session output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSurvey {
    pub id: Uuid,
    pub created_at: String,
    pub plan: SurveyPlan,
    pub questionnaire: String,
    pub records: Vec<QuestionRecord>,
    pub report: ValidationReport,
    pub usage: UsageTotals,
}

// =============================================================================
// Pipeline
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SurveyPipeline {
    config: SurveyConfig,
}

impl SurveyPipeline {
    pub fn new(config: SurveyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// Steps 1-4. Only input validation can fail; brand lookup failures fall
    /// back to the static table.
    pub async fn plan(
        &self,
        spec: &SurveySpec,
        lookup: Option<&dyn BrandLookup>,
    ) -> Result<SurveyPlan, SurveyError> {
        spec.validate()?;

        let classification = CategoryClassifier::new(self.config.keyword_weight)
            .classify(&spec.objective, &spec.target_audience);
        info!(
            category = %classification.category,
            confidence = classification.confidence,
            "classified survey"
        );

        let brands = self
            .config
            .brands
            .resolve(classification.category, &spec.market, lookup)
            .await;

        let budget = self.config.budget.plan(spec.loi_minutes);
        info!(
            screener = budget.screener,
            core_research = budget.core_research,
            demographics = budget.demographics,
            total = budget.total,
            "question budget"
        );

        let batches = BatchPlanner::new(self.config.batches.clone()).plan(
            &budget,
            &brands,
            classification.category,
            &spec.market,
        );

        Ok(SurveyPlan {
            spec: spec.clone(),
            classification,
            brands,
            budget,
            batches,
        })
    }

    /// Steps 1-6. `run_id` becomes the session id.
    pub async fn generate(
        &self,
        run_id: Uuid,
        spec: &SurveySpec,
        generator: &dyn TextGenerator,
        lookup: Option<&dyn BrandLookup>,
    ) -> Result<GeneratedSurvey, SurveyError> {
        let plan = self.plan(spec, lookup).await?;
        let mut usage = UsageTotals::default();

        let mut outputs = Vec::with_capacity(plan.batches.len());
        for batch in plan.batches.iter() {
            info!(
                batch = batch.index,
                section = %batch.section,
                start = batch.start,
                end = batch.end,
                "generating batch"
            );
            let ins = batch.instruction(spec, &self.config.batches, &self.config.quality);
            let out = generator
                .generate(&ins.prompt.system, &ins.prompt.user, ins.params)
                .await
                .map_err(|e| SurveyError::batch(batch.index, batch.section, e))?;
            if out.truncated {
                warn!(batch = batch.index, "batch output hit the token cap");
            }
            usage.add(&out);
            outputs.push(format!("=== {} ===\n\n{}", batch.section.title(), out.text.trim()));
        }

        let completion = GeneratorCompletion {
            generator,
            plan: &plan,
            config: &self.config,
        };
        let Assembly {
            text,
            records,
            report,
            supplement,
        } = QuestionnaireAssembler::new(self.config.quality.clone())
            .assemble(&outputs, &plan.batches, &completion)
            .await?;
        if let Some(g) = &supplement {
            usage.add(g);
        }

        info!(
            questions = report.actual_count,
            planned = report.planned_total,
            discrepancies = report.discrepancies.len(),
            requests = usage.requests,
            cost_dollars = usage.cost_dollars(),
            "survey generated"
        );

        Ok(GeneratedSurvey {
            id: run_id,
            created_at: Utc::now().to_rfc3339(),
            plan,
            questionnaire: text,
            records,
            report,
            usage,
        })
    }
}

/// Completion pass over the run's generator, reusing the run's brand list.
struct GeneratorCompletion<'a> {
    generator: &'a dyn TextGenerator,
    plan: &'a SurveyPlan,
    config: &'a SurveyConfig,
}

#[async_trait]
impl CompletionPass for GeneratorCompletion<'_> {
    async fn complete(
        &self,
        start: u32,
        end: u32,
        existing_questions: &[String],
    ) -> Result<Generation, GenerationError> {
        let ins = supplement_instruction(
            &self.plan.spec,
            &self.plan.batches,
            &self.plan.brands,
            start,
            end,
            existing_questions,
            &self.config.batches,
        );
        self.generator
            .generate(&ins.prompt.system, &ins.prompt.user, ins.params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;

    #[tokio::test]
    async fn plan_is_deterministic_without_lookup() {
        let pipeline = SurveyPipeline::default();
        let spec = SurveySpec::new("Understand car purchase drivers", "Urban vehicle owners");
        let a = pipeline.plan(&spec, None).await.unwrap();
        let b = pipeline.plan(&spec, None).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.classification.category, Category::Automotive);
        assert!(a.batches.covers_total());
    }

    #[tokio::test]
    async fn invalid_spec_stops_before_planning() {
        let err = SurveyPipeline::default()
            .plan(&SurveySpec::new("", "Adults"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SurveyError::InputValidation(_)));
    }

    #[test]
    fn usage_totals_accumulate() {
        let mut usage = UsageTotals::default();
        usage.add(&Generation {
            text: String::new(),
            input_tokens: 10,
            output_tokens: 20,
            cost_nanodollars: 1_500_000_000,
            truncated: true,
        });
        usage.add(&Generation::text("x"));
        assert_eq!(usage.requests, 2);
        assert_eq!(usage.output_tokens, 20);
        assert_eq!(usage.truncated, 1);
        assert!((usage.cost_dollars() - 1.5).abs() < 1e-9);
    }
}
