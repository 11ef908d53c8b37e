use std::collections::HashSet;

use proptest::prelude::*;
use survey_harness::batch::{plan_batches, Section};
use survey_harness::brands::{BrandList, BrandLookup, BrandResolver};
use survey_harness::budget::{
    self, BudgetPolicy, QuestionBudget, MAX_MULTIPLIER, MAX_SECTION_QUESTIONS,
};
use survey_harness::classifier::{Category, CategoryClassifier, DEFAULT_KEYWORD_WEIGHT};
use survey_harness::survey::{MAX_LOI_MINUTES, MIN_LOI_MINUTES};
use survey_harness::GenerationError;

fn assert_brand_list(list: &BrandList) {
    assert!(!list.is_empty());
    assert!(list.len() <= 20);
    let unique: HashSet<String> = list.names().iter().map(|b| b.to_lowercase()).collect();
    assert_eq!(unique.len(), list.len());
    for b in list.names() {
        let n = b.chars().count();
        assert!((3..=49).contains(&n), "{b:?}");
    }
}

proptest! {
    #[test]
    fn budget_total_is_sum_and_floors_hold(loi in MIN_LOI_MINUTES..=MAX_LOI_MINUTES) {
        let b = budget::plan(loi);
        prop_assert_eq!(b.total, b.screener + b.core_research + b.demographics);
        prop_assert!(b.screener >= 5);
        prop_assert!(b.demographics >= 5);
        prop_assert!(b.total > 0);
    }

    #[test]
    fn budget_is_monotonic_in_loi(loi in MIN_LOI_MINUTES..MAX_LOI_MINUTES) {
        prop_assert!(budget::plan(loi + 1).total >= budget::plan(loi).total);
    }

    #[test]
    fn custom_policies_keep_their_floors(
        loi in 1u32..=120,
        k_core in 0.0f64..3.0,
        k_screener in 0.0f64..1.0,
        k_demo in 0.0f64..1.0,
        screener_floor in 1u32..10,
        demographics_floor in 1u32..10,
    ) {
        let policy = BudgetPolicy {
            core_multiplier: k_core,
            screener_multiplier: k_screener,
            demographics_multiplier: k_demo,
            screener_floor,
            demographics_floor,
        };
        prop_assert!(policy.validate().is_ok());
        let b = policy.plan(loi);
        prop_assert!(b.screener >= screener_floor);
        prop_assert!(b.demographics >= demographics_floor);
        prop_assert_eq!(b.total, b.screener + b.core_research + b.demographics);
    }

    #[test]
    fn any_accepted_policy_plans_without_overflow(
        loi in MIN_LOI_MINUTES..=MAX_LOI_MINUTES,
        k_core in 0.0f64..=MAX_MULTIPLIER,
        k_screener in 0.0f64..=MAX_MULTIPLIER,
        k_demo in 0.0f64..=MAX_MULTIPLIER,
        screener_floor in 1u32..=MAX_SECTION_QUESTIONS,
        demographics_floor in 1u32..=MAX_SECTION_QUESTIONS,
    ) {
        let policy = BudgetPolicy {
            core_multiplier: k_core,
            screener_multiplier: k_screener,
            demographics_multiplier: k_demo,
            screener_floor,
            demographics_floor,
        };
        prop_assert!(policy.validate().is_ok());
        let b = policy.plan(loi);
        prop_assert!(b.core_research <= MAX_SECTION_QUESTIONS);
        prop_assert_eq!(
            u64::from(b.total),
            u64::from(b.screener) + u64::from(b.core_research) + u64::from(b.demographics)
        );
        let plan = plan_batches(&b, &BrandList::placeholders(), Category::General, "India");
        prop_assert!(plan.covers_total());
        let sum: u32 = plan.iter().map(|b| b.count).sum();
        prop_assert_eq!(sum, b.total);
    }

    #[test]
    fn out_of_range_multipliers_are_rejected(k in (MAX_MULTIPLIER + 0.001)..1e12f64) {
        let policy = BudgetPolicy {
            core_multiplier: k,
            ..BudgetPolicy::default()
        };
        prop_assert!(policy.validate().is_err());
    }

    #[test]
    fn batches_cover_the_budget_exactly_once(
        screener in 0u32..40,
        core_research in 0u32..200,
        demographics in 0u32..40,
    ) {
        let budget = QuestionBudget {
            screener,
            core_research,
            demographics,
            total: screener + core_research + demographics,
        };
        let plan = plan_batches(&budget, &BrandList::placeholders(), Category::General, "India");

        prop_assert!(plan.covers_total());
        let mut next = 1;
        for b in plan.iter() {
            prop_assert_eq!(b.start, next);
            prop_assert_eq!(b.count, b.end - b.start + 1);
            prop_assert!(b.count > 0);
            next = b.end + 1;
        }
        prop_assert_eq!(next - 1, budget.total);
        let sum: u32 = plan.iter().map(|b| b.count).sum();
        prop_assert_eq!(sum, budget.total);

        let core_parts = plan
            .iter()
            .filter(|b| matches!(b.section, Section::CoreResearch { .. }))
            .count();
        prop_assert!(core_parts <= 2);
    }

    #[test]
    fn keywordless_text_is_general(objective in "[0-9 ]{0,40}", audience in "[0-9 ]{0,40}") {
        let c = CategoryClassifier::default().classify(&objective, &audience);
        prop_assert_eq!(c.category, Category::General);
        prop_assert_eq!(c.confidence, 0);
    }

    #[test]
    fn classification_is_idempotent(objective in ".{0,60}", audience in ".{0,60}") {
        let classifier = CategoryClassifier::default();
        prop_assert_eq!(
            classifier.classify(&objective, &audience),
            classifier.classify(&objective, &audience)
        );
    }

    #[test]
    fn static_resolution_is_always_usable(market in "[A-Za-z ]{0,20}", idx in 0usize..10) {
        let category = Category::ALL.get(idx).copied().unwrap_or(Category::General);
        let list = BrandResolver::default().resolve_static(category, &market);
        assert_brand_list(&list);
    }
}

#[test]
fn single_keyword_scores_exactly_one_weight() {
    let c = CategoryClassifier::default().classify("Study lipstick shade preferences", "Women 25-40");
    assert_eq!(c.category, Category::Cosmetics);
    assert_eq!(c.confidence, DEFAULT_KEYWORD_WEIGHT);
}

#[test]
fn minimum_loi_is_dominated_by_floors() {
    let b = budget::plan(MIN_LOI_MINUTES);
    assert_eq!(b.screener, 5);
    assert_eq!(b.demographics, 5);
    assert_eq!(b.core_research, 7);
}

struct AlwaysFails;

#[async_trait::async_trait]
impl BrandLookup for AlwaysFails {
    async fn lookup(
        &self,
        _category: Category,
        _market: &str,
        _count: usize,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Empty)
    }
}

#[tokio::test]
async fn resolution_survives_a_failing_lookup_for_every_category() {
    let resolver = BrandResolver::default();
    for category in Category::ALL.into_iter().chain([Category::General]) {
        for market in ["India", "United States", "Brazil", ""] {
            let a = resolver.resolve(category, market, Some(&AlwaysFails)).await;
            let b = resolver.resolve(category, market, Some(&AlwaysFails)).await;
            assert_brand_list(&a);
            assert_eq!(a, b);
        }
    }
}
