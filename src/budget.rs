//! LOI-driven question budget.
//!
//! The default policy allocates `floor(loi × 1.5)` core-research questions,
//! `max(5, floor(loi × 0.3))` screener questions and
//! `max(5, floor(loi × 0.25))` demographic questions. Multipliers and floors
//! are configurable; the floors keep short interviews structurally valid.
//! Each section is capped at [`MAX_SECTION_QUESTIONS`], so `total` is always
//! the exact sum of the three counts.

use serde::{Deserialize, Serialize};

/// Upper bound on any one section's question count.
pub const MAX_SECTION_QUESTIONS: u32 = 10_000;

/// Largest multiplier a policy may use.
pub const MAX_MULTIPLIER: f64 = 10.0;

/// Per-section question counts. `total` is always the sum of the three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBudget {
    pub screener: u32,
    pub core_research: u32,
    pub demographics: u32,
    pub total: u32,
}

impl QuestionBudget {
    fn new(screener: u32, core_research: u32, demographics: u32) -> Self {
        let screener = screener.min(MAX_SECTION_QUESTIONS);
        let core_research = core_research.min(MAX_SECTION_QUESTIONS);
        let demographics = demographics.min(MAX_SECTION_QUESTIONS);
        Self {
            screener,
            core_research,
            demographics,
            total: screener + core_research + demographics,
        }
    }
}

fn default_core_multiplier() -> f64 {
    1.5
}
fn default_screener_multiplier() -> f64 {
    0.3
}
fn default_demographics_multiplier() -> f64 {
    0.25
}
fn default_floor() -> u32 {
    5
}

/// Allocation formula for [`plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPolicy {
    #[serde(default = "default_core_multiplier")]
    pub core_multiplier: f64,
    #[serde(default = "default_screener_multiplier")]
    pub screener_multiplier: f64,
    #[serde(default = "default_demographics_multiplier")]
    pub demographics_multiplier: f64,
    #[serde(default = "default_floor")]
    pub screener_floor: u32,
    #[serde(default = "default_floor")]
    pub demographics_floor: u32,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            core_multiplier: default_core_multiplier(),
            screener_multiplier: default_screener_multiplier(),
            demographics_multiplier: default_demographics_multiplier(),
            screener_floor: default_floor(),
            demographics_floor: default_floor(),
        }
    }
}

impl BudgetPolicy {
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("core_multiplier", self.core_multiplier),
            ("screener_multiplier", self.screener_multiplier),
            ("demographics_multiplier", self.demographics_multiplier),
        ] {
            if !v.is_finite() || !(0.0..=MAX_MULTIPLIER).contains(&v) {
                return Err(format!("{name} must be between 0 and {MAX_MULTIPLIER}"));
            }
        }
        for (name, floor) in [
            ("screener_floor", self.screener_floor),
            ("demographics_floor", self.demographics_floor),
        ] {
            if !(1..=MAX_SECTION_QUESTIONS).contains(&floor) {
                return Err(format!("{name} must be between 1 and {MAX_SECTION_QUESTIONS}"));
            }
        }
        Ok(())
    }

    /// Compute the budget for an interview length. Pure and total.
    pub fn plan(&self, loi_minutes: u32) -> QuestionBudget {
        let core_research = scaled(loi_minutes, self.core_multiplier);
        let screener = self
            .screener_floor
            .max(scaled(loi_minutes, self.screener_multiplier));
        let demographics = self
            .demographics_floor
            .max(scaled(loi_minutes, self.demographics_multiplier));
        QuestionBudget::new(screener, core_research, demographics)
    }
}

/// `floor(loi × k)`, saturating. Negative or NaN multipliers contribute zero.
fn scaled(loi_minutes: u32, k: f64) -> u32 {
    let v = (loi_minutes as f64 * k).floor();
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= u32::MAX as f64 {
        u32::MAX
    } else {
        v as u32
    }
}

/// Budget under the default policy.
pub fn plan(loi_minutes: u32) -> QuestionBudget {
    BudgetPolicy::default().plan(loi_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_minute_interview() {
        let b = plan(20);
        assert_eq!(b.core_research, 30);
        assert_eq!(b.screener, 6);
        assert_eq!(b.demographics, 5);
        assert_eq!(b.total, 41);
    }

    #[test]
    fn floors_dominate_at_minimum_loi() {
        let b = plan(crate::survey::MIN_LOI_MINUTES);
        assert_eq!(b.screener, 5);
        assert_eq!(b.demographics, 5);
        assert_eq!(b.core_research, 7);
        assert_eq!(b.total, 17);
    }

    #[test]
    fn fifteen_minutes_truncates() {
        let b = plan(15);
        assert_eq!(b.core_research, 22);
        assert_eq!(b.screener, 5);
        assert_eq!(b.demographics, 5);
    }

    #[test]
    fn alternate_policy_is_honoured() {
        let policy = BudgetPolicy {
            core_multiplier: 2.5,
            ..BudgetPolicy::default()
        };
        assert!(policy.validate().is_ok());
        assert_eq!(policy.plan(20).core_research, 50);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = BudgetPolicy {
            screener_floor: 0,
            ..BudgetPolicy::default()
        };
        assert!(policy.validate().is_err());
        let policy = BudgetPolicy {
            core_multiplier: f64::NAN,
            ..BudgetPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn oversized_multiplier_is_rejected() {
        let policy = BudgetPolicy {
            core_multiplier: 1e9,
            ..BudgetPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn sections_are_capped_so_the_total_stays_exact() {
        let policy = BudgetPolicy {
            core_multiplier: 1e9,
            ..BudgetPolicy::default()
        };
        let b = policy.plan(20);
        assert_eq!(b.core_research, MAX_SECTION_QUESTIONS);
        assert_eq!(b.total, b.screener + b.core_research + b.demographics);

        let b = BudgetPolicy::default().plan(u32::MAX);
        assert_eq!(b.total, 3 * MAX_SECTION_QUESTIONS);
    }
}
