//! Questionnaire assembly and validation.
//!
//! Batch outputs are joined in plan order and checked for count, numbering,
//! duplicate questions and the required quality markers. A short result gets
//! exactly one completion pass for the missing tail; whatever is still wrong
//! afterwards is reported, never hidden and never retried.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::batch::{BatchPlan, Section};
use crate::error::{GenerationError, SurveyError};
use crate::generator::Generation;
use crate::parse::{match_marker, parse_questionnaire, question_markers, renumber, QuestionRecord};

// =============================================================================
// Rules
// =============================================================================

fn default_min_fraud_checks() -> usize {
    2
}
fn default_true() -> bool {
    true
}

/// Quality requirements shared by batch instructions and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRules {
    #[serde(default = "default_min_fraud_checks")]
    pub min_fraud_checks: usize,
    /// Require a likelihood-to-recommend question followed by a reason question.
    #[serde(default = "default_true")]
    pub require_nps_pair: bool,
    /// Renumber question markers sequentially when duplicates or gaps appear.
    #[serde(default = "default_true")]
    pub repair_numbering: bool,
}

impl Default for QualityRules {
    fn default() -> Self {
        Self {
            min_fraud_checks: default_min_fraud_checks(),
            require_nps_pair: true,
            repair_numbering: true,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// One unresolved problem in the assembled questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    Shortfall { planned: u32, actual: u32, missing: u32 },
    Excess { planned: u32, actual: u32 },
    DuplicateNumbers { numbers: Vec<u32> },
    NumberingGaps { missing: Vec<u32> },
    DuplicateQuestions { texts: Vec<String> },
    MissingTermination,
    InsufficientFraudChecks { required: usize, found: usize },
    MissingNpsPair,
    SupplementFailed { reason: String },
}

impl Discrepancy {
    pub fn describe(&self) -> String {
        match self {
            Self::Shortfall { planned, actual, missing } => {
                format!("{actual} of {planned} planned questions generated ({missing} missing)")
            }
            Self::Excess { planned, actual } => {
                format!("{actual} questions generated, {planned} planned")
            }
            Self::DuplicateNumbers { numbers } => format!("duplicate question numbers: {numbers:?}"),
            Self::NumberingGaps { missing } => format!("question numbers missing: {missing:?}"),
            Self::DuplicateQuestions { texts } => {
                format!("{} duplicated question texts", texts.len())
            }
            Self::MissingTermination => "no screener question carries termination logic".into(),
            Self::InsufficientFraudChecks { required, found } => {
                format!("{found} fraud/attention checks, {required} required")
            }
            Self::MissingNpsPair => "no likelihood-to-recommend question with follow-up".into(),
            Self::SupplementFailed { reason } => format!("completion pass failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub planned_total: u32,
    pub actual_count: u32,
    pub fraud_checks: usize,
    /// Question markers were rewritten to a 1-based sequence.
    pub renumbered: bool,
    /// The single completion pass was issued.
    pub supplement_requested: bool,
    pub discrepancies: Vec<Discrepancy>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Missing question count, if short.
    pub fn shortfall(&self) -> Option<u32> {
        self.discrepancies.iter().find_map(|d| match d {
            Discrepancy::Shortfall { missing, .. } => Some(*missing),
            _ => None,
        })
    }
}

// =============================================================================
// Assembler
// =============================================================================

/// Completion pass collaborator: writes questions `start..=end`.
#[async_trait]
pub trait CompletionPass: Send + Sync {
    async fn complete(
        &self,
        start: u32,
        end: u32,
        existing_questions: &[String],
    ) -> Result<Generation, GenerationError>;
}

/// Final questionnaire with its report.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub text: String,
    pub records: Vec<QuestionRecord>,
    pub report: ValidationReport,
    /// Accounting for the completion pass, when one ran.
    pub supplement: Option<Generation>,
}

/// Join batch outputs in order, separated by blank lines.
pub fn join_outputs<S: AsRef<str>>(outputs: &[S]) -> String {
    outputs
        .iter()
        .map(|o| o.as_ref().trim())
        .filter(|o| !o.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireAssembler {
    pub rules: QualityRules,
}

impl QuestionnaireAssembler {
    pub fn new(rules: QualityRules) -> Self {
        Self { rules }
    }

    /// Validate `text` against `plan`. Pure.
    pub fn assess(&self, text: &str, plan: &BatchPlan) -> ValidationReport {
        let markers = question_markers(text);
        let records = parse_questionnaire(text);
        let actual = markers.len() as u32;
        let planned = plan.total;
        let mut discrepancies = Vec::new();

        if actual < planned {
            discrepancies.push(Discrepancy::Shortfall {
                planned,
                actual,
                missing: planned - actual,
            });
        } else if actual > planned {
            discrepancies.push(Discrepancy::Excess { planned, actual });
        }

        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for m in &markers {
            *counts.entry(m.number).or_default() += 1;
        }
        let duplicates: Vec<u32> = counts
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(number, _)| *number)
            .collect();
        if !duplicates.is_empty() {
            discrepancies.push(Discrepancy::DuplicateNumbers { numbers: duplicates });
        }
        if let Some(&max) = counts.keys().next_back() {
            let gaps: Vec<u32> = (1..=max).filter(|n| !counts.contains_key(n)).collect();
            if !gaps.is_empty() {
                discrepancies.push(Discrepancy::NumberingGaps { missing: gaps });
            }
        }

        let duplicate_texts = duplicate_texts(&records);
        if !duplicate_texts.is_empty() {
            discrepancies.push(Discrepancy::DuplicateQuestions {
                texts: duplicate_texts,
            });
        }

        let screener_planned = plan.iter().any(|b| b.section == Section::Screener);
        if screener_planned && !records.iter().any(QuestionRecord::terminates) {
            discrepancies.push(Discrepancy::MissingTermination);
        }

        let fraud_checks = records.iter().filter(|r| r.fraud_check).count();
        if fraud_checks < self.rules.min_fraud_checks {
            discrepancies.push(Discrepancy::InsufficientFraudChecks {
                required: self.rules.min_fraud_checks,
                found: fraud_checks,
            });
        }

        if self.rules.require_nps_pair && !has_nps_pair(&records) {
            discrepancies.push(Discrepancy::MissingNpsPair);
        }

        ValidationReport {
            planned_total: planned,
            actual_count: actual,
            fraud_checks,
            renumbered: false,
            supplement_requested: false,
            discrepancies,
        }
    }

    /// Join, repair, validate, and run at most one completion pass.
    ///
    /// Only a credential failure of the completion pass is an error; any
    /// other failure is recorded in the report.
    pub async fn assemble<S: AsRef<str>>(
        &self,
        outputs: &[S],
        plan: &BatchPlan,
        completion: &dyn CompletionPass,
    ) -> Result<Assembly, SurveyError> {
        let mut text = join_outputs(outputs);
        let mut renumbered = self.repair(&mut text);
        let mut report = self.assess(&text, plan);
        let mut supplement = None;
        let mut supplement_failure = None;

        if report.actual_count < plan.total {
            let start = report.actual_count + 1;
            let end = plan.total;
            info!(start, end, "questionnaire short, requesting completion pass");
            let existing = existing_questions(&text);
            match completion.complete(start, end, &existing).await {
                Ok(generation) => {
                    if !generation.text.trim().is_empty() {
                        text = join_outputs(&[text.as_str(), generation.text.as_str()]);
                    }
                    supplement = Some(generation);
                }
                Err(e) if e.is_configuration() => return Err(SurveyError::configuration(e.to_string())),
                Err(e) => {
                    warn!(error = %e, "completion pass failed");
                    supplement_failure = Some(e.to_string());
                }
            }
            renumbered |= self.repair(&mut text);
            report = self.assess(&text, plan);
            report.supplement_requested = true;
            if let Some(reason) = supplement_failure {
                report.discrepancies.push(Discrepancy::SupplementFailed { reason });
            }
        }
        report.renumbered = renumbered;

        if report.is_clean() {
            info!(questions = report.actual_count, "questionnaire validated");
        } else {
            for d in &report.discrepancies {
                warn!(problem = %d.describe(), "questionnaire validation");
            }
        }

        Ok(Assembly {
            records: parse_questionnaire(&text),
            text,
            report,
            supplement,
        })
    }

    fn repair(&self, text: &mut String) -> bool {
        if !self.rules.repair_numbering {
            return false;
        }
        let (fixed, changed) = renumber(text);
        if changed {
            *text = fixed;
        }
        changed
    }
}

fn duplicate_texts(records: &[QuestionRecord]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut dupes = BTreeSet::new();
    for r in records {
        let key = r.text.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let n = seen.entry(key.clone()).or_default();
        *n += 1;
        if *n == 2 {
            dupes.insert(key);
        }
    }
    dupes.into_iter().collect()
}

fn has_nps_pair(records: &[QuestionRecord]) -> bool {
    records.windows(2).any(|w| {
        let ask = w[0].text.to_lowercase();
        let follow = w[1].text.to_lowercase();
        ask.contains("recommend")
            && w[0].has_zero_to_ten_scale()
            && (follow.contains("why") || follow.contains("reason"))
    })
}

/// `Q<n>. <text>` lines already present, for the completion prompt.
fn existing_questions(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(match_marker)
        .map(|(n, q)| format!("Q{n}. {q}"))
        .collect()
}
