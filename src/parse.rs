//! Questionnaire text parser.
//!
//! Recovers question markers and per-question metadata from generated
//! text. The result is best effort: lines that fit no known shape are
//! ignored, and invariants are checked by the assembler, not here.
//!
//! A question marker is a line starting with `Q<number>` and a terminator
//! (`.`, `:` or `)`), optionally wrapped in markdown emphasis:
//!
//! ```text
//! Q1. What is your age?
//! **Q2:** Which city do you live in?
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:#+\s*)?\**\s*[Qq](\d+)\s*\**\s*[.:)]\s*\**\s*(.*)$")
        .expect("Invalid question marker regex")
});

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*[\[\-*•]*\s*\**\s*(purpose|data type|validation rule|statistical methods|required for analysis|quality checks|estimated time|skip logic|termination logic|termination|fraud detection|fraud check|scale)\s*\**\s*:\s*\**\s*(.*?)\s*\]?\s*$",
    )
    .expect("Invalid metadata field regex")
});

static OPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-•]\s*|\*\s+|[A-Za-z0-9]{1,2}[.)]\s+)(.+)$").expect("Invalid option regex")
});

static ZERO_TO_TEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b0\s*(?:-|–|to)\s*10\b").expect("Invalid 0-10 scale regex"));

/// A question marker found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMarker {
    pub number: u32,
    /// Zero-based line index.
    pub line: usize,
}

/// Structured view of one generated question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub number: u32,
    pub text: String,
    /// Last section banner seen before the question.
    pub section: Option<String>,
    pub options: Vec<String>,
    pub scale: Option<String>,
    pub purpose: Option<String>,
    pub data_type: Option<String>,
    pub validation_rule: Option<String>,
    pub statistical_methods: Vec<String>,
    pub required_for_analysis: Option<String>,
    pub quality_checks: Option<String>,
    pub estimated_time: Option<String>,
    pub skip_logic: Option<String>,
    pub termination_logic: Option<String>,
    pub fraud_detection: Option<String>,
    pub fraud_check: bool,
}

impl QuestionRecord {
    /// Termination logic that actually ends the survey.
    pub fn terminates(&self) -> bool {
        self.termination_logic
            .as_deref()
            .is_some_and(|t| t.to_lowercase().starts_with("terminate"))
    }

    /// Offers a 0-10 scale in its text, scale or options.
    pub fn has_zero_to_ten_scale(&self) -> bool {
        ZERO_TO_TEN_RE.is_match(&self.text)
            || self.scale.as_deref().is_some_and(|s| ZERO_TO_TEN_RE.is_match(s))
            || self.options.iter().any(|o| ZERO_TO_TEN_RE.is_match(o))
    }

    fn has_metadata(&self) -> bool {
        self.scale.is_some()
            || self.purpose.is_some()
            || self.data_type.is_some()
            || self.validation_rule.is_some()
            || !self.statistical_methods.is_empty()
            || self.termination_logic.is_some()
            || self.fraud_detection.is_some()
    }

    fn set_field(&mut self, name: &str, value: &str) {
        let value = value.trim().trim_end_matches('*').trim().to_string();
        match name.to_lowercase().as_str() {
            "purpose" => self.purpose = Some(value),
            "data type" => self.data_type = Some(value),
            "validation rule" => self.validation_rule = Some(value),
            "statistical methods" => {
                self.statistical_methods = value
                    .split([',', ';'])
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "required for analysis" => self.required_for_analysis = Some(value),
            "quality checks" => self.quality_checks = Some(value),
            "estimated time" => self.estimated_time = Some(value),
            "skip logic" => self.skip_logic = Some(value),
            "termination logic" | "termination" => self.termination_logic = Some(value),
            "fraud detection" | "fraud check" => self.fraud_detection = Some(value),
            "scale" => self.scale = Some(value),
            _ => {}
        }
    }

    fn finish(mut self) -> Self {
        let flagged = self
            .fraud_detection
            .as_deref()
            .is_some_and(|f| f.to_lowercase().starts_with("yes"));
        self.fraud_check = flagged || self.text.to_lowercase().contains("attention check");
        self
    }
}

/// Match a marker line, returning the number and the question text.
pub fn match_marker(line: &str) -> Option<(u32, &str)> {
    let caps = MARKER_RE.captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let text = caps.get(2).map_or("", |m| m.as_str());
    Some((number, text.trim().trim_end_matches('*').trim()))
}

pub fn question_markers(text: &str) -> Vec<QuestionMarker> {
    text.lines()
        .enumerate()
        .filter_map(|(line, l)| match_marker(l).map(|(number, _)| QuestionMarker { number, line }))
        .collect()
}

fn is_section_banner(line: &str) -> bool {
    let t = line.trim();
    t.starts_with("===") || t.to_uppercase().starts_with("SECTION") || t.starts_with("## ")
}

/// Parse every question block in `text`.
pub fn parse_questionnaire(text: &str) -> Vec<QuestionRecord> {
    let mut records = Vec::new();
    let mut section: Option<String> = None;
    let mut current: Option<QuestionRecord> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((number, q)) = match_marker(line) {
            if let Some(done) = current.take() {
                records.push(done.finish());
            }
            current = Some(QuestionRecord {
                number,
                text: q.to_string(),
                section: section.clone(),
                ..QuestionRecord::default()
            });
            continue;
        }
        if is_section_banner(line) {
            let title = line.trim().trim_matches(|c| c == '=' || c == '#' || c == '*').trim();
            if !title.is_empty() {
                section = Some(title.to_string());
            }
            continue;
        }
        let Some(record) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = FIELD_RE.captures(line) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let value = caps.get(2).map_or("", |m| m.as_str());
            record.set_field(name, value);
        } else if let Some(caps) = OPTION_RE.captures(line) {
            if let Some(opt) = caps.get(1) {
                record.options.push(opt.as_str().trim().to_string());
            }
        } else if record.options.is_empty() && !record.has_metadata() {
            record.text.push(' ');
            record.text.push_str(line.trim());
        }
    }
    if let Some(done) = current {
        records.push(done.finish());
    }
    records
}

/// Rewrite marker numbers as 1, 2, 3, ... in order of appearance.
/// Returns the new text and whether anything changed.
pub fn renumber(text: &str) -> (String, bool) {
    let mut next = 1u32;
    let mut changed = false;
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let Some(caps) = MARKER_RE.captures(line) else {
                return line.to_string();
            };
            let Some(digits) = caps.get(1) else {
                return line.to_string();
            };
            let expected = next;
            next += 1;
            if digits.as_str().parse::<u32>().ok() == Some(expected) {
                return line.to_string();
            }
            changed = true;
            format!(
                "{}{}{}",
                &line[..digits.start()],
                expected,
                &line[digits.end()..]
            )
        })
        .collect();
    (lines.join("\n"), changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SECTION 1: SCREENER & TERMINATION CRITERIA

Q1. What is your age?
- Under 18
- 18-24
- 25-34
Purpose: Age qualification
Data Type: Categorical
Statistical Methods: Frequency analysis, Cross-tabulation
Termination Logic: Terminate if Under 18
Fraud Detection: No

**Q2:** Please select \"Somewhat agree\" for this attention check.
a) Strongly agree
b) Somewhat agree
[Purpose: Data quality]
[Fraud Detection: Yes, instructed response]
[Termination Logic: None]

Q3) How likely are you to recommend your current car brand
to a friend or colleague?
Scale: 0-10 (0=Not at all likely, 10=Extremely likely)

Q4. Why did you give that score?
Data Type: Open-ended text
";

    #[test]
    fn markers_cover_all_emphasis_forms() {
        let numbers: Vec<u32> = question_markers(SAMPLE).iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(match_marker("  **Q12.** Which brand?"), Some((12, "Which brand?")));
        assert_eq!(match_marker("Quality Checks: straight-lining"), None);
        assert_eq!(match_marker("Q. no number"), None);
    }

    #[test]
    fn fields_and_options_are_recovered() {
        let records = parse_questionnaire(SAMPLE);
        assert_eq!(records.len(), 4);

        let q1 = &records[0];
        assert_eq!(q1.text, "What is your age?");
        assert_eq!(q1.options, vec!["Under 18", "18-24", "25-34"]);
        assert_eq!(q1.purpose.as_deref(), Some("Age qualification"));
        assert_eq!(q1.statistical_methods, vec!["Frequency analysis", "Cross-tabulation"]);
        assert!(q1.terminates());
        assert!(!q1.fraud_check);
        assert_eq!(q1.section.as_deref(), Some("SECTION 1: SCREENER & TERMINATION CRITERIA"));

        let q2 = &records[1];
        assert_eq!(q2.options, vec!["Strongly agree", "Somewhat agree"]);
        assert_eq!(q2.fraud_detection.as_deref(), Some("Yes, instructed response"));
        assert!(q2.fraud_check);
        assert!(!q2.terminates());
    }

    #[test]
    fn continuation_lines_join_question_text() {
        let records = parse_questionnaire(SAMPLE);
        assert_eq!(
            records[2].text,
            "How likely are you to recommend your current car brand to a friend or colleague?"
        );
        assert!(records[2].has_zero_to_ten_scale());
        assert!(!records[3].has_zero_to_ten_scale());
    }

    #[test]
    fn renumber_fixes_duplicates_and_gaps() {
        let text = "Q1. A?\nQ1. B?\n- opt\n**Q7:** C?";
        let (fixed, changed) = renumber(text);
        assert!(changed);
        assert_eq!(fixed, "Q1. A?\nQ2. B?\n- opt\n**Q3:** C?");

        let (same, changed) = renumber("Q1. A?\nQ2. B?");
        assert!(!changed);
        assert_eq!(same, "Q1. A?\nQ2. B?");
    }
}
