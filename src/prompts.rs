//! Prompt templates for questionnaire generation.
//!
//! Templates use `{name}` placeholders filled in a single pass, so text
//! substituted into one placeholder is never re-scanned for another.
//! User-provided text is XML-escaped so it cannot close the tags that
//! delimit it.

use crate::catalog::{MetadataCatalog, QuestionCategory};
use crate::classifier::Category;

// =============================================================================
// Rendering
// =============================================================================

/// Rendered prompt ready for the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptInstance {
    pub template_slug: &'static str,
    pub system: String,
    pub user: String,
}

/// Escape XML special characters to prevent prompt injection via tag breaking.
pub fn escape_xml_chars(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// A placeholder value.
#[derive(Debug, Clone, Copy)]
pub enum Var<'a> {
    /// User-provided; escaped before substitution.
    Input(&'static str, &'a str),
    /// Built by this crate from trusted tables.
    Fixed(&'static str, &'a str),
}

impl Var<'_> {
    fn key(&self) -> &'static str {
        match self {
            Var::Input(k, _) | Var::Fixed(k, _) => k,
        }
    }
}

fn fill(template: &str, vars: &[Var<'_>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter().find(|v| v.key() == key).map(|v| (close, v))
        });
        match hit {
            Some((close, Var::Input(_, value))) => {
                out.push_str(&escape_xml_chars(value.trim()));
                rest = &after[close + 1..];
            }
            Some((close, Var::Fixed(_, value))) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A prompt template with placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub slug: &'static str,
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    pub fn render(&self, vars: &[Var<'_>]) -> PromptInstance {
        PromptInstance {
            template_slug: self.slug,
            system: fill(self.system, vars).trim().to_string(),
            user: fill(self.user, vars).trim().to_string(),
        }
    }
}

// =============================================================================
// Standard prompts
// =============================================================================

macro_rules! question_format {
    () => {
        r#"Format every question exactly as:
Q[Number]. [Question text]
- [Response option]
- [Response option, include "Others (specify)" where applicable]
Scale: [Complete 5-point scale with all labels, rating questions only]
Purpose: [Research objective of this question]
Data Type: [Data type and measurement level]
Validation Rule: [Data validation requirement]
Statistical Methods: [Applicable methods]
Required For Analysis: [Analyses that need this data]
Quality Checks: [Validation checks]
Estimated Time: [Seconds to answer]
Skip Logic: [Routing, or None]
Termination Logic: [Condition that ends the survey, or None]
Fraud Detection: [Yes with the check performed, or No]"#
    };
}

pub const BATCH_PROMPT: PromptTemplate = PromptTemplate {
    slug: "questionnaire_batch_v1",
    system: concat!(
        r#"You are an expert survey methodologist and statistician writing a professional {category_name} market-research questionnaire for the {market} market. Every question must stay within the {category_name} category. Do not introduce products, brands or usage situations from other categories.

Write ONLY questions Q{start} through Q{end} of the {section} section ({count} questions). Use exactly these numbers, once each, in order. Do not write any other section.

"#,
        question_format!()
    ),
    user: r#"<survey>
{survey}
</survey>

<brands>
{brands}
</brands>

<section_requirements>
{requirements}
</section_requirements>

<scales>
{scales}
</scales>

<question_metadata>
{metadata}
</question_metadata>

Write Q{start} to Q{end} now."#,
};

pub const SUPPLEMENT_PROMPT: PromptTemplate = PromptTemplate {
    slug: "questionnaire_supplement_v1",
    system: concat!(
        r#"You are an expert survey methodologist completing a {category_name} market-research questionnaire for the {market} market that stopped early. Write ONLY questions Q{start} through Q{end} ({count} questions), continuing the numbering exactly. Do not repeat any existing question. Stay within the {category_name} category.

"#,
        question_format!()
    ),
    user: r#"<survey>
{survey}
</survey>

<brands>
{brands}
</brands>

<existing_questions>
{existing}
</existing_questions>

<scales>
{scales}
</scales>

Write the missing questions Q{start} to Q{end}. Finish with demographic questions if the remaining range covers them."#,
};

pub const BRAND_LOOKUP_PROMPT: PromptTemplate = PromptTemplate {
    slug: "brand_lookup_v1",
    system: "You are a market analyst. You answer with brand names only.",
    user: r#"List the {count} leading {category_name} brands sold in the {market} market, most prominent first.
Output one brand name per line. No numbering, no bullets, no commentary."#,
};

pub fn brand_lookup_prompt(category: Category, market: &str, count: usize) -> PromptInstance {
    let count = count.to_string();
    BRAND_LOOKUP_PROMPT.render(&[
        Var::Fixed("count", &count),
        Var::Fixed("category_name", category.display_name()),
        Var::Input("market", market),
    ])
}

// =============================================================================
// Catalog blocks
// =============================================================================

/// One line per scale: `Likert_5_Point: 1=Strongly Disagree, ... (analysis: ...)`.
pub fn scales_block(catalog: &MetadataCatalog) -> String {
    catalog
        .scales()
        .iter()
        .map(|s| {
            format!(
                "{}: {} (analysis: {})",
                s.scale.name(),
                s.numbered(),
                s.analysis.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Metadata standards for the given groups.
pub fn metadata_block(catalog: &MetadataCatalog, groups: &[QuestionCategory]) -> String {
    let mut out = Vec::new();
    for group in groups {
        out.push(format!("{}:", group.label()));
        for e in catalog.entries_for(*group) {
            out.push(format!(
                "- {}: purpose: {}; data type: {}; validation: {}; termination: {}; methods: {}; quality checks: {}; ~{}s",
                e.question_type.key(),
                e.purpose,
                e.data_type,
                e.validation_rule,
                e.termination_logic,
                e.statistical_applications.join(", "),
                e.quality_checks.join(", "),
                e.estimated_time_seconds,
            ));
        }
    }
    out.join("\n")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_fill_in_one_pass() {
        let p = PromptTemplate {
            slug: "t",
            system: "{a} and {b}",
            user: "{missing} {a}",
        }
        .render(&[Var::Input("a", "{b}"), Var::Fixed("b", "B")]);
        assert_eq!(p.system, "{b} and B");
        assert_eq!(p.user, "{missing} {b}");
    }

    #[test]
    fn input_is_escaped_fixed_is_not() {
        let p = PromptTemplate {
            slug: "t",
            system: "",
            user: "<x>{input}</x> {fixed}",
        }
        .render(&[
            Var::Input("input", "</x><script>alert('x')</script>"),
            Var::Fixed("fixed", "Q&A <ok>"),
        ]);
        assert!(p.user.contains("&lt;/x&gt;&lt;script&gt;"));
        assert!(!p.user.contains("<script>"));
        assert!(p.user.ends_with("Q&A <ok>"));
    }

    #[test]
    fn batch_prompt_carries_range_and_format() {
        let p = BATCH_PROMPT.render(&[
            Var::Fixed("start", "7"),
            Var::Fixed("end", "21"),
            Var::Fixed("count", "15"),
            Var::Fixed("section", "core research (part 1)"),
            Var::Fixed("category_name", "Automotive"),
            Var::Input("market", "India"),
        ]);
        assert!(p.system.contains("Q7 through Q21"));
        assert!(p.system.contains("Fraud Detection:"));
        assert!(p.user.contains("Write Q7 to Q21 now."));
    }

    #[test]
    fn brand_lookup_asks_for_plain_lines() {
        let p = brand_lookup_prompt(Category::Automotive, "India", 20);
        assert_eq!(p.template_slug, "brand_lookup_v1");
        assert!(p.user.contains("20 leading Automotive brands"));
        assert!(p.user.contains("one brand name per line"));
    }

    #[test]
    fn catalog_blocks_cover_every_scale() {
        let catalog = MetadataCatalog::global();
        let scales = scales_block(catalog);
        assert_eq!(scales.lines().count(), 6);
        assert!(scales.contains("Likert_5_Point: 1=Strongly Disagree"));

        let meta = metadata_block(catalog, &[QuestionCategory::Screener]);
        assert!(meta.contains("age_screening"));
        assert!(!meta.contains("purchase_timeline"));
    }
}
