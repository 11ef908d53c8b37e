//! Export collaborators.
//!
//! Each exporter turns an assembled questionnaire plus its survey spec and
//! the metadata catalog into bytes. Exporters do not validate content.

mod document;
mod text;
mod workbook;

use std::fmt;
use std::str::FromStr;

use crate::budget::QuestionBudget;
use crate::catalog::MetadataCatalog;
use crate::error::SurveyError;
use crate::pipeline::GeneratedSurvey;
use crate::survey::SurveySpec;

pub use document::{DocxExporter, MarkdownExporter};
pub use text::{format_questionnaire, PlainTextExporter};
pub use workbook::{build_workbook, catalog_sheets, Sheet, Workbook, WorkbookExporter};

/// Inputs shared by every exporter.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    pub spec: &'a SurveySpec,
    pub questionnaire: &'a str,
    pub budget: &'a QuestionBudget,
    pub catalog: &'a MetadataCatalog,
    pub generated_at: &'a str,
}

impl<'a> ExportInput<'a> {
    pub fn from_session(session: &'a GeneratedSurvey) -> Self {
        Self {
            spec: &session.plan.spec,
            questionnaire: &session.questionnaire,
            budget: &session.plan.budget,
            catalog: MetadataCatalog::global(),
            generated_at: &session.created_at,
        }
    }
}

pub trait Exporter {
    fn extension(&self) -> &'static str;
    fn export(&self, input: &ExportInput<'_>) -> Result<Vec<u8>, SurveyError>;
}

/// Output formats selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
    Document,
    Workbook,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Text, Self::Markdown, Self::Document, Self::Workbook];

    pub fn exporter(self) -> Box<dyn Exporter> {
        match self {
            Self::Text => Box::new(PlainTextExporter),
            Self::Markdown => Box::new(MarkdownExporter),
            Self::Document => Box::new(DocxExporter),
            Self::Workbook => Box::new(WorkbookExporter),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Document => "document",
            Self::Workbook => "workbook",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "document" | "docx" | "doc" | "word" => Ok(Self::Document),
            "workbook" | "xlsx" | "excel" => Ok(Self::Workbook),
            other => Err(SurveyError::Export(format!("unknown export format: {other}"))),
        }
    }
}

/// Lines that carry routing or analysis metadata, highlighted by the text
/// and document exporters.
pub(crate) fn is_logic_line(line: &str) -> bool {
    [
        "Statistical Methods:",
        "Fraud Detection:",
        "Skip Logic:",
        "Termination Logic:",
    ]
    .iter()
    .any(|k| line.contains(k))
}

pub(crate) fn is_section_line(line: &str) -> bool {
    let t = line.trim();
    t.starts_with("===") || t.to_uppercase().contains("SECTION")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::budget;

    pub const QUESTIONNAIRE: &str = "\
=== SECTION 1: SCREENER & TERMINATION CRITERIA ===

Q1. What is your age?
- Under 18
- 18-34
Purpose: Age qualification
Statistical Methods: Frequency analysis
Termination Logic: Terminate if Under 18
Fraud Detection: No

Q2. Please select Agree for this attention check.
- Agree
- Disagree
Fraud Detection: Yes";

    pub fn spec() -> SurveySpec {
        SurveySpec::new("Understand EV purchase drivers", "Urban car buyers | 25-45")
    }

    pub fn with_input<T>(f: impl FnOnce(&ExportInput<'_>) -> T) -> T {
        let spec = spec();
        let budget = budget::plan(spec.loi_minutes);
        f(&ExportInput {
            spec: &spec,
            questionnaire: QUESTIONNAIRE,
            budget: &budget,
            catalog: MetadataCatalog::global(),
            generated_at: "2026-01-01T00:00:00+00:00",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_by_name_and_alias() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Workbook);
        assert_eq!("docx".parse::<ExportFormat>().unwrap(), ExportFormat::Document);
        assert!("pdf".parse::<ExportFormat>().is_err());
        for f in ExportFormat::ALL {
            assert_eq!(f.as_str().parse::<ExportFormat>().unwrap(), f);
        }
    }

    #[test]
    fn every_exporter_produces_bytes() {
        fixtures::with_input(|input| {
            for f in ExportFormat::ALL {
                let bytes = f.exporter().export(input).unwrap();
                assert!(!bytes.is_empty(), "{f}");
            }
        });
    }

    #[test]
    fn office_aliases_produce_office_files() {
        fixtures::with_input(|input| {
            for (alias, ext) in [("xlsx", "xlsx"), ("doc", "docx"), ("document", "docx")] {
                let exporter = alias.parse::<ExportFormat>().unwrap().exporter();
                assert_eq!(exporter.extension(), ext);
                assert!(exporter.export(input).unwrap().starts_with(b"PK"), "{alias}");
            }
        });
    }
}
