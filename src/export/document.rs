use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

use super::{is_logic_line, is_section_line, ExportInput, Exporter};
use crate::error::SurveyError;
use crate::parse::match_marker;

/// Layout shared by the Markdown and Word renderings.
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Title(String),
    Heading(String),
    Section(String),
    Question(String),
    Table(Vec<(String, String)>),
    Bullet(String),
    Logic(String),
    Text(String),
}

fn document_blocks(input: &ExportInput<'_>) -> Vec<Block> {
    let spec = input.spec;
    let specs = [
        ("Survey Objective", spec.objective.clone()),
        ("Target Audience", spec.target_audience.clone()),
        ("Expected LOI", format!("{} minutes", spec.loi_minutes)),
        ("Methodology", spec.methodology.label().to_string()),
        ("Device Context", spec.device_context.label().to_string()),
        ("Market/Country", spec.market.clone()),
        ("Statistical Methods", spec.statistical_method_labels().join(", ")),
        ("Generation Date", input.generated_at.to_string()),
    ];

    let b = input.budget;
    let mut blocks = vec![
        Block::Title("Professional Survey Questionnaire".into()),
        Block::Heading("Survey Specifications".into()),
        Block::Table(specs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()),
        Block::Heading("Question Distribution".into()),
        Block::Bullet(format!("Screener Questions: {}", b.screener)),
        Block::Bullet(format!("Core Research Questions: {}", b.core_research)),
        Block::Bullet(format!("Demographics Questions: {}", b.demographics)),
        Block::Bullet(format!("Total Questions: {}", b.total)),
        Block::Heading("Complete Questionnaire".into()),
    ];

    for line in input.questionnaire.lines() {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        let block = if match_marker(t).is_some() {
            Block::Question(t.to_string())
        } else if is_section_line(t) {
            Block::Section(t.trim_matches('=').trim().to_string())
        } else if is_logic_line(t) {
            Block::Logic(t.to_string())
        } else if t.starts_with('-') || t.starts_with('•') {
            Block::Bullet(t.trim_start_matches(['-', '•']).trim().to_string())
        } else {
            Block::Text(t.to_string())
        };
        blocks.push(block);
    }
    blocks
}

/// Word-processor style document rendered as Markdown.
pub struct MarkdownExporter;

fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

impl Exporter for MarkdownExporter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn export(&self, input: &ExportInput<'_>) -> Result<Vec<u8>, SurveyError> {
        let mut out = Vec::new();
        for block in document_blocks(input) {
            match block {
                Block::Title(t) => out.push(format!("# {t}")),
                Block::Heading(t) => out.extend([String::new(), format!("## {t}"), String::new()]),
                Block::Section(t) => out.extend([String::new(), format!("### {t}"), String::new()]),
                Block::Question(t) => {
                    out.extend([String::new(), format!("#### {t}"), String::new()])
                }
                Block::Table(rows) => {
                    out.push("| Field | Value |".to_string());
                    out.push("|---|---|".to_string());
                    out.extend(rows.iter().map(|(k, v)| format!("| {k} | {} |", cell(v))));
                }
                Block::Bullet(t) => out.push(format!("- {t}")),
                Block::Logic(t) => out.push(format!("*{t}*  ")),
                Block::Text(t) => out.push(format!("{t}  ")),
            }
        }
        out.push(String::new());
        Ok(out.join("\n").into_bytes())
    }
}

/// The same document as a Word `.docx` file.
pub struct DocxExporter;

/// Run sizes are in half-points.
fn heading(text: &str, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(size))
}

fn table_cell(text: &str, bold: bool) -> TableCell {
    let run = Run::new().add_text(text);
    let run = if bold { run.bold() } else { run };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

impl Exporter for DocxExporter {
    fn extension(&self) -> &'static str {
        "docx"
    }

    fn export(&self, input: &ExportInput<'_>) -> Result<Vec<u8>, SurveyError> {
        let mut docx = Docx::new();
        for block in document_blocks(input) {
            docx = match block {
                Block::Title(t) => docx.add_paragraph(heading(&t, 40)),
                Block::Heading(t) => docx.add_paragraph(heading(&t, 32)),
                Block::Section(t) => docx.add_paragraph(heading(&t, 28)),
                Block::Question(t) => docx.add_paragraph(heading(&t, 24)),
                Block::Table(rows) => {
                    let mut table_rows = vec![TableRow::new(vec![
                        table_cell("Field", true),
                        table_cell("Value", true),
                    ])];
                    table_rows.extend(
                        rows.iter()
                            .map(|(k, v)| TableRow::new(vec![table_cell(k, true), table_cell(v, false)])),
                    );
                    docx.add_table(Table::new(table_rows))
                }
                Block::Bullet(t) => {
                    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!("• {t}"))))
                }
                Block::Logic(t) => {
                    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(t).italic()))
                }
                Block::Text(t) => docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(t))),
            };
        }

        let mut buf = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| SurveyError::Export(format!("docx: {e}")))?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn document_has_specs_distribution_and_questions() {
        let bytes = fixtures::with_input(|input| MarkdownExporter.export(input).unwrap());
        let doc = String::from_utf8(bytes).unwrap();
        assert!(doc.starts_with("# Professional Survey Questionnaire"));
        assert!(doc.contains("| Target Audience | Urban car buyers \\| 25-45 |"));
        assert!(doc.contains("- Total Questions: 41"));
        assert!(doc.contains("### SECTION 1: SCREENER & TERMINATION CRITERIA"));
        assert!(doc.contains("#### Q1. What is your age?"));
        assert!(doc.contains("*Fraud Detection: Yes*"));
        assert!(doc.contains("- Under 18"));
    }

    #[test]
    fn questionnaire_lines_are_classified() {
        let blocks = fixtures::with_input(document_blocks);
        assert!(blocks.contains(&Block::Section("SECTION 1: SCREENER & TERMINATION CRITERIA".into())));
        assert!(blocks.contains(&Block::Question("Q2. Please select Agree for this attention check.".into())));
        assert!(blocks.contains(&Block::Logic("Termination Logic: Terminate if Under 18".into())));
        assert!(blocks.contains(&Block::Text("Purpose: Age qualification".into())));
        assert!(blocks.contains(&Block::Bullet("18-34".into())));
    }

    #[test]
    fn docx_export_is_a_word_package() {
        let bytes = fixtures::with_input(|input| DocxExporter.export(input).unwrap());
        assert!(bytes.starts_with(b"PK"));
        let member = b"word/document.xml";
        assert!(bytes.windows(member.len()).any(|w| w == member));
    }
}
