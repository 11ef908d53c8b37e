use super::{is_logic_line, is_section_line, ExportInput, Exporter};
use crate::error::SurveyError;
use crate::parse::match_marker;

/// Plain-text layout: section banners framed by `=` rules, each question
/// preceded by a `-` rule, logic lines arrowed and options indented.
pub fn format_questionnaire(text: &str) -> String {
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push(String::new());
        } else if match_marker(line).is_some() {
            out.push(format!("\n{}", "-".repeat(50)));
            out.push(line.to_string());
        } else if is_section_line(line) {
            out.push(format!("\n{}", "=".repeat(80)));
            out.push(line.trim().to_uppercase());
            out.push(format!("{}\n", "=".repeat(80)));
        } else if is_logic_line(line) {
            out.push(format!("    → {line}"));
        } else if line.trim_start().starts_with('-') || line.trim_start().starts_with('•') {
            out.push(format!("    {line}"));
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

pub struct PlainTextExporter;

impl Exporter for PlainTextExporter {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn export(&self, input: &ExportInput<'_>) -> Result<Vec<u8>, SurveyError> {
        let mut out = String::new();
        out.push_str("PROFESSIONAL SURVEY QUESTIONNAIRE\n");
        out.push_str(&"=".repeat(80));
        out.push('\n');
        out.push_str(&input.spec.to_string());
        out.push_str(&format!("\nGenerated: {}\n", input.generated_at));
        out.push_str(&format_questionnaire(input.questionnaire));
        out.push('\n');
        Ok(out.into_bytes())
    }
}
