use rust_xlsxwriter as xlsx;
use serde::{Deserialize, Serialize};

use super::{ExportInput, Exporter};
use crate::catalog::{Guideline, MetadataCatalog};
use crate::error::SurveyError;
use crate::parse::parse_questionnaire;

/// One worksheet: a header row and string cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width in {}", self.name);
        self.rows.push(row);
    }

    /// Guideline tables are laid out with one column per key and a single row.
    fn from_guidelines(name: &str, guidelines: &[Guideline]) -> Self {
        Self {
            name: name.to_string(),
            columns: guidelines.iter().map(|g| g.key.to_string()).collect(),
            rows: vec![guidelines.iter().map(|g| g.text.to_string()).collect()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Widest column written to a worksheet, in character units.
const MAX_COLUMN_WIDTH: usize = 60;

fn xlsx_error(e: xlsx::XlsxError) -> SurveyError {
    SurveyError::Export(format!("xlsx: {e}"))
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Render as an `.xlsx` file: one worksheet per sheet, a bold frozen
    /// header row and wrapped cells.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, SurveyError> {
        let header = xlsx::Format::new().set_bold().set_text_wrap();
        let body = xlsx::Format::new().set_text_wrap();

        let mut book = xlsx::Workbook::new();
        for sheet in &self.sheets {
            let ws = book.add_worksheet();
            ws.set_name(sheet.name.as_str()).map_err(xlsx_error)?;
            for (col, title) in (0u16..).zip(&sheet.columns) {
                ws.write_string_with_format(0, col, title.as_str(), &header)
                    .map_err(xlsx_error)?;
                let widest = sheet
                    .rows
                    .iter()
                    .filter_map(|r| r.get(usize::from(col)))
                    .flat_map(|cell| cell.lines())
                    .map(|l| l.chars().count())
                    .chain([title.chars().count()])
                    .max()
                    .unwrap_or(0)
                    .clamp(8, MAX_COLUMN_WIDTH);
                ws.set_column_width(col, widest as f64).map_err(xlsx_error)?;
            }
            for (row, cells) in (1u32..).zip(&sheet.rows) {
                for (col, value) in (0u16..).zip(cells) {
                    ws.write_string_with_format(row, col, value.as_str(), &body)
                        .map_err(xlsx_error)?;
                }
            }
            ws.set_freeze_panes(1, 0).map_err(xlsx_error)?;
        }
        book.save_to_buffer().map_err(xlsx_error)
    }
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

/// Survey details, per-question breakdown, catalog metadata, scale toolkit,
/// fraud, termination and LOI guidelines.
pub fn build_workbook(input: &ExportInput<'_>) -> Workbook {
    let spec = input.spec;
    let mut details = Sheet::new(
        "Survey_Details",
        &[
            "Objective",
            "Target_Audience",
            "Population_Size",
            "LOI_Minutes",
            "Methodology",
            "Device_Context",
            "Market",
            "Statistical_Methods",
            "Question_Types",
            "Compliance",
            "Generated_At",
        ],
    );
    details.push(vec![
        spec.objective.clone(),
        spec.target_audience.clone(),
        spec.population_size.to_string(),
        spec.loi_minutes.to_string(),
        spec.methodology.label().to_string(),
        spec.device_context.label().to_string(),
        spec.market.clone(),
        spec.statistical_method_labels().join(", "),
        spec.question_type_labels().join(", "),
        spec.compliance_labels().join(", "),
        input.generated_at.to_string(),
    ]);

    let mut questions = Sheet::new(
        "Questions_Analysis",
        &[
            "Question_Number",
            "Question_Text",
            "Section",
            "Response_Options",
            "Scale_Description",
            "Purpose",
            "Data_Type",
            "Validation_Rule",
            "Statistical_Methods",
            "Required_For_Analysis",
            "Quality_Checks",
            "Estimated_Time_Seconds",
            "Skip_Logic",
            "Termination_Logic",
            "Fraud_Check",
        ],
    );
    for r in parse_questionnaire(input.questionnaire) {
        questions.push(vec![
            format!("Q{}", r.number),
            r.text.clone(),
            opt(&r.section),
            r.options.join("\n"),
            opt(&r.scale),
            opt(&r.purpose),
            opt(&r.data_type),
            opt(&r.validation_rule),
            r.statistical_methods.join(", "),
            opt(&r.required_for_analysis),
            opt(&r.quality_checks),
            opt(&r.estimated_time),
            opt(&r.skip_logic),
            opt(&r.termination_logic),
            if r.fraud_check { "Yes" } else { "No" }.to_string(),
        ]);
    }

    let mut sheets = vec![details, questions];
    sheets.extend(catalog_sheets(input.catalog));
    Workbook { sheets }
}

/// Sheets built from the metadata catalog alone.
pub fn catalog_sheets(catalog: &MetadataCatalog) -> Vec<Sheet> {
    let mut metadata = Sheet::new(
        "Survey_Question_Metadata",
        &[
            "Question_Category",
            "Question_Type",
            "Purpose",
            "Data_Type",
            "Validation_Rule",
            "Termination_Logic",
            "Statistical_Applications",
            "Required_For_Analysis",
            "Quality_Checks",
            "Estimated_Time_Seconds",
            "Mobile_Optimization",
            "Accessibility_Notes",
        ],
    );
    for e in catalog.entries() {
        metadata.push(vec![
            e.category.label().to_string(),
            e.question_type.key().to_string(),
            e.purpose.to_string(),
            e.data_type.to_string(),
            e.validation_rule.to_string(),
            e.termination_logic.to_string(),
            e.statistical_applications.join(" | "),
            e.required_for_analysis.join(" | "),
            e.quality_checks.join(" | "),
            e.estimated_time_seconds.to_string(),
            e.mobile_optimization.to_string(),
            e.accessibility_notes.to_string(),
        ]);
    }

    let mut toolkit = Sheet::new(
        "Survey_Toolkit",
        &["Question_Type", "Scale_Options", "Analysis_Methods"],
    );
    for s in catalog.scales() {
        toolkit.push(vec![
            s.scale.name().to_string(),
            s.labels.join(" | "),
            s.analysis.join(" | "),
        ]);
    }

    vec![
        metadata,
        toolkit,
        Sheet::from_guidelines("Fraud_Guidelines", catalog.fraud_checks()),
        Sheet::from_guidelines("Termination_Criteria", catalog.termination_criteria()),
        Sheet::from_guidelines("LOI_Guidelines", catalog.loi_guidelines()),
    ]
}

/// Excel workbook with the seven analysis sheets.
pub struct WorkbookExporter;

impl Exporter for WorkbookExporter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn export(&self, input: &ExportInput<'_>) -> Result<Vec<u8>, SurveyError> {
        build_workbook(input).to_xlsx()
    }
}
