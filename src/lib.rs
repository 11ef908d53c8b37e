#![forbid(unsafe_code)]

//! # survey-harness
//!
//! Plans and generates market-research questionnaires with an LLM.
//!
//! The planning engine is deterministic: it classifies the survey's product
//! category from free text, allocates a question budget from the interview
//! length, resolves one brand list for the category and market, and splits
//! the questionnaire into numbered batches. Each batch becomes one bounded
//! generation request. The assembler joins the outputs, checks numbering,
//! duplicates and the required termination, fraud-check and NPS markers, and
//! issues at most one completion request when the result is short.

pub mod assembler;
pub mod batch;
pub mod brands;
pub mod budget;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod generator;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod survey;

pub use assembler::{Discrepancy, QualityRules, QuestionnaireAssembler, ValidationReport};
pub use batch::{plan_batches, BatchDescriptor, BatchPlan, Section};
pub use brands::{BrandList, BrandLookup, BrandResolver, GeneratorBrandLookup};
pub use budget::{BudgetPolicy, QuestionBudget};
pub use catalog::MetadataCatalog;
pub use classifier::{Category, CategoryClassifier, Classification};
pub use config::{load_config, SurveyConfig};
pub use error::{GenerationError, SurveyError};
pub use gateway::{Attribution, ChatGateway, ProviderGateway, UsageSink};
pub use generator::{GatewayGenerator, Generation, GenerationParams, TextGenerator};
pub use pipeline::{GeneratedSurvey, SurveyPipeline, SurveyPlan};
pub use survey::SurveySpec;
