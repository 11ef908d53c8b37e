//! Error taxonomy for a generation run.
//!
//! Planning stages are total and never produce these. Only collaborator
//! calls, input checks, and config/export I/O do.

use thiserror::Error;

use crate::batch::Section;
use crate::gateway::ProviderError;

/// Failure of the text-generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("generator returned no text")]
    Empty,
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_configuration())
    }
}

#[derive(Debug, Error)]
pub enum SurveyError {
    /// Missing or invalid collaborator credentials. Fatal, no partial output.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The SurveySpec cannot start a run.
    #[error("invalid survey input: {0}")]
    InputValidation(String),

    /// A questionnaire batch failed; later batches were not attempted.
    #[error("batch {batch_index} ({section}) failed: {source}")]
    Generation {
        batch_index: usize,
        section: Section,
        #[source]
        source: GenerationError,
    },

    /// Planner config file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurveyError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::InputValidation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a batch failure, promoting credential problems to
    /// [`SurveyError::Configuration`].
    pub(crate) fn batch(batch_index: usize, section: Section, source: GenerationError) -> Self {
        if source.is_configuration() {
            return Self::Configuration(source.to_string());
        }
        Self::Generation {
            batch_index,
            section,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_surface_as_configuration() {
        let err = SurveyError::batch(
            0,
            Section::Screener,
            GenerationError::Provider(ProviderError::config("OPENROUTER_API_KEY not set")),
        );
        assert!(matches!(err, SurveyError::Configuration(_)));
    }

    #[test]
    fn batch_failure_names_the_section() {
        let err = SurveyError::batch(
            2,
            Section::CoreResearch { part: 2 },
            GenerationError::Other("boom".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("batch 2"), "{msg}");
        assert!(msg.contains("core research (part 2)"), "{msg}");
    }
}
