pub mod difficulty;
pub mod fallback;
pub mod normalizer;
pub mod prompt;

use crate::types::Issue;

pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Everything the analysis prompt is built from
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub issue: Issue,
    /// Repository identifier, usually `owner/repo`
    pub repository: String,
    /// Primary language, `Unknown` when the caller has none
    pub language: String,
}

impl AnalysisContext {
    pub fn new(issue: Issue, repository: impl Into<String>) -> Self {
        Self {
            issue,
            repository: repository.into(),
            language: UNKNOWN_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.language = language;
        }
        self
    }
}
