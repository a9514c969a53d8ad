use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ISSUE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Label {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            description: None,
        }
    }
}

/// Issue as consumed by the analysis core. GitHub sends `null` bodies, so
/// `body` stays optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub comments: u32,
}

impl Issue {
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub avatar_url: String,
}

/// Issue returned by the issue listing, annotated with difficulty and language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
    pub user: GithubUser,
    pub labels: Vec<Label>,
    pub assignees: Vec<GithubUser>,
    pub comments: u32,
    pub html_url: String,
    pub repository_url: String,
    pub difficulty: Difficulty,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesResponse {
    pub issues: Vec<ProcessedIssue>,
    pub pagination: Pagination,
    pub repository: String,
}

/// Search results are passed through; `repos` mirrors `items` for clients
/// that resolve a repository by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
    pub repos: Vec<serde_json::Value>,
    pub pagination: Pagination,
}

// ============================================================================
// ANALYSIS TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Complexity {
    /// Lenient parse used on model output; anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Complexity::Easy,
            "medium" => Complexity::Medium,
            "hard" => Complexity::Hard,
            _ => Complexity::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Complexity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Complexity::parse(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemAnalysis {
    pub summary: String,
    pub complexity: Complexity,
    pub estimated_time: String,
    pub key_challenges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolutionApproach {
    pub steps: Vec<String>,
    pub technologies: Vec<String>,
    pub files_to_modify: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeExamples {
    pub snippets: Vec<CodeSnippet>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrGuidelines {
    pub title: String,
    pub description: String,
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resources {
    pub documentation: Vec<String>,
    pub examples: Vec<String>,
    pub related_issues: Vec<String>,
}

/// Structured issue analysis. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Suggestions {
    pub problem_analysis: ProblemAnalysis,
    pub solution_approach: SolutionApproach,
    pub code_examples: CodeExamples,
    pub pr_guidelines: PrGuidelines,
    pub resources: Resources,
    pub contribution_tips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub suggestions: Suggestions,
    pub raw_response: String,
}

// ============================================================================
// FAVORITES TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    pub avatar_url: String,
}

/// Favorite as submitted by a client; `addedAt` is stamped by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFavorite {
    /// `owner/repo`
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stargazers_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forks_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<RepoOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRepo {
    #[serde(flatten)]
    pub repo: NewFavorite,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl FavoriteRepo {
    pub fn id(&self) -> &str {
        &self.repo.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FavoritesEvent {
    Added { id: String },
    Removed { id: String },
    Cleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_parse() {
        assert_eq!(Complexity::parse("Easy"), Complexity::Easy);
        assert_eq!(Complexity::parse(" hard "), Complexity::Hard);
        assert_eq!(Complexity::parse("easy|medium|hard"), Complexity::Unknown);
        assert_eq!(Complexity::parse(""), Complexity::Unknown);
    }

    #[test]
    fn test_complexity_deserialize_is_lenient() {
        let c: Complexity = serde_json::from_str(r#""Medium""#).unwrap();
        assert_eq!(c, Complexity::Medium);
        let c: Complexity = serde_json::from_str(r#""moderate""#).unwrap();
        assert_eq!(c, Complexity::Unknown);
    }

    #[test]
    fn test_suggestions_wire_format() {
        let suggestions = Suggestions::default();
        let json = serde_json::to_value(&suggestions).unwrap();

        assert!(json.get("problemAnalysis").is_some());
        assert_eq!(json["problemAnalysis"]["complexity"], "unknown");
        assert!(json["solutionApproach"]["filesToModify"].is_array());
        assert!(json["resources"]["relatedIssues"].is_array());
        assert!(json["contributionTips"].is_array());
        assert!(json.get("rawResponse").is_none());
    }

    #[test]
    fn test_issue_null_body() {
        let issue: Issue = serde_json::from_str(
            r#"{"title": "Crash on start", "body": null, "labels": [{"name": "bug"}], "comments": 3}"#,
        )
        .unwrap();
        assert_eq!(issue.body_text(), "");
        assert_eq!(issue.label_names(), vec!["bug"]);
        assert_eq!(issue.comments, 3);
    }

    #[test]
    fn test_favorite_repo_flattens() {
        let favorite = FavoriteRepo {
            repo: NewFavorite {
                id: "rust-lang/rust".to_string(),
                name: "rust".to_string(),
                description: None,
                language: Some("Rust".to_string()),
                stargazers_count: Some(100),
                forks_count: None,
                owner: None,
                html_url: None,
            },
            added_at: Utc::now(),
        };
        let json = serde_json::to_value(&favorite).unwrap();
        assert_eq!(json["id"], "rust-lang/rust");
        assert_eq!(json["stargazers_count"], 100);
        assert!(json.get("addedAt").is_some());
        assert!(json.get("forks_count").is_none());
    }

    #[test]
    fn test_favorites_event_tagging() {
        let json = serde_json::to_string(&FavoritesEvent::Cleared).unwrap();
        assert_eq!(json, r#"{"type":"cleared"}"#);
    }
}
