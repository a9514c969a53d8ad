pub mod client;
pub mod retry;

pub use client::GithubClient;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::ai::difficulty;
use crate::ai::UNKNOWN_LANGUAGE;
use crate::types::{
    DiscoverResponse, GithubUser, IssuesResponse, Label, Pagination, ProcessedIssue,
};

pub const DEFAULT_DISCOVER_PER_PAGE: u32 = 100;
pub const DEFAULT_ISSUES_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;
const GITHUB_HOST: &str = "github.com";

static LAST_PAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[?&]page=(\d+)[^>]*>;\s*rel="last""#).unwrap()
});

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverQuery {
    pub language: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuesQuery {
    pub repo: Option<String>,
    pub state: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub difficulty: Option<String>,
    pub label: Option<String>,
}

/// Issue as returned by `GET /repos/{owner}/{repo}/issues`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawIssue {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    closed_at: Option<String>,
    user: GithubUser,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    assignees: Vec<GithubUser>,
    #[serde(default)]
    comments: u32,
    html_url: String,
    repository_url: String,
}

impl RawIssue {
    pub(crate) fn into_processed(self, language: &str) -> ProcessedIssue {
        let difficulty = difficulty::classify_labels(&self.labels, self.comments);
        ProcessedIssue {
            id: self.id,
            number: self.number,
            title: self.title,
            body: self.body,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_at: self.closed_at,
            user: self.user,
            labels: self.labels,
            assignees: self.assignees,
            comments: self.comments,
            html_url: self.html_url,
            repository_url: self.repository_url,
            difficulty,
            language: language.to_string(),
        }
    }
}

/// Normalize a repository reference to `owner/name`. Accepts the bare slug or
/// any github.com URL inside a repository (issue, tree, clone URLs).
pub fn repo_slug(input: &str) -> Option<String> {
    let input = input.trim();

    let (path, is_url) = match input.find(GITHUB_HOST) {
        Some(idx) => {
            let rest = &input[idx + GITHUB_HOST.len()..];
            let rest = rest.split(['?', '#']).next().unwrap_or("");
            (rest.trim_start_matches([':', '/']), true)
        }
        None => (input, false),
    };

    let mut parts = path.trim_end_matches('/').split('/');
    let owner = parts.next()?;
    let mut repo = parts.next()?;
    if is_url {
        repo = repo.strip_suffix(".git").unwrap_or(repo);
    } else if parts.next().is_some() {
        return None;
    }

    if is_valid_segment(owner) && is_valid_segment(repo) {
        Some(format!("{}/{}", owner, repo))
    } else {
        None
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Guess a language from the repository name alone. Checks run in a fixed
/// order and the first substring hit wins.
pub fn language_from_repo(repo: &str) -> &'static str {
    let name = repo.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    if has(&["react", "next", "vue"]) {
        "JavaScript"
    } else if has(&["angular"]) {
        "TypeScript"
    } else if has(&["python", "django", "flask"]) {
        "Python"
    } else if has(&["go", "golang"]) {
        "Go"
    } else if has(&["rust"]) {
        "Rust"
    } else if has(&["java"]) {
        "Java"
    } else if has(&["csharp", "dotnet"]) {
        "C#"
    } else {
        UNKNOWN_LANGUAGE
    }
}

/// Search query and sort order for repository discovery.
pub fn search_query(language: Option<&str>, q: Option<&str>) -> (String, &'static str) {
    fn non_blank(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    if let Some(q) = non_blank(q) {
        return (format!("{} in:name", q), "best-match");
    }

    let mut query = "stars:>1".to_string();
    if let Some(language) = non_blank(language) {
        query.push_str(&format!(" language:{}", language));
    }
    (query, "forks")
}

pub fn clamp_per_page(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_PER_PAGE)
}

pub fn discover_response(data: Map<String, Value>, page: u32, per_page: u32) -> DiscoverResponse {
    let items = data
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total_count = data.get("total_count").and_then(Value::as_u64).unwrap_or(0);

    let pagination = Pagination {
        current_page: page,
        per_page,
        total_pages: total_count.div_ceil(per_page as u64) as u32,
        has_next_page: items.len() == per_page as usize,
        has_prev_page: page > 1,
        total_count,
    };

    DiscoverResponse {
        data,
        repos: items,
        pagination,
    }
}

/// Page number of the `rel="last"` link, if any.
pub fn parse_last_page(link: &str) -> Option<u32> {
    LAST_PAGE_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn link_pagination(
    link: Option<&str>,
    total_count: Option<u64>,
    page: u32,
    per_page: u32,
    fetched: usize,
) -> Pagination {
    let link = link.unwrap_or("");
    Pagination {
        current_page: page,
        per_page,
        total_pages: parse_last_page(link).unwrap_or(page),
        has_next_page: link.contains(r#"rel="next""#),
        has_prev_page: link.contains(r#"rel="prev""#),
        total_count: total_count.unwrap_or(fetched as u64),
    }
}

/// Annotate and filter one page of issues. Without `x-total-count` the
/// total is the size of the page as fetched, before any filter.
pub(crate) fn issues_page(
    repo: &str,
    raw: Vec<RawIssue>,
    query: &IssuesQuery,
    link: Option<&str>,
    total_count: Option<u64>,
    page: u32,
    per_page: u32,
) -> IssuesResponse {
    let fetched = raw.len();
    let language = language_from_repo(repo);
    let processed = raw.into_iter().map(|issue| issue.into_processed(language)).collect();
    let issues = filter_issues(processed, query.difficulty.as_deref(), query.label.as_deref());

    IssuesResponse {
        issues,
        pagination: link_pagination(link, total_count, page, per_page, fetched),
        repository: repo.to_string(),
    }
}

/// Apply the optional difficulty and label filters. `"all"` disables the
/// difficulty filter; the label filter is a case-insensitive substring match.
pub fn filter_issues(
    issues: Vec<ProcessedIssue>,
    difficulty: Option<&str>,
    label: Option<&str>,
) -> Vec<ProcessedIssue> {
    let difficulty = difficulty
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty() && d != "all");
    let label = label
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty());

    issues
        .into_iter()
        .filter(|issue| {
            difficulty
                .as_deref()
                .is_none_or(|d| issue.difficulty.as_str() == d)
        })
        .filter(|issue| {
            label.as_deref().is_none_or(|l| {
                issue
                    .labels
                    .iter()
                    .any(|existing| existing.name.to_lowercase().contains(l))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;
    use serde_json::json;

    fn raw_issue(labels: &[&str], comments: u32) -> RawIssue {
        serde_json::from_value(json!({
            "id": 1,
            "number": 42,
            "title": "Broken link in README",
            "body": null,
            "state": "open",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "closed_at": null,
            "user": {"login": "octocat", "avatar_url": "https://avatars.example/octocat"},
            "labels": labels.iter().map(|l| json!({"id": 7, "name": l, "color": "ededed", "description": null})).collect::<Vec<_>>(),
            "assignees": [],
            "comments": comments,
            "html_url": "https://github.com/acme/widgets/issues/42",
            "repository_url": "https://api.github.com/repos/acme/widgets",
            "node_id": "I_abc",
            "pull_request": null
        }))
        .unwrap()
    }

    #[test]
    fn test_repo_slug() {
        assert_eq!(repo_slug("rust-lang/rust").as_deref(), Some("rust-lang/rust"));
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio.git").as_deref(),
            Some("tokio-rs/tokio")
        );
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio/").as_deref(),
            Some("tokio-rs/tokio")
        );
        assert_eq!(
            repo_slug("git@github.com:serde-rs/serde.git").as_deref(),
            Some("serde-rs/serde")
        );
        assert_eq!(repo_slug("just-a-name"), None);
        assert_eq!(repo_slug("a/b/c"), None);
        assert_eq!(repo_slug("https://github.com/"), None);
        assert_eq!(repo_slug("https://github.com/tokio-rs"), None);
        assert_eq!(repo_slug(""), None);
    }

    #[test]
    fn test_repo_slug_uses_segments_after_host() {
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio/issues/5").as_deref(),
            Some("tokio-rs/tokio")
        );
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio/tree/main/tokio/src").as_deref(),
            Some("tokio-rs/tokio")
        );
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio?tab=readme").as_deref(),
            Some("tokio-rs/tokio")
        );
        assert_eq!(
            repo_slug("https://github.com/tokio-rs/tokio#readme").as_deref(),
            Some("tokio-rs/tokio")
        );
    }

    #[test]
    fn test_repo_slug_rejects_unsafe_segments() {
        assert_eq!(repo_slug("../etc"), None);
        assert_eq!(repo_slug("owner/.."), None);
        assert_eq!(repo_slug("./repo"), None);
        assert_eq!(repo_slug("owner/repo?per_page=1"), None);
        assert_eq!(repo_slug("owner/repo#frag"), None);
        assert_eq!(repo_slug("owner name/repo"), None);
        assert_eq!(repo_slug("https://github.com/../secrets"), None);
        assert_eq!(repo_slug("my_org/my.repo-2").as_deref(), Some("my_org/my.repo-2"));
    }

    #[test]
    fn test_language_from_repo() {
        assert_eq!(language_from_repo("facebook/react"), "JavaScript");
        assert_eq!(language_from_repo("vercel/next.js"), "JavaScript");
        assert_eq!(language_from_repo("angular/angular"), "TypeScript");
        assert_eq!(language_from_repo("pallets/flask"), "Python");
        assert_eq!(language_from_repo("golang/go"), "Go");
        assert_eq!(language_from_repo("rust-lang/rust"), "Rust");
        assert_eq!(language_from_repo("dotnet/runtime"), "C#");
        assert_eq!(language_from_repo("acme/widgets"), "Unknown");
    }

    #[test]
    fn test_language_first_match_wins() {
        // "django" also contains "go"; Python is checked first.
        assert_eq!(language_from_repo("django/django"), "Python");
        // "javascript" contains "java" but nothing earlier matches.
        assert_eq!(language_from_repo("airbnb/javascript"), "Java");
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query(Some("rust"), Some("tokio")),
            ("tokio in:name".to_string(), "best-match")
        );
        assert_eq!(
            search_query(Some("rust"), None),
            ("stars:>1 language:rust".to_string(), "forks")
        );
        assert_eq!(search_query(None, Some("  ")), ("stars:>1".to_string(), "forks"));
    }

    #[test]
    fn test_clamp_per_page() {
        assert_eq!(clamp_per_page(None, DEFAULT_DISCOVER_PER_PAGE), 100);
        assert_eq!(clamp_per_page(Some(0), DEFAULT_ISSUES_PER_PAGE), 1);
        assert_eq!(clamp_per_page(Some(500), DEFAULT_ISSUES_PER_PAGE), 100);
        assert_eq!(clamp_per_page(None, DEFAULT_ISSUES_PER_PAGE), 20);
    }

    #[test]
    fn test_discover_response_pagination() {
        let data = json!({
            "total_count": 45,
            "incomplete_results": false,
            "items": [{"full_name": "a/b"}, {"full_name": "c/d"}]
        });
        let Value::Object(map) = data else { unreachable!() };

        let response = discover_response(map, 2, 2);
        assert_eq!(response.repos.len(), 2);
        assert_eq!(response.pagination.total_pages, 23);
        assert!(response.pagination.has_next_page);
        assert!(response.pagination.has_prev_page);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_count"], 45);
        assert_eq!(json["items"][0]["full_name"], "a/b");
        assert_eq!(json["repos"][1]["full_name"], "c/d");
        assert_eq!(json["pagination"]["current_page"], 2);
    }

    #[test]
    fn test_discover_response_short_page() {
        let Value::Object(map) = json!({"total_count": 1, "items": [{}]}) else {
            unreachable!()
        };
        let response = discover_response(map, 1, 100);
        assert_eq!(response.pagination.total_pages, 1);
        assert!(!response.pagination.has_next_page);
        assert!(!response.pagination.has_prev_page);
    }

    #[test]
    fn test_parse_last_page() {
        let link = r#"<https://api.github.com/repositories/1/issues?per_page=20&page=2>; rel="next", <https://api.github.com/repositories/1/issues?per_page=20&page=17>; rel="last""#;
        assert_eq!(parse_last_page(link), Some(17));

        let link = r#"<https://api.github.com/repositories/1/issues?page=3&per_page=20>; rel="last""#;
        assert_eq!(parse_last_page(link), Some(3));

        let link = r#"<https://api.github.com/repositories/1/issues?page=1>; rel="prev""#;
        assert_eq!(parse_last_page(link), None);
    }

    #[test]
    fn test_link_pagination() {
        let link = r#"<https://x/issues?page=1>; rel="prev", <https://x/issues?page=3>; rel="next", <https://x/issues?page=9>; rel="last""#;
        let pagination = link_pagination(Some(link), Some(180), 2, 20, 20);
        assert_eq!(
            pagination,
            Pagination {
                current_page: 2,
                per_page: 20,
                total_pages: 9,
                has_next_page: true,
                has_prev_page: true,
                total_count: 180,
            }
        );

        let pagination = link_pagination(None, None, 1, 20, 4);
        assert_eq!(pagination.total_pages, 1);
        assert!(!pagination.has_next_page);
        assert_eq!(pagination.total_count, 4);
    }

    #[test]
    fn test_raw_issue_processing() {
        let issue = raw_issue(&["good first issue"], 1).into_processed("Rust");
        assert_eq!(issue.difficulty, Difficulty::Easy);
        assert_eq!(issue.language, "Rust");
        assert_eq!(issue.labels[0].name, "good first issue");
        assert!(issue.body.is_none());

        let issue = raw_issue(&[], 20).into_processed("Unknown");
        assert_eq!(issue.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_issues_page_counts_before_filtering() {
        let raw = vec![raw_issue(&["good first issue"], 0), raw_issue(&["bug"], 0), raw_issue(&[], 30)];
        let query = IssuesQuery {
            difficulty: Some("easy".to_string()),
            ..IssuesQuery::default()
        };

        let response = issues_page("golang/go", raw, &query, None, None, 1, 20);
        assert_eq!(response.issues.len(), 1);
        assert_eq!(response.issues[0].language, "Go");
        assert_eq!(response.pagination.total_count, 3);
        assert_eq!(response.repository, "golang/go");

        let response = issues_page("golang/go", vec![raw_issue(&[], 0)], &query, None, Some(250), 1, 20);
        assert_eq!(response.pagination.total_count, 250);
    }

    #[test]
    fn test_filter_issues() {
        let issues = vec![
            raw_issue(&["good first issue"], 0).into_processed("Go"),
            raw_issue(&["Bug", "needs triage"], 0).into_processed("Go"),
            raw_issue(&["wontfix"], 30).into_processed("Go"),
        ];

        assert_eq!(filter_issues(issues.clone(), None, None).len(), 3);
        assert_eq!(filter_issues(issues.clone(), Some("all"), None).len(), 3);
        assert_eq!(filter_issues(issues.clone(), Some("easy"), None).len(), 1);
        assert_eq!(filter_issues(issues.clone(), Some("Medium"), None).len(), 1);
        assert_eq!(filter_issues(issues.clone(), Some("hard"), None).len(), 1);
        assert_eq!(filter_issues(issues.clone(), None, Some("bug")).len(), 1);
        assert_eq!(filter_issues(issues.clone(), None, Some("TRIAGE")).len(), 1);
        assert!(filter_issues(issues, Some("easy"), Some("bug")).is_empty());
    }
}
