use reqwest::header::{HeaderMap, ACCEPT, LINK, RETRY_AFTER};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::github::retry::{with_retry, RetryConfig};
use crate::github::{
    clamp_per_page, discover_response, issues_page, search_query, DiscoverQuery, IssuesQuery,
    RawIssue, DEFAULT_DISCOVER_PER_PAGE, DEFAULT_ISSUES_PER_PAGE,
};
use crate::types::{DiscoverResponse, IssuesResponse};

const USER_AGENT: &str = "repovibe-api";
const API_VERSION: &str = "2022-11-28";
const DEFAULT_RATE_LIMIT_WAIT_MS: u64 = 60_000;

pub struct GithubClient {
    client: Client,
    token: Option<SecretString>,
    api_url: String,
    retry: RetryConfig,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Search repositories by name, or by language ordered by forks.
    pub async fn discover(&self, query: &DiscoverQuery) -> Result<DiscoverResponse, GithubError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = clamp_per_page(query.per_page, DEFAULT_DISCOVER_PER_PAGE);
        let (q, sort) = search_query(query.language.as_deref(), query.q.as_deref());

        debug!(query = %q, sort, page, per_page, "Searching repositories");

        let params = [
            ("q", q),
            ("sort", sort.to_string()),
            ("order", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self.get("/search/repositories", &params).await?;

        let data: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| GithubError::InvalidResponse(format!("Invalid search response: {}", e)))?;

        Ok(discover_response(data, page, per_page))
    }

    /// List issues of `repo` (`owner/name`) with difficulty and language
    /// annotations, then apply the query's filters.
    pub async fn list_issues(
        &self,
        repo: &str,
        query: &IssuesQuery,
    ) -> Result<IssuesResponse, GithubError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = clamp_per_page(query.per_page, DEFAULT_ISSUES_PER_PAGE);
        let params = [
            ("state", query.state.clone().unwrap_or_else(|| "open".to_string())),
            ("sort", query.sort.clone().unwrap_or_else(|| "created".to_string())),
            ("direction", query.direction.clone().unwrap_or_else(|| "desc".to_string())),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];

        let response = self.get(&format!("/repos/{}/issues", repo), &params).await?;

        let link = header_str(response.headers(), LINK.as_str()).map(str::to_string);
        let total_count = header_str(response.headers(), "x-total-count").and_then(|v| v.parse().ok());

        let raw: Vec<RawIssue> = response
            .json()
            .await
            .map_err(|e| GithubError::InvalidResponse(format!("Invalid issues response: {}", e)))?;

        let response = issues_page(repo, raw, query, link.as_deref(), total_count, page, per_page);
        info!(repository = %repo, count = response.issues.len(), page, "Fetched issues");
        Ok(response)
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Response, GithubError> {
        let token = self.token.as_ref().ok_or(GithubError::MissingToken)?;
        let url = format!("{}{}", self.api_url, path);

        with_retry(&self.retry, || self.send(&url, token, params)).await
    }

    async fn send(
        &self,
        url: &str,
        token: &SecretString,
        params: &[(&str, String)],
    ) -> Result<Response, GithubError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        check_status(response.status().as_u16(), response.headers())?;
        Ok(response)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// GitHub signals an exhausted budget with 429, or 403 plus
/// `x-ratelimit-remaining: 0`.
fn check_status(status: u16, headers: &HeaderMap) -> Result<(), GithubError> {
    let budget_exhausted = header_str(headers, "x-ratelimit-remaining") == Some("0");
    if status == 429 || (status == 403 && budget_exhausted) {
        let retry_after_ms = header_str(headers, RETRY_AFTER.as_str())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_MS);
        return Err(GithubError::RateLimited { retry_after_ms });
    }

    if !(200..300).contains(&status) {
        return Err(GithubError::Api { status });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_check_status_success() {
        assert!(check_status(200, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_check_status_rate_limited() {
        let err = check_status(429, &headers(&[("retry-after", "7")])).unwrap_err();
        assert!(matches!(err, GithubError::RateLimited { retry_after_ms: 7000 }));

        let err = check_status(403, &headers(&[("x-ratelimit-remaining", "0")])).unwrap_err();
        assert!(matches!(
            err,
            GithubError::RateLimited {
                retry_after_ms: DEFAULT_RATE_LIMIT_WAIT_MS
            }
        ));
    }

    #[test]
    fn test_check_status_huge_retry_after_saturates() {
        let err = check_status(429, &headers(&[("retry-after", "18446744073709551615")])).unwrap_err();
        assert!(matches!(
            err,
            GithubError::RateLimited {
                retry_after_ms: u64::MAX
            }
        ));
    }

    #[test]
    fn test_check_status_forbidden_with_budget_left() {
        let err = check_status(403, &headers(&[("x-ratelimit-remaining", "12")])).unwrap_err();
        assert!(matches!(err, GithubError::Api { status: 403 }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_check_status_not_found() {
        let err = check_status(404, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, GithubError::Api { status: 404 }));
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let client = GithubClient::new(&GithubConfig {
            api_url: "https://ghe.example.com/api/v3/".to_string(),
            ..GithubConfig::default()
        })
        .unwrap();
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_request() {
        let client = GithubClient::new(&GithubConfig::default()).unwrap();

        let result = client.discover(&DiscoverQuery::default()).await;
        assert!(matches!(result, Err(GithubError::MissingToken)));

        let result = client.list_issues("acme/widgets", &IssuesQuery::default()).await;
        assert!(matches!(result, Err(GithubError::MissingToken)));
    }
}
