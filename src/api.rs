use actix_web::http::header::CACHE_CONTROL;
use actix_web::{web, HttpResponse, Responder};
use actix_web_lab::sse::{self, Event, Sse};
use futures::stream::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::AnalysisContext;
use crate::error::ApiError;
use crate::favorites::FavoritesStore;
use crate::github::{repo_slug, DiscoverQuery, GithubClient, IssuesQuery};
use crate::orchestrator::IssueAnalyzer;
use crate::types::{AnalyzeRequest, AnalyzeResponse, NewFavorite};

const DISCOVER_CACHE_SECS: u32 = 600;
const ISSUES_CACHE_SECS: u32 = 300;

pub struct AppState {
    pub analyzer: IssueAnalyzer,
    pub github: GithubClient,
    pub favorites: Arc<dyn FavoritesStore>,
}

pub async fn health() -> impl Responder {
    web::Json(serde_json::json!({"status": "ok"}))
}

/// JSON response that shared caches may keep for `max_age_secs`.
fn cached_json<T: Serialize>(body: &T, max_age_secs: u32) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((
            CACHE_CONTROL,
            format!("public, s-maxage={}, stale-while-revalidate", max_age_secs),
        ))
        .json(body)
}

pub async fn discover_repos(
    query: web::Query<DiscoverQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let response = state.github.discover(&query).await.map_err(|e| {
        tracing::error!("Repository search failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(cached_json(&response, DISCOVER_CACHE_SECS))
}

pub async fn list_issues(
    query: web::Query<IssuesQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let repo = query
        .repo
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Repository name is required".to_string()))?;

    let slug = repo_slug(repo)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid repository name: {}", repo)))?;

    let response = state.github.list_issues(&slug, &query).await.map_err(|e| {
        tracing::error!("Fetching issues for {} failed: {}", slug, e);
        ApiError::from(e)
    })?;

    Ok(cached_json(&response, ISSUES_CACHE_SECS))
}

pub async fn ai_suggestions(
    body: web::Json<AnalyzeRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let request = body.into_inner();

    let repository = request
        .repository
        .filter(|r| !r.trim().is_empty());
    let (Some(issue), Some(repository)) = (request.issue, repository) else {
        return Err(ApiError::BadRequest(
            "Issue and repository are required".to_string(),
        ));
    };

    let context = AnalysisContext::new(issue, repository)
        .with_language(request.language.unwrap_or_default());

    let analysis = state.analyzer.analyze(&context).await.map_err(|e| {
        tracing::error!("AI suggestions for {} failed: {}", context.repository, e);
        ApiError::InternalError("Failed to generate AI suggestions".to_string())
    })?;

    Ok(web::Json(AnalyzeResponse {
        success: true,
        suggestions: analysis.suggestions,
        raw_response: analysis.raw_response,
    }))
}

pub async fn list_favorites(state: web::Data<AppState>) -> impl Responder {
    web::Json(state.favorites.list().await)
}

pub async fn add_favorite(
    body: web::Json<NewFavorite>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut repo = body.into_inner();
    repo.id = repo_slug(&repo.id)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid repository id: {}", repo.id)))?;
    let id = repo.id.clone();

    if !state.favorites.add(repo).await {
        return Err(ApiError::Conflict(format!("{} is already a favorite", id)));
    }

    let saved = state
        .favorites
        .get(&id)
        .await
        .ok_or_else(|| ApiError::InternalError(format!("Favorite {} vanished after insert", id)))?;

    Ok(HttpResponse::Created().json(saved))
}

pub async fn get_favorite(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let (owner, name) = path.into_inner();
    let id = format!("{}/{}", owner, name);

    let favorite = state
        .favorites
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Favorite {} not found", id)))?;

    Ok(web::Json(favorite))
}

pub async fn remove_favorite(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (owner, name) = path.into_inner();
    let id = format!("{}/{}", owner, name);

    if !state.favorites.remove(&id).await {
        return Err(ApiError::NotFound(format!("Favorite {} not found", id)));
    }

    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_favorites(state: web::Data<AppState>) -> HttpResponse {
    state.favorites.clear().await;
    HttpResponse::NoContent().finish()
}

pub async fn stream_favorites(state: web::Data<AppState>) -> impl Responder {
    let receiver = state.favorites.subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(receiver).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok::<_, std::convert::Infallible>(Event::Data(
                    sse::Data::new(data),
                )))
            }
            Err(_) => None,
        }
    });

    Sse::from_stream(stream).with_keep_alive(Duration::from_secs(15))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/github/discover", web::get().to(discover_repos))
            .route("/github/issues", web::get().to(list_issues))
            .route("/ai/suggestions", web::post().to(ai_suggestions))
            .route("/favorites", web::get().to(list_favorites))
            .route("/favorites", web::post().to(add_favorite))
            .route("/favorites", web::delete().to(clear_favorites))
            .route("/favorites/stream", web::get().to(stream_favorites))
            .route("/favorites/{owner}/{repo}", web::get().to(get_favorite))
            .route("/favorites/{owner}/{repo}", web::delete().to(remove_favorite)),
    );
}
