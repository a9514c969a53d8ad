use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::types::{FavoriteRepo, FavoritesEvent, NewFavorite};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Saved repositories keyed by `owner/repo`, kept in insertion order.
/// Mutations are announced to subscribers.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn list(&self) -> Vec<FavoriteRepo>;

    async fn get(&self, id: &str) -> Option<FavoriteRepo>;

    /// Returns `false` without changes when `id` is already saved.
    async fn add(&self, repo: NewFavorite) -> bool;

    /// Returns `false` when `id` was not saved.
    async fn remove(&self, id: &str) -> bool;

    async fn is_favorite(&self, id: &str) -> bool;

    async fn count(&self) -> usize;

    async fn clear(&self);

    fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent>;
}

#[derive(Clone)]
pub struct InMemoryFavorites {
    repos: Arc<RwLock<Vec<FavoriteRepo>>>,
    event_sender: broadcast::Sender<FavoritesEvent>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repos: Arc::new(RwLock::new(Vec::new())),
            event_sender,
        }
    }

    fn emit(&self, event: FavoritesEvent) {
        let _ = self.event_sender.send(event);
    }
}

impl Default for InMemoryFavorites {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavorites {
    async fn list(&self) -> Vec<FavoriteRepo> {
        self.repos.read().await.clone()
    }

    async fn get(&self, id: &str) -> Option<FavoriteRepo> {
        let repos = self.repos.read().await;
        repos.iter().find(|r| r.id() == id).cloned()
    }

    async fn add(&self, repo: NewFavorite) -> bool {
        let id = repo.id.clone();
        {
            let mut repos = self.repos.write().await;
            if repos.iter().any(|r| r.id() == id) {
                return false;
            }
            repos.push(FavoriteRepo {
                repo,
                added_at: Utc::now(),
            });
        }

        tracing::debug!(%id, "Favorite added");
        self.emit(FavoritesEvent::Added { id });
        true
    }

    async fn remove(&self, id: &str) -> bool {
        {
            let mut repos = self.repos.write().await;
            let before = repos.len();
            repos.retain(|r| r.id() != id);
            if repos.len() == before {
                return false;
            }
        }

        tracing::debug!(%id, "Favorite removed");
        self.emit(FavoritesEvent::Removed { id: id.to_string() });
        true
    }

    async fn is_favorite(&self, id: &str) -> bool {
        self.repos.read().await.iter().any(|r| r.id() == id)
    }

    async fn count(&self) -> usize {
        self.repos.read().await.len()
    }

    async fn clear(&self) {
        self.repos.write().await.clear();
        self.emit(FavoritesEvent::Cleared);
    }

    fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.event_sender.subscribe()
    }
}
