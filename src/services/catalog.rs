use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::filters::exclude_decided;
use crate::core::ports::{DocumentStore, StoreError};
use crate::models::{CollegeCard, SkippedDocument, UserRecord};
use crate::services::cache::{CacheKey, CacheManager};

/// Liked colleges plus whatever could not be fetched
#[derive(Debug, Clone, Default)]
pub struct LikedColleges {
    pub cards: Vec<CollegeCard>,
    pub skipped: Vec<SkippedDocument>,
}

/// Read side of the document store: deck loads, likes and top picks.
///
/// Every method degrades to an empty result on remote failure; errors are
/// logged here and never reach the swipe deck.
pub struct CollegeCatalog {
    store: Arc<dyn DocumentStore>,
    cache: Arc<CacheManager>,
    /// `imageURL`s of the cards seen in the last successful listing
    image_urls: RwLock<HashSet<String>>,
}

impl CollegeCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<CacheManager>) -> Self {
        Self {
            store,
            cache,
            image_urls: RwLock::new(HashSet::new()),
        }
    }

    /// User record, served from the cache when possible
    pub async fn user_record(&self, user_id: &str) -> Result<UserRecord, StoreError> {
        let key = CacheKey::user_record(user_id);
        if let Ok(record) = self.cache.get::<UserRecord>(&key).await {
            return Ok(record);
        }

        let version = self.cache.version(&key).await;
        let record = self.store.get_user(user_id).await?;
        if let Err(e) = self.cache.set_if_current(&key, &record, version).await {
            tracing::warn!("Failed to cache user record for {}: {}", user_id, e);
        }
        Ok(record)
    }

    /// Colleges the user already liked or disliked
    pub async fn decided_ids(&self, user_id: &str) -> HashSet<String> {
        match self.user_record(user_id).await {
            Ok(record) => record.decided(),
            Err(StoreError::NotFound(_)) => HashSet::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch decided colleges for {}, showing all: {}",
                    user_id,
                    e
                );
                HashSet::new()
            }
        }
    }

    /// Every college, unfiltered. Empty on any error.
    pub async fn all_colleges(&self) -> Vec<CollegeCard> {
        match self.store.list_colleges().await {
            Ok(report) => {
                if !report.is_complete() {
                    for skipped in &report.skipped {
                        tracing::warn!("Skipping college {}: {}", skipped.id, skipped.reason);
                    }
                }
                *self.image_urls.write().await = report
                    .cards
                    .iter()
                    .filter(|card| !card.image_url.is_empty())
                    .map(|card| card.image_url.clone())
                    .collect();
                report.cards
            }
            Err(e) => {
                tracing::error!("Error fetching colleges: {}", e);
                vec![]
            }
        }
    }

    /// Whether `url` is the image of a known card. Refreshes the listing once on a miss.
    pub async fn is_known_image(&self, url: &str) -> bool {
        if self.image_urls.read().await.contains(url) {
            return true;
        }
        self.all_colleges().await;
        self.image_urls.read().await.contains(url)
    }

    /// Cards for a fresh deck: all colleges minus the ones already decided
    pub async fn load_deck(&self, user_id: &str) -> Vec<CollegeCard> {
        let decided = self.decided_ids(user_id).await;
        let cards = exclude_decided(self.all_colleges().await, &decided);

        tracing::debug!(
            "Loaded {} cards for {} ({} already decided)",
            cards.len(),
            user_id,
            decided.len()
        );

        cards
    }

    /// Liked colleges, fetched concurrently; failed fetches are skipped
    pub async fn liked_colleges(&self, user_id: &str) -> LikedColleges {
        let liked_ids = match self.user_record(user_id).await {
            Ok(record) => record.liked_colleges,
            Err(e) => {
                tracing::error!("Error fetching user doc for {}: {}", user_id, e);
                return LikedColleges::default();
            }
        };

        if liked_ids.is_empty() {
            return LikedColleges::default();
        }

        let fetches = liked_ids.iter().map(|id| self.store.get_college(id));
        let results = join_all(fetches).await;

        let mut liked = LikedColleges::default();
        for (id, result) in liked_ids.iter().zip(results) {
            match result {
                Ok(card) => liked.cards.push(card),
                Err(e) => {
                    tracing::warn!("Skipping liked college {}: {}", id, e);
                    liked.skipped.push(SkippedDocument {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        liked
    }

    /// Number of liked colleges, 0 when the user has no record
    pub async fn liked_count(&self, user_id: &str) -> usize {
        match self.user_record(user_id).await {
            Ok(record) => record.liked_colleges.len(),
            Err(e) => {
                tracing::debug!("No liked count for {}: {}", user_id, e);
                0
            }
        }
    }
}
