use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::deck::{Deck, PendingExit, SwipeResult};
use crate::core::swipe::{Translation, EXIT_DURATION};
use crate::models::{Decision, DeckView, SwipeResponse};
use crate::services::catalog::CollegeCatalog;
use crate::services::sink::DecisionSink;

/// A user's live deck.
///
/// The mutex plays the role of the UI thread: every stack or gesture mutation
/// happens while holding it, and remote I/O always runs with it released.
pub struct DeckSession {
    deck: Arc<Mutex<Deck>>,
    catalog: Arc<CollegeCatalog>,
    sink: DecisionSink,
}

impl DeckSession {
    pub fn new(user_id: &str, catalog: Arc<CollegeCatalog>, sink: DecisionSink) -> Self {
        Self {
            deck: Arc::new(Mutex::new(Deck::new(user_id))),
            catalog,
            sink,
        }
    }

    pub async fn view(&self) -> DeckView {
        self.deck.lock().await.view()
    }

    /// Refetch the deck. A result superseded by a newer reload or a
    /// completed swipe is dropped.
    pub async fn reload(&self) -> DeckView {
        let (user_id, ticket) = {
            let mut deck = self.deck.lock().await;
            (deck.user_id().to_string(), deck.begin_fetch())
        };

        let cards = self.catalog.load_deck(&user_id).await;

        let mut deck = self.deck.lock().await;
        if !deck.apply_fetch(ticket, cards) {
            tracing::warn!(
                "Discarding stale deck fetch for {} (generation {})",
                user_id,
                ticket.generation()
            );
        }
        deck.view()
    }

    pub async fn drag(&self, translation: Translation) -> DeckView {
        let mut deck = self.deck.lock().await;
        deck.drag(translation);
        deck.view()
    }

    pub async fn release(&self) -> SwipeResponse {
        let mut deck = self.deck.lock().await;
        let result = deck.release();
        let view = deck.view();
        drop(deck);

        self.respond(result, view)
    }

    /// Like or dislike button
    pub async fn force(&self, decision: Decision) -> SwipeResponse {
        let mut deck = self.deck.lock().await;
        let result = deck.force(decision);
        let view = deck.view();
        drop(deck);

        self.respond(result, view)
    }

    fn respond(&self, result: SwipeResult, deck: DeckView) -> SwipeResponse {
        match result {
            SwipeResult::Committed(pending) => {
                let response = SwipeResponse {
                    outcome: "committed".to_string(),
                    decision: Some(pending.decision),
                    card_id: Some(pending.card_id.clone()),
                    exit_after_ms: Some(EXIT_DURATION.as_millis() as u64),
                    deck,
                };
                self.schedule_exit(pending);
                response
            }
            SwipeResult::Cancelled => SwipeResponse {
                outcome: "cancelled".to_string(),
                decision: None,
                card_id: None,
                exit_after_ms: None,
                deck,
            },
            SwipeResult::Ignored => SwipeResponse {
                outcome: "ignored".to_string(),
                decision: None,
                card_id: None,
                exit_after_ms: None,
                deck,
            },
        }
    }

    /// Run the exit animation, then remove the card and hand the decision to the sink
    fn schedule_exit(&self, pending: PendingExit) {
        let deck = Arc::clone(&self.deck);
        let sink = self.sink.clone();

        tokio::spawn(async move {
            tokio::time::sleep(EXIT_DURATION).await;

            let record = deck.lock().await.complete(&pending);
            tracing::debug!(
                "Card {} left the deck ({:?} via {:?})",
                pending.card_id,
                pending.decision,
                pending.origin
            );

            sink.dispatch(record);
        });
    }
}

/// Default cap on live deck sessions
pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;
/// Default idle time after which a deck session is dropped
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Deck sessions keyed by user id.
///
/// Sessions idle for longer than the configured time are evicted; the next
/// request for that user opens a fresh one with a new load.
pub struct SessionRegistry {
    sessions: moka::future::Cache<String, Arc<DeckSession>>,
    catalog: Arc<CollegeCatalog>,
    sink: DecisionSink,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<CollegeCatalog>, sink: DecisionSink) -> Self {
        Self::with_limits(catalog, sink, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE)
    }

    pub fn with_limits(
        catalog: Arc<CollegeCatalog>,
        sink: DecisionSink,
        max_sessions: u64,
        idle: Duration,
    ) -> Self {
        let sessions = moka::future::CacheBuilder::new(max_sessions)
            .time_to_idle(idle)
            .build();

        Self {
            sessions,
            catalog,
            sink,
        }
    }

    /// Existing session for `user_id`, or a new one with an initial load
    pub async fn session(&self, user_id: &str) -> Arc<DeckSession> {
        let entry = self
            .sessions
            .entry_by_ref(user_id)
            .or_insert_with(async {
                Arc::new(DeckSession::new(
                    user_id,
                    Arc::clone(&self.catalog),
                    self.sink.clone(),
                ))
            })
            .await;

        let created = entry.is_fresh();
        let session = entry.into_value();

        if created {
            tracing::info!("Opened deck session for {}", user_id);
            session.reload().await;
        }

        session
    }

    /// Drop the session for `user_id`. Returns false if there was none.
    pub async fn close(&self, user_id: &str) -> bool {
        let closed = self.sessions.remove(user_id).await.is_some();
        if closed {
            tracing::info!("Closed deck session for {}", user_id);
        }
        closed
    }

    pub async fn len(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ports::DocumentStore;
    use crate::models::{CollegeCard, CollegeDetails, UserRecord};
    use crate::services::cache::CacheManager;
    use crate::services::memory::MemoryStore;
    use std::time::Duration;

    fn card(id: &str) -> CollegeCard {
        CollegeCard {
            id: id.to_string(),
            name: id.to_string(),
            year: 1800,
            description: String::new(),
            image_url: String::new(),
            details: CollegeDetails::default(),
        }
    }

    async fn registry() -> (Arc<MemoryStore>, SessionRegistry) {
        let store = Arc::new(MemoryStore::with_colleges(vec![
            card("harvard"),
            card("yale"),
            card("mit"),
        ]));
        store.insert_user(UserRecord::new("student", None)).await;

        let cache = Arc::new(CacheManager::new(100, 60));
        let catalog = Arc::new(CollegeCatalog::new(store.clone(), cache.clone()));
        let sink = DecisionSink::new(store.clone(), cache);
        (store, SessionRegistry::new(catalog, sink))
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_commit_removes_card_and_records() {
        let (store, registry) = registry().await;
        let session = registry.session("student").await;
        assert_eq!(session.view().await.remaining, 3);

        session.drag(Translation::new(-200.0, 0.0)).await;
        let response = session.release().await;
        assert_eq!(response.outcome, "committed");
        assert_eq!(response.card_id.as_deref(), Some("mit"));
        assert_eq!(response.decision, Some(Decision::Disliked));

        // Still animating out
        assert_eq!(session.view().await.remaining, 3);

        tokio::time::sleep(EXIT_DURATION + Duration::from_millis(50)).await;

        let view = session.view().await;
        assert_eq!(view.remaining, 2);
        assert_eq!(view.top_card.map(|c| c.id), Some("yale".to_string()));

        let user = store.get_user("student").await.unwrap();
        assert_eq!(user.disliked_colleges, vec!["mit"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_swipe_records_like() {
        let (store, registry) = registry().await;
        let session = registry.session("student").await;

        let response = session.force(Decision::Liked).await;
        assert_eq!(response.outcome, "committed");
        assert_eq!(response.exit_after_ms, Some(400));

        tokio::time::sleep(EXIT_DURATION + Duration::from_millis(50)).await;

        assert_eq!(session.view().await.remaining, 2);
        let user = store.get_user("student").await.unwrap();
        assert_eq!(user.liked_colleges, vec!["mit"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_card_removed_even_when_write_fails() {
        let (store, registry) = registry().await;
        let session = registry.session("student").await;
        store.set_offline(true).await;

        session.force(Decision::Liked).await;
        tokio::time::sleep(EXIT_DURATION + Duration::from_millis(50)).await;

        assert_eq!(session.view().await.remaining, 2);
    }

    #[tokio::test]
    async fn test_reload_skips_decided_cards() {
        let (store, registry) = registry().await;
        store.add_decision("student", "mit", Decision::Liked).await.unwrap();

        let session = registry.session("student").await;
        let view = session.view().await;
        assert_eq!(view.remaining, 2);
        assert_eq!(view.top_card.map(|c| c.id), Some("yale".to_string()));
    }

    #[tokio::test]
    async fn test_short_release_is_cancelled() {
        let (_store, registry) = registry().await;
        let session = registry.session("student").await;

        session.drag(Translation::new(100.0, 0.0)).await;
        let response = session.release().await;
        assert_eq!(response.outcome, "cancelled");
        assert_eq!(response.deck.translation_x, 0.0);
        assert_eq!(response.deck.remaining, 3);
    }

    #[tokio::test]
    async fn test_registry_reuses_sessions() {
        let (_store, registry) = registry().await;
        let a = registry.session("student").await;
        let b = registry.session("student").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().await, 1);
        assert!(registry.close("student").await);
        assert_eq!(registry.len().await, 0);
        assert!(!registry.close("student").await);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = Arc::new(MemoryStore::with_colleges(vec![card("mit")]));
        let cache = Arc::new(CacheManager::new(100, 60));
        let catalog = Arc::new(CollegeCatalog::new(store.clone(), cache.clone()));
        let sink = DecisionSink::new(store, cache);
        let registry =
            SessionRegistry::with_limits(catalog, sink, 10, Duration::from_millis(50));

        let first = registry.session("student").await;
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(registry.len().await, 0);

        let second = registry.session("student").await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.view().await.remaining, 1);
    }
}
