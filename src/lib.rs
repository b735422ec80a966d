//! Campus Swipe - swipe-deck service for a college discovery app
//!
//! Users swipe cards representing colleges; likes and dislikes are written to a
//! remote document store. The crate holds the deck core (card stack, swipe
//! interpreter, forced-swipe channel) and the services and HTTP routes around it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    classify_release, Deck, DocumentStore, StoreError, SwipeDirection, SwipeResult, Translation,
    EXIT_DURATION, EXIT_OFFSET, SWIPE_THRESHOLD,
};
pub use models::{CollegeCard, Decision, DecisionRecord, DeckView, StudentProfile, UserRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(classify_release(SWIPE_THRESHOLD + 1.0), Some(SwipeDirection::Right));
        assert_eq!(Decision::from(SwipeDirection::Left), Decision::Disliked);
    }
}
