// Deck core exports
pub mod deck;
pub mod filters;
pub mod ports;
pub mod stack;
pub mod swipe;

pub use deck::{Deck, PendingExit, SwipeOrigin, SwipeResult, DEFAULT_CARD_WIDTH};
pub use filters::{decode_college, decode_college_documents, exclude_decided};
pub use ports::{DocumentStore, StoreError};
pub use stack::{CardStack, FetchTicket};
pub use swipe::{
    classify_release, rotation_degrees, Release, SwipeDirection, SwipeInterpreter, SwipePhase,
    SwipeState, Translation, EXIT_DURATION, EXIT_OFFSET, SWIPE_THRESHOLD,
};
