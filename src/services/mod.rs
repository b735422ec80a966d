// Service exports
pub mod advisor;
pub mod appwrite;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod images;
pub mod memory;
pub mod profile;
pub mod session;
pub mod sink;

pub use advisor::{AdmissionAdvisor, AdvisorError};
pub use appwrite::{AppwriteCollections, AppwriteStore};
pub use auth::{AppwriteAccounts, AuthError, Authenticator, IdentityProvider, MemoryAccounts};
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use catalog::{CollegeCatalog, LikedColleges};
pub use images::{ImageCache, ImageError, ImageLoader};
pub use memory::MemoryStore;
pub use profile::{ProfileError, ProfileService, ProfileStore, PROFILE_SLOT};
pub use session::{DeckSession, SessionRegistry, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE};
pub use sink::DecisionSink;
