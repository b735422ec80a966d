// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuthSession, CollegeCard, CollegeDetails, Decision, DecisionRecord, FetchReport,
    SkippedDocument, StudentProfile, UserRecord, MAX_RATING,
};
pub use requests::{
    AdmissionRequest, CredentialsRequest, DragRequest, ForceSwipeRequest, ImageQuery,
    ProfileUpdateRequest,
};
pub use responses::{
    AdmissionResponse, DeckView, ErrorResponse, HealthResponse, LikedCollegesResponse,
    LikedCountResponse, SwipeLabel, SwipeResponse,
};
