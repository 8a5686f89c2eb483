// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AdviceProse, AdviceReport, CompatibilityScore, ContactCard, EngagementAssessment,
    EngagementTrend, FeedbackEntry, FeedbackSummary, LikedMatch, PersonalityTraits, Profile,
    ProfileRecord, RemovedMatch, ScoringWeights, SortOrder, SwipeDirection, SwipeRecord,
};
pub use requests::SwipeRequest;
pub use responses::{
    ErrorResponse, HealthResponse, LoginResponse, LoginUser, SubmitFeedbackResponse,
    SuccessResponse,
};
